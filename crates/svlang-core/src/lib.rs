//! Shared infrastructure for the svlang SystemVerilog front-end.
//!
//! - `source` - source buffers, include resolution, location mapping
//! - `diagnostics` - structured diagnostics with stable codes
//! - `intern` - string interning

pub mod diagnostics;
pub mod intern;
pub mod source;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, DiagnosticsPrinter, Severity};
pub use intern::{Interner, Name};
pub use source::{FileSpan, SourceError, SourceId, SourceManager};
