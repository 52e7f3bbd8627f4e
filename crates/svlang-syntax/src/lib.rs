//! Syntax layer of the svlang SystemVerilog front-end.
//!
//! The pipeline: `lexer` turns a buffer into tokens, `preprocessor` applies
//! directives and macro expansion, `parser` builds a lossless rowan tree,
//! `ast` layers typed accessors over it, and `rewriter` produces edited
//! trees with structural sharing. `SyntaxTree` ties the stages together.

pub mod ast;
pub mod cst;
pub mod lexer;
pub mod parser;
pub mod preprocessor;
pub mod rewriter;
pub mod token;
mod tree;

pub use cst::{KeywordProfile, SvLang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, TokenSet};
pub use parser::{GuessKind, Parse, SpanMap, parse_guess};

/// Hard failures that stop the front-end outright.
///
/// User-level problems (bad source) are diagnostics and never surface here;
/// these are the cases where no useful tree can be produced at all.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Execution fuel exhausted (too many parser operations).
    #[error("execution limit exceeded")]
    ExecFuelExhausted,

    /// Recursion fuel exhausted (input nested too deeply).
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,

    /// Path or include resolution failed while loading input.
    #[error(transparent)]
    Source(#[from] svlang_core::source::SourceError),
}

/// Result type for front-end operations.
pub type Result<T> = std::result::Result<T, Error>;
pub use preprocessor::{
    DefaultNetType, MacroDef, MacroParam, Preprocessor, PreprocessorOptions, TimeScale,
    TimeScaleValue,
};
pub use rewriter::{Rewriter, dump_tree};
pub use token::{Base, TimeUnit, Token, TokenValue};
pub use tree::SyntaxTree;
