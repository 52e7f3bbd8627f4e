//! Structured diagnostics with stable codes.
//!
//! Diagnostics are data, not text: a kind, a primary span, lazily formatted
//! arguments, and ordered notes. Rendering happens in consumers; the built-in
//! consumer is [`DiagnosticsPrinter`].

mod kind;
mod printer;

use std::collections::HashSet;

use indexmap::IndexMap;
use rowan::TextSize;

pub use kind::{DiagnosticKind, Severity};
pub use printer::DiagnosticsPrinter;

use crate::source::FileSpan;

/// An attached note with its own location and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub span: Option<FileSpan>,
    pub message: String,
}

/// A single diagnostic: kind, severity, primary span, args, notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub span: FileSpan,
    pub args: Vec<String>,
    pub notes: Vec<Note>,
}

impl Diagnostic {
    /// Renders the message by substituting args into the kind's template.
    pub fn message(&self) -> String {
        let template = self.kind.template();
        let mut out = String::with_capacity(template.len());
        let mut args = self.args.iter();
        let mut rest = template;
        while let Some(idx) = rest.find("{}") {
            out.push_str(&rest[..idx]);
            if let Some(arg) = args.next() {
                out.push_str(arg);
            }
            rest = &rest[idx + 2..];
        }
        out.push_str(rest);
        out
    }

    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }
}

/// What the policy table says about a diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    Suppressed,
    Severity(Severity),
}

/// Accumulates diagnostics, deduplicating by (kind, location).
#[derive(Debug, Default)]
pub struct Diagnostics {
    messages: Vec<Diagnostic>,
    seen: HashSet<(DiagnosticKind, crate::source::SourceId, TextSize)>,
    policy: IndexMap<DiagnosticKind, Policy>,
}

/// Builder for one diagnostic.
#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    sink: &'a mut Diagnostics,
    diagnostic: Diagnostic,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, kind: DiagnosticKind, span: FileSpan) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostic: Diagnostic {
                kind,
                severity: kind.severity(),
                span,
                args: Vec::new(),
                notes: Vec::new(),
            },
            sink: self,
        }
    }

    /// Suppress a code entirely.
    pub fn suppress(&mut self, kind: DiagnosticKind) {
        self.policy.insert(kind, Policy::Suppressed);
    }

    /// Override the severity of a code.
    pub fn set_severity(&mut self, kind: DiagnosticKind, severity: Severity) {
        self.policy.insert(kind, Policy::Severity(severity));
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.messages
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|d| d.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_error()).count()
    }

    /// Diagnostics of exactly one kind; handy in tests and filters.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter().filter(move |d| d.kind == kind)
    }

    pub fn extend(&mut self, other: Diagnostics) {
        for d in other.messages {
            self.push(d);
        }
    }

    /// Moves buffered diagnostics in. Used when a speculative parse commits.
    pub fn merge_buffered(&mut self, buffered: Vec<Diagnostic>) {
        for d in buffered {
            self.push(d);
        }
    }

    fn push(&mut self, mut diagnostic: Diagnostic) {
        match self.policy.get(&diagnostic.kind) {
            Some(Policy::Suppressed) => return,
            Some(Policy::Severity(sev)) => diagnostic.severity = *sev,
            None => {}
        }
        let key = (
            diagnostic.kind,
            diagnostic.span.source,
            diagnostic.span.range.start(),
        );
        if self.seen.insert(key) {
            self.messages.push(diagnostic);
        }
    }
}

impl<'a> DiagnosticBuilder<'a> {
    /// Attach a format argument; substituted into the template in order.
    pub fn arg(mut self, arg: impl std::fmt::Display) -> Self {
        self.diagnostic.args.push(arg.to_string());
        self
    }

    pub fn note(mut self, span: Option<FileSpan>, message: impl Into<String>) -> Self {
        self.diagnostic.notes.push(Note {
            span,
            message: message.into(),
        });
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.diagnostic.severity = severity;
        self
    }

    pub fn emit(self) {
        self.sink.push(self.diagnostic);
    }

    /// Finish without emitting into the sink; used by speculative buffers.
    pub fn build(self) -> Diagnostic {
        self.diagnostic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceId;
    use rowan::TextRange;

    fn span() -> FileSpan {
        FileSpan::new(SourceId::default(), TextRange::new(0.into(), 4.into()))
    }

    #[test]
    fn message_substitutes_args() {
        let mut diags = Diagnostics::new();
        diags
            .report(DiagnosticKind::UndeclaredIdentifier, span())
            .arg("foo")
            .emit();
        assert_eq!(
            diags.iter().next().unwrap().message(),
            "use of undeclared identifier 'foo'"
        );
    }

    #[test]
    fn dedup_by_kind_and_location() {
        let mut diags = Diagnostics::new();
        for _ in 0..3 {
            diags
                .report(DiagnosticKind::UnknownDirective, span())
                .arg("bogus")
                .emit();
        }
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn suppression_drops_and_override_rewrites() {
        let mut diags = Diagnostics::new();
        diags.suppress(DiagnosticKind::SkippedTokens);
        diags.set_severity(DiagnosticKind::MacroRedefinition, Severity::Error);

        diags.report(DiagnosticKind::SkippedTokens, span()).emit();
        diags
            .report(DiagnosticKind::MacroRedefinition, span())
            .arg("M")
            .emit();

        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().unwrap().severity, Severity::Error);
        assert!(diags.has_errors());
    }

    #[test]
    fn notes_preserve_order() {
        let mut diags = Diagnostics::new();
        diags
            .report(DiagnosticKind::DuplicateDefinition, span())
            .arg("x")
            .note(Some(span()), "previous declaration is here")
            .note(None, "rename one of them")
            .emit();
        let d = diags.iter().next().unwrap();
        assert_eq!(d.notes.len(), 2);
        assert_eq!(d.notes[0].message, "previous declaration is here");
    }
}
