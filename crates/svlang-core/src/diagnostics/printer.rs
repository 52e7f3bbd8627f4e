//! Builder-pattern printer for rendering diagnostics against their buffers.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};
use rowan::TextRange;

use super::{Diagnostics, Severity};
use crate::source::SourceManager;

/// Renders a diagnostic collection. The source manager supplies text and
/// display names for every buffer a diagnostic may point into.
pub struct DiagnosticsPrinter<'a> {
    diagnostics: &'a Diagnostics,
    sources: &'a SourceManager,
    colored: bool,
}

impl<'a> DiagnosticsPrinter<'a> {
    pub fn new(diagnostics: &'a Diagnostics, sources: &'a SourceManager) -> Self {
        Self {
            diagnostics,
            sources,
            colored: false,
        }
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        if self.diagnostics.is_empty() {
            return Ok(());
        }

        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (i, diag) in self.diagnostics.iter().enumerate() {
            let source = self.sources.text(diag.span.source);
            let path = self.sources.name(diag.span.source);
            let message = diag.message();

            let mut snippet = Snippet::source(source).line_start(1).path(path).annotation(
                AnnotationKind::Primary
                    .span(adjust_range(diag.span.range, source.len()))
                    .label(&message),
            );

            for note in &diag.notes {
                if let Some(span) = note.span
                    && span.source == diag.span.source
                {
                    snippet = snippet.annotation(
                        AnnotationKind::Context
                            .span(adjust_range(span.range, source.len()))
                            .label(&note.message),
                    );
                }
            }

            let level = severity_to_level(diag.severity);
            let title = format!("{} [{}]", message, diag.kind.code());
            let mut report: Vec<Group> = vec![level.primary_title(&title).element(snippet)];

            // Notes pointing into other buffers get their own snippet group.
            for note in &diag.notes {
                match note.span {
                    Some(span) if span.source != diag.span.source => {
                        let other = self.sources.text(span.source);
                        report.push(
                            Level::NOTE.secondary_title(&note.message).element(
                                Snippet::source(other)
                                    .line_start(1)
                                    .path(self.sources.name(span.source))
                                    .annotation(
                                        AnnotationKind::Context
                                            .span(adjust_range(span.range, other.len())),
                                    ),
                            ),
                        );
                    }
                    None => report.push(Group::with_title(Level::NOTE.secondary_title(&note.message))),
                    _ => {}
                }
            }

            if i > 0 {
                w.write_char('\n')?;
            }
            write!(w, "{}", renderer.render(&report))?;
        }

        Ok(())
    }
}

fn severity_to_level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Note => Level::NOTE,
        Severity::Warning => Level::WARNING,
        Severity::Error | Severity::Fatal => Level::ERROR,
    }
}

fn adjust_range(range: TextRange, limit: usize) -> std::ops::Range<usize> {
    let start: usize = range.start().into();
    let end: usize = range.end().into();
    let start = start.min(limit);
    let end = end.min(limit);

    if start == end {
        return start..(start + 1).min(limit);
    }

    start..end
}

impl Diagnostics {
    pub fn printer<'a>(&'a self, sources: &'a SourceManager) -> DiagnosticsPrinter<'a> {
        DiagnosticsPrinter::new(self, sources)
    }
}

#[cfg(test)]
mod tests {
    use super::super::DiagnosticKind;
    use crate::source::{FileSpan, SourceManager};
    use rowan::TextRange;

    #[test]
    fn render_points_at_the_offending_text() {
        let mut sm = SourceManager::new();
        let id = sm.add_buffer("top.sv", "module m;\n  wire bogus&;\nendmodule\n");
        let mut diags = crate::Diagnostics::new();
        diags
            .report(
                DiagnosticKind::UnknownToken,
                FileSpan::new(id, TextRange::new(22.into(), 23.into())),
            )
            .arg("&")
            .emit();

        let rendered = diags.printer(&sm).render();
        assert!(rendered.contains("unknown character '&'"));
        assert!(rendered.contains("top.sv"));
        assert!(rendered.contains("[UnknownToken]"));
    }
}
