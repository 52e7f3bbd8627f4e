//! User-defined primitive elaboration.
//!
//! Port-list coverage and the combinational/sequential split both resolve
//! here: exactly one output, first in the list; `output reg` (or a body
//! `reg` declaration naming the output) makes the primitive sequential; an
//! `initial` row is only legal on sequential primitives, must target the
//! output, and must assign 0, 1, or 1'bx.

use svlang_core::diagnostics::DiagnosticKind;
use svlang_core::intern::Name;
use svlang_syntax::ast;
use svlang_syntax::cst::SyntaxKind;

use crate::symbol::{SymbolKind, UdpInfo};
use crate::value::SvInt;
use crate::Compilation;

use super::BindCtx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UdpDirection {
    Input,
    Output,
}

impl Compilation {
    pub(crate) fn bind_udp(&mut self, ctx: BindCtx, decl: &ast::UdpDecl) {
        let name = self.token_name(decl.name());
        let span = self.span_of(ctx.tree, decl.syntax());

        let Some(port_list) = decl.port_list() else {
            self.new_member(
                ctx,
                name,
                span,
                SymbolKind::Primitive {
                    info: UdpInfo {
                        ports: Vec::new(),
                        is_sequential: false,
                        initial_value: None,
                    },
                },
            );
            return;
        };

        if port_list.is_wildcard() {
            if let Some(span) = span {
                self.diagnostics_mut()
                    .report(DiagnosticKind::UnsupportedUdpPortList, span)
                    .emit();
            }
            self.new_member(
                ctx,
                name,
                span,
                SymbolKind::Primitive {
                    info: UdpInfo {
                        ports: Vec::new(),
                        is_sequential: false,
                        initial_value: None,
                    },
                },
            );
            return;
        }

        let ansi_decls: Vec<_> = port_list.ansi_decls().collect();
        let info = if !ansi_decls.is_empty() {
            self.bind_udp_ansi(span, &ansi_decls)
        } else {
            let names: Vec<_> = port_list.names().collect();
            self.bind_udp_non_ansi(ctx, span, decl, &names)
        };

        let info = self.check_udp_initial(ctx, decl, info);
        self.new_member(ctx, name, span, SymbolKind::Primitive { info });
    }

    fn bind_udp_ansi(
        &mut self,
        span: Option<svlang_core::source::FileSpan>,
        decls: &[ast::UdpPortDecl],
    ) -> UdpInfo {
        let mut ports = Vec::new();
        let mut outputs = 0usize;
        let mut output_first = false;
        let mut is_sequential = false;

        for (index, decl) in decls.iter().enumerate() {
            let direction = match decl.direction().map(|t| t.kind()) {
                Some(SyntaxKind::KwOutput) => UdpDirection::Output,
                _ => UdpDirection::Input,
            };
            for token in decl.names() {
                ports.push(self.intern(token.text()));
            }
            if direction == UdpDirection::Output {
                outputs += 1;
                if index == 0 {
                    output_first = true;
                }
                if decl.is_reg() {
                    is_sequential = true;
                }
            }
        }

        self.check_output_shape(span, outputs, output_first);
        UdpInfo {
            ports,
            is_sequential,
            initial_value: None,
        }
    }

    fn bind_udp_non_ansi(
        &mut self,
        ctx: BindCtx,
        span: Option<svlang_core::source::FileSpan>,
        decl: &ast::UdpDecl,
        names: &[ast::NonAnsiPort],
    ) -> UdpInfo {
        let ports: Vec<Name> = names
            .iter()
            .filter_map(|p| p.name())
            .map(|t| self.intern(t.text()))
            .collect();

        // Walk the body's port declarations and check coverage.
        let mut directions: Vec<(Name, UdpDirection)> = Vec::new();
        let mut output_name: Option<Name> = None;
        let mut is_sequential = false;

        let body_decls: Vec<_> = decl
            .body()
            .map(|b| b.port_decls().collect())
            .unwrap_or_default();
        for port_decl in &body_decls {
            let direction = port_decl.direction().map(|t| t.kind());
            let decl_span = self.span_of(ctx.tree, port_decl.syntax());
            let decl_names: Vec<(Name, String)> = port_decl
                .names()
                .map(|t| (self.intern(t.text()), t.text().to_string()))
                .collect();

            match direction {
                Some(SyntaxKind::KwOutput) => {
                    for (name, text) in &decl_names {
                        if directions.iter().any(|(n, _)| n == name) {
                            self.report_udp_dup(decl_span, text);
                            continue;
                        }
                        directions.push((*name, UdpDirection::Output));
                        output_name = output_name.or(Some(*name));
                        if port_decl.is_reg() {
                            is_sequential = true;
                        }
                    }
                }
                Some(SyntaxKind::KwInput) => {
                    for (name, text) in &decl_names {
                        if directions.iter().any(|(n, _)| n == name) {
                            self.report_udp_dup(decl_span, text);
                            continue;
                        }
                        directions.push((*name, UdpDirection::Input));
                    }
                }
                // Standalone `reg q;` must name the output.
                _ if port_decl.is_reg() => {
                    for (name, text) in &decl_names {
                        if Some(*name) != output_name
                            && !directions
                                .iter()
                                .any(|(n, d)| n == name && *d == UdpDirection::Output)
                        {
                            if let Some(decl_span) = decl_span {
                                self.diagnostics_mut()
                                    .report(DiagnosticKind::PrimitiveRegNotOutput, decl_span)
                                    .arg(text)
                                    .emit();
                            }
                        } else {
                            is_sequential = true;
                        }
                    }
                }
                _ => {}
            }
        }

        // Every listed port needs a body declaration.
        for name in &ports {
            if !directions.iter().any(|(n, _)| n == name) {
                let text = self.names.resolve(*name).to_string();
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::PrimitivePortMissing, span)
                        .arg(text)
                        .emit();
                }
            }
        }

        let outputs = directions
            .iter()
            .filter(|(_, d)| *d == UdpDirection::Output)
            .count();
        let output_first = match (ports.first(), output_name) {
            (Some(first), Some(output)) => *first == output,
            _ => false,
        };
        self.check_output_shape(span, outputs, output_first);

        UdpInfo {
            ports,
            is_sequential,
            initial_value: None,
        }
    }

    fn check_output_shape(
        &mut self,
        span: Option<svlang_core::source::FileSpan>,
        outputs: usize,
        output_first: bool,
    ) {
        if outputs != 1 {
            if let Some(span) = span {
                self.diagnostics_mut()
                    .report(DiagnosticKind::PrimitiveWrongOutputCount, span)
                    .emit();
            }
        } else if !output_first
            && let Some(span) = span
        {
            self.diagnostics_mut()
                .report(DiagnosticKind::PrimitiveOutputFirst, span)
                .emit();
        }
    }

    fn report_udp_dup(&mut self, span: Option<svlang_core::source::FileSpan>, text: &str) {
        if let Some(span) = span {
            self.diagnostics_mut()
                .report(DiagnosticKind::PrimitivePortDup, span)
                .arg(text)
                .emit();
        }
    }

    /// Validates the `initial` row and stores its value.
    fn check_udp_initial(&mut self, ctx: BindCtx, decl: &ast::UdpDecl, mut info: UdpInfo) -> UdpInfo {
        let Some(initial) = decl.body().and_then(|b| b.initial()) else {
            return info;
        };
        let span = self.span_of(ctx.tree, initial.syntax());

        if !info.is_sequential {
            if let Some(span) = span {
                self.diagnostics_mut()
                    .report(DiagnosticKind::PrimitiveInitialInCombinational, span)
                    .emit();
            }
            return info;
        }

        // The target must be the output port (the first in the list).
        let target_ok = match initial.target() {
            Some(ast::Expr::NameRef(name)) => {
                let target = self.intern(&name.text());
                info.ports.first() == Some(&target)
            }
            _ => false,
        };
        if !target_ok {
            if let Some(span) = span {
                self.diagnostics_mut()
                    .report(DiagnosticKind::PrimitiveInitialTarget, span)
                    .emit();
            }
            return info;
        }

        let value = initial.value().and_then(|expr| match expr {
            ast::Expr::Literal(lit) => crate::eval::literal_value(&lit),
            _ => None,
        });
        let value = value.and_then(|v| v.as_int()).filter(valid_udp_init);
        match value {
            Some(v) => info.initial_value = Some(v),
            None => {
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::PrimitiveInitVal, span)
                        .emit();
                }
            }
        }
        info
    }
}

/// `0`, `1`, or a one-bit x.
fn valid_udp_init(value: &SvInt) -> bool {
    if value.xz != 0 {
        // x has the xz bit set with a zero value bit; z is rejected.
        return value.xz == 1 && value.value == 0;
    }
    value.value <= 1
}
