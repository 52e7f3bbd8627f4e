//! Clocking block elaboration: default skews and clocking variables.

use svlang_core::diagnostics::DiagnosticKind;
use svlang_syntax::ast;
use svlang_syntax::cst::SyntaxKind;

use crate::symbol::{
    DeclaredType, Direction, EdgeKind, LookupLocation, SkewInfo, SymbolKind,
};
use crate::types::Type;
use crate::value::ConstValue;
use crate::{Compilation, LookupFlags};

use super::BindCtx;

impl Compilation {
    pub(crate) fn bind_clocking_decl(&mut self, ctx: BindCtx, decl: &ast::ClockingDecl) {
        let name = self.token_name(decl.name());
        let span = self.span_of(ctx.tree, decl.syntax());
        let (block, scope) = self.new_scope_member(
            ctx,
            name,
            span,
            SymbolKind::ClockingBlock {
                default_input_skew: None,
                default_output_skew: None,
            },
            false,
        );
        let inner = BindCtx {
            tree: ctx.tree,
            scope_owner: block,
            scope,
            procedural: false,
        };

        let defaults: Vec<_> = decl.default_skew_items().collect();
        for item in defaults {
            self.bind_default_skew(ctx, block, &item);
        }

        let items: Vec<_> = decl.items().collect();
        for item in items {
            self.bind_clocking_item(ctx, inner, &item);
        }
    }

    /// `default input #1 output #2;` with at most one default per direction.
    fn bind_default_skew(&mut self, ctx: BindCtx, block: crate::SymbolId, item: &ast::DefaultSkewItem) {
        let span = self.span_of(ctx.tree, item.syntax());
        for (direction, skew) in item.skews() {
            let info = skew
                .map(|s| self.resolve_skew(ctx, &s))
                .unwrap_or(SkewInfo {
                    edge: None,
                    delay: None,
                });
            let is_input = direction == SyntaxKind::KwInput;
            let occupied = match &self.symbol(block).kind {
                SymbolKind::ClockingBlock {
                    default_input_skew,
                    default_output_skew,
                } => {
                    if is_input {
                        default_input_skew.is_some()
                    } else {
                        default_output_skew.is_some()
                    }
                }
                _ => return,
            };

            if occupied {
                let kind = if is_input {
                    DiagnosticKind::MultipleDefaultInputSkew
                } else {
                    DiagnosticKind::MultipleDefaultOutputSkew
                };
                if let Some(span) = span {
                    self.diagnostics_mut().report(kind, span).emit();
                }
            } else if let SymbolKind::ClockingBlock {
                default_input_skew,
                default_output_skew,
            } = &mut self.symbol_mut(block).kind
            {
                if is_input {
                    *default_input_skew = Some(info);
                } else {
                    *default_output_skew = Some(info);
                }
            }
        }
    }

    fn bind_clocking_item(&mut self, outer: BindCtx, inner: BindCtx, item: &ast::ClockingItem) {
        let directions: Vec<_> = item.directions().map(|t| t.kind()).collect();
        let direction = match directions.as_slice() {
            [SyntaxKind::KwInout] => Direction::InOut,
            [SyntaxKind::KwInput] => Direction::In,
            [SyntaxKind::KwOutput] => Direction::Out,
            // `input ... output ...` on one item behaves as inout.
            _ if directions.len() >= 2 => Direction::InOut,
            _ => Direction::In,
        };

        let skews: Vec<_> = item.skews().collect();
        let resolved: Vec<SkewInfo> = skews.iter().map(|s| self.resolve_skew(outer, s)).collect();
        let (input_skew, output_skew) = match direction {
            Direction::In => (resolved.first().copied(), None),
            Direction::Out => (None, resolved.first().copied()),
            _ => (resolved.first().copied(), resolved.get(1).copied()),
        };

        let assigns: Vec<_> = item.assigns().collect();
        for assign in assigns {
            self.bind_clocking_var(outer, inner, direction, input_skew, output_skew, &assign);
        }
    }

    /// One clocking variable. With an initializer its type comes from the
    /// expression; otherwise it links to the referenced signal in the parent
    /// scope, which outputs must be able to drive.
    fn bind_clocking_var(
        &mut self,
        outer: BindCtx,
        inner: BindCtx,
        direction: Direction,
        input_skew: Option<SkewInfo>,
        output_skew: Option<SkewInfo>,
        assign: &ast::ClockingDeclAssign,
    ) {
        let Some(token) = assign.name() else { return };
        let text = token.text().to_string();
        let name = self.intern(&text);
        let span = self.span_of(outer.tree, assign.syntax());
        let initializer = assign.init().and_then(|i| i.expr());

        let declared = if let Some(init) = &initializer {
            // The initializer's type becomes the variable's type.
            let at = LookupLocation::ANYWHERE;
            let value = self.eval_expr_in(outer.scope_owner, at, outer.tree, init);
            let ty = match value {
                Some(ConstValue::Int(_)) | None => self.types_mut().int(),
                Some(ConstValue::Real(_)) => {
                    self.types_mut().intern(Type::Real(crate::RealKind::Real))
                }
                Some(ConstValue::Str(_)) => self.types_mut().intern(Type::String),
            };
            DeclaredType::resolved(outer.tree, ty)
        } else {
            let signal = self.lookup(
                outer.scope_owner,
                name,
                LookupLocation::ANYWHERE,
                LookupFlags {
                    allow_declared_after: true,
                    no_parent: false,
                },
            );
            match signal {
                Some(signal) => {
                    let assignable = matches!(
                        self.symbol(signal).kind,
                        SymbolKind::Variable { .. } | SymbolKind::Net { .. }
                    );
                    if !assignable {
                        if let Some(span) = span {
                            self.diagnostics_mut()
                                .report(DiagnosticKind::InvalidClockingSignal, span)
                                .arg(&text)
                                .emit();
                        }
                        DeclaredType::from_syntax(outer.tree, None)
                    } else {
                        if matches!(direction, Direction::Out | Direction::InOut) {
                            self.register_clocking_driver(signal, inner.scope_owner);
                        }
                        DeclaredType::linked(outer.tree, signal)
                    }
                }
                None => {
                    if let Some(span) = span {
                        self.diagnostics_mut()
                            .report(DiagnosticKind::InvalidClockingSignal, span)
                            .arg(&text)
                            .emit();
                    }
                    DeclaredType::from_syntax(outer.tree, None)
                }
            }
        };

        self.new_member(
            inner,
            name,
            span,
            SymbolKind::ClockingVar {
                direction,
                input_skew,
                output_skew,
                declared,
                initializer: initializer.map(|e| e.syntax().clone()),
            },
        );
    }

    fn register_clocking_driver(&mut self, signal: crate::SymbolId, driver: crate::SymbolId) {
        self.add_driver(signal, driver);
    }

    fn resolve_skew(&mut self, ctx: BindCtx, skew: &ast::ClockingSkew) -> SkewInfo {
        let edge = skew.edge().map(|t| match t.kind() {
            SyntaxKind::KwPosedge => EdgeKind::Posedge,
            SyntaxKind::KwNegedge => EdgeKind::Negedge,
            _ => EdgeKind::Edge,
        });
        let delay = skew
            .delay()
            .and_then(|d| d.expr())
            .and_then(|e| {
                let at = LookupLocation::ANYWHERE;
                self.eval_expr_in(ctx.scope_owner, at, ctx.tree, &e)
            })
            .and_then(|v| v.as_int());
        SkewInfo { edge, delay }
    }
}
