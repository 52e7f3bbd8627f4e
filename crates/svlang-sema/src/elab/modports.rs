//! Modport elaboration: named directional views over interface members.

use svlang_core::diagnostics::DiagnosticKind;
use svlang_syntax::ast;

use crate::symbol::{Direction, LookupLocation, SymbolKind};
use crate::{Compilation, LookupFlags};

use super::BindCtx;

impl Compilation {
    pub(crate) fn bind_modport_decl(&mut self, ctx: BindCtx, decl: &ast::ModportDecl) {
        let items: Vec<_> = decl.items().collect();
        for item in items {
            self.bind_modport_item(ctx, &item);
        }
    }

    fn bind_modport_item(&mut self, ctx: BindCtx, item: &ast::ModportItem) {
        let name = self.token_name(item.name());
        let span = self.span_of(ctx.tree, item.syntax());
        let (modport, scope) = self.new_scope_member(ctx, name, span, SymbolKind::Modport, false);
        let inner = BindCtx {
            tree: ctx.tree,
            scope_owner: modport,
            scope,
            procedural: false,
        };

        let lists: Vec<_> = item.simple_port_lists().collect();
        for list in lists {
            let direction = list
                .direction()
                .and_then(|t| Direction::from_token(t.kind()))
                .unwrap_or(Direction::In);

            let named: Vec<_> = list.named_ports().collect();
            for port in named {
                self.bind_modport_named_port(ctx, inner, direction, &port);
            }
            let explicit: Vec<_> = list.explicit_ports().collect();
            for port in explicit {
                let name = self.token_name(port.name());
                let span = self.span_of(ctx.tree, port.syntax());
                self.new_member(
                    inner,
                    name,
                    span,
                    SymbolKind::ModportExplicitPort { direction },
                );
            }
        }

        let sub_lists: Vec<_> = item.subroutine_port_lists().collect();
        for list in sub_lists {
            let is_export = list.is_export();
            let ports: Vec<_> = list.ports().collect();
            for port in ports {
                self.bind_modport_subroutine_port(ctx, inner, is_export, &port);
            }
        }

        let clocking: Vec<_> = item.clocking_ports().collect();
        for port in clocking {
            self.bind_modport_clocking_port(ctx, inner, &port);
        }
    }

    /// A simple named port: the direction applies to a variable or net of
    /// the enclosing interface body.
    fn bind_modport_named_port(
        &mut self,
        outer: BindCtx,
        inner: BindCtx,
        direction: Direction,
        port: &ast::ModportNamedPort,
    ) {
        let Some(token) = port.name() else { return };
        let text = token.text().to_string();
        let name = self.intern(&text);
        let span = self.span_of(outer.tree, port.syntax());

        let internal = self.lookup(
            outer.scope_owner,
            name,
            LookupLocation::ANYWHERE,
            LookupFlags {
                allow_declared_after: true,
                no_parent: false,
            },
        );

        let internal = match internal {
            None => {
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::UndeclaredIdentifier, span)
                        .arg(&text)
                        .emit();
                }
                None
            }
            Some(target) => match &self.symbol(target).kind {
                SymbolKind::Variable { .. } | SymbolKind::Net { .. } => Some(target),
                _ => {
                    if let Some(span) = span {
                        self.diagnostics_mut()
                            .report(DiagnosticKind::BadModportPort, span)
                            .arg(&text)
                            .emit();
                    }
                    None
                }
            },
        };

        self.new_member(
            inner,
            name,
            span,
            SymbolKind::ModportPort {
                direction,
                internal,
            },
        );
    }

    /// `import f` / `export task t(...)`: the target must be a subroutine.
    fn bind_modport_subroutine_port(
        &mut self,
        outer: BindCtx,
        inner: BindCtx,
        is_export: bool,
        port: &ast::ModportSubroutinePort,
    ) {
        let Some(token) = port.name() else { return };
        let text = token.text().to_string();
        let name = self.intern(&text);
        let span = self.span_of(outer.tree, port.syntax());

        let target = self.lookup(
            outer.scope_owner,
            name,
            LookupLocation::ANYWHERE,
            LookupFlags {
                allow_declared_after: true,
                no_parent: false,
            },
        );

        let target = match target {
            Some(found) if matches!(self.symbol(found).kind, SymbolKind::Subroutine { .. }) => {
                Some(found)
            }
            // A prototype declares the subroutine as part of the modport.
            _ if port.is_prototype() => None,
            Some(_) => {
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::NotASubroutine, span)
                        .arg(&text)
                        .emit();
                }
                None
            }
            None => {
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::UndeclaredIdentifier, span)
                        .arg(&text)
                        .emit();
                }
                None
            }
        };

        self.new_member(
            inner,
            name,
            span,
            SymbolKind::ModportSubroutinePort { is_export, target },
        );
    }

    fn bind_modport_clocking_port(
        &mut self,
        outer: BindCtx,
        inner: BindCtx,
        port: &ast::ModportClockingPort,
    ) {
        let Some(token) = port.name() else { return };
        let text = token.text().to_string();
        let name = self.intern(&text);
        let span = self.span_of(outer.tree, port.syntax());

        let clocking = self.lookup(
            outer.scope_owner,
            name,
            LookupLocation::ANYWHERE,
            LookupFlags {
                allow_declared_after: true,
                no_parent: false,
            },
        );
        let clocking = match clocking {
            Some(found)
                if matches!(self.symbol(found).kind, SymbolKind::ClockingBlock { .. }) =>
            {
                Some(found)
            }
            _ => {
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::UnknownClockingBlock, span)
                        .arg(&text)
                        .emit();
                }
                None
            }
        };

        self.new_member(
            inner,
            name,
            span,
            SymbolKind::ModportClockingPort { clocking },
        );
    }
}
