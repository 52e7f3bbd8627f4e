//! Assertion declarations: `sequence`, `property`, and `let`, with their
//! assertion port lists.

use svlang_core::diagnostics::DiagnosticKind;
use svlang_syntax::ast;
use svlang_syntax::cst::SyntaxKind;

use crate::symbol::{
    AssertionPortType, DeclaredType, Direction, SymbolId, SymbolKind,
};
use crate::Compilation;

use super::BindCtx;

/// Which declaration family an assertion port list belongs to; the local
/// direction rules differ between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssertionContext {
    Sequence,
    Property,
    Let,
}

impl AssertionContext {
    fn keyword(self) -> &'static str {
        match self {
            AssertionContext::Sequence => "sequence",
            AssertionContext::Property => "property",
            AssertionContext::Let => "let",
        }
    }
}

impl Compilation {
    pub(crate) fn bind_sequence_decl(&mut self, ctx: BindCtx, decl: &ast::SequenceDecl) {
        let name = self.token_name(decl.name());
        let span = self.span_of(ctx.tree, decl.syntax());
        let (symbol, scope) =
            self.new_scope_member(ctx, name, span, SymbolKind::SequenceDecl, false);
        let inner = BindCtx {
            tree: ctx.tree,
            scope_owner: symbol,
            scope,
            procedural: false,
        };
        self.bind_assertion_ports(inner, decl.ports().collect(), AssertionContext::Sequence);
    }

    pub(crate) fn bind_property_decl(&mut self, ctx: BindCtx, decl: &ast::PropertyDecl) {
        let name = self.token_name(decl.name());
        let span = self.span_of(ctx.tree, decl.syntax());
        let (symbol, scope) =
            self.new_scope_member(ctx, name, span, SymbolKind::PropertyDecl, false);
        let inner = BindCtx {
            tree: ctx.tree,
            scope_owner: symbol,
            scope,
            procedural: false,
        };
        self.bind_assertion_ports(inner, decl.ports().collect(), AssertionContext::Property);
    }

    pub(crate) fn bind_let_decl(&mut self, ctx: BindCtx, decl: &ast::LetDecl) {
        let name = self.token_name(decl.name());
        let span = self.span_of(ctx.tree, decl.syntax());
        let body = decl.body().map(|e| e.syntax().clone());
        let (symbol, scope) =
            self.new_scope_member(ctx, name, span, SymbolKind::LetDecl { body }, false);
        let inner = BindCtx {
            tree: ctx.tree,
            scope_owner: symbol,
            scope,
            procedural: false,
        };
        self.bind_assertion_ports(inner, decl.ports().collect(), AssertionContext::Let);
    }

    fn bind_assertion_ports(
        &mut self,
        ctx: BindCtx,
        ports: Vec<ast::AssertionPort>,
        context: AssertionContext,
    ) {
        let mut previous: Option<(AssertionPortType, Option<SymbolId>)> = None;
        for port in ports {
            previous = Some(self.bind_assertion_port(ctx, &port, context, previous));
        }
    }

    /// One assertion port. Defaults to `untyped`; a bare name inherits the
    /// previous port's type; `local` carries a direction with per-context
    /// legality rules.
    fn bind_assertion_port(
        &mut self,
        ctx: BindCtx,
        port: &ast::AssertionPort,
        context: AssertionContext,
        previous: Option<(AssertionPortType, Option<SymbolId>)>,
    ) -> (AssertionPortType, Option<SymbolId>) {
        let name = self.token_name(port.name());
        let span = self.span_of(ctx.tree, port.syntax());
        let is_local = port.is_local();
        let direction = port
            .direction()
            .and_then(|t| Direction::from_token(t.kind()))
            .or(is_local.then_some(Direction::In));

        // Local direction legality: sequences take only `in`; properties
        // reject `out`/`inout` as well.
        if is_local
            && let Some(dir) = direction
            && dir != Direction::In
            && matches!(
                context,
                AssertionContext::Sequence | AssertionContext::Property
            )
            && let Some(span) = span
        {
            self.diagnostics_mut()
                .report(DiagnosticKind::AssertionPortDirection, span)
                .arg(dir.keyword())
                .arg(context.keyword())
                .emit();
        }

        let keyword_type = port.keyword_type().map(|t| t.kind());
        let explicit_data_type = port.port_type().and_then(|t| match &t {
            ast::DataType::Implicit(i) if i.is_empty() => None,
            other => Some(other.syntax().clone()),
        });

        let (port_type, declared) = match (keyword_type, &explicit_data_type) {
            (Some(SyntaxKind::KwSequence), _) => (AssertionPortType::Sequence, None),
            (Some(SyntaxKind::KwProperty), _) => (AssertionPortType::Property, None),
            (Some(SyntaxKind::KwEvent), _) => (AssertionPortType::Event, None),
            (Some(SyntaxKind::KwUntyped), _) => (AssertionPortType::Untyped, None),
            (None, Some(syntax)) => {
                let mut declared = DeclaredType::from_syntax(ctx.tree, Some(syntax.clone()));
                if is_local && context == AssertionContext::Sequence {
                    declared.flags.requires_sequence_type = true;
                }
                (AssertionPortType::Data, Some(declared))
            }
            // Only a name: inherit the previous port's type.
            (None, None) => match &previous {
                Some((prev_type, prev_symbol)) => {
                    let declared = (*prev_type == AssertionPortType::Data)
                        .then_some(*prev_symbol)
                        .flatten()
                        .map(|target| {
                            let mut d = DeclaredType::linked(ctx.tree, target);
                            if is_local && context == AssertionContext::Sequence {
                                d.flags.requires_sequence_type = true;
                            }
                            d
                        });
                    (*prev_type, declared)
                }
                None => (AssertionPortType::Untyped, None),
            },
            _ => (AssertionPortType::Untyped, None),
        };

        let default = port.default_value().and_then(|i| i.expr()).map(|e| e.syntax().clone());
        if default.is_some()
            && is_local
            && matches!(direction, Some(Direction::Out) | Some(Direction::InOut))
            && let Some(span) = span
        {
            self.diagnostics_mut()
                .report(DiagnosticKind::AssertionPortOutputDefault, span)
                .emit();
        }

        let symbol = self.new_member(
            ctx,
            name,
            span,
            SymbolKind::AssertionPort {
                port_type,
                declared,
                is_local,
                direction,
                default,
            },
        );
        (port_type, Some(symbol))
    }
}
