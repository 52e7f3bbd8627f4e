//! Randsequence production elaboration.
//!
//! Each production becomes a scope symbol holding its formals; rules are
//! checked for resolvable production references, argument counts, and
//! integral weight expressions.

use svlang_core::diagnostics::DiagnosticKind;
use svlang_core::intern::Name;
use svlang_syntax::ast;
use svlang_syntax::cst::SyntaxKind;

use crate::symbol::{DeclaredType, LookupLocation, SymbolId, SymbolKind};
use crate::value::ConstValue;
use crate::Compilation;

use super::BindCtx;

impl Compilation {
    pub(crate) fn bind_randsequence(&mut self, ctx: BindCtx, stmt: &ast::RandsequenceStatement) {
        let productions: Vec<_> = stmt.productions().collect();

        // First pass: declare every production so rules can reference
        // later ones.
        let mut bound: Vec<(Name, SymbolId, usize, ast::RsProduction)> = Vec::new();
        for production in productions {
            let name = self.token_name(production.name());
            let span = self.span_of(ctx.tree, production.syntax());
            let return_type = DeclaredType::from_syntax(
                ctx.tree,
                production.return_type().map(|t| t.syntax().clone()),
            );
            let (symbol, scope) = self.new_scope_member(
                ctx,
                name,
                span,
                SymbolKind::RsProduction { return_type },
                true,
            );
            let inner = BindCtx {
                tree: ctx.tree,
                scope_owner: symbol,
                scope,
                procedural: true,
            };
            let ports: Vec<_> = production.tf_ports().collect();
            let arity = ports.len();
            let mut previous = None;
            for port in &ports {
                previous = Some(self.bind_tf_port(inner, port, previous));
            }
            bound.push((name, symbol, arity, production));
        }

        // Second pass: check the rules of each production.
        for (_, symbol, _, production) in &bound {
            let rules: Vec<_> = production.rules().collect();
            for rule in rules {
                self.check_rs_rule(ctx, *symbol, &rule, &bound);
            }
        }
    }

    fn check_rs_rule(
        &mut self,
        ctx: BindCtx,
        production: SymbolId,
        rule: &ast::RsRule,
        bound: &[(Name, SymbolId, usize, ast::RsProduction)],
    ) {
        // Weights must be integral constants when they are constant at all.
        if let Some(weight) = rule.weight()
            && let Some(expr) = weight.expr()
        {
            let at = LookupLocation::ANYWHERE;
            let value = self.eval_expr_in(production, at, ctx.tree, &expr);
            if let Some(ConstValue::Real(_)) | Some(ConstValue::Str(_)) = value {
                if let Some(span) = self.span_of(ctx.tree, weight.syntax()) {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::ExpressionNotConstant, span)
                        .emit();
                }
            }
        }

        let items: Vec<_> = rule.items().collect();
        for item in items {
            match item.kind() {
                SyntaxKind::RsProdItem => {
                    if let Some(prod_item) = ast::RsProdItem::cast(item.clone()) {
                        self.check_rs_prod_item(ctx, &prod_item, bound);
                    }
                }
                SyntaxKind::RsIfElse => {
                    let refs: Vec<_> = item
                        .children()
                        .filter_map(ast::RsProdItem::cast)
                        .collect();
                    for prod_item in refs {
                        self.check_rs_prod_item(ctx, &prod_item, bound);
                    }
                }
                SyntaxKind::RsRepeat | SyntaxKind::RsCase => {
                    let refs: Vec<_> = item
                        .descendants()
                        .filter_map(ast::RsProdItem::cast)
                        .collect();
                    for prod_item in refs {
                        self.check_rs_prod_item(ctx, &prod_item, bound);
                    }
                }
                _ => {}
            }
        }
    }

    /// A production reference: the name must be a production of this
    /// randsequence and the bound argument count must match its formals.
    fn check_rs_prod_item(
        &mut self,
        ctx: BindCtx,
        item: &ast::RsProdItem,
        bound: &[(Name, SymbolId, usize, ast::RsProduction)],
    ) {
        let Some(token) = item.name() else { return };
        let text = token.text().to_string();
        let name = self.intern(&text);
        let span = self.span_of(ctx.tree, item.syntax());

        let Some((_, _, arity, _)) = bound.iter().find(|(n, _, _, _)| *n == name) else {
            if let Some(span) = span {
                self.diagnostics_mut()
                    .report(DiagnosticKind::UndeclaredIdentifier, span)
                    .arg(&text)
                    .emit();
            }
            return;
        };

        let supplied = item
            .args()
            .map(|args| args.ordered().count() + args.named().count())
            .unwrap_or(0);
        if supplied != *arity && supplied > 0 {
            if let Some(span) = span {
                self.diagnostics_mut()
                    .report(DiagnosticKind::WrongNumberArgs, span)
                    .arg(arity)
                    .arg(supplied)
                    .emit();
            }
        }
    }
}
