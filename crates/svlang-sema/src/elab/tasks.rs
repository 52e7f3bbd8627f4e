//! Elaboration system tasks: `$fatal`, `$error`, `$warning`, `$info`, and
//! `$static_assert`.
//!
//! These run during scope binding. Messages format `$display`-style from
//! constant-evaluated arguments; a passing static assert is silent.

use svlang_core::diagnostics::DiagnosticKind;
use svlang_core::Severity;
use svlang_syntax::ast;

use crate::symbol::{ElabTaskKind, LookupLocation, SymbolKind};
use crate::value::{format_message, ConstValue};
use crate::Compilation;

use super::BindCtx;

impl Compilation {
    pub(crate) fn bind_elab_task(&mut self, ctx: BindCtx, task: &ast::ElabSystemTask) {
        let span = self.span_of(ctx.tree, task.syntax());
        let name_text = task
            .name()
            .map(|t| t.text().to_string())
            .unwrap_or_default();

        let Some(kind) = ElabTaskKind::from_name(&name_text) else {
            if let Some(span) = span {
                self.diagnostics_mut()
                    .report(DiagnosticKind::ExpectedMember, span)
                    .emit();
            }
            return;
        };

        let at = LookupLocation(self.decl_counter + 1);
        let mut args: Vec<Option<ConstValue>> = Vec::new();
        if let Some(list) = task.args() {
            let exprs: Vec<_> = list.ordered().filter_map(|a| a.expr()).collect();
            for expr in exprs {
                let value = self.eval_expr_in(ctx.scope_owner, at, ctx.tree, &expr);
                args.push(value);
            }
        }

        match kind {
            ElabTaskKind::StaticAssert => self.run_static_assert(ctx, span, &args),
            ElabTaskKind::Fatal => {
                // The leading argument is a finish number: 0, 1, or 2.
                let mut rest = args.as_slice();
                if let Some(first) = args.first() {
                    let finish_ok = matches!(
                        first.as_ref().and_then(|v| v.as_int()).map(|v| v.as_i64()),
                        Some(0..=2)
                    );
                    if !finish_ok {
                        if let Some(span) = span {
                            self.diagnostics_mut()
                                .report(DiagnosticKind::BadFinishNum, span)
                                .emit();
                        }
                    }
                    rest = &args[1..];
                }
                self.issue_task_message(span, Severity::Fatal, rest);
            }
            ElabTaskKind::Error => self.issue_task_message(span, Severity::Error, &args),
            ElabTaskKind::Warning => self.issue_task_message(span, Severity::Warning, &args),
            ElabTaskKind::Info => self.issue_task_message(span, Severity::Note, &args),
        }

        let name = self.intern("");
        self.new_member(ctx, name, span, SymbolKind::ElabTask { task: kind });
    }

    fn run_static_assert(
        &mut self,
        _ctx: BindCtx,
        span: Option<svlang_core::source::FileSpan>,
        args: &[Option<ConstValue>],
    ) {
        let condition = match args.first() {
            Some(Some(value)) => value.to_bool(),
            _ => None,
        };
        match condition {
            Some(true) => {}
            Some(false) => {
                let detail = self.format_task_args(span, &args[1..]);
                let detail = if detail.is_empty() {
                    detail
                } else {
                    format!(": {detail}")
                };
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::StaticAssert, span)
                        .arg(detail)
                        .emit();
                }
            }
            None => {
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::ExpressionNotConstant, span)
                        .emit();
                }
            }
        }
    }

    fn issue_task_message(
        &mut self,
        span: Option<svlang_core::source::FileSpan>,
        severity: Severity,
        args: &[Option<ConstValue>],
    ) {
        let message = self.format_task_args(span, args);
        if let Some(span) = span {
            self.diagnostics_mut()
                .report(DiagnosticKind::ElabTaskMessage, span)
                .severity(severity)
                .arg(message)
                .emit();
        }
    }

    /// `$display`-style formatting: the first string argument is the
    /// template, everything after feeds its specifiers.
    fn format_task_args(
        &mut self,
        span: Option<svlang_core::source::FileSpan>,
        args: &[Option<ConstValue>],
    ) -> String {
        let mut resolved: Vec<ConstValue> = Vec::new();
        for arg in args {
            match arg {
                Some(value) => resolved.push(value.clone()),
                None => resolved.push(ConstValue::Str(String::new())),
            }
        }
        match resolved.split_first() {
            Some((ConstValue::Str(template), rest)) => {
                let (message, bad) = format_message(template, rest);
                for spec in bad {
                    if let Some(span) = span {
                        self.diagnostics_mut()
                            .report(DiagnosticKind::UnknownFormatSpecifier, span)
                            .arg(spec)
                            .emit();
                    }
                }
                message
            }
            Some((first, rest)) => {
                let mut out = first.to_string();
                for value in rest {
                    out.push(' ');
                    out.push_str(&value.to_string());
                }
                out
            }
            None => String::new(),
        }
    }
}
