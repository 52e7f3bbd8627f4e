//! Macro table entries and replacement-list construction.

use svlang_core::source::{FileSpan, SourceManager};

use crate::cst::SyntaxKind;
use crate::token::Token;

/// One formal parameter of a function-like macro.
#[derive(Debug, Clone)]
pub struct MacroParam {
    pub name: String,
    pub default: Option<Vec<Token>>,
}

/// A macro definition. Object-like macros have `params == None`.
#[derive(Debug, Clone)]
pub struct MacroDef {
    pub name: String,
    pub name_span: FileSpan,
    pub params: Option<Vec<MacroParam>>,
    /// Replacement tokens, including interior trivia for spacing.
    pub body: Vec<Token>,
    /// `__FILE__` / `__LINE__`; expanded specially and never redefinable.
    pub builtin: bool,
}

impl MacroDef {
    /// Whether two definitions would mean the same thing. Used for the
    /// redefinition check: trivia differences don't count, token text does.
    pub fn same_as(&self, other: &MacroDef, sources: &SourceManager) -> bool {
        let params_match = match (&self.params, &other.params) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| {
                        x.name == y.name
                            && match (&x.default, &y.default) {
                                (None, None) => true,
                                (Some(dx), Some(dy)) => same_tokens(dx, dy, sources),
                                _ => false,
                            }
                    })
            }
            _ => false,
        };
        params_match && same_tokens(&self.body, &other.body, sources)
    }
}

fn same_tokens(a: &[Token], b: &[Token], sources: &SourceManager) -> bool {
    let a = a.iter().filter(|t| !t.is_trivia());
    let mut b = b.iter().filter(|t| !t.is_trivia());
    for ta in a {
        match b.next() {
            Some(tb) if ta.kind == tb.kind && ta.text(sources) == tb.text(sources) => {}
            _ => return false,
        }
    }
    b.next().is_none()
}

/// Names that can never be defined or undefined by the user.
pub fn is_builtin_name(name: &str) -> bool {
    matches!(name, "__FILE__" | "__LINE__")
}

/// Directive names are not usable as macro names either.
pub fn is_reserved_directive(name: &str) -> bool {
    matches!(
        name,
        "include"
            | "define"
            | "undef"
            | "undefineall"
            | "ifdef"
            | "ifndef"
            | "elsif"
            | "else"
            | "endif"
            | "timescale"
            | "default_nettype"
            | "line"
            | "resetall"
            | "begin_keywords"
            | "end_keywords"
            | "unconnected_drive"
            | "nounconnected_drive"
            | "celldefine"
            | "endcelldefine"
            | "pragma"
    )
}

/// Substitutes formal parameters in a macro body with actual argument tokens.
/// Stringification and token pasting are handled by the caller, which owns
/// the source manager needed to synthesize new buffers.
pub fn substitute_params(
    body: &[Token],
    params: &[MacroParam],
    args: &[Vec<Token>],
    sources: &SourceManager,
) -> Vec<Token> {
    let mut out = Vec::with_capacity(body.len());
    for token in body {
        if matches!(token.kind, SyntaxKind::Ident) {
            let text = token.text(sources);
            if let Some(idx) = params.iter().position(|p| p.name == text) {
                out.extend(args[idx].iter().cloned());
                continue;
            }
        }
        out.push(token.clone());
    }
    out
}
