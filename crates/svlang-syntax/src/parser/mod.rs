//! Hand-written recursive-descent parser over the preprocessed token stream.
//!
//! Entry points differ in what they expect at top level but all produce a
//! tree rooted at a `CompilationUnit` node; the entry point determines what
//! its children are. `parse_guess` probes the first few tokens to classify an
//! arbitrary snippet.

mod core;
mod grammar;

#[cfg(test)]
mod tests;

use svlang_core::source::SourceManager;

use crate::Error;
use crate::cst::{SyntaxKind, token_sets};
use crate::token::Token;

pub use self::core::{Parse, SpanMap, SpanMapEntry};
pub(crate) use self::core::{Lookahead, Parser};

/// What `parse_guess` decided a snippet is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessKind {
    CompilationUnit,
    Member,
    Statement,
    Expression,
}

pub fn parse_compilation_unit(
    sources: &SourceManager,
    tokens: &[Token],
) -> Result<Parse, Error> {
    let mut p = Parser::new(sources, tokens);
    p.start_node(SyntaxKind::CompilationUnit);
    while !p.at_eof() {
        p.parse_member();
    }
    p.eat_remaining_trivia();
    p.finish_node();
    p.finish()
}

pub fn parse_expression(sources: &SourceManager, tokens: &[Token]) -> Result<Parse, Error> {
    let mut p = Parser::new(sources, tokens);
    p.start_node(SyntaxKind::CompilationUnit);
    p.parse_expr();
    p.eat_remaining_trivia();
    p.finish_node();
    p.finish()
}

pub fn parse_statement(sources: &SourceManager, tokens: &[Token]) -> Result<Parse, Error> {
    let mut p = Parser::new(sources, tokens);
    p.start_node(SyntaxKind::CompilationUnit);
    p.parse_statement();
    p.eat_remaining_trivia();
    p.finish_node();
    p.finish()
}

pub fn parse_member(sources: &SourceManager, tokens: &[Token]) -> Result<Parse, Error> {
    let mut p = Parser::new(sources, tokens);
    p.start_node(SyntaxKind::CompilationUnit);
    p.parse_member();
    p.eat_remaining_trivia();
    p.finish_node();
    p.finish()
}

/// Classifies a snippet by its first tokens, then parses it accordingly.
pub fn parse_guess(
    sources: &SourceManager,
    tokens: &[Token],
) -> Result<(Parse, GuessKind), Error> {
    let first = tokens
        .iter()
        .filter(|t| !t.is_trivia())
        .map(|t| t.kind)
        .next()
        .unwrap_or(SyntaxKind::Eof);

    let guess = match first {
        SyntaxKind::KwModule
        | SyntaxKind::KwMacromodule
        | SyntaxKind::KwInterface
        | SyntaxKind::KwProgram
        | SyntaxKind::KwPackage
        | SyntaxKind::KwPrimitive
        | SyntaxKind::KwTimeunit
        | SyntaxKind::KwTimeprecision => GuessKind::CompilationUnit,
        SyntaxKind::KwBegin
        | SyntaxKind::KwFork
        | SyntaxKind::KwIf
        | SyntaxKind::KwCase
        | SyntaxKind::KwCasex
        | SyntaxKind::KwCasez
        | SyntaxKind::KwFor
        | SyntaxKind::KwForeach
        | SyntaxKind::KwWhile
        | SyntaxKind::KwDo
        | SyntaxKind::KwRepeat
        | SyntaxKind::KwForever
        | SyntaxKind::KwReturn
        | SyntaxKind::KwBreak
        | SyntaxKind::KwContinue
        | SyntaxKind::KwWait
        | SyntaxKind::KwDisable
        | SyntaxKind::KwRandsequence
        | SyntaxKind::At
        | SyntaxKind::Pound => GuessKind::Statement,
        kind if token_sets::MEMBER_FIRST.contains(kind) => GuessKind::Member,
        _ => GuessKind::Expression,
    };

    let parse = match guess {
        GuessKind::CompilationUnit => parse_compilation_unit(sources, tokens),
        GuessKind::Member => parse_member(sources, tokens),
        GuessKind::Statement => parse_statement(sources, tokens),
        GuessKind::Expression => parse_expression(sources, tokens),
    }?;
    Ok((parse, guess))
}
