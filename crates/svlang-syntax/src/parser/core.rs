//! Core parser state machine and low-level operations.
//!
//! The `Parser` walks the preprocessed token stream left-to-right, building a
//! rowan green tree. Trivia tokens buffer separately and flush in front of
//! the next consumed token, which gives the stable attachment the round-trip
//! guarantee depends on. Recovery has three tools:
//!
//! - `expect` materializes a zero-width *missing* token when a required kind
//!   is absent, so parsing continues with well-formed structure
//! - unexpected tokens are demoted to `SkippedText` trivia
//! - `recover_until` skips to a production's follow set or a hard
//!   synchronization token
//!
//! Speculation never builds nodes: probe functions scan ahead over the token
//! slice and the cursor is restored wholesale, dropping any buffered
//! diagnostics from the probe.
//!
//! Fuel-based limits bound runaway inputs: every consumed token spends
//! execution fuel and recursion depth spends recursion fuel. Exhausting
//! either sets a fatal [`Error`] that makes the parser report end-of-input,
//! and `finish` returns the error instead of a tree.

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder, TextSize};

use svlang_core::diagnostics::{Diagnostic, DiagnosticKind};
use svlang_core::source::{FileSpan, SourceManager};

use crate::Error;
use crate::cst::{SyntaxKind, TokenSet, token_sets};
use crate::token::Token;

/// Execution fuel: every consumed token spends one unit. Never replenishes.
const DEFAULT_EXEC_FUEL: u32 = 1_000_000;
const DEFAULT_RECURSION_FUEL: u32 = 512;

/// Maps offsets in the tree's text back to original file spans.
///
/// One entry per significant token, in tree order. `index` is the token's
/// position in the preprocessor's significant-token numbering, which is what
/// positional directive state (like `default_nettype`) is keyed on.
#[derive(Debug, Clone, Default)]
pub struct SpanMap {
    entries: Vec<SpanMapEntry>,
}

#[derive(Debug, Clone, Copy)]
pub struct SpanMapEntry {
    pub offset: TextSize,
    pub span: FileSpan,
    pub index: usize,
}

impl SpanMap {
    /// The entry covering a tree offset: the last token starting at or
    /// before it.
    pub fn entry_at(&self, offset: TextSize) -> Option<&SpanMapEntry> {
        let idx = self.entries.partition_point(|e| e.offset <= offset);
        self.entries[..idx].last()
    }

    pub fn file_span(&self, offset: TextSize) -> Option<FileSpan> {
        self.entry_at(offset).map(|e| e.span)
    }

    pub fn token_index(&self, offset: TextSize) -> Option<usize> {
        self.entry_at(offset).map(|e| e.index)
    }
}

/// Parse result: the green tree, buffered diagnostics, and the span map.
#[derive(Debug)]
pub struct Parse {
    pub green: GreenNode,
    pub diagnostics: Vec<Diagnostic>,
    pub span_map: SpanMap,
}

impl Parse {
    pub fn root(&self) -> crate::cst::SyntaxNode {
        crate::cst::SyntaxNode::new_root(self.green.clone())
    }
}

/// Read-only cursor for speculative scans.
///
/// Probes classify upcoming input (declaration vs. expression, cast vs.
/// parenthesized expression) by walking a `Lookahead` as far as they need.
/// Nothing is consumed and no diagnostics can be emitted, so "rollback" is
/// simply dropping the cursor.
pub(crate) struct Lookahead<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Lookahead<'t> {
    /// Current significant token kind.
    pub(crate) fn peek(&self) -> SyntaxKind {
        self.tokens[self.pos..]
            .iter()
            .find(|t| !t.is_trivia())
            .map_or(SyntaxKind::Eof, |t| t.kind)
    }

    /// Advances past the current significant token.
    pub(crate) fn bump(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            self.pos += 1;
            if !token.is_trivia() {
                return;
            }
        }
    }

    /// Skips a balanced bracketed group if one starts here. Returns false on
    /// unbalanced input.
    pub(crate) fn skip_balanced(&mut self, open: SyntaxKind, close: SyntaxKind) -> bool {
        if self.peek() != open {
            return true;
        }
        let mut depth = 0u32;
        loop {
            let kind = self.peek();
            if kind == SyntaxKind::Eof {
                return false;
            }
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    self.bump();
                    return true;
                }
            }
            self.bump();
        }
    }
}

pub struct Parser<'a> {
    pub(crate) sources: &'a SourceManager,
    tokens: &'a [Token],
    /// Current position. Monotonically increases outside of speculation.
    pos: usize,
    /// Significant tokens consumed so far (matches preprocessor numbering).
    significant: usize,
    /// Trivia seen since the last consumed token, pending attachment.
    trivia_buffer: Vec<Token>,
    builder: GreenNodeBuilder<'static>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    /// Running byte offset in the tree text, for the span map.
    text_pos: TextSize,
    span_map: SpanMap,
    depth: u32,
    last_error_pos: Option<FileSpan>,

    /// Execution fuel remaining. None = infinite.
    exec_fuel_remaining: Option<u32>,
    /// Recursion depth limit. None = infinite.
    recursion_fuel_limit: Option<u32>,
    /// Fatal error that stops parsing (fuel exhaustion).
    fatal_error: Option<Error>,
}

impl<'a> Parser<'a> {
    pub fn new(sources: &'a SourceManager, tokens: &'a [Token]) -> Self {
        Self {
            sources,
            tokens,
            pos: 0,
            significant: 0,
            trivia_buffer: Vec::with_capacity(4),
            builder: GreenNodeBuilder::new(),
            diagnostics: Vec::new(),
            text_pos: 0.into(),
            span_map: SpanMap::default(),
            depth: 0,
            last_error_pos: None,
            exec_fuel_remaining: Some(DEFAULT_EXEC_FUEL),
            recursion_fuel_limit: Some(DEFAULT_RECURSION_FUEL),
            fatal_error: None,
        }
    }

    /// Set execution fuel limit. None = infinite.
    pub fn with_exec_fuel(mut self, limit: Option<u32>) -> Self {
        self.exec_fuel_remaining = limit;
        self
    }

    /// Set recursion depth limit. None = infinite.
    pub fn with_recursion_fuel(mut self, limit: Option<u32>) -> Self {
        self.recursion_fuel_limit = limit;
        self
    }

    pub fn finish(mut self) -> Result<Parse, Error> {
        if let Some(error) = self.fatal_error.take() {
            return Err(error);
        }
        Ok(Parse {
            green: self.builder.finish(),
            diagnostics: self.diagnostics,
            span_map: self.span_map,
        })
    }

    pub(crate) fn has_fatal_error(&self) -> bool {
        self.fatal_error.is_some()
    }

    /// Consume execution fuel. Sets the fatal error when exhausted.
    fn consume_exec_fuel(&mut self) {
        if let Some(remaining) = &mut self.exec_fuel_remaining {
            if *remaining == 0 {
                if self.fatal_error.is_none() {
                    self.fatal_error = Some(Error::ExecFuelExhausted);
                }
                return;
            }
            *remaining -= 1;
        }
    }

    // --- token access -------------------------------------------------------

    /// Kind of the current significant token. Buffers any trivia in front.
    /// A fatal parser reports `Eof` so every production unwinds.
    pub(crate) fn current(&mut self) -> SyntaxKind {
        if self.has_fatal_error() {
            return SyntaxKind::Eof;
        }
        self.skip_trivia_to_buffer();
        self.tokens
            .get(self.pos)
            .map_or(SyntaxKind::Eof, |t| t.kind)
    }

    pub(crate) fn current_span(&mut self) -> FileSpan {
        self.skip_trivia_to_buffer();
        match self.tokens.get(self.pos) {
            Some(t) => t.span,
            None => self
                .tokens
                .last()
                .map(|t| t.span)
                .unwrap_or(FileSpan::empty(Default::default(), 0.into())),
        }
    }

    /// Lookahead by `n` significant tokens (0 = current).
    pub(crate) fn nth(&mut self, n: usize) -> SyntaxKind {
        if self.has_fatal_error() {
            return SyntaxKind::Eof;
        }
        self.skip_trivia_to_buffer();
        let mut seen = 0;
        for token in &self.tokens[self.pos..] {
            if token.is_trivia() {
                continue;
            }
            if seen == n {
                return token.kind;
            }
            seen += 1;
        }
        SyntaxKind::Eof
    }

    pub(crate) fn at(&mut self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_set(&mut self, set: TokenSet) -> bool {
        set.contains(self.current())
    }

    pub(crate) fn at_eof(&mut self) -> bool {
        self.current() == SyntaxKind::Eof
    }

    fn skip_trivia_to_buffer(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            if !token.is_trivia() {
                break;
            }
            self.trivia_buffer.push(token.clone());
            self.pos += 1;
        }
    }

    fn drain_trivia(&mut self) {
        let buffered = std::mem::take(&mut self.trivia_buffer);
        for token in buffered {
            let text = token.text(self.sources);
            self.builder.token(token.kind.into(), text);
            self.text_pos += TextSize::from(text.len() as u32);
        }
    }

    // --- tree construction --------------------------------------------------

    pub(crate) fn start_node(&mut self, kind: SyntaxKind) {
        self.drain_trivia();
        self.builder.start_node(kind.into());
    }

    pub(crate) fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    pub(crate) fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    /// Checkpoint for retroactive wrapping (binary expressions, suffixes).
    pub(crate) fn checkpoint(&mut self) -> Checkpoint {
        self.skip_trivia_to_buffer();
        self.drain_trivia();
        self.builder.checkpoint()
    }

    /// Consumes the current significant token into the tree.
    pub(crate) fn bump(&mut self) {
        self.consume_exec_fuel();
        if self.has_fatal_error() {
            return;
        }
        self.skip_trivia_to_buffer();
        let Some(token) = self.tokens.get(self.pos) else {
            return;
        };
        if token.kind == SyntaxKind::Eof {
            return;
        }
        let token = token.clone();
        self.drain_trivia();

        let text = token.text(self.sources);
        self.span_map.entries.push(SpanMapEntry {
            offset: self.text_pos,
            span: token.span,
            index: self.significant,
        });
        self.builder.token(token.kind.into(), text);
        self.text_pos += TextSize::from(text.len() as u32);
        self.pos += 1;
        self.significant += 1;
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Expects `kind`; on mismatch emits `ExpectedToken` and splices in a
    /// zero-width missing token of that kind so parsing can continue.
    pub(crate) fn expect(&mut self, kind: SyntaxKind, what: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error(DiagnosticKind::ExpectedToken, |d| d.push(what.to_string()));
        self.missing_token(kind);
        false
    }

    /// Emits a zero-width missing token of `kind` at the current position.
    pub(crate) fn missing_token(&mut self, kind: SyntaxKind) {
        self.drain_trivia();
        self.builder.token(kind.into(), "");
    }

    /// Eats any trailing trivia into the current node. Call before finishing
    /// a root so end-of-file trivia is not lost.
    pub(crate) fn eat_remaining_trivia(&mut self) {
        self.skip_trivia_to_buffer();
        self.drain_trivia();
    }

    // --- diagnostics --------------------------------------------------------

    pub(crate) fn error(
        &mut self,
        kind: DiagnosticKind,
        with_args: impl FnOnce(&mut Vec<String>),
    ) {
        let span = self.current_span();
        if self.last_error_pos == Some(span) {
            return;
        }
        self.last_error_pos = Some(span);
        let mut args = Vec::new();
        with_args(&mut args);
        self.diagnostics.push(Diagnostic {
            kind,
            severity: kind.severity(),
            span,
            args,
            notes: Vec::new(),
        });
    }

    pub(crate) fn error_plain(&mut self, kind: DiagnosticKind) {
        self.error(kind, |_| {});
    }

    // --- recovery -----------------------------------------------------------

    /// Demotes the current token to `SkippedText` trivia. The skipped text
    /// attaches in front of the next accepted token.
    pub(crate) fn skip_current(&mut self) {
        self.consume_exec_fuel();
        if self.has_fatal_error() {
            return;
        }
        self.skip_trivia_to_buffer();
        let Some(token) = self.tokens.get(self.pos) else {
            return;
        };
        if token.kind == SyntaxKind::Eof {
            return;
        }
        self.trivia_buffer.push(Token {
            kind: SyntaxKind::SkippedText,
            ..token.clone()
        });
        self.pos += 1;
        self.significant += 1;
    }

    /// Reports `kind`, then skips the current token and everything further
    /// until the production's follow set or a hard synchronization point.
    /// Always consumes at least one token, so callers in loops make
    /// progress even when the recovery set is immediately satisfied.
    pub(crate) fn recover_until(&mut self, kind: DiagnosticKind, recovery: TokenSet) {
        self.error_plain(kind);
        let sync = recovery.union(token_sets::MEMBER_RECOVERY);
        self.skip_current();
        while !self.at_eof() && !self.at_set(sync) {
            self.skip_current();
        }
    }

    // --- speculation --------------------------------------------------------

    /// A read-only cursor starting at the current significant token.
    pub(crate) fn lookahead(&mut self) -> Lookahead<'a> {
        self.skip_trivia_to_buffer();
        Lookahead {
            tokens: self.tokens,
            pos: self.pos,
        }
    }

    // --- recursion guard ----------------------------------------------------

    pub(crate) fn enter_recursion(&mut self) -> bool {
        if let Some(limit) = self.recursion_fuel_limit
            && self.depth >= limit
        {
            if self.fatal_error.is_none() {
                self.fatal_error = Some(Error::RecursionLimitExceeded);
            }
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn exit_recursion(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
