//! The preprocessor: directives, conditional compilation, macro expansion,
//! and include stacking.
//!
//! Sits between the lexer and the parser. Consumes the raw token stream of
//! the root buffer (plus any buffers it pulls in via `include` or macro
//! expansion, managed as a stack of frames) and produces the post-directive
//! stream the parser sees.
//!
//! Round-trip rules: every directive line it consumes is re-emitted as a
//! single `DirectiveTrivia` token covering the original bytes; a non-taken
//! conditional region becomes one `DisabledText` token. Macro usages are the
//! exception: they are replaced by their expansion, whose tokens point back
//! at the macro body with an expansion chain registered in the source
//! manager.

mod macros;

use std::path::PathBuf;

use indexmap::IndexMap;
use rowan::TextRange;

use svlang_core::diagnostics::{DiagnosticKind, Diagnostics};
use svlang_core::source::{ExpansionId, FileSpan, SourceId, SourceManager};

use crate::cst::{KeywordProfile, SyntaxKind};
use crate::lexer;
use crate::token::{TimeUnit, Token, TokenValue};

pub use macros::{MacroDef, MacroParam};

/// Configuration for one preprocessing run.
#[derive(Debug, Clone)]
pub struct PreprocessorOptions {
    pub include_dirs: Vec<PathBuf>,
    pub system_include_dirs: Vec<PathBuf>,
    /// `(name, replacement text)` pairs defined before the first token.
    pub predefines: Vec<(String, String)>,
    pub keyword_profile: KeywordProfile,
    pub max_include_depth: u32,
}

impl Default for PreprocessorOptions {
    fn default() -> Self {
        Self {
            include_dirs: Vec::new(),
            system_include_dirs: Vec::new(),
            predefines: Vec::new(),
            keyword_profile: KeywordProfile::default(),
            max_include_depth: 64,
        }
    }
}

/// The net type assumed for implicit nets, set by `default_nettype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultNetType {
    #[default]
    Wire,
    Tri,
    Tri0,
    Tri1,
    Triand,
    Trior,
    Trireg,
    Wand,
    Wor,
    Uwire,
    /// `default_nettype none`: implicit nets are errors.
    None,
}

/// Positions here are indices of significant (non-trivia) output tokens, so
/// consumers can ask which value was active at any point of the stream.
#[derive(Debug, Clone, Default)]
pub struct DefaultNetTypeTracker {
    changes: Vec<(usize, DefaultNetType)>,
}

impl DefaultNetTypeTracker {
    fn record(&mut self, index: usize, value: DefaultNetType) {
        self.changes.push((index, value));
    }

    pub fn at(&self, token_index: usize) -> DefaultNetType {
        self.changes
            .iter()
            .rev()
            .find(|(i, _)| *i <= token_index)
            .map(|(_, v)| *v)
            .unwrap_or_default()
    }
}

/// `1`, `10`, or `100` of a time unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeScaleValue {
    pub magnitude: u16,
    pub unit: TimeUnit,
}

impl TimeScaleValue {
    /// Power-of-ten exponent relative to one second.
    pub fn power(self) -> i32 {
        let mag = match self.magnitude {
            100 => 2,
            10 => 1,
            _ => 0,
        };
        self.unit.magnitude() + mag
    }
}

impl std::fmt::Display for TimeScaleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.suffix())
    }
}

/// A `timescale` value: unit / precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeScale {
    pub unit: TimeScaleValue,
    pub precision: TimeScaleValue,
}

/// Everything a preprocessing run produces.
#[derive(Debug)]
pub struct PreprocessResult {
    pub tokens: Vec<Token>,
    /// Snapshot of the macro table at end of input.
    pub macros: IndexMap<String, MacroDef>,
    pub default_nettype: DefaultNetTypeTracker,
    /// First `timescale` directive seen, if any.
    pub time_scale: Option<TimeScale>,
}

#[derive(Debug)]
enum FrameKind {
    Source { depth: u32 },
    Expansion { id: ExpansionId, name: String },
}

#[derive(Debug)]
struct Frame {
    tokens: Vec<Token>,
    pos: usize,
    kind: FrameKind,
}

#[derive(Debug, Clone, Copy)]
struct CondFrame {
    any_taken: bool,
    has_else: bool,
}

/// Preprocessor state machine. Create with [`Preprocessor::new`], seed macros
/// with [`predefine`](Self::predefine), then drive to completion with
/// [`run`](Self::run).
pub struct Preprocessor<'a> {
    sources: &'a mut SourceManager,
    diagnostics: &'a mut Diagnostics,
    options: &'a PreprocessorOptions,
    root: SourceId,
    stack: Vec<Frame>,
    macros: IndexMap<String, MacroDef>,
    cond_stack: Vec<CondFrame>,
    profile: KeywordProfile,
    profile_stack: Vec<KeywordProfile>,
    out: Vec<Token>,
    /// Count of significant tokens emitted so far.
    significant: usize,
    default_nettype: DefaultNetTypeTracker,
    time_scale: Option<TimeScale>,
}

impl<'a> Preprocessor<'a> {
    pub fn new(
        sources: &'a mut SourceManager,
        diagnostics: &'a mut Diagnostics,
        root: SourceId,
        options: &'a PreprocessorOptions,
    ) -> Self {
        let tokens = lexer::lex(sources, root, diagnostics);
        let mut pp = Self {
            sources,
            diagnostics,
            options,
            root,
            stack: vec![Frame {
                tokens,
                pos: 0,
                kind: FrameKind::Source { depth: 0 },
            }],
            macros: IndexMap::new(),
            cond_stack: Vec::new(),
            profile: options.keyword_profile,
            profile_stack: Vec::new(),
            out: Vec::new(),
            significant: 0,
            default_nettype: DefaultNetTypeTracker::default(),
            time_scale: None,
        };
        for name in ["__FILE__", "__LINE__"] {
            pp.macros.insert(
                name.to_string(),
                MacroDef {
                    name: name.to_string(),
                    name_span: FileSpan::empty(root, 0.into()),
                    params: None,
                    body: Vec::new(),
                    builtin: true,
                },
            );
        }
        let predefines = options.predefines.clone();
        for (name, text) in &predefines {
            pp.predefine(name, text);
        }
        pp
    }

    /// Defines an object-like macro from caller-provided text.
    pub fn predefine(&mut self, name: &str, text: &str) {
        if macros::is_builtin_name(name) || macros::is_reserved_directive(name) {
            return;
        }
        let buffer = self.sources.add_buffer(format!("<predefine:{name}>"), text);
        let mut scratch = Diagnostics::new();
        let mut body = lexer::lex(self.sources, buffer, &mut scratch);
        body.retain(|t| t.kind != SyntaxKind::Eof);
        trim_trivia(&mut body);
        self.diagnostics.extend(scratch);
        self.macros.insert(
            name.to_string(),
            MacroDef {
                name: name.to_string(),
                name_span: FileSpan::empty(buffer, 0.into()),
                params: None,
                body,
                builtin: false,
            },
        );
    }

    pub fn undefine(&mut self, name: &str) {
        if !macros::is_builtin_name(name) {
            self.macros.shift_remove(name);
        }
    }

    /// Whether `name` is defined at the current point of the run.
    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    /// Snapshot of the current macro table.
    pub fn defined_macros(&self) -> IndexMap<String, MacroDef> {
        self.macros.clone()
    }

    /// Drives the stream to end of input.
    pub fn run(mut self) -> PreprocessResult {
        loop {
            let token = self.bump();
            match token.kind {
                SyntaxKind::Eof => {
                    if !self.cond_stack.is_empty() {
                        self.diagnostics
                            .report(DiagnosticKind::MissingEndIfDirective, token.span)
                            .emit();
                        self.cond_stack.clear();
                    }
                    self.emit(token);
                    break;
                }
                SyntaxKind::Directive => self.handle_directive(token),
                SyntaxKind::LineContinuation => {
                    // A stray splice outside a directive; treat as whitespace.
                    self.emit(Token {
                        kind: SyntaxKind::Whitespace,
                        ..token
                    });
                }
                kind if kind.is_keyword() && !self.profile.contains(kind) => {
                    self.emit(Token {
                        kind: SyntaxKind::Ident,
                        ..token
                    });
                }
                _ => self.emit(token),
            }
        }

        PreprocessResult {
            tokens: self.out,
            macros: self.macros,
            default_nettype: self.default_nettype,
            time_scale: self.time_scale,
        }
    }

    // --- token plumbing -----------------------------------------------------

    /// Current token across the frame stack. Exhausted frames pop; the root
    /// frame's `Eof` is sticky.
    fn current(&mut self) -> Token {
        loop {
            let top = self.stack.last().expect("frame stack never empties");
            if top.pos < top.tokens.len() {
                let token = top.tokens[top.pos].clone();
                if token.kind == SyntaxKind::Eof && self.stack.len() > 1 {
                    self.stack.pop();
                    continue;
                }
                return token;
            }
            if self.stack.len() == 1 {
                // The root always ends with Eof, so this is unreachable in
                // practice; synthesize one for safety.
                let end = (self.sources.text(self.root).len() as u32).into();
                return Token::new(SyntaxKind::Eof, FileSpan::empty(self.root, end));
            }
            self.stack.pop();
        }
    }

    fn bump(&mut self) -> Token {
        let token = self.current();
        if token.kind != SyntaxKind::Eof {
            self.stack.last_mut().expect("frame stack never empties").pos += 1;
        }
        token
    }

    fn emit(&mut self, token: Token) {
        if !token.is_trivia() && token.kind != SyntaxKind::Eof {
            self.significant += 1;
        }
        self.out.push(token);
    }

    /// Consumes trivia up to (not including) the next newline, folding their
    /// spans into `span`.
    fn eat_line_trivia(&mut self, span: &mut FileSpan) {
        loop {
            let token = self.current();
            if token.is_trivia() && token.kind != SyntaxKind::Newline {
                self.bump();
                *span = span.cover(token.span);
            } else {
                return;
            }
        }
    }

    /// Next significant token on the directive's line, or None at EOL/EOF.
    fn take_in_line(&mut self, span: &mut FileSpan) -> Option<Token> {
        self.eat_line_trivia(span);
        let token = self.current();
        if matches!(token.kind, SyntaxKind::Newline | SyntaxKind::Eof) {
            return None;
        }
        self.bump();
        *span = span.cover(token.span);
        Some(token)
    }

    /// Consumes everything up to the next newline into `span`.
    fn consume_line(&mut self, span: &mut FileSpan) {
        loop {
            let token = self.current();
            if matches!(token.kind, SyntaxKind::Newline | SyntaxKind::Eof) {
                return;
            }
            self.bump();
            *span = span.cover(token.span);
        }
    }

    fn emit_directive_trivia(&mut self, span: FileSpan) {
        self.emit(Token::new(SyntaxKind::DirectiveTrivia, span));
    }

    fn text_of(&self, token: &Token) -> String {
        token.text(self.sources).to_string()
    }

    // --- directives ---------------------------------------------------------

    fn handle_directive(&mut self, token: Token) {
        let name = self.text_of(&token)[1..].to_string();
        match name.as_str() {
            "define" => self.handle_define(token),
            "undef" => self.handle_undef(token),
            "undefineall" => {
                self.macros.retain(|_, def| def.builtin);
                self.emit_directive_trivia(token.span);
            }
            "ifdef" | "ifndef" | "elsif" | "else" | "endif" => {
                self.handle_conditional(&name, token)
            }
            "include" => self.handle_include(token),
            "timescale" => self.handle_timescale(token),
            "default_nettype" => self.handle_default_nettype(token),
            "line" => self.handle_line(token),
            "resetall" => {
                self.default_nettype
                    .record(self.significant, DefaultNetType::Wire);
                self.emit_directive_trivia(token.span);
            }
            "begin_keywords" => self.handle_begin_keywords(token),
            "end_keywords" => {
                match self.profile_stack.pop() {
                    Some(profile) => self.profile = profile,
                    None => self
                        .diagnostics
                        .report(DiagnosticKind::MismatchedEndKeywords, token.span)
                        .emit(),
                }
                self.emit_directive_trivia(token.span);
            }
            "celldefine" | "endcelldefine" | "nounconnected_drive" => {
                self.emit_directive_trivia(token.span);
            }
            "unconnected_drive" | "pragma" => {
                let mut span = token.span;
                self.consume_line(&mut span);
                self.emit_directive_trivia(span);
            }
            _ => self.handle_usage(name, token),
        }
    }

    fn handle_define(&mut self, dir: Token) {
        let mut span = dir.span;
        let name_token = self.take_in_line(&mut span);
        let (name, name_span) = match &name_token {
            Some(t) if t.kind == SyntaxKind::Ident => (self.text_of(t), t.span),
            Some(t) => {
                let text = self.text_of(t);
                self.diagnostics
                    .report(DiagnosticKind::InvalidMacroName, t.span)
                    .arg(text)
                    .emit();
                self.consume_line(&mut span);
                self.emit_directive_trivia(span);
                return;
            }
            None => {
                self.diagnostics
                    .report(DiagnosticKind::ExpectedMacroName, span)
                    .emit();
                self.emit_directive_trivia(span);
                return;
            }
        };

        if macros::is_builtin_name(&name) || macros::is_reserved_directive(&name) {
            self.diagnostics
                .report(DiagnosticKind::InvalidMacroName, name_span)
                .arg(&name)
                .emit();
            self.consume_line(&mut span);
            self.emit_directive_trivia(span);
            return;
        }

        // A parameter list exists only when '(' directly abuts the name.
        let next = self.current();
        let params = if next.kind == SyntaxKind::LParen
            && next.span.source == name_span.source
            && next.span.range.start() == name_span.range.end()
        {
            Some(self.parse_macro_params(&mut span))
        } else {
            None
        };

        // Body: the rest of the line, line continuations spliced out.
        let mut body = Vec::new();
        loop {
            let token = self.current();
            match token.kind {
                SyntaxKind::Newline | SyntaxKind::Eof => break,
                SyntaxKind::LineContinuation => {
                    self.bump();
                    span = span.cover(token.span);
                    // The splice acts as whitespace between body tokens.
                    body.push(Token {
                        kind: SyntaxKind::Whitespace,
                        ..token
                    });
                }
                _ => {
                    self.bump();
                    span = span.cover(token.span);
                    body.push(token);
                }
            }
        }
        trim_trivia(&mut body);

        let def = MacroDef {
            name: name.clone(),
            name_span,
            params,
            body,
            builtin: false,
        };
        if let Some(existing) = self.macros.get(&name)
            && !existing.same_as(&def, self.sources)
        {
            self.diagnostics
                .report(DiagnosticKind::MacroRedefinition, name_span)
                .arg(&name)
                .note(Some(existing.name_span), "previous definition is here")
                .emit();
        }
        self.macros.insert(name, def);
        self.emit_directive_trivia(span);
    }

    fn parse_macro_params(&mut self, span: &mut FileSpan) -> Vec<MacroParam> {
        let lparen = self.bump();
        *span = span.cover(lparen.span);
        let mut params = Vec::new();

        loop {
            let Some(token) = self.take_in_line(span) else {
                self.diagnostics
                    .report(DiagnosticKind::UnterminatedMacroArgList, *span)
                    .emit();
                return params;
            };
            match token.kind {
                SyntaxKind::RParen => return params,
                SyntaxKind::Comma | SyntaxKind::LineContinuation => {}
                SyntaxKind::Ident => {
                    let name = self.text_of(&token);
                    let mut default = None;
                    self.eat_line_trivia(span);
                    if self.current().kind == SyntaxKind::Equals {
                        let eq = self.bump();
                        *span = span.cover(eq.span);
                        let mut tokens = Vec::new();
                        let mut depth = 0u32;
                        loop {
                            let t = self.current();
                            match t.kind {
                                SyntaxKind::Newline | SyntaxKind::Eof => break,
                                SyntaxKind::LParen
                                | SyntaxKind::LBracket
                                | SyntaxKind::LBrace => depth += 1,
                                SyntaxKind::RParen if depth == 0 => break,
                                SyntaxKind::Comma if depth == 0 => break,
                                SyntaxKind::RParen
                                | SyntaxKind::RBracket
                                | SyntaxKind::RBrace => depth = depth.saturating_sub(1),
                                _ => {}
                            }
                            self.bump();
                            *span = span.cover(t.span);
                            tokens.push(t);
                        }
                        trim_trivia(&mut tokens);
                        default = Some(tokens);
                    }
                    params.push(MacroParam { name, default });
                }
                _ => {
                    // Not a parameter name; give up on the list.
                    self.diagnostics
                        .report(DiagnosticKind::ExpectedMacroName, token.span)
                        .emit();
                    return params;
                }
            }
        }
    }

    fn handle_undef(&mut self, dir: Token) {
        let mut span = dir.span;
        match self.take_in_line(&mut span) {
            Some(t) if t.kind == SyntaxKind::Ident => {
                let name = self.text_of(&t);
                if macros::is_builtin_name(&name) {
                    self.diagnostics
                        .report(DiagnosticKind::InvalidMacroName, t.span)
                        .arg(&name)
                        .emit();
                } else if self.macros.shift_remove(&name).is_none() {
                    self.diagnostics
                        .report(DiagnosticKind::UnknownMacro, t.span)
                        .arg(&name)
                        .severity(svlang_core::Severity::Warning)
                        .emit();
                }
            }
            _ => {
                self.diagnostics
                    .report(DiagnosticKind::ExpectedMacroName, span)
                    .emit();
            }
        }
        self.emit_directive_trivia(span);
    }

    // --- conditionals -------------------------------------------------------

    fn handle_conditional(&mut self, name: &str, dir: Token) {
        let mut span = dir.span;
        match name {
            "ifdef" | "ifndef" => {
                let taken = match self.conditional_name(&mut span) {
                    Some(macro_name) => self.is_defined(&macro_name) == (name == "ifdef"),
                    None => false,
                };
                self.cond_stack.push(CondFrame {
                    any_taken: taken,
                    has_else: false,
                });
                self.emit_directive_trivia(span);
                if !taken {
                    self.skip_disabled_region();
                }
            }
            "elsif" => {
                let macro_name = self.conditional_name(&mut span);
                self.emit_directive_trivia(span);
                match self.cond_stack.last_mut() {
                    None => self.report_unbalanced(name, dir.span),
                    Some(frame) if frame.has_else => {
                        self.report_unbalanced(name, dir.span);
                        self.skip_disabled_region();
                    }
                    Some(frame) => {
                        let taken = !frame.any_taken
                            && macro_name.map(|n| self.macros.contains_key(&n)).unwrap_or(false);
                        if taken {
                            self.cond_stack.last_mut().unwrap().any_taken = true;
                        } else {
                            self.skip_disabled_region();
                        }
                    }
                }
            }
            "else" => {
                self.emit_directive_trivia(span);
                match self.cond_stack.last_mut() {
                    None => self.report_unbalanced(name, dir.span),
                    Some(frame) if frame.has_else => {
                        self.report_unbalanced(name, dir.span);
                        self.skip_disabled_region();
                    }
                    Some(frame) => {
                        frame.has_else = true;
                        let taken = !frame.any_taken;
                        frame.any_taken = true;
                        if !taken {
                            self.skip_disabled_region();
                        }
                    }
                }
            }
            "endif" => {
                self.emit_directive_trivia(span);
                if self.cond_stack.pop().is_none() {
                    self.report_unbalanced(name, dir.span);
                }
            }
            _ => unreachable!("caller dispatches only conditional directives"),
        }
    }

    fn report_unbalanced(&mut self, name: &str, span: FileSpan) {
        self.diagnostics
            .report(DiagnosticKind::UnbalancedConditional, span)
            .arg(name)
            .emit();
    }

    fn conditional_name(&mut self, span: &mut FileSpan) -> Option<String> {
        match self.take_in_line(span) {
            Some(t) if t.kind == SyntaxKind::Ident => Some(self.text_of(&t)),
            Some(t) => {
                self.diagnostics
                    .report(DiagnosticKind::ExpectedConditionalName, t.span)
                    .emit();
                None
            }
            None => {
                self.diagnostics
                    .report(DiagnosticKind::ExpectedConditionalName, *span)
                    .emit();
                None
            }
        }
    }

    /// Consumes a non-taken region up to its terminating `elsif`/`else`/
    /// `endif`, emitting the skipped bytes as one `DisabledText` token, then
    /// processes the terminator.
    fn skip_disabled_region(&mut self) {
        let mut depth = 0u32;
        let mut covered: Option<FileSpan> = None;

        loop {
            let token = self.current();
            match token.kind {
                SyntaxKind::Eof => {
                    self.diagnostics
                        .report(DiagnosticKind::MissingEndIfDirective, token.span)
                        .emit();
                    self.cond_stack.pop();
                    break;
                }
                SyntaxKind::Directive => {
                    let name = self.text_of(&token);
                    let name = &name[1..];
                    if matches!(name, "ifdef" | "ifndef") {
                        depth += 1;
                    } else if depth == 0 && matches!(name, "elsif" | "else" | "endif") {
                        if let Some(span) = covered.take() {
                            self.emit(Token::new(SyntaxKind::DisabledText, span));
                        }
                        let dir = self.bump();
                        let name = name.to_string();
                        self.handle_conditional(&name, dir);
                        return;
                    } else if name == "endif" {
                        depth -= 1;
                    }
                    self.bump();
                    covered = Some(match covered {
                        Some(span) => span.cover(token.span),
                        None => token.span,
                    });
                }
                _ => {
                    self.bump();
                    covered = Some(match covered {
                        Some(span) => span.cover(token.span),
                        None => token.span,
                    });
                }
            }
        }
        if let Some(span) = covered {
            self.emit(Token::new(SyntaxKind::DisabledText, span));
        }
    }

    // --- includes and friends ----------------------------------------------

    fn handle_include(&mut self, dir: Token) {
        let mut span = dir.span;
        let file_name = match self.take_in_line(&mut span) {
            Some(t) if t.kind == SyntaxKind::StringLiteral => match &t.value {
                Some(TokenValue::Str(s)) => Some(s.clone()),
                _ => None,
            },
            Some(t) if t.kind == SyntaxKind::Less => {
                // `<path>` form: reassemble the raw text up to '>'.
                let mut name = String::new();
                loop {
                    let token = self.current();
                    match token.kind {
                        SyntaxKind::Greater => {
                            self.bump();
                            span = span.cover(token.span);
                            break;
                        }
                        SyntaxKind::Newline | SyntaxKind::Eof => {
                            self.diagnostics
                                .report(DiagnosticKind::ExpectedIncludeFileName, span)
                                .emit();
                            break;
                        }
                        _ => {
                            self.bump();
                            span = span.cover(token.span);
                            name.push_str(token.text(self.sources));
                        }
                    }
                }
                if name.is_empty() { None } else { Some(name) }
            }
            _ => None,
        };

        self.emit_directive_trivia(span);

        let Some(file_name) = file_name else {
            self.diagnostics
                .report(DiagnosticKind::ExpectedIncludeFileName, span)
                .emit();
            return;
        };

        let (current_source, depth) = self.current_source();
        match self.sources.open_include(
            &file_name,
            current_source,
            &self.options.include_dirs,
            &self.options.system_include_dirs,
            depth,
            self.options.max_include_depth,
        ) {
            Ok(id) => {
                let tokens = lexer::lex(self.sources, id, self.diagnostics);
                self.stack.push(Frame {
                    tokens,
                    pos: 0,
                    kind: FrameKind::Source { depth: depth + 1 },
                });
            }
            Err(svlang_core::source::SourceError::IncludeDepth(limit)) => {
                self.diagnostics
                    .report(DiagnosticKind::IncludeDepthExceeded, span)
                    .arg(limit)
                    .emit();
            }
            Err(_) => {
                self.diagnostics
                    .report(DiagnosticKind::IncludeNotFound, span)
                    .arg(&file_name)
                    .emit();
            }
        }
    }

    /// Innermost source frame: the file whose text is currently streaming.
    fn current_source(&self) -> (SourceId, u32) {
        for frame in self.stack.iter().rev() {
            if let FrameKind::Source { depth } = frame.kind {
                let source = frame
                    .tokens
                    .first()
                    .map(|t| t.span.source)
                    .unwrap_or(self.root);
                return (source, depth);
            }
        }
        (self.root, 0)
    }

    fn handle_timescale(&mut self, dir: Token) {
        let mut span = dir.span;
        let unit = self.time_scale_value(&mut span);
        let slash = self.take_in_line(&mut span);
        let precision = self.time_scale_value(&mut span);
        self.consume_line(&mut span);
        self.emit_directive_trivia(span);

        match (unit, slash, precision) {
            (Some(unit), Some(s), Some(precision)) if s.kind == SyntaxKind::Slash => {
                if precision.power() > unit.power() {
                    self.diagnostics
                        .report(DiagnosticKind::InvalidTimescale, span)
                        .emit();
                    return;
                }
                if self.time_scale.is_none() {
                    self.time_scale = Some(TimeScale { unit, precision });
                }
            }
            _ => {
                self.diagnostics
                    .report(DiagnosticKind::InvalidTimescale, span)
                    .emit();
            }
        }
    }

    fn time_scale_value(&mut self, span: &mut FileSpan) -> Option<TimeScaleValue> {
        let token = self.take_in_line(span)?;
        match token.kind {
            // `10ns` lexes as one time literal.
            SyntaxKind::TimeLiteral => match token.value {
                Some(TokenValue::Time { value, unit })
                    if value.fract() == 0.0 && matches!(value as u16, 1 | 10 | 100) =>
                {
                    Some(TimeScaleValue {
                        magnitude: value as u16,
                        unit,
                    })
                }
                _ => None,
            },
            // `10 ns` arrives as an integer then an identifier.
            SyntaxKind::IntLiteral => {
                let magnitude = match token.value {
                    Some(TokenValue::Integer { value, .. }) if matches!(value, 1 | 10 | 100) => {
                        value as u16
                    }
                    _ => return None,
                };
                let unit_token = self.take_in_line(span)?;
                let unit = TimeUnit::from_suffix(unit_token.text(self.sources))?;
                Some(TimeScaleValue { magnitude, unit })
            }
            _ => None,
        }
    }

    fn handle_default_nettype(&mut self, dir: Token) {
        let mut span = dir.span;
        let value = match self.take_in_line(&mut span) {
            Some(t) => match t.kind {
                SyntaxKind::KwWire => Some(DefaultNetType::Wire),
                SyntaxKind::KwTri => Some(DefaultNetType::Tri),
                SyntaxKind::KwTri0 => Some(DefaultNetType::Tri0),
                SyntaxKind::KwTri1 => Some(DefaultNetType::Tri1),
                SyntaxKind::KwTriand => Some(DefaultNetType::Triand),
                SyntaxKind::KwTrior => Some(DefaultNetType::Trior),
                SyntaxKind::KwTrireg => Some(DefaultNetType::Trireg),
                SyntaxKind::KwWand => Some(DefaultNetType::Wand),
                SyntaxKind::KwWor => Some(DefaultNetType::Wor),
                SyntaxKind::KwUwire => Some(DefaultNetType::Uwire),
                SyntaxKind::Ident if t.text(self.sources) == "none" => Some(DefaultNetType::None),
                _ => None,
            },
            None => None,
        };
        self.emit_directive_trivia(span);
        match value {
            Some(value) => self.default_nettype.record(self.significant, value),
            None => self
                .diagnostics
                .report(DiagnosticKind::ExpectedNetType, span)
                .emit(),
        }
    }

    fn handle_line(&mut self, dir: Token) {
        let mut span = dir.span;
        let line = self.take_in_line(&mut span);
        let file = self.take_in_line(&mut span);
        let level = self.take_in_line(&mut span);

        let parsed = match (&line, &file, &level) {
            (Some(l), Some(f), Some(v))
                if l.kind == SyntaxKind::IntLiteral
                    && f.kind == SyntaxKind::StringLiteral
                    && v.kind == SyntaxKind::IntLiteral =>
            {
                let line = match l.value {
                    Some(TokenValue::Integer { value, .. }) => value as u32,
                    _ => 0,
                };
                let name = match &f.value {
                    Some(TokenValue::Str(s)) => Some(s.clone()),
                    _ => None,
                };
                let level_ok = matches!(
                    v.value,
                    Some(TokenValue::Integer { value: 0..=2, .. })
                );
                level_ok.then_some((line, name))
            }
            _ => None,
        };
        self.emit_directive_trivia(span);

        match parsed {
            Some((line, name)) => {
                // The override applies from the start of the next line.
                let offset = self
                    .line_end_offset()
                    .unwrap_or_else(|| span.range.end());
                self.sources
                    .set_line_override(span.source, offset, line, name);
            }
            None => self
                .diagnostics
                .report(DiagnosticKind::InvalidLineDirective, span)
                .emit(),
        }
    }

    /// Offset just past the newline that ends the current line, if visible.
    fn line_end_offset(&mut self) -> Option<rowan::TextSize> {
        let top = self.stack.last()?;
        top.tokens[top.pos..]
            .iter()
            .find(|t| t.kind == SyntaxKind::Newline)
            .map(|t| t.span.range.end())
    }

    fn handle_begin_keywords(&mut self, dir: Token) {
        let mut span = dir.span;
        let version = self.take_in_line(&mut span);
        self.emit_directive_trivia(span);
        let version_str = match version {
            Some(t) if t.kind == SyntaxKind::StringLiteral => match t.value {
                Some(TokenValue::Str(s)) => s,
                _ => String::new(),
            },
            _ => String::new(),
        };
        match KeywordProfile::from_version(&version_str) {
            Some(profile) => {
                self.profile_stack.push(self.profile);
                self.profile = profile;
            }
            None => self
                .diagnostics
                .report(DiagnosticKind::UnrecognizedKeywordVersion, span)
                .arg(version_str)
                .emit(),
        }
    }

    // --- macro expansion ----------------------------------------------------

    fn handle_usage(&mut self, name: String, dir: Token) {
        if !self.macros.contains_key(&name) {
            self.diagnostics
                .report(DiagnosticKind::UnknownDirective, dir.span)
                .arg(&name)
                .emit();
            let mut span = dir.span;
            self.consume_line(&mut span);
            self.emit_directive_trivia(span);
            return;
        }

        // Recursion guard: a name already being expanded passes through
        // verbatim instead of expanding again.
        let in_progress = self.stack.iter().any(|f| match &f.kind {
            FrameKind::Expansion { name: n, .. } => *n == name,
            _ => false,
        });
        if in_progress {
            self.emit(dir);
            return;
        }

        let def = self.macros.get(&name).cloned().unwrap();
        if def.builtin {
            self.expand_builtin(&def.name, dir);
            return;
        }

        let mut usage_span = dir.span;
        let args = match &def.params {
            Some(params) => {
                let Some(args) = self.collect_macro_args(&def, &mut usage_span) else {
                    return;
                };
                Some(args)
            }
            None => None,
        };

        let parent = self.innermost_expansion();
        let expansion = self
            .sources
            .register_expansion(dir.span, usage_span, parent);

        let substituted = match (&def.params, &args) {
            (Some(params), Some(args)) => {
                macros::substitute_params(&def.body, params, args, self.sources)
            }
            _ => def.body.clone(),
        };
        let mut replacement = self.apply_paste_and_stringify(substituted, expansion);
        for token in &mut replacement {
            if token.expansion.is_none() {
                token.expansion = Some(expansion);
            }
        }

        self.emit(Token {
            kind: SyntaxKind::MacroMarker,
            span: FileSpan::empty(dir.span.source, dir.span.range.start()),
            value: None,
            missing: false,
            expansion: Some(expansion),
        });
        self.stack.push(Frame {
            tokens: replacement,
            pos: 0,
            kind: FrameKind::Expansion {
                id: expansion,
                name,
            },
        });
    }

    fn innermost_expansion(&self) -> Option<ExpansionId> {
        self.stack.iter().rev().find_map(|f| match f.kind {
            FrameKind::Expansion { id, .. } => Some(id),
            _ => None,
        })
    }

    fn expand_builtin(&mut self, name: &str, dir: Token) {
        let expansion = self.sources.register_expansion(dir.span, dir.span, None);
        let location = self.sources.resolve(dir.span);
        let token = match name {
            "__FILE__" => {
                let text = format!("\"{}\"", location.name);
                let value = TokenValue::Str(location.name);
                self.synthesize(SyntaxKind::StringLiteral, &text, Some(value), expansion)
            }
            _ => {
                let text = location.line.to_string();
                let value = TokenValue::Integer {
                    value: location.line as u64,
                    xz: 0,
                    width: None,
                    signed: true,
                    base: None,
                };
                self.synthesize(SyntaxKind::IntLiteral, &text, Some(value), expansion)
            }
        };
        self.emit(token);
    }

    /// Creates a token whose text lives in a fresh synthesized buffer.
    fn synthesize(
        &mut self,
        kind: SyntaxKind,
        text: &str,
        value: Option<TokenValue>,
        expansion: ExpansionId,
    ) -> Token {
        let buffer = self.sources.add_buffer("<macro>", text);
        Token {
            kind,
            span: FileSpan::new(
                buffer,
                TextRange::new(0.into(), (text.len() as u32).into()),
            ),
            value,
            missing: false,
            expansion: Some(expansion),
        }
    }

    /// Collects `(...)` arguments for a function-like macro usage. Arguments
    /// split at top-level commas; nesting and strings are respected because
    /// strings are single tokens and delimiters are tracked by depth.
    fn collect_macro_args(
        &mut self,
        def: &MacroDef,
        usage_span: &mut FileSpan,
    ) -> Option<Vec<Vec<Token>>> {
        // Whitespace before the argument list is allowed at the usage site.
        loop {
            let token = self.current();
            if token.is_trivia() {
                self.bump();
            } else {
                break;
            }
        }
        let lparen = self.current();
        if lparen.kind != SyntaxKind::LParen {
            self.diagnostics
                .report(DiagnosticKind::ExpectedMacroArgs, *usage_span)
                .arg(&def.name)
                .emit();
            return None;
        }
        self.bump();
        *usage_span = usage_span.cover(lparen.span);

        let params = def.params.as_ref().expect("caller checked params");
        let mut raw_args: Vec<Vec<Token>> = vec![Vec::new()];
        let mut depth = 0u32;
        loop {
            let token = self.bump();
            let token_span = token.span;
            match token.kind {
                SyntaxKind::Eof => {
                    self.diagnostics
                        .report(DiagnosticKind::UnterminatedMacroArgList, *usage_span)
                        .emit();
                    break;
                }
                SyntaxKind::LParen | SyntaxKind::LBracket | SyntaxKind::LBrace => {
                    depth += 1;
                    raw_args.last_mut().unwrap().push(token);
                }
                SyntaxKind::RParen if depth == 0 => {
                    *usage_span = usage_span.cover(token_span);
                    break;
                }
                SyntaxKind::RParen | SyntaxKind::RBracket | SyntaxKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    raw_args.last_mut().unwrap().push(token);
                }
                SyntaxKind::Comma if depth == 0 => raw_args.push(Vec::new()),
                _ => raw_args.last_mut().unwrap().push(token),
            }
            *usage_span = usage_span.cover(token_span);
        }

        for arg in &mut raw_args {
            trim_trivia(arg);
        }
        if raw_args.len() == 1 && raw_args[0].is_empty() {
            raw_args.clear();
        }

        if raw_args.len() > params.len() {
            self.diagnostics
                .report(DiagnosticKind::TooManyMacroArgs, *usage_span)
                .arg(&def.name)
                .emit();
            raw_args.truncate(params.len());
        }

        let mut args = Vec::with_capacity(params.len());
        for (i, param) in params.iter().enumerate() {
            let provided = raw_args.get(i).filter(|a| !a.is_empty());
            match provided {
                Some(tokens) => args.push(tokens.clone()),
                None => match &param.default {
                    Some(default) => args.push(default.clone()),
                    None => {
                        self.diagnostics
                            .report(DiagnosticKind::MissingMacroArg, *usage_span)
                            .arg(&param.name)
                            .emit();
                        args.push(Vec::new());
                    }
                },
            }
        }
        Some(args)
    }

    /// Applies `` `` `` token pasting and `` `" `` stringification to a
    /// substituted replacement list.
    fn apply_paste_and_stringify(
        &mut self,
        substituted: Vec<Token>,
        expansion: ExpansionId,
    ) -> Vec<Token> {
        let mut out: Vec<Token> = Vec::with_capacity(substituted.len());
        let mut iter = substituted.into_iter().peekable();

        while let Some(token) = iter.next() {
            match token.kind {
                SyntaxKind::MacroQuote => {
                    let mut text = String::from("\"");
                    let mut closed = false;
                    for t in iter.by_ref() {
                        match t.kind {
                            SyntaxKind::MacroQuote => {
                                closed = true;
                                break;
                            }
                            SyntaxKind::MacroEscapedQuote => text.push('"'),
                            _ => text.push_str(t.text(self.sources)),
                        }
                    }
                    if !closed {
                        self.diagnostics
                            .report(DiagnosticKind::UnterminatedString, token.span)
                            .emit();
                    }
                    text.push('"');
                    let inner = text[1..text.len() - 1].to_string();
                    let value = TokenValue::Str(inner);
                    out.push(self.synthesize(
                        SyntaxKind::StringLiteral,
                        &text,
                        Some(value),
                        expansion,
                    ));
                }
                SyntaxKind::MacroPaste => {
                    // Trivia adjacent to the paste is dropped.
                    while matches!(out.last(), Some(t) if t.is_trivia()) {
                        out.pop();
                    }
                    while matches!(iter.peek(), Some(t) if t.is_trivia()) {
                        iter.next();
                    }
                    let left = out.pop();
                    let right = iter.next();
                    match (left, right) {
                        (Some(left), Some(right)) => {
                            let combined = format!(
                                "{}{}",
                                left.text(self.sources),
                                right.text(self.sources)
                            );
                            match lexer::glue(left.text(self.sources), right.text(self.sources)) {
                                Some(kind) => {
                                    let token =
                                        self.synthesize(kind, &combined, None, expansion);
                                    out.push(token);
                                }
                                None => {
                                    self.diagnostics
                                        .report(DiagnosticKind::MacroPasteFailed, token.span)
                                        .arg(&combined)
                                        .emit();
                                    out.push(left);
                                    out.push(right);
                                }
                            }
                        }
                        (left, right) => {
                            out.extend(left);
                            out.extend(right);
                        }
                    }
                }
                _ => out.push(token),
            }
        }
        out
    }
}

fn trim_trivia(tokens: &mut Vec<Token>) {
    while matches!(tokens.last(), Some(t) if t.is_trivia()) {
        tokens.pop();
    }
    while matches!(tokens.first(), Some(t) if t.is_trivia()) {
        tokens.remove(0);
    }
}

#[cfg(test)]
mod tests;
