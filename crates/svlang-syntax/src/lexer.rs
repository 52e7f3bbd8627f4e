//! Lexer for SystemVerilog source buffers.
//!
//! Logos drives token recognition; a post-processing loop layers on what the
//! derive cannot express:
//!
//! - consecutive unrecognized characters coalesce into single `ErrorToken`s
//!   (with an `UnknownToken` diagnostic) instead of one error per byte
//! - unterminated strings and block comments are closed at the next
//!   plausible boundary and diagnosed
//! - literal tokens get their decoded values attached
//!
//! Lexing never aborts; every byte of input lands in some token.

use logos::Logos;
use rowan::TextRange;

use svlang_core::diagnostics::{DiagnosticKind, Diagnostics};
use svlang_core::source::{FileSpan, SourceId, SourceManager};

use crate::cst::SyntaxKind;
use crate::token::{Base, TimeUnit, Token, TokenValue};

/// Maximum supported width of a vector literal's value, in bits.
pub const MAX_VECTOR_BITS: u32 = 64;

/// Tokenizes one buffer. The final element is always an `Eof` token.
pub fn lex(sources: &SourceManager, source: SourceId, diagnostics: &mut Diagnostics) -> Vec<Token> {
    let text = sources.text(source);
    let mut tokens = Vec::with_capacity(text.len() / 4 + 1);
    let mut pos = 0usize;

    'outer: while pos < text.len() {
        let mut lexer = SyntaxKind::lexer(&text[pos..]);
        while let Some(result) = lexer.next() {
            let rel = lexer.span();
            let range = TextRange::new(
                ((pos + rel.start) as u32).into(),
                ((pos + rel.end) as u32).into(),
            );
            let span = FileSpan::new(source, range);
            match result {
                Ok(kind) => {
                    let value = decode(kind, lexer.slice(), span, diagnostics);
                    tokens.push(Token {
                        kind,
                        span,
                        value,
                        missing: false,
                        expansion: None,
                    });
                }
                Err(()) => {
                    pos = recover(text, pos + rel.start, span, &mut tokens, diagnostics);
                    continue 'outer;
                }
            }
        }
        break;
    }

    tokens.push(Token::new(
        SyntaxKind::Eof,
        FileSpan::empty(source, (text.len() as u32).into()),
    ));
    tokens
}

/// Handles a byte logos could not start a token at. Returns the position to
/// resume lexing from.
fn recover(
    text: &str,
    start: usize,
    span: FileSpan,
    tokens: &mut Vec<Token>,
    diagnostics: &mut Diagnostics,
) -> usize {
    let rest = &text[start..];

    if rest.starts_with('"') {
        // Unterminated string: close at end of line.
        let end = rest.find('\n').map_or(text.len(), |i| start + i);
        let range = TextRange::new((start as u32).into(), (end as u32).into());
        let span = FileSpan::new(span.source, range);
        diagnostics
            .report(DiagnosticKind::UnterminatedString, span)
            .emit();
        let value = decode_string(&text[start + 1..end], span, diagnostics);
        tokens.push(Token {
            kind: SyntaxKind::StringLiteral,
            span,
            value: Some(TokenValue::Str(value)),
            missing: false,
            expansion: None,
        });
        return end;
    }

    if rest.starts_with("/*") {
        // Unterminated block comment: runs to end of input.
        let range = TextRange::new((start as u32).into(), (text.len() as u32).into());
        let span = FileSpan::new(span.source, range);
        diagnostics
            .report(DiagnosticKind::UnterminatedBlockComment, span)
            .emit();
        tokens.push(Token::new(SyntaxKind::BlockComment, span));
        return text.len();
    }

    let ch = rest.chars().next().unwrap_or('\u{fffd}');
    let end = start + ch.len_utf8();
    let range = TextRange::new((start as u32).into(), (end as u32).into());
    let span = FileSpan::new(span.source, range);

    if ch == '\0' {
        diagnostics.report(DiagnosticKind::EmbeddedNull, span).emit();
    } else if ch == '\\' {
        // A backslash with no identifier body after it.
        diagnostics
            .report(DiagnosticKind::EscapedIdentifierEmpty, span)
            .emit();
    } else {
        diagnostics
            .report(DiagnosticKind::UnknownToken, span)
            .arg(ch.escape_default())
            .emit();
    }

    // Coalesce with a directly preceding error token.
    if let Some(last) = tokens.last_mut()
        && last.kind == SyntaxKind::ErrorToken
        && last.span.range.end() == range.start()
    {
        last.span.range = TextRange::new(last.span.range.start(), range.end());
    } else {
        tokens.push(Token::new(SyntaxKind::ErrorToken, span));
    }
    end
}

fn decode(
    kind: SyntaxKind,
    slice: &str,
    span: FileSpan,
    diagnostics: &mut Diagnostics,
) -> Option<TokenValue> {
    match kind {
        SyntaxKind::IntLiteral => Some(decode_decimal(slice, span, diagnostics)),
        SyntaxKind::VectorLiteral => Some(decode_vector(slice, span, diagnostics)),
        SyntaxKind::UnbasedUnsizedLiteral => Some(decode_unbased(slice)),
        SyntaxKind::RealLiteral => {
            let cleaned: String = slice.chars().filter(|&c| c != '_').collect();
            Some(TokenValue::Real(cleaned.parse().unwrap_or(0.0)))
        }
        SyntaxKind::TimeLiteral => Some(decode_time(slice)),
        SyntaxKind::StringLiteral => {
            let inner = &slice[1..slice.len() - 1];
            Some(TokenValue::Str(decode_string(inner, span, diagnostics)))
        }
        _ => None,
    }
}

fn decode_decimal(slice: &str, span: FileSpan, diagnostics: &mut Diagnostics) -> TokenValue {
    let mut value: u64 = 0;
    let mut overflow = false;
    for c in slice.chars().filter(|&c| c != '_') {
        let digit = c.to_digit(10).unwrap_or(0) as u64;
        let (v, o1) = value.overflowing_mul(10);
        let (v, o2) = v.overflowing_add(digit);
        value = v;
        overflow |= o1 | o2;
    }
    if overflow {
        diagnostics
            .report(DiagnosticKind::VectorLiteralTooWide, span)
            .arg(MAX_VECTOR_BITS)
            .emit();
    }
    TokenValue::Integer {
        value,
        xz: 0,
        width: None,
        signed: true,
        base: None,
    }
}

fn decode_vector(slice: &str, span: FileSpan, diagnostics: &mut Diagnostics) -> TokenValue {
    debug_assert!(slice.starts_with('\''));
    let mut chars = slice[1..].chars().peekable();
    let signed = matches!(chars.peek(), Some('s' | 'S'));
    if signed {
        chars.next();
    }
    let base = match chars.next() {
        Some('b' | 'B') => Base::Binary,
        Some('o' | 'O') => Base::Octal,
        Some('d' | 'D') => Base::Decimal,
        _ => Base::Hex,
    };

    let digits: Vec<char> = chars.filter(|&c| c != '_').collect();
    if digits.is_empty() {
        diagnostics
            .report(DiagnosticKind::MissingVectorDigits, span)
            .emit();
        return TokenValue::Integer {
            value: 0,
            xz: 0,
            width: None,
            signed,
            base: Some(base),
        };
    }

    if base == Base::Decimal {
        // Decimal allows either plain digits or a single x/z digit.
        if digits.len() == 1 && matches!(digits[0], 'x' | 'X' | 'z' | 'Z' | '?') {
            let z = matches!(digits[0], 'z' | 'Z' | '?');
            return TokenValue::Integer {
                value: if z { u64::MAX } else { 0 },
                xz: u64::MAX,
                width: None,
                signed,
                base: Some(base),
            };
        }
        let mut value: u64 = 0;
        let mut overflow = false;
        for &c in &digits {
            match c.to_digit(10) {
                Some(d) => {
                    let (v, o1) = value.overflowing_mul(10);
                    let (v, o2) = v.overflowing_add(d as u64);
                    value = v;
                    overflow |= o1 | o2;
                }
                None => {
                    diagnostics
                        .report(DiagnosticKind::InvalidVectorDigit, span)
                        .arg(c)
                        .arg("d")
                        .emit();
                }
            }
        }
        if overflow {
            diagnostics
                .report(DiagnosticKind::VectorLiteralTooWide, span)
                .arg(MAX_VECTOR_BITS)
                .emit();
        }
        return TokenValue::Integer {
            value,
            xz: 0,
            width: None,
            signed,
            base: Some(base),
        };
    }

    let shift = base.bits_per_digit();
    let mut value: u64 = 0;
    let mut xz: u64 = 0;
    let mut bits: u32 = 0;
    let digit_mask = (1u64 << shift) - 1;
    for &c in &digits {
        let (dv, dxz) = match c {
            'x' | 'X' => (0, digit_mask),
            'z' | 'Z' | '?' => (digit_mask, digit_mask),
            _ => match c.to_digit(base.radix()) {
                Some(d) => (d as u64, 0),
                None => {
                    diagnostics
                        .report(DiagnosticKind::InvalidVectorDigit, span)
                        .arg(c)
                        .arg(match base {
                            Base::Binary => "b",
                            Base::Octal => "o",
                            Base::Decimal => "d",
                            Base::Hex => "h",
                        })
                        .emit();
                    (0, 0)
                }
            },
        };
        bits += shift;
        if bits > MAX_VECTOR_BITS {
            diagnostics
                .report(DiagnosticKind::VectorLiteralTooWide, span)
                .arg(MAX_VECTOR_BITS)
                .emit();
            break;
        }
        value = (value << shift) | dv;
        xz = (xz << shift) | dxz;
    }

    TokenValue::Integer {
        value,
        xz,
        width: None,
        signed,
        base: Some(base),
    }
}

fn decode_unbased(slice: &str) -> TokenValue {
    let (value, xz) = match slice.as_bytes()[1] {
        b'0' => (0, 0),
        b'1' => (1, 0),
        b'x' | b'X' => (0, 1),
        _ => (1, 1),
    };
    TokenValue::Integer {
        value,
        xz,
        width: None,
        signed: false,
        base: None,
    }
}

fn decode_time(slice: &str) -> TokenValue {
    let split = slice
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(slice.len());
    let magnitude: String = slice[..split].chars().filter(|&c| c != '_').collect();
    let unit = TimeUnit::from_suffix(&slice[split..]).unwrap_or(TimeUnit::Seconds);
    TokenValue::Time {
        value: magnitude.parse().unwrap_or(0.0),
        unit,
    }
}

/// Applies escape sequences to string literal content.
pub fn decode_string(inner: &str, span: FileSpan, diagnostics: &mut Diagnostics) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('v') => out.push('\u{b}'),
            Some('f') => out.push('\u{c}'),
            Some('a') => out.push('\u{7}'),
            Some('\n') => {} // line continuation
            Some(d @ '0'..='7') => {
                let mut v = d.to_digit(8).unwrap();
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            v = v * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(v).unwrap_or('\u{fffd}'));
            }
            Some('x') => {
                let mut v = 0u32;
                let mut any = false;
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            v = v * 16 + d;
                            any = true;
                            chars.next();
                        }
                        None => break,
                    }
                }
                if any {
                    out.push(char::from_u32(v).unwrap_or('\u{fffd}'));
                } else {
                    diagnostics
                        .report(DiagnosticKind::InvalidEscapeCode, span)
                        .arg('x')
                        .emit();
                }
            }
            Some(other) => {
                diagnostics
                    .report(DiagnosticKind::InvalidEscapeCode, span)
                    .arg(other)
                    .emit();
                out.push(other);
            }
            None => {}
        }
    }
    out
}

/// Decodes the value of a literal from its tree tokens. Handles the sized
/// two-token form (`8'hFF`), adjacent string concatenation, and every single
/// token literal kind.
pub fn decode_literal_tokens(
    tokens: impl Iterator<Item = (SyntaxKind, String)>,
) -> Option<TokenValue> {
    let tokens: Vec<_> = tokens.filter(|(k, _)| !k.is_trivia()).collect();
    let mut scratch = Diagnostics::new();
    let span = FileSpan::empty(SourceId::default(), 0.into());

    match tokens.as_slice() {
        [(SyntaxKind::IntLiteral, text)] => Some(decode_decimal(text, span, &mut scratch)),
        [(SyntaxKind::VectorLiteral, text)] => Some(decode_vector(text, span, &mut scratch)),
        [(SyntaxKind::IntLiteral, size), (SyntaxKind::VectorLiteral, text)] => {
            let width = size.chars().filter(|&c| c != '_').collect::<String>().parse().ok();
            match decode_vector(text, span, &mut scratch) {
                TokenValue::Integer {
                    value, xz, signed, base, ..
                } => Some(TokenValue::Integer {
                    value,
                    xz,
                    width,
                    signed,
                    base,
                }),
                other => Some(other),
            }
        }
        [(SyntaxKind::UnbasedUnsizedLiteral, text)] => Some(decode_unbased(text)),
        [(SyntaxKind::RealLiteral, text)] => {
            let cleaned: String = text.chars().filter(|&c| c != '_').collect();
            Some(TokenValue::Real(cleaned.parse().ok()?))
        }
        [(SyntaxKind::TimeLiteral, text)] => Some(decode_time(text)),
        all if !all.is_empty() && all.iter().all(|(k, _)| *k == SyntaxKind::StringLiteral) => {
            let mut out = String::new();
            for (_, text) in all {
                if text.len() >= 2 {
                    out.push_str(&decode_string(&text[1..text.len() - 1], span, &mut scratch));
                }
            }
            Some(TokenValue::Str(out))
        }
        _ => None,
    }
}

/// Re-lexes the concatenation of two token texts. Returns the kind if the
/// result is exactly one token covering all of the text.
pub fn glue(a: &str, b: &str) -> Option<SyntaxKind> {
    let combined = format!("{a}{b}");
    let mut lexer = SyntaxKind::lexer(&combined);
    let kind = lexer.next()?.ok()?;
    if lexer.span().end == combined.len() && lexer.next().is_none() {
        Some(kind)
    } else {
        None
    }
}

/// Whether writing `a` directly before `b` would lex differently than the two
/// tokens separated by whitespace.
pub fn needs_space(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let combined = format!("{a}{b}");
    let mut lexer = SyntaxKind::lexer(&combined);
    match lexer.next() {
        Some(Ok(_)) => lexer.span().end != a.len(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svlang_core::Diagnostics;

    fn lex_text(text: &str) -> (Vec<Token>, Diagnostics, SourceManager) {
        let mut sm = SourceManager::new();
        let id = sm.add_buffer("test.sv", text);
        let mut diags = Diagnostics::new();
        let tokens = lex(&sm, id, &mut diags);
        (tokens, diags, sm)
    }

    fn kinds(tokens: &[Token]) -> Vec<SyntaxKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        let (tokens, diags, _) = lex_text("module m;");
        assert!(diags.is_empty());
        assert_eq!(
            kinds(&tokens),
            vec![
                SyntaxKind::KwModule,
                SyntaxKind::Whitespace,
                SyntaxKind::Ident,
                SyntaxKind::Semicolon,
                SyntaxKind::Eof,
            ]
        );
    }

    #[test]
    fn every_byte_lands_in_a_token() {
        let text = "wire w = 8'hF_F; // done\n";
        let (tokens, _, sm) = lex_text(text);
        let rebuilt: String = tokens.iter().map(|t| t.text(&sm)).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn vector_literal_decodes_planes() {
        let (tokens, diags, _) = lex_text("'b10x1");
        assert!(diags.is_empty());
        match tokens[0].value.as_ref().unwrap() {
            TokenValue::Integer {
                value,
                xz,
                signed,
                base,
                ..
            } => {
                assert_eq!(*value, 0b1001);
                assert_eq!(*xz, 0b0010);
                assert!(!*signed);
                assert_eq!(*base, Some(Base::Binary));
            }
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn signed_hex_literal() {
        let (tokens, _, _) = lex_text("'shFF");
        match tokens[0].value.as_ref().unwrap() {
            TokenValue::Integer { value, signed, .. } => {
                assert_eq!(*value, 0xFF);
                assert!(*signed);
            }
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn too_wide_vector_is_diagnosed() {
        let (_, diags, _) = lex_text("'h1_0000_0000_0000_0000_0");
        assert!(
            diags
                .of_kind(DiagnosticKind::VectorLiteralTooWide)
                .next()
                .is_some()
        );
    }

    #[test]
    fn time_literal() {
        let (tokens, _, _) = lex_text("10ns 1.5us");
        assert_eq!(tokens[0].kind, SyntaxKind::TimeLiteral);
        assert_eq!(
            tokens[0].value,
            Some(TokenValue::Time {
                value: 10.0,
                unit: TimeUnit::Nanoseconds
            })
        );
        assert_eq!(
            tokens[2].value,
            Some(TokenValue::Time {
                value: 1.5,
                unit: TimeUnit::Microseconds
            })
        );
    }

    #[test]
    fn string_escapes() {
        let (tokens, diags, _) = lex_text(r#""a\tb\x41\102""#);
        assert!(diags.is_empty());
        assert_eq!(
            tokens[0].value,
            Some(TokenValue::Str("a\tbAB".to_string()))
        );
    }

    #[test]
    fn unknown_escape_is_diagnosed_and_passed_through() {
        let (tokens, diags, _) = lex_text(r#""a\qb""#);
        assert_eq!(diags.of_kind(DiagnosticKind::InvalidEscapeCode).count(), 1);
        assert_eq!(tokens[0].value, Some(TokenValue::Str("aqb".to_string())));
    }

    #[test]
    fn unterminated_string_closes_at_eol() {
        let (tokens, diags, _) = lex_text("\"oops\nwire");
        assert_eq!(diags.of_kind(DiagnosticKind::UnterminatedString).count(), 1);
        assert_eq!(tokens[0].kind, SyntaxKind::StringLiteral);
        assert_eq!(tokens[1].kind, SyntaxKind::Newline);
        assert_eq!(tokens[2].kind, SyntaxKind::KwWire);
    }

    #[test]
    fn unterminated_block_comment_runs_to_eof() {
        let (tokens, diags, _) = lex_text("wire /* dangling");
        assert_eq!(
            diags
                .of_kind(DiagnosticKind::UnterminatedBlockComment)
                .count(),
            1
        );
        assert_eq!(tokens.last().unwrap().kind, SyntaxKind::Eof);
        assert_eq!(tokens[tokens.len() - 2].kind, SyntaxKind::BlockComment);
    }

    #[test]
    fn unknown_bytes_coalesce() {
        let (tokens, diags, sm) = lex_text("wire \u{1f600}\u{1f600} w;");
        assert_eq!(diags.of_kind(DiagnosticKind::UnknownToken).count(), 2);
        let errors: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == SyntaxKind::ErrorToken)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text(&sm), "\u{1f600}\u{1f600}");
    }

    #[test]
    fn escaped_identifier_runs_to_whitespace() {
        let (tokens, _, sm) = lex_text(r"\bus[0] rest");
        assert_eq!(tokens[0].kind, SyntaxKind::EscapedIdent);
        assert_eq!(tokens[0].text(&sm), r"\bus[0]");
        assert_eq!(tokens[2].kind, SyntaxKind::Ident);
    }

    #[test]
    fn directives_lex_as_single_tokens() {
        let (tokens, _, sm) = lex_text("`include `FOO ``");
        assert_eq!(tokens[0].kind, SyntaxKind::Directive);
        assert_eq!(tokens[0].text(&sm), "`include");
        assert_eq!(tokens[2].kind, SyntaxKind::Directive);
        assert_eq!(tokens[4].kind, SyntaxKind::MacroPaste);
    }

    #[test]
    fn glue_and_needs_space() {
        assert_eq!(glue("foo", "bar"), Some(SyntaxKind::Ident));
        assert_eq!(glue("<", "="), Some(SyntaxKind::LessEquals));
        assert_eq!(glue("foo", "+"), None);
        assert!(needs_space("a", "b"));
        assert!(needs_space("<", "="));
        assert!(!needs_space("a", "+"));
        assert!(!needs_space(")", "("));
    }

    #[test]
    fn compound_operators_prefer_longest_match() {
        let (tokens, _, _) = lex_text("a<<<=b===c");
        assert_eq!(
            kinds(&tokens),
            vec![
                SyntaxKind::Ident,
                SyntaxKind::ArithShiftLeftEquals,
                SyntaxKind::Ident,
                SyntaxKind::CaseEquals,
                SyntaxKind::Ident,
                SyntaxKind::Eof,
            ]
        );
    }
}
