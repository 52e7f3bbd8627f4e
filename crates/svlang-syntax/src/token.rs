//! The token model shared by the lexer, preprocessor, and parser.
//!
//! A token is a kind plus the span of original text it came from. Text is
//! never copied into the token; it is sliced out of the owning buffer in the
//! source manager on demand. Literal tokens additionally carry their decoded
//! value, and tokens produced by error recovery are flagged `missing`.

use svlang_core::source::{ExpansionId, FileSpan, SourceManager};

use crate::cst::SyntaxKind;

/// Radix of a based vector literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    Binary,
    Octal,
    Decimal,
    Hex,
}

impl Base {
    pub fn radix(self) -> u32 {
        match self {
            Base::Binary => 2,
            Base::Octal => 8,
            Base::Decimal => 10,
            Base::Hex => 16,
        }
    }

    pub fn bits_per_digit(self) -> u32 {
        match self {
            Base::Binary => 1,
            Base::Octal => 3,
            Base::Decimal => 4,
            Base::Hex => 4,
        }
    }
}

/// Time literal unit suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
    Picoseconds,
    Femtoseconds,
}

impl TimeUnit {
    pub fn from_suffix(s: &str) -> Option<Self> {
        Some(match s {
            "s" => TimeUnit::Seconds,
            "ms" => TimeUnit::Milliseconds,
            "us" => TimeUnit::Microseconds,
            "ns" => TimeUnit::Nanoseconds,
            "ps" => TimeUnit::Picoseconds,
            "fs" => TimeUnit::Femtoseconds,
            _ => return None,
        })
    }

    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Microseconds => "us",
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Picoseconds => "ps",
            TimeUnit::Femtoseconds => "fs",
        }
    }

    /// Power-of-ten exponent relative to one second.
    pub fn magnitude(self) -> i32 {
        match self {
            TimeUnit::Seconds => 0,
            TimeUnit::Milliseconds => -3,
            TimeUnit::Microseconds => -6,
            TimeUnit::Nanoseconds => -9,
            TimeUnit::Picoseconds => -12,
            TimeUnit::Femtoseconds => -15,
        }
    }
}

/// Decoded value of a literal token.
///
/// Integer values keep two bit planes slang-style: `value` holds the known
/// bits, `xz` marks positions that are x or z (an xz bit that is set in
/// `value` is z, clear is x). Widths beyond 64 bits are diagnosed at lex time.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Integer {
        value: u64,
        xz: u64,
        /// Declared bit width; `None` for unsized forms.
        width: Option<u32>,
        signed: bool,
        base: Option<Base>,
    },
    Real(f64),
    Str(String),
    Time { value: f64, unit: TimeUnit },
}

impl TokenValue {
    pub fn unsigned_of(value: u64) -> TokenValue {
        TokenValue::Integer {
            value,
            xz: 0,
            width: None,
            signed: false,
            base: None,
        }
    }
}

/// One token out of the lexer or preprocessor.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: SyntaxKind,
    /// Where the token's text lives. For macro-expanded tokens this points
    /// into the macro body; the `expansion` chain leads back to the usage.
    pub span: FileSpan,
    pub value: Option<TokenValue>,
    /// Synthesized by error recovery; prints as nothing.
    pub missing: bool,
    pub expansion: Option<ExpansionId>,
}

impl Token {
    pub fn new(kind: SyntaxKind, span: FileSpan) -> Self {
        Self {
            kind,
            span,
            value: None,
            missing: false,
            expansion: None,
        }
    }

    pub fn with_value(kind: SyntaxKind, span: FileSpan, value: TokenValue) -> Self {
        Self {
            kind,
            span,
            value: Some(value),
            missing: false,
            expansion: None,
        }
    }

    /// Zero-width synthetic token standing in for a required kind.
    pub fn missing(kind: SyntaxKind, span: FileSpan) -> Self {
        Self {
            kind,
            span,
            value: None,
            missing: true,
            expansion: None,
        }
    }

    #[inline]
    pub fn text<'a>(&self, sources: &'a SourceManager) -> &'a str {
        if self.missing {
            return "";
        }
        sources.text_slice(self.span)
    }

    #[inline]
    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }
}
