//! Constant values produced by elaboration-time evaluation.
//!
//! Integers keep the two-plane representation the lexer produces: `value`
//! holds known bits, `xz` marks unknown positions. Evaluation is
//! conservative: an unknown operand poisons the result except where the
//! language defines otherwise (case equality).

use std::fmt;
use std::hash::{Hash, Hasher};

/// A four-state integer value, capped at 64 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SvInt {
    pub value: u64,
    pub xz: u64,
    pub width: u32,
    pub signed: bool,
}

impl SvInt {
    pub fn new(value: u64, width: u32, signed: bool) -> Self {
        let width = width.clamp(1, 64);
        Self {
            value: value & Self::mask(width),
            xz: 0,
            width,
            signed,
        }
    }

    pub fn from_i64(value: i64) -> Self {
        Self {
            value: value as u64,
            xz: 0,
            width: 64,
            signed: true,
        }
    }

    fn mask(width: u32) -> u64 {
        if width >= 64 { u64::MAX } else { (1u64 << width) - 1 }
    }

    pub fn has_unknown(&self) -> bool {
        self.xz != 0
    }

    /// All-x value of a given width.
    pub fn unknown(width: u32) -> Self {
        let width = width.clamp(1, 64);
        Self {
            value: 0,
            xz: Self::mask(width),
            width,
            signed: false,
        }
    }

    /// Interprets the known bits as a signed 64-bit integer.
    pub fn as_i64(&self) -> i64 {
        if self.signed && self.width < 64 {
            let sign_bit = 1u64 << (self.width - 1);
            if self.value & sign_bit != 0 {
                return (self.value | !Self::mask(self.width)) as i64;
            }
        }
        self.value as i64
    }

    /// Truth value: true when any known bit is one. None when unknown bits
    /// make the answer ambiguous.
    pub fn to_bool(&self) -> Option<bool> {
        if self.value & !self.xz != 0 {
            return Some(true);
        }
        if self.xz != 0 {
            return None;
        }
        Some(false)
    }

    /// Resizes to `width`, truncating or extending (sign-aware).
    pub fn resize(&self, width: u32) -> SvInt {
        let width = width.clamp(1, 64);
        let extended = if self.signed { self.as_i64() as u64 } else { self.value };
        SvInt {
            value: extended & Self::mask(width),
            xz: self.xz & Self::mask(width),
            width,
            signed: self.signed,
        }
    }
}

impl fmt::Display for SvInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_unknown() {
            // Print bitwise with x/z marks.
            write!(f, "{}'b", self.width)?;
            for i in (0..self.width).rev() {
                let bit = 1u64 << i;
                let c = if self.xz & bit != 0 {
                    if self.value & bit != 0 { 'z' } else { 'x' }
                } else if self.value & bit != 0 {
                    '1'
                } else {
                    '0'
                };
                write!(f, "{c}")?;
            }
            Ok(())
        } else {
            write!(f, "{}", self.as_i64())
        }
    }
}

/// An elaboration-time constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Int(SvInt),
    Real(f64),
    Str(String),
}

impl ConstValue {
    pub fn int(value: i64) -> Self {
        ConstValue::Int(SvInt::from_i64(value))
    }

    pub fn as_int(&self) -> Option<SvInt> {
        match self {
            ConstValue::Int(v) => Some(*v),
            ConstValue::Real(r) => Some(SvInt::from_i64(*r as i64)),
            ConstValue::Str(_) => None,
        }
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            ConstValue::Int(v) => v.to_bool(),
            ConstValue::Real(r) => Some(*r != 0.0),
            ConstValue::Str(s) => Some(!s.is_empty()),
        }
    }
}

impl Eq for ConstValue {}

impl Hash for ConstValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ConstValue::Int(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            ConstValue::Real(r) => {
                1u8.hash(state);
                r.to_bits().hash(state);
            }
            ConstValue::Str(s) => {
                2u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Real(r) => write!(f, "{r}"),
            ConstValue::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Applies `$display`-style formatting: `%d %b %h %o %s %c %%` over the
/// evaluated arguments. Field widths are accepted and ignored. Unknown
/// specifiers report through the returned list.
pub fn format_message(template: &str, args: &[ConstValue]) -> (String, Vec<char>) {
    let mut out = String::with_capacity(template.len());
    let mut bad = Vec::new();
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            chars.next();
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some(spec) => format_arg(&mut out, spec, args.next(), &mut bad),
            None => out.push('%'),
        }
    }
    (out, bad)
}

fn format_arg(out: &mut String, spec: char, arg: Option<&ConstValue>, bad: &mut Vec<char>) {
    use fmt::Write;
    let Some(arg) = arg else {
        return;
    };
    match spec.to_ascii_lowercase() {
        'd' => {
            let _ = write!(out, "{arg}");
        }
        'b' => match arg.as_int() {
            Some(v) => {
                let _ = write!(out, "{:b}", v.value);
            }
            None => {
                let _ = write!(out, "{arg}");
            }
        },
        'h' | 'x' => match arg.as_int() {
            Some(v) => {
                let _ = write!(out, "{:x}", v.value);
            }
            None => {
                let _ = write!(out, "{arg}");
            }
        },
        'o' => match arg.as_int() {
            Some(v) => {
                let _ = write!(out, "{:o}", v.value);
            }
            None => {
                let _ = write!(out, "{arg}");
            }
        },
        's' => {
            let _ = write!(out, "{arg}");
        }
        'c' => {
            if let Some(v) = arg.as_int()
                && let Some(c) = char::from_u32((v.value & 0xff) as u32)
            {
                out.push(c);
            }
        }
        'm' | 't' | 'f' | 'g' | 'e' => {
            let _ = write!(out, "{arg}");
        }
        other => bad.push(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_narrowing_and_extension() {
        let v = SvInt::new(0xFF, 8, true);
        assert_eq!(v.as_i64(), -1);
        assert_eq!(v.resize(16).value, 0xFFFF);

        let u = SvInt::new(0xFF, 8, false);
        assert_eq!(u.as_i64(), 255);
        assert_eq!(u.resize(4).value, 0xF);
    }

    #[test]
    fn truthiness_with_unknowns() {
        assert_eq!(SvInt::new(0, 1, false).to_bool(), Some(false));
        assert_eq!(SvInt::new(1, 1, false).to_bool(), Some(true));
        assert_eq!(SvInt::unknown(1).to_bool(), None);
        // A known one bit wins over other unknown bits.
        let v = SvInt {
            value: 0b10,
            xz: 0b01,
            width: 2,
            signed: false,
        };
        assert_eq!(v.to_bool(), Some(true));
    }

    #[test]
    fn unknown_display_marks_bits() {
        let v = SvInt {
            value: 0b00,
            xz: 0b01,
            width: 2,
            signed: false,
        };
        assert_eq!(v.to_string(), "2'b0x");
    }

    #[test]
    fn display_style_formatting() {
        let (text, bad) = format_message(
            "count=%d hex=%h str=%s pct=%%",
            &[
                ConstValue::int(42),
                ConstValue::int(255),
                ConstValue::Str("hi".into()),
            ],
        );
        assert_eq!(text, "count=42 hex=ff str=hi pct=%");
        assert!(bad.is_empty());

        let (_, bad) = format_message("%q", &[ConstValue::int(1)]);
        assert_eq!(bad, vec!['q']);
    }
}
