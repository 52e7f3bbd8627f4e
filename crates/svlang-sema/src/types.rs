//! The interned type system.
//!
//! Types are immutable values interned in the compilation; comparing two
//! `TypeId`s answers "same type" in O(1). Enum/struct/union types carry a
//! per-declaration tag so two structurally identical declarations stay
//! distinct, which is what the language requires.

use std::collections::HashMap;
use std::fmt;

use svlang_core::intern::{Interner, Name};

/// Lightweight handle to an interned type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

/// Built-in integral type keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegralKind {
    Bit,
    Logic,
    Reg,
    Byte,
    ShortInt,
    Int,
    LongInt,
    Integer,
    Time,
}

impl IntegralKind {
    pub fn default_width(self) -> u32 {
        match self {
            IntegralKind::Bit | IntegralKind::Logic | IntegralKind::Reg => 1,
            IntegralKind::Byte => 8,
            IntegralKind::ShortInt => 16,
            IntegralKind::Int | IntegralKind::Integer => 32,
            IntegralKind::LongInt | IntegralKind::Time => 64,
        }
    }

    pub fn is_four_state(self) -> bool {
        matches!(
            self,
            IntegralKind::Logic | IntegralKind::Reg | IntegralKind::Integer | IntegralKind::Time
        )
    }

    pub fn default_signed(self) -> bool {
        matches!(
            self,
            IntegralKind::Byte
                | IntegralKind::ShortInt
                | IntegralKind::Int
                | IntegralKind::LongInt
                | IntegralKind::Integer
        )
    }

    pub fn keyword(self) -> &'static str {
        match self {
            IntegralKind::Bit => "bit",
            IntegralKind::Logic => "logic",
            IntegralKind::Reg => "reg",
            IntegralKind::Byte => "byte",
            IntegralKind::ShortInt => "shortint",
            IntegralKind::Int => "int",
            IntegralKind::LongInt => "longint",
            IntegralKind::Integer => "integer",
            IntegralKind::Time => "time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealKind {
    Real,
    ShortReal,
    RealTime,
}

/// One interned type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Stand-in after an unrecoverable resolution failure.
    Error,
    Void,
    Integral {
        kind: IntegralKind,
        signed: bool,
    },
    /// `elem [left:right]` packed dimension.
    PackedArray {
        elem: TypeId,
        left: i32,
        right: i32,
    },
    /// `elem [left:right]` unpacked dimension.
    UnpackedArray {
        elem: TypeId,
        left: i32,
        right: i32,
    },
    Real(RealKind),
    String,
    Chandle,
    Event,
    Enum {
        base: TypeId,
        /// Per-declaration tag keeping distinct enums distinct.
        decl: u32,
        name: Option<Name>,
    },
    Struct {
        packed: bool,
        fields: Vec<(Name, TypeId)>,
        decl: u32,
    },
    Union {
        packed: bool,
        fields: Vec<(Name, TypeId)>,
        decl: u32,
    },
}

/// Interner for types plus the pre-made builtins.
#[derive(Debug, Default)]
pub struct TypeInterner {
    types: Vec<Type>,
    map: HashMap<Type, TypeId>,
    next_decl_tag: u32,
}

impl TypeInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.map.get(&ty) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty.clone());
        self.map.insert(ty, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    /// Fresh tag for a new enum/struct/union declaration.
    pub fn fresh_decl_tag(&mut self) -> u32 {
        self.next_decl_tag += 1;
        self.next_decl_tag
    }

    pub fn error(&mut self) -> TypeId {
        self.intern(Type::Error)
    }

    pub fn logic(&mut self) -> TypeId {
        self.intern(Type::Integral {
            kind: IntegralKind::Logic,
            signed: false,
        })
    }

    pub fn int(&mut self) -> TypeId {
        self.intern(Type::Integral {
            kind: IntegralKind::Int,
            signed: true,
        })
    }

    pub fn integral(&mut self, kind: IntegralKind, signed: bool) -> TypeId {
        self.intern(Type::Integral { kind, signed })
    }

    pub fn packed_array(&mut self, elem: TypeId, left: i32, right: i32) -> TypeId {
        self.intern(Type::PackedArray { elem, left, right })
    }

    pub fn unpacked_array(&mut self, elem: TypeId, left: i32, right: i32) -> TypeId {
        self.intern(Type::UnpackedArray { elem, left, right })
    }

    /// Total packed bit width; None for non-integral types.
    pub fn packed_width(&self, id: TypeId) -> Option<u32> {
        match self.get(id) {
            Type::Integral { kind, .. } => Some(kind.default_width()),
            Type::PackedArray { elem, left, right } => {
                let elem_width = self.packed_width(*elem)?;
                Some(elem_width * ((left - right).unsigned_abs() + 1))
            }
            Type::Enum { base, .. } => self.packed_width(*base),
            Type::Struct { packed: true, fields, .. } => {
                fields.iter().map(|(_, t)| self.packed_width(*t)).sum()
            }
            Type::Union { packed: true, fields, .. } => fields
                .iter()
                .map(|(_, t)| self.packed_width(*t))
                .try_fold(0u32, |acc, w| w.map(|w| acc.max(w))),
            _ => None,
        }
    }

    pub fn is_integral(&self, id: TypeId) -> bool {
        matches!(
            self.get(id),
            Type::Integral { .. }
                | Type::PackedArray { .. }
                | Type::Enum { .. }
                | Type::Struct { packed: true, .. }
                | Type::Union { packed: true, .. }
        )
    }

    /// Renders a type the way a user would write it.
    pub fn display(&self, id: TypeId, names: &Interner) -> String {
        match self.get(id) {
            Type::Error => "<error>".to_string(),
            Type::Void => "void".to_string(),
            Type::Integral { kind, signed } => {
                let mut out = kind.keyword().to_string();
                if *signed != kind.default_signed() {
                    out.push_str(if *signed { " signed" } else { " unsigned" });
                }
                out
            }
            Type::PackedArray { elem, left, right } => {
                format!("{}[{left}:{right}]", self.display(*elem, names))
            }
            Type::UnpackedArray { elem, left, right } => {
                format!("{}$[{left}:{right}]", self.display(*elem, names))
            }
            Type::Real(RealKind::Real) => "real".to_string(),
            Type::Real(RealKind::ShortReal) => "shortreal".to_string(),
            Type::Real(RealKind::RealTime) => "realtime".to_string(),
            Type::String => "string".to_string(),
            Type::Chandle => "chandle".to_string(),
            Type::Event => "event".to_string(),
            Type::Enum { name, .. } => match name {
                Some(n) => format!("enum {}", names.resolve(*n)),
                None => "enum".to_string(),
            },
            Type::Struct { packed, .. } => {
                if *packed { "struct packed" } else { "struct" }.to_string()
            }
            Type::Union { packed, .. } => {
                if *packed { "union packed" } else { "union" }.to_string()
            }
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let mut types = TypeInterner::new();
        let a = types.logic();
        let b = types.integral(IntegralKind::Logic, false);
        assert_eq!(a, b);
        let c = types.integral(IntegralKind::Logic, true);
        assert_ne!(a, c);
    }

    #[test]
    fn packed_width_composes() {
        let mut types = TypeInterner::new();
        let logic = types.logic();
        let vec4 = types.packed_array(logic, 3, 0);
        assert_eq!(types.packed_width(vec4), Some(4));
        let mat = types.packed_array(vec4, 1, 0);
        assert_eq!(types.packed_width(mat), Some(8));
        let string = types.intern(Type::String);
        assert_eq!(types.packed_width(string), None);
    }

    #[test]
    fn distinct_enum_decls_stay_distinct() {
        let mut types = TypeInterner::new();
        let int = types.int();
        let tag1 = types.fresh_decl_tag();
        let tag2 = types.fresh_decl_tag();
        let e1 = types.intern(Type::Enum {
            base: int,
            decl: tag1,
            name: None,
        });
        let e2 = types.intern(Type::Enum {
            base: int,
            decl: tag2,
            name: None,
        });
        assert_ne!(e1, e2);
    }

    #[test]
    fn display_matches_source_spelling() {
        let mut types = TypeInterner::new();
        let names = Interner::new();
        let logic = types.logic();
        let vec4 = types.packed_array(logic, 3, 0);
        assert_eq!(types.display(vec4, &names), "logic[3:0]");
    }
}
