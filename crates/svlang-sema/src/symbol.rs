//! Symbol and scope storage.
//!
//! Symbols live in one flat arena owned by the compilation and reference
//! each other by `SymbolId`. A symbol that introduces a scope additionally
//! owns a `ScopeData` holding its ordered members and name map. Derived data
//! (resolved types, parameter values, skews) is computed lazily by
//! compilation queries and cached in place; the compilation's in-progress
//! set converts resolution cycles into diagnostics instead of overflows.

use indexmap::IndexMap;

use svlang_core::intern::Name;
use svlang_core::source::FileSpan;
use svlang_syntax::SyntaxNode;
use svlang_syntax::cst::SyntaxKind;

use crate::types::TypeId;
use crate::value::{ConstValue, SvInt};

/// Handle to a symbol in the compilation's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) u32);

/// Handle to a scope payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) u32);

/// A position in declaration order, used to bound unqualified lookup to
/// names declared before the point of use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LookupLocation(pub u32);

impl LookupLocation {
    /// Sees every member regardless of position.
    pub const ANYWHERE: LookupLocation = LookupLocation(u32::MAX);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    Static,
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    InOut,
    Ref,
}

impl Direction {
    pub fn from_token(kind: SyntaxKind) -> Option<Direction> {
        Some(match kind {
            SyntaxKind::KwInput => Direction::In,
            SyntaxKind::KwOutput => Direction::Out,
            SyntaxKind::KwInout => Direction::InOut,
            SyntaxKind::KwRef => Direction::Ref,
            _ => return None,
        })
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Direction::In => "input",
            Direction::Out => "output",
            Direction::InOut => "inout",
            Direction::Ref => "ref",
        }
    }
}

/// Extra properties of a value symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarFlags {
    pub is_const: bool,
    pub compiler_generated: bool,
    pub interface_var: bool,
    pub immutable: bool,
}

/// Policy flags on a declared type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeclaredTypeFlags {
    pub net_type: bool,
    pub interface_var: bool,
    pub requires_sequence_type: bool,
    pub automatic_initializer: bool,
    pub formal_arg_merge_var: bool,
}

/// A lazily resolved type slot.
///
/// Three states: unresolved (syntax only), linked (alias of another symbol's
/// declared type), resolved (an interned `TypeId`). Resolution re-entry is
/// caught by the compilation's in-progress set.
#[derive(Debug, Clone)]
pub struct DeclaredType {
    /// Owning tree index, for span-map queries on the syntax.
    pub tree: u32,
    pub type_syntax: Option<SyntaxNode>,
    /// Unpacked dimensions from the declarator.
    pub dims: Vec<SyntaxNode>,
    pub link: Option<SymbolId>,
    pub resolved: Option<TypeId>,
    pub flags: DeclaredTypeFlags,
}

impl DeclaredType {
    pub fn from_syntax(tree: u32, type_syntax: Option<SyntaxNode>) -> Self {
        Self {
            tree,
            type_syntax,
            dims: Vec::new(),
            link: None,
            resolved: None,
            flags: DeclaredTypeFlags::default(),
        }
    }

    pub fn linked(tree: u32, target: SymbolId) -> Self {
        Self {
            tree,
            type_syntax: None,
            dims: Vec::new(),
            link: Some(target),
            resolved: None,
            flags: DeclaredTypeFlags::default(),
        }
    }

    pub fn resolved(tree: u32, ty: TypeId) -> Self {
        Self {
            tree,
            type_syntax: None,
            dims: Vec::new(),
            link: None,
            resolved: Some(ty),
            flags: DeclaredTypeFlags::default(),
        }
    }
}

/// Definition flavor for module-like declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Module,
    Interface,
    Program,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Function,
    Task,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElabTaskKind {
    Fatal,
    Error,
    Warning,
    Info,
    StaticAssert,
}

impl ElabTaskKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "$fatal" => ElabTaskKind::Fatal,
            "$error" => ElabTaskKind::Error,
            "$warning" => ElabTaskKind::Warning,
            "$info" => ElabTaskKind::Info,
            "$static_assert" => ElabTaskKind::StaticAssert,
            _ => return None,
        })
    }
}

/// How a net gets its net type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetKind {
    /// Built-in net type keyword (`wire`, `trireg`, ...).
    Builtin(SyntaxKind),
    /// A `nettype` declaration.
    UserDefined(SymbolId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Posedge,
    Negedge,
    Edge,
}

/// A clocking skew: optional edge plus optional constant delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewInfo {
    pub edge: Option<EdgeKind>,
    pub delay: Option<SvInt>,
}

/// The type slot flavor of an assertion port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionPortType {
    Untyped,
    Sequence,
    Property,
    Event,
    Data,
}

/// A parameter binding value: ordinary constant or a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamValue {
    Const(ConstValue),
    Type(TypeId),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Const(v) => write!(f, "{v}"),
            ParamValue::Type(t) => write!(f, "{t}"),
        }
    }
}

/// Canonicalized parameter bindings of an instance body. Two instantiations
/// with equal keys share one body.
pub type ParamKey = Vec<(Name, ParamValue)>;

/// Everything recorded about a user-defined primitive.
#[derive(Debug, Clone)]
pub struct UdpInfo {
    pub ports: Vec<Name>,
    pub is_sequential: bool,
    pub initial_value: Option<SvInt>,
}

/// Kind tag plus kind-specific payload.
#[derive(Debug, Clone)]
pub enum SymbolKind {
    Root,
    CompilationUnit,
    Package,
    Definition {
        kind: DefinitionKind,
        tree: u32,
        syntax: SyntaxNode,
        /// Cached parameter-free realization, created on first query.
        default_body: Option<SymbolId>,
    },
    Primitive {
        info: UdpInfo,
    },
    InstanceBody {
        definition: SymbolId,
        params: ParamKey,
    },
    Instance {
        body: SymbolId,
    },
    Parameter {
        declared: DeclaredType,
        init: Option<SyntaxNode>,
        is_local: bool,
        is_type: bool,
        /// Memoized bound value; the compilation's cycle guard protects
        /// recursive references.
        value: Option<ParamValue>,
        /// Override supplied by the instantiation, already evaluated.
        override_value: Option<ParamValue>,
    },
    Variable {
        declared: DeclaredType,
        initializer: Option<SyntaxNode>,
        lifetime: Lifetime,
        flags: VarFlags,
    },
    Net {
        declared: DeclaredType,
        net_kind: NetKind,
        initializer: Option<SyntaxNode>,
        /// Parent declaration syntax, for lazy delay/strength queries.
        decl_syntax: Option<SyntaxNode>,
        delay: Option<Option<SvInt>>,
        implicit: bool,
    },
    Nettype {
        declared: DeclaredType,
        resolver: Option<Name>,
    },
    TypeAlias {
        declared: DeclaredType,
    },
    EnumValue {
        value: Option<SvInt>,
    },
    Genvar,
    ContinuousAssign {
        tree: u32,
        syntax: SyntaxNode,
    },
    EmptyMember,
    ElabTask {
        task: ElabTaskKind,
    },
    Subroutine {
        kind: SubroutineKind,
        return_type: DeclaredType,
        lifetime: Lifetime,
    },
    FormalArg {
        declared: DeclaredType,
        direction: Direction,
        default: Option<SyntaxNode>,
    },
    Modport,
    ModportPort {
        direction: Direction,
        internal: Option<SymbolId>,
    },
    ModportExplicitPort {
        direction: Direction,
    },
    ModportSubroutinePort {
        is_export: bool,
        target: Option<SymbolId>,
    },
    ModportClockingPort {
        clocking: Option<SymbolId>,
    },
    ClockingBlock {
        default_input_skew: Option<SkewInfo>,
        default_output_skew: Option<SkewInfo>,
    },
    ClockingVar {
        direction: Direction,
        input_skew: Option<SkewInfo>,
        output_skew: Option<SkewInfo>,
        declared: DeclaredType,
        initializer: Option<SyntaxNode>,
    },
    SequenceDecl,
    PropertyDecl,
    LetDecl {
        body: Option<SyntaxNode>,
    },
    AssertionPort {
        port_type: AssertionPortType,
        declared: Option<DeclaredType>,
        is_local: bool,
        direction: Option<Direction>,
        default: Option<SyntaxNode>,
    },
    ProceduralBlock {
        keyword: SyntaxKind,
    },
    GenerateBlock,
    RsProduction {
        return_type: DeclaredType,
    },
}

impl SymbolKind {
    /// Short tag for debugging and dotted-path dumps.
    pub fn tag(&self) -> &'static str {
        match self {
            SymbolKind::Root => "root",
            SymbolKind::CompilationUnit => "unit",
            SymbolKind::Package => "package",
            SymbolKind::Definition { .. } => "definition",
            SymbolKind::Primitive { .. } => "primitive",
            SymbolKind::InstanceBody { .. } => "instance-body",
            SymbolKind::Instance { .. } => "instance",
            SymbolKind::Parameter { .. } => "parameter",
            SymbolKind::Variable { .. } => "variable",
            SymbolKind::Net { .. } => "net",
            SymbolKind::Nettype { .. } => "nettype",
            SymbolKind::TypeAlias { .. } => "typedef",
            SymbolKind::EnumValue { .. } => "enum-value",
            SymbolKind::Genvar => "genvar",
            SymbolKind::ContinuousAssign { .. } => "assign",
            SymbolKind::EmptyMember => "empty",
            SymbolKind::ElabTask { .. } => "elab-task",
            SymbolKind::Subroutine { .. } => "subroutine",
            SymbolKind::FormalArg { .. } => "formal",
            SymbolKind::Modport => "modport",
            SymbolKind::ModportPort { .. } => "modport-port",
            SymbolKind::ModportExplicitPort { .. } => "modport-expr-port",
            SymbolKind::ModportSubroutinePort { .. } => "modport-subroutine",
            SymbolKind::ModportClockingPort { .. } => "modport-clocking",
            SymbolKind::ClockingBlock { .. } => "clocking",
            SymbolKind::ClockingVar { .. } => "clocking-var",
            SymbolKind::SequenceDecl => "sequence",
            SymbolKind::PropertyDecl => "property",
            SymbolKind::LetDecl { .. } => "let",
            SymbolKind::AssertionPort { .. } => "assertion-port",
            SymbolKind::ProceduralBlock { .. } => "procedural-block",
            SymbolKind::GenerateBlock => "generate-block",
            SymbolKind::RsProduction { .. } => "rs-production",
        }
    }

    /// Whether lookup may see this symbol before its declaration point.
    pub fn allow_declared_after(&self) -> bool {
        matches!(
            self,
            SymbolKind::Subroutine { .. }
                | SymbolKind::SequenceDecl
                | SymbolKind::PropertyDecl
                | SymbolKind::LetDecl { .. }
                | SymbolKind::RsProduction { .. }
                | SymbolKind::Definition { .. }
                | SymbolKind::Primitive { .. }
                | SymbolKind::Package
        )
    }
}

/// One symbol in the arena.
#[derive(Debug, Clone)]
pub struct SymbolData {
    pub name: Name,
    pub span: Option<FileSpan>,
    pub parent: Option<SymbolId>,
    /// Present when this symbol is itself a scope.
    pub scope: Option<ScopeId>,
    /// Position in global declaration order; bounds unqualified lookup.
    pub decl_index: u32,
    pub kind: SymbolKind,
}

/// A recorded wildcard import: `import pkg::*;`.
#[derive(Debug, Clone, Copy)]
pub struct WildcardImport {
    pub package: SymbolId,
    pub decl_index: u32,
}

/// Scope payload: ordered members plus name lookup structures.
#[derive(Debug, Default)]
pub struct ScopeData {
    pub members: Vec<SymbolId>,
    pub name_map: IndexMap<Name, SymbolId>,
    pub wildcard_imports: Vec<WildcardImport>,
    /// Wildcard-imported names pinned by an earlier lookup.
    pub imported: IndexMap<Name, SymbolId>,
    /// Packages whose names this scope re-exports.
    pub exports: Vec<SymbolId>,
    pub is_procedural: bool,
    pub default_lifetime: Lifetime,
}

impl Default for Lifetime {
    fn default() -> Self {
        Lifetime::Static
    }
}
