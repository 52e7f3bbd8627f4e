//! Typed AST wrappers over CST nodes.
//!
//! Each struct wraps a `SyntaxNode` and provides typed accessors. `cast` is
//! cheap and infallible for the right `SyntaxKind`; validation of the
//! *content* happens during elaboration, never here.

mod expr;

pub use expr::*;

use crate::cst::{SyntaxKind, SyntaxNode, SyntaxToken};

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) SyntaxNode);

        impl $name {
            pub fn cast(node: SyntaxNode) -> Option<Self> {
                (node.kind() == SyntaxKind::$kind).then(|| Self(node))
            }

            pub fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}
pub(crate) use ast_node;

/// First direct token child with one of the given kinds.
pub(crate) fn first_token_of(node: &SyntaxNode, kinds: &[SyntaxKind]) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| kinds.contains(&t.kind()))
}

/// Direct child expressions, in order.
pub(crate) fn child_exprs(node: &SyntaxNode) -> impl Iterator<Item = Expr> + '_ {
    node.children().filter_map(Expr::cast)
}

/// The declared name of a node: its first identifier token child.
pub(crate) fn name_token(node: &SyntaxNode) -> Option<SyntaxToken> {
    first_token_of(node, &[SyntaxKind::Ident, SyntaxKind::EscapedIdent])
}

// --- root and members -------------------------------------------------------

ast_node!(Root, CompilationUnit);
ast_node!(ModuleDecl, ModuleDecl);
ast_node!(InterfaceDecl, InterfaceDecl);
ast_node!(ProgramDecl, ProgramDecl);
ast_node!(PackageDecl, PackageDecl);
ast_node!(UdpDecl, UdpDecl);
ast_node!(ModuleHeader, ModuleHeader);
ast_node!(ParameterPortList, ParameterPortList);
ast_node!(ParameterPort, ParameterPort);
ast_node!(AnsiPortList, AnsiPortList);
ast_node!(AnsiPort, AnsiPort);
ast_node!(NonAnsiPortList, NonAnsiPortList);
ast_node!(NonAnsiPort, NonAnsiPort);
ast_node!(PortDecl, PortDecl);
ast_node!(PackageImportDecl, PackageImportDecl);
ast_node!(PackageImportItem, PackageImportItem);
ast_node!(PackageExportDecl, PackageExportDecl);
ast_node!(TimeunitsDecl, TimeunitsDecl);
ast_node!(DataDecl, DataDecl);
ast_node!(NetDecl, NetDecl);
ast_node!(NettypeDecl, NettypeDecl);
ast_node!(TypedefDecl, TypedefDecl);
ast_node!(Declarator, Declarator);
ast_node!(Init, Init);
ast_node!(Dimension, Dimension);
ast_node!(ParameterDecl, ParameterDecl);
ast_node!(LocalparamDecl, LocalparamDecl);
ast_node!(ParamAssignment, ParamAssignment);
ast_node!(ContinuousAssign, ContinuousAssign);
ast_node!(AssignItem, AssignItem);
ast_node!(DelayControl, DelayControl);
ast_node!(EventControl, EventControl);
ast_node!(EventExpr, EventExpr);
ast_node!(DriveStrength, DriveStrength);
ast_node!(ChargeStrength, ChargeStrength);
ast_node!(GenvarDecl, GenvarDecl);
ast_node!(HierarchyInstantiation, HierarchyInstantiation);
ast_node!(ParamValueAssignment, ParamValueAssignment);
ast_node!(HierarchicalInstance, HierarchicalInstance);
ast_node!(OrderedPortConnection, OrderedPortConnection);
ast_node!(NamedPortConnection, NamedPortConnection);
ast_node!(WildcardPortConnection, WildcardPortConnection);
ast_node!(ModportDecl, ModportDecl);
ast_node!(ModportItem, ModportItem);
ast_node!(ModportSimplePortList, ModportSimplePortList);
ast_node!(ModportNamedPort, ModportNamedPort);
ast_node!(ModportExplicitPort, ModportExplicitPort);
ast_node!(ModportSubroutinePortList, ModportSubroutinePortList);
ast_node!(ModportSubroutinePort, ModportSubroutinePort);
ast_node!(ModportClockingPort, ModportClockingPort);
ast_node!(ClockingDecl, ClockingDecl);
ast_node!(ClockingItem, ClockingItem);
ast_node!(DefaultSkewItem, DefaultSkewItem);
ast_node!(ClockingSkew, ClockingSkew);
ast_node!(ClockingDeclAssign, ClockingDeclAssign);
ast_node!(SequenceDecl, SequenceDecl);
ast_node!(PropertyDecl, PropertyDecl);
ast_node!(LetDecl, LetDecl);
ast_node!(AssertionPortList, AssertionPortList);
ast_node!(AssertionPort, AssertionPort);
ast_node!(ElabSystemTask, ElabSystemTask);
ast_node!(FunctionDecl, FunctionDecl);
ast_node!(TaskDecl, TaskDecl);
ast_node!(TfPortList, TfPortList);
ast_node!(TfPort, TfPort);
ast_node!(ProceduralBlock, ProceduralBlock);
ast_node!(GenerateRegion, GenerateRegion);
ast_node!(IfGenerate, IfGenerate);
ast_node!(CaseGenerate, CaseGenerate);
ast_node!(LoopGenerate, LoopGenerate);
ast_node!(GenerateBlock, GenerateBlock);
ast_node!(EmptyMember, EmptyMember);
ast_node!(UdpPortList, UdpPortList);
ast_node!(UdpPortDecl, UdpPortDecl);
ast_node!(UdpBody, UdpBody);
ast_node!(UdpInitial, UdpInitial);
ast_node!(UdpEntry, UdpEntry);
ast_node!(BlockStatement, BlockStatement);
ast_node!(VariableDeclStatement, VariableDeclStatement);
ast_node!(RandsequenceStatement, RandsequenceStatement);
ast_node!(RsProduction, RsProduction);
ast_node!(RsRule, RsRule);
ast_node!(RsProdItem, RsProdItem);
ast_node!(RsCodeBlock, RsCodeBlock);
ast_node!(RsIfElse, RsIfElse);
ast_node!(RsRepeat, RsRepeat);
ast_node!(RsCase, RsCase);
ast_node!(RsCaseItem, RsCaseItem);
ast_node!(WeightClause, WeightClause);

// --- type nodes -------------------------------------------------------------

ast_node!(ImplicitType, ImplicitType);
ast_node!(IntegerType, IntegerType);
ast_node!(NamedType, NamedType);
ast_node!(EnumType, EnumType);
ast_node!(EnumMember, EnumMember);
ast_node!(StructType, StructType);
ast_node!(UnionType, UnionType);
ast_node!(StructField, StructField);
ast_node!(TypeReference, TypeReference);

/// Any data type node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Implicit(ImplicitType),
    Integer(IntegerType),
    Named(NamedType),
    Enum(EnumType),
    Struct(StructType),
    Union(UnionType),
    TypeRef(TypeReference),
}

impl DataType {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        Some(match node.kind() {
            SyntaxKind::ImplicitType => DataType::Implicit(ImplicitType(node)),
            SyntaxKind::IntegerType => DataType::Integer(IntegerType(node)),
            SyntaxKind::NamedType => DataType::Named(NamedType(node)),
            SyntaxKind::EnumType => DataType::Enum(EnumType(node)),
            SyntaxKind::StructType => DataType::Struct(StructType(node)),
            SyntaxKind::UnionType => DataType::Union(UnionType(node)),
            SyntaxKind::TypeReference => DataType::TypeRef(TypeReference(node)),
            _ => return None,
        })
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            DataType::Implicit(n) => n.syntax(),
            DataType::Integer(n) => n.syntax(),
            DataType::Named(n) => n.syntax(),
            DataType::Enum(n) => n.syntax(),
            DataType::Struct(n) => n.syntax(),
            DataType::Union(n) => n.syntax(),
            DataType::TypeRef(n) => n.syntax(),
        }
    }

    pub fn of(node: &SyntaxNode) -> Option<DataType> {
        node.children().find_map(DataType::cast)
    }
}

impl IntegerType {
    pub fn keyword(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind().is_keyword())
    }

    pub fn signing(&self) -> Option<SyntaxToken> {
        first_token_of(&self.0, &[SyntaxKind::KwSigned, SyntaxKind::KwUnsigned])
    }

    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.0.children().filter_map(Dimension::cast)
    }
}

impl NamedType {
    /// The type name; the last identifier handles `pkg::name` paths.
    pub fn name_token(&self) -> Option<SyntaxToken> {
        self.0
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::Ident)
            .last()
    }

    /// Package qualifier for `pkg::name` forms.
    pub fn package_token(&self) -> Option<SyntaxToken> {
        let scoped = self.0.children().find_map(ScopedName::cast)?;
        scoped
            .scope()
            .and_then(|e| match e {
                Expr::NameRef(n) => n.token(),
                _ => None,
            })
    }

    pub fn is_scoped(&self) -> bool {
        self.0
            .children()
            .any(|n| n.kind() == SyntaxKind::ScopedName)
    }

    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.0.children().filter_map(Dimension::cast)
    }
}

impl ImplicitType {
    pub fn signing(&self) -> Option<SyntaxToken> {
        first_token_of(&self.0, &[SyntaxKind::KwSigned, SyntaxKind::KwUnsigned])
    }

    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.0.children().filter_map(Dimension::cast)
    }

    pub fn is_empty(&self) -> bool {
        self.0.children_with_tokens().next().is_none()
    }
}

impl EnumType {
    pub fn base_type(&self) -> Option<DataType> {
        DataType::of(&self.0)
    }

    pub fn members(&self) -> impl Iterator<Item = EnumMember> + '_ {
        self.0.children().filter_map(EnumMember::cast)
    }
}

impl EnumMember {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }

    pub fn init(&self) -> Option<Init> {
        self.0.children().find_map(Init::cast)
    }
}

impl StructType {
    pub fn is_packed(&self) -> bool {
        first_token_of(&self.0, &[SyntaxKind::KwPacked]).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = StructField> + '_ {
        self.0.children().filter_map(StructField::cast)
    }
}

impl UnionType {
    pub fn is_packed(&self) -> bool {
        first_token_of(&self.0, &[SyntaxKind::KwPacked]).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = StructField> + '_ {
        self.0.children().filter_map(StructField::cast)
    }
}

impl StructField {
    pub fn field_type(&self) -> Option<DataType> {
        DataType::of(&self.0)
    }

    pub fn declarators(&self) -> impl Iterator<Item = Declarator> + '_ {
        self.0.children().filter_map(Declarator::cast)
    }
}

impl Dimension {
    /// `(left, right)` bound expressions; a plain size has only `left`.
    pub fn bounds(&self) -> (Option<Expr>, Option<Expr>) {
        let mut exprs = child_exprs(&self.0);
        (exprs.next(), exprs.next())
    }

    pub fn is_range(&self) -> bool {
        first_token_of(&self.0, &[SyntaxKind::Colon]).is_some()
    }
}

// --- members ----------------------------------------------------------------

/// Any node that can appear as a member of a compilation unit, package,
/// module, interface, or program body.
#[derive(Debug, Clone)]
pub enum Member {
    Module(ModuleDecl),
    Interface(InterfaceDecl),
    Program(ProgramDecl),
    Package(PackageDecl),
    Udp(UdpDecl),
    Import(PackageImportDecl),
    Export(PackageExportDecl),
    Timeunits(TimeunitsDecl),
    Data(DataDecl),
    Net(NetDecl),
    Nettype(NettypeDecl),
    Typedef(TypedefDecl),
    Parameter(ParameterDecl),
    Localparam(LocalparamDecl),
    ContinuousAssign(ContinuousAssign),
    Genvar(GenvarDecl),
    Instantiation(HierarchyInstantiation),
    Modport(ModportDecl),
    Clocking(ClockingDecl),
    Sequence(SequenceDecl),
    Property(PropertyDecl),
    Let(LetDecl),
    ElabTask(ElabSystemTask),
    Function(FunctionDecl),
    Task(TaskDecl),
    Procedural(ProceduralBlock),
    GenerateRegion(GenerateRegion),
    IfGenerate(IfGenerate),
    CaseGenerate(CaseGenerate),
    LoopGenerate(LoopGenerate),
    GenerateBlock(GenerateBlock),
    PortDecl(PortDecl),
    Empty(EmptyMember),
}

impl Member {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        Some(match node.kind() {
            SyntaxKind::ModuleDecl => Member::Module(ModuleDecl(node)),
            SyntaxKind::InterfaceDecl => Member::Interface(InterfaceDecl(node)),
            SyntaxKind::ProgramDecl => Member::Program(ProgramDecl(node)),
            SyntaxKind::PackageDecl => Member::Package(PackageDecl(node)),
            SyntaxKind::UdpDecl => Member::Udp(UdpDecl(node)),
            SyntaxKind::PackageImportDecl => Member::Import(PackageImportDecl(node)),
            SyntaxKind::PackageExportDecl => Member::Export(PackageExportDecl(node)),
            SyntaxKind::TimeunitsDecl => Member::Timeunits(TimeunitsDecl(node)),
            SyntaxKind::DataDecl => Member::Data(DataDecl(node)),
            SyntaxKind::NetDecl => Member::Net(NetDecl(node)),
            SyntaxKind::NettypeDecl => Member::Nettype(NettypeDecl(node)),
            SyntaxKind::TypedefDecl => Member::Typedef(TypedefDecl(node)),
            SyntaxKind::ParameterDecl => Member::Parameter(ParameterDecl(node)),
            SyntaxKind::LocalparamDecl => Member::Localparam(LocalparamDecl(node)),
            SyntaxKind::ContinuousAssign => Member::ContinuousAssign(ContinuousAssign(node)),
            SyntaxKind::GenvarDecl => Member::Genvar(GenvarDecl(node)),
            SyntaxKind::HierarchyInstantiation => {
                Member::Instantiation(HierarchyInstantiation(node))
            }
            SyntaxKind::ModportDecl => Member::Modport(ModportDecl(node)),
            SyntaxKind::ClockingDecl => Member::Clocking(ClockingDecl(node)),
            SyntaxKind::SequenceDecl => Member::Sequence(SequenceDecl(node)),
            SyntaxKind::PropertyDecl => Member::Property(PropertyDecl(node)),
            SyntaxKind::LetDecl => Member::Let(LetDecl(node)),
            SyntaxKind::ElabSystemTask => Member::ElabTask(ElabSystemTask(node)),
            SyntaxKind::FunctionDecl => Member::Function(FunctionDecl(node)),
            SyntaxKind::TaskDecl => Member::Task(TaskDecl(node)),
            SyntaxKind::ProceduralBlock => Member::Procedural(ProceduralBlock(node)),
            SyntaxKind::GenerateRegion => Member::GenerateRegion(GenerateRegion(node)),
            SyntaxKind::IfGenerate => Member::IfGenerate(IfGenerate(node)),
            SyntaxKind::CaseGenerate => Member::CaseGenerate(CaseGenerate(node)),
            SyntaxKind::LoopGenerate => Member::LoopGenerate(LoopGenerate(node)),
            SyntaxKind::GenerateBlock => Member::GenerateBlock(GenerateBlock(node)),
            SyntaxKind::PortDecl => Member::PortDecl(PortDecl(node)),
            SyntaxKind::EmptyMember => Member::Empty(EmptyMember(node)),
            _ => return None,
        })
    }
}

impl Root {
    pub fn members(&self) -> impl Iterator<Item = Member> + '_ {
        self.0.children().filter_map(Member::cast)
    }
}

macro_rules! module_like_accessors {
    ($name:ident) => {
        impl $name {
            pub fn header(&self) -> Option<ModuleHeader> {
                self.0.children().find_map(ModuleHeader::cast)
            }

            pub fn name(&self) -> Option<SyntaxToken> {
                self.header().and_then(|h| name_token(h.syntax()))
            }

            pub fn members(&self) -> impl Iterator<Item = Member> + '_ {
                self.0.children().filter_map(Member::cast)
            }
        }
    };
}

module_like_accessors!(ModuleDecl);
module_like_accessors!(InterfaceDecl);
module_like_accessors!(ProgramDecl);
module_like_accessors!(PackageDecl);

impl ModuleHeader {
    pub fn parameter_ports(&self) -> Option<ParameterPortList> {
        self.0.children().find_map(ParameterPortList::cast)
    }

    pub fn ansi_ports(&self) -> Option<AnsiPortList> {
        self.0.children().find_map(AnsiPortList::cast)
    }

    pub fn non_ansi_ports(&self) -> Option<NonAnsiPortList> {
        self.0.children().find_map(NonAnsiPortList::cast)
    }
}

impl ParameterPortList {
    pub fn ports(&self) -> impl Iterator<Item = ParameterPort> + '_ {
        self.0.children().filter_map(ParameterPort::cast)
    }
}

impl ParameterPort {
    pub fn decl(&self) -> Option<Member> {
        self.0.children().find_map(Member::cast)
    }
}

impl AnsiPortList {
    pub fn ports(&self) -> impl Iterator<Item = AnsiPort> + '_ {
        self.0.children().filter_map(AnsiPort::cast)
    }
}

impl AnsiPort {
    pub fn direction(&self) -> Option<SyntaxToken> {
        first_token_of(
            &self.0,
            &[
                SyntaxKind::KwInput,
                SyntaxKind::KwOutput,
                SyntaxKind::KwInout,
                SyntaxKind::KwRef,
            ],
        )
    }

    pub fn port_type(&self) -> Option<DataType> {
        DataType::of(&self.0)
    }

    /// The port name is the last identifier token directly under the port.
    pub fn name(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| matches!(t.kind(), SyntaxKind::Ident | SyntaxKind::EscapedIdent))
            .last()
    }

    pub fn init(&self) -> Option<Init> {
        self.0.children().find_map(Init::cast)
    }

    pub fn is_net_port(&self) -> bool {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .any(|t| crate::cst::token_sets::NET_TYPE_KEYWORDS.contains(t.kind()))
    }

    pub fn is_var_port(&self) -> bool {
        first_token_of(&self.0, &[SyntaxKind::KwVar]).is_some()
    }
}

impl NonAnsiPortList {
    pub fn ports(&self) -> impl Iterator<Item = NonAnsiPort> + '_ {
        self.0.children().filter_map(NonAnsiPort::cast)
    }
}

impl NonAnsiPort {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }
}

impl PortDecl {
    pub fn direction(&self) -> Option<SyntaxToken> {
        first_token_of(
            &self.0,
            &[
                SyntaxKind::KwInput,
                SyntaxKind::KwOutput,
                SyntaxKind::KwInout,
                SyntaxKind::KwRef,
            ],
        )
    }

    pub fn port_type(&self) -> Option<DataType> {
        DataType::of(&self.0)
    }

    pub fn declarators(&self) -> impl Iterator<Item = Declarator> + '_ {
        self.0.children().filter_map(Declarator::cast)
    }
}

impl PackageImportDecl {
    pub fn items(&self) -> impl Iterator<Item = PackageImportItem> + '_ {
        self.0.children().filter_map(PackageImportItem::cast)
    }
}

impl PackageExportDecl {
    pub fn items(&self) -> impl Iterator<Item = PackageImportItem> + '_ {
        self.0.children().filter_map(PackageImportItem::cast)
    }
}

impl PackageImportItem {
    pub fn package(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }

    /// Imported name; None for wildcard imports.
    pub fn imported(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::Ident)
            .nth(1)
    }

    pub fn is_wildcard(&self) -> bool {
        first_token_of(&self.0, &[SyntaxKind::Star]).is_some()
    }
}

impl TimeunitsDecl {
    pub fn keyword(&self) -> Option<SyntaxToken> {
        first_token_of(
            &self.0,
            &[SyntaxKind::KwTimeunit, SyntaxKind::KwTimeprecision],
        )
    }

    pub fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.0.children().filter_map(Literal::cast)
    }
}

impl DataDecl {
    pub fn has_modifier(&self, kind: SyntaxKind) -> bool {
        first_token_of(&self.0, &[kind]).is_some()
    }

    pub fn decl_type(&self) -> Option<DataType> {
        DataType::of(&self.0)
    }

    pub fn declarators(&self) -> impl Iterator<Item = Declarator> + '_ {
        self.0.children().filter_map(Declarator::cast)
    }
}

impl NetDecl {
    /// The net-type keyword (`wire`, `tri`, ...).
    pub fn net_type(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| crate::cst::token_sets::NET_TYPE_KEYWORDS.contains(t.kind()))
    }

    pub fn decl_type(&self) -> Option<DataType> {
        DataType::of(&self.0)
    }

    pub fn delay(&self) -> Option<DelayControl> {
        self.0.children().find_map(DelayControl::cast)
    }

    pub fn drive_strength(&self) -> Option<DriveStrength> {
        self.0.children().find_map(DriveStrength::cast)
    }

    pub fn charge_strength(&self) -> Option<ChargeStrength> {
        self.0.children().find_map(ChargeStrength::cast)
    }

    pub fn declarators(&self) -> impl Iterator<Item = Declarator> + '_ {
        self.0.children().filter_map(Declarator::cast)
    }
}

impl NettypeDecl {
    pub fn decl_type(&self) -> Option<DataType> {
        DataType::of(&self.0)
    }

    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }

    pub fn resolver(&self) -> Option<NameRef> {
        self.0.children().find_map(NameRef::cast)
    }
}

impl TypedefDecl {
    pub fn decl_type(&self) -> Option<DataType> {
        DataType::of(&self.0)
    }

    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }
}

impl Declarator {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }

    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.0.children().filter_map(Dimension::cast)
    }

    pub fn init(&self) -> Option<Init> {
        self.0.children().find_map(Init::cast)
    }
}

impl Init {
    pub fn expr(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }

    pub fn init_type(&self) -> Option<DataType> {
        DataType::of(&self.0)
    }
}

macro_rules! param_decl_accessors {
    ($name:ident) => {
        impl $name {
            pub fn is_type_param(&self) -> bool {
                first_token_of(&self.0, &[SyntaxKind::KwType]).is_some()
            }

            pub fn decl_type(&self) -> Option<DataType> {
                DataType::of(&self.0)
            }

            pub fn assignments(&self) -> impl Iterator<Item = ParamAssignment> + '_ {
                self.0.children().filter_map(ParamAssignment::cast)
            }
        }
    };
}

param_decl_accessors!(ParameterDecl);
param_decl_accessors!(LocalparamDecl);

impl ParamAssignment {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }

    pub fn init(&self) -> Option<Init> {
        self.0.children().find_map(Init::cast)
    }
}

impl ContinuousAssign {
    pub fn delay(&self) -> Option<DelayControl> {
        self.0.children().find_map(DelayControl::cast)
    }

    pub fn items(&self) -> impl Iterator<Item = AssignItem> + '_ {
        self.0.children().filter_map(AssignItem::cast)
    }
}

impl AssignItem {
    pub fn lhs(&self) -> Option<Expr> {
        child_exprs(&self.0).next()
    }

    pub fn rhs(&self) -> Option<Expr> {
        child_exprs(&self.0).nth(1)
    }
}

impl GenvarDecl {
    pub fn declarators(&self) -> impl Iterator<Item = Declarator> + '_ {
        self.0.children().filter_map(Declarator::cast)
    }
}

impl HierarchyInstantiation {
    pub fn definition_name(&self) -> Option<SyntaxToken> {
        self.0
            .children()
            .find_map(NameRef::cast)
            .and_then(|n| n.token())
    }

    pub fn param_assignment(&self) -> Option<ParamValueAssignment> {
        self.0.children().find_map(ParamValueAssignment::cast)
    }

    pub fn instances(&self) -> impl Iterator<Item = HierarchicalInstance> + '_ {
        self.0.children().filter_map(HierarchicalInstance::cast)
    }
}

impl ParamValueAssignment {
    pub fn args(&self) -> Option<ArgList> {
        self.0.children().find_map(ArgList::cast)
    }
}

impl HierarchicalInstance {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }

    pub fn connections(&self) -> impl Iterator<Item = SyntaxNode> + '_ {
        self.0.children().filter(|n| {
            matches!(
                n.kind(),
                SyntaxKind::OrderedPortConnection
                    | SyntaxKind::NamedPortConnection
                    | SyntaxKind::WildcardPortConnection
            )
        })
    }
}

impl NamedPortConnection {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }

    pub fn expr(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }
}

impl OrderedPortConnection {
    pub fn expr(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }
}

impl ModportDecl {
    pub fn items(&self) -> impl Iterator<Item = ModportItem> + '_ {
        self.0.children().filter_map(ModportItem::cast)
    }
}

impl ModportItem {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }

    pub fn simple_port_lists(&self) -> impl Iterator<Item = ModportSimplePortList> + '_ {
        self.0.children().filter_map(ModportSimplePortList::cast)
    }

    pub fn subroutine_port_lists(&self) -> impl Iterator<Item = ModportSubroutinePortList> + '_ {
        self.0.children().filter_map(ModportSubroutinePortList::cast)
    }

    pub fn clocking_ports(&self) -> impl Iterator<Item = ModportClockingPort> + '_ {
        self.0.children().filter_map(ModportClockingPort::cast)
    }
}

impl ModportSimplePortList {
    pub fn direction(&self) -> Option<SyntaxToken> {
        first_token_of(
            &self.0,
            &[
                SyntaxKind::KwInput,
                SyntaxKind::KwOutput,
                SyntaxKind::KwInout,
                SyntaxKind::KwRef,
            ],
        )
    }

    pub fn named_ports(&self) -> impl Iterator<Item = ModportNamedPort> + '_ {
        self.0.children().filter_map(ModportNamedPort::cast)
    }

    pub fn explicit_ports(&self) -> impl Iterator<Item = ModportExplicitPort> + '_ {
        self.0.children().filter_map(ModportExplicitPort::cast)
    }
}

impl ModportNamedPort {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }
}

impl ModportExplicitPort {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }

    pub fn expr(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }
}

impl ModportSubroutinePortList {
    pub fn is_export(&self) -> bool {
        first_token_of(&self.0, &[SyntaxKind::KwExport]).is_some()
    }

    pub fn ports(&self) -> impl Iterator<Item = ModportSubroutinePort> + '_ {
        self.0.children().filter_map(ModportSubroutinePort::cast)
    }
}

impl ModportSubroutinePort {
    pub fn name(&self) -> Option<SyntaxToken> {
        self.0
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| matches!(t.kind(), SyntaxKind::Ident | SyntaxKind::EscapedIdent))
    }

    pub fn is_prototype(&self) -> bool {
        first_token_of(&self.0, &[SyntaxKind::KwTask, SyntaxKind::KwFunction]).is_some()
    }
}

impl ModportClockingPort {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }
}

impl ClockingDecl {
    pub fn is_default(&self) -> bool {
        first_token_of(&self.0, &[SyntaxKind::KwDefault]).is_some()
    }

    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }

    pub fn event(&self) -> Option<EventControl> {
        self.0.children().find_map(EventControl::cast)
    }

    pub fn default_skew_items(&self) -> impl Iterator<Item = DefaultSkewItem> + '_ {
        self.0.children().filter_map(DefaultSkewItem::cast)
    }

    pub fn items(&self) -> impl Iterator<Item = ClockingItem> + '_ {
        self.0.children().filter_map(ClockingItem::cast)
    }
}

impl DefaultSkewItem {
    /// `(input skew, output skew)` in declaration order.
    pub fn skews(&self) -> Vec<(SyntaxKind, Option<ClockingSkew>)> {
        let mut out = Vec::new();
        let mut dir: Option<SyntaxKind> = None;
        for element in self.0.children_with_tokens() {
            match element {
                rowan::NodeOrToken::Token(t)
                    if matches!(t.kind(), SyntaxKind::KwInput | SyntaxKind::KwOutput) =>
                {
                    if let Some(d) = dir.take() {
                        out.push((d, None));
                    }
                    dir = Some(t.kind());
                }
                rowan::NodeOrToken::Node(n) => {
                    if let Some(skew) = ClockingSkew::cast(n)
                        && let Some(d) = dir.take()
                    {
                        out.push((d, Some(skew)));
                    }
                }
                _ => {}
            }
        }
        if let Some(d) = dir {
            out.push((d, None));
        }
        out
    }
}

impl ClockingItem {
    pub fn directions(&self) -> impl Iterator<Item = SyntaxToken> + '_ {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| {
                matches!(
                    t.kind(),
                    SyntaxKind::KwInput | SyntaxKind::KwOutput | SyntaxKind::KwInout
                )
            })
    }

    pub fn skews(&self) -> impl Iterator<Item = ClockingSkew> + '_ {
        self.0.children().filter_map(ClockingSkew::cast)
    }

    pub fn assigns(&self) -> impl Iterator<Item = ClockingDeclAssign> + '_ {
        self.0.children().filter_map(ClockingDeclAssign::cast)
    }
}

impl ClockingDeclAssign {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }

    pub fn init(&self) -> Option<Init> {
        self.0.children().find_map(Init::cast)
    }
}

macro_rules! assertion_decl_accessors {
    ($name:ident) => {
        impl $name {
            pub fn name(&self) -> Option<SyntaxToken> {
                name_token(&self.0)
            }

            pub fn ports(&self) -> impl Iterator<Item = AssertionPort> + '_ {
                self.0
                    .children()
                    .find_map(AssertionPortList::cast)
                    .into_iter()
                    .flat_map(|l| {
                        l.syntax()
                            .children()
                            .filter_map(AssertionPort::cast)
                            .collect::<Vec<_>>()
                    })
            }
        }
    };
}

assertion_decl_accessors!(SequenceDecl);
assertion_decl_accessors!(PropertyDecl);
assertion_decl_accessors!(LetDecl);

impl LetDecl {
    pub fn body(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }
}

impl AssertionPort {
    pub fn is_local(&self) -> bool {
        first_token_of(&self.0, &[SyntaxKind::KwLocal]).is_some()
    }

    pub fn direction(&self) -> Option<SyntaxToken> {
        first_token_of(
            &self.0,
            &[
                SyntaxKind::KwInput,
                SyntaxKind::KwOutput,
                SyntaxKind::KwInout,
            ],
        )
    }

    /// The `untyped`/`sequence`/`property`/`event` keyword type, if used.
    pub fn keyword_type(&self) -> Option<SyntaxToken> {
        first_token_of(
            &self.0,
            &[
                SyntaxKind::KwUntyped,
                SyntaxKind::KwSequence,
                SyntaxKind::KwProperty,
                SyntaxKind::KwEvent,
            ],
        )
    }

    pub fn port_type(&self) -> Option<DataType> {
        DataType::of(&self.0)
    }

    /// The port name: the last identifier before any default value.
    pub fn name(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| matches!(t.kind(), SyntaxKind::Ident | SyntaxKind::EscapedIdent))
            .last()
    }

    pub fn default_value(&self) -> Option<Init> {
        self.0.children().find_map(Init::cast)
    }
}

impl ElabSystemTask {
    pub fn name(&self) -> Option<SyntaxToken> {
        first_token_of(&self.0, &[SyntaxKind::SystemIdent])
    }

    pub fn args(&self) -> Option<ArgList> {
        self.0.children().find_map(ArgList::cast)
    }
}

macro_rules! subroutine_accessors {
    ($name:ident) => {
        impl $name {
            pub fn name(&self) -> Option<SyntaxToken> {
                name_token(&self.0)
            }

            pub fn lifetime(&self) -> Option<SyntaxToken> {
                first_token_of(&self.0, &[SyntaxKind::KwAutomatic, SyntaxKind::KwStatic])
            }

            pub fn tf_ports(&self) -> impl Iterator<Item = TfPort> + '_ {
                self.0
                    .children()
                    .find_map(TfPortList::cast)
                    .into_iter()
                    .flat_map(|l| {
                        l.syntax()
                            .children()
                            .filter_map(TfPort::cast)
                            .collect::<Vec<_>>()
                    })
            }
        }
    };
}

subroutine_accessors!(FunctionDecl);
subroutine_accessors!(TaskDecl);

impl FunctionDecl {
    pub fn return_type(&self) -> Option<DataType> {
        DataType::of(&self.0)
    }
}

impl TfPort {
    pub fn direction(&self) -> Option<SyntaxToken> {
        first_token_of(
            &self.0,
            &[
                SyntaxKind::KwInput,
                SyntaxKind::KwOutput,
                SyntaxKind::KwInout,
                SyntaxKind::KwRef,
            ],
        )
    }

    pub fn port_type(&self) -> Option<DataType> {
        DataType::of(&self.0)
    }

    pub fn name(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| matches!(t.kind(), SyntaxKind::Ident | SyntaxKind::EscapedIdent))
            .last()
    }

    pub fn default_value(&self) -> Option<Init> {
        self.0.children().find_map(Init::cast)
    }
}

impl ProceduralBlock {
    pub fn keyword(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind().is_keyword())
    }
}

impl UdpDecl {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }

    pub fn port_list(&self) -> Option<UdpPortList> {
        self.0.children().find_map(UdpPortList::cast)
    }

    pub fn body(&self) -> Option<UdpBody> {
        self.0.children().find_map(UdpBody::cast)
    }
}

impl UdpPortList {
    pub fn is_wildcard(&self) -> bool {
        first_token_of(&self.0, &[SyntaxKind::DotStar, SyntaxKind::Star]).is_some()
    }

    /// ANSI-style inline declarations.
    pub fn ansi_decls(&self) -> impl Iterator<Item = UdpPortDecl> + '_ {
        self.0.children().filter_map(UdpPortDecl::cast)
    }

    /// Non-ANSI name list.
    pub fn names(&self) -> impl Iterator<Item = NonAnsiPort> + '_ {
        self.0.children().filter_map(NonAnsiPort::cast)
    }
}

impl UdpBody {
    pub fn port_decls(&self) -> impl Iterator<Item = UdpPortDecl> + '_ {
        self.0.children().filter_map(UdpPortDecl::cast)
    }

    pub fn initial(&self) -> Option<UdpInitial> {
        self.0.children().find_map(UdpInitial::cast)
    }

    pub fn entries(&self) -> impl Iterator<Item = UdpEntry> + '_ {
        self.0.children().filter_map(UdpEntry::cast)
    }
}

impl UdpPortDecl {
    pub fn direction(&self) -> Option<SyntaxToken> {
        first_token_of(&self.0, &[SyntaxKind::KwInput, SyntaxKind::KwOutput])
    }

    pub fn is_reg(&self) -> bool {
        first_token_of(&self.0, &[SyntaxKind::KwReg]).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = SyntaxToken> + '_ {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| matches!(t.kind(), SyntaxKind::Ident | SyntaxKind::EscapedIdent))
    }
}

impl UdpInitial {
    pub fn target(&self) -> Option<Expr> {
        child_exprs(&self.0).next()
    }

    pub fn value(&self) -> Option<Expr> {
        child_exprs(&self.0).nth(1)
    }
}

impl GenerateRegion {
    pub fn members(&self) -> impl Iterator<Item = Member> + '_ {
        self.0.children().filter_map(Member::cast)
    }
}

impl GenerateBlock {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }

    pub fn members(&self) -> impl Iterator<Item = Member> + '_ {
        self.0.children().filter_map(Member::cast)
    }
}

impl RandsequenceStatement {
    pub fn productions(&self) -> impl Iterator<Item = RsProduction> + '_ {
        self.0.children().filter_map(RsProduction::cast)
    }
}

impl RsProduction {
    pub fn return_type(&self) -> Option<DataType> {
        DataType::of(&self.0)
    }

    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.0)
    }

    pub fn tf_ports(&self) -> impl Iterator<Item = TfPort> + '_ {
        self.0
            .children()
            .find_map(TfPortList::cast)
            .into_iter()
            .flat_map(|l| {
                l.syntax()
                    .children()
                    .filter_map(TfPort::cast)
                    .collect::<Vec<_>>()
            })
    }

    pub fn rules(&self) -> impl Iterator<Item = RsRule> + '_ {
        self.0.children().filter_map(RsRule::cast)
    }
}

impl RsRule {
    pub fn weight(&self) -> Option<WeightClause> {
        self.0.children().find_map(WeightClause::cast)
    }

    pub fn items(&self) -> impl Iterator<Item = SyntaxNode> + '_ {
        self.0.children().filter(|n| {
            matches!(
                n.kind(),
                SyntaxKind::RsProdItem
                    | SyntaxKind::RsCodeBlock
                    | SyntaxKind::RsIfElse
                    | SyntaxKind::RsRepeat
                    | SyntaxKind::RsCase
            )
        })
    }
}

impl WeightClause {
    pub fn expr(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }
}

impl RsProdItem {
    pub fn name(&self) -> Option<SyntaxToken> {
        self.0
            .children()
            .find_map(NameRef::cast)
            .and_then(|n| n.token())
    }

    pub fn args(&self) -> Option<ArgList> {
        self.0.children().find_map(ArgList::cast)
    }
}

impl RsIfElse {
    pub fn condition(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }
}

impl RsRepeat {
    pub fn count(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }
}

impl RsCase {
    pub fn selector(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }

    pub fn items(&self) -> impl Iterator<Item = RsCaseItem> + '_ {
        self.0.children().filter_map(RsCaseItem::cast)
    }
}

impl RsCaseItem {
    pub fn is_default(&self) -> bool {
        first_token_of(&self.0, &[SyntaxKind::KwDefault]).is_some()
    }

    pub fn exprs(&self) -> impl Iterator<Item = Expr> + '_ {
        child_exprs(&self.0)
    }
}

impl EventControl {
    pub fn event_expr(&self) -> Option<EventExpr> {
        self.0.children().find_map(EventExpr::cast)
    }
}

impl DelayControl {
    pub fn expr(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }
}

impl ClockingSkew {
    pub fn edge(&self) -> Option<SyntaxToken> {
        first_token_of(
            &self.0,
            &[SyntaxKind::KwPosedge, SyntaxKind::KwNegedge, SyntaxKind::KwEdge],
        )
    }

    pub fn delay(&self) -> Option<DelayControl> {
        self.0.children().find_map(DelayControl::cast)
    }
}
