//! Syntax kinds for SystemVerilog.
//!
//! `SyntaxKind` serves dual roles: token kinds (from the lexer) and node
//! kinds (from the parser). Logos derives token recognition; node kinds carry
//! no token/regex attributes. `SvLang` implements Rowan's `Language` trait.
//!
//! Keywords cover IEEE 1800-2017 in full; the keyword profile machinery
//! (`KeywordProfile`) demotes out-of-profile keywords to identifiers so that
//! 1364-era source keeps `logic`, `bit`, etc. available as names.

use logos::Logos;
use rowan::Language;

/// All token and node kinds. Tokens first, then nodes, then a `__LAST`
/// sentinel. `#[repr(u16)]` enables the transmute in `kind_from_raw`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // --- Keywords (IEEE 1800-2017) ---
    #[token("accept_on")]
    KwAcceptOn,

    #[token("alias")]
    KwAlias,

    #[token("always")]
    KwAlways,

    #[token("always_comb")]
    KwAlwaysComb,

    #[token("always_ff")]
    KwAlwaysFf,

    #[token("always_latch")]
    KwAlwaysLatch,

    #[token("and")]
    KwAnd,

    #[token("assert")]
    KwAssert,

    #[token("assign")]
    KwAssign,

    #[token("assume")]
    KwAssume,

    #[token("automatic")]
    KwAutomatic,

    #[token("before")]
    KwBefore,

    #[token("begin")]
    KwBegin,

    #[token("bind")]
    KwBind,

    #[token("bins")]
    KwBins,

    #[token("binsof")]
    KwBinsof,

    #[token("bit")]
    KwBit,

    #[token("break")]
    KwBreak,

    #[token("buf")]
    KwBuf,

    #[token("bufif0")]
    KwBufif0,

    #[token("bufif1")]
    KwBufif1,

    #[token("byte")]
    KwByte,

    #[token("case")]
    KwCase,

    #[token("casex")]
    KwCasex,

    #[token("casez")]
    KwCasez,

    #[token("cell")]
    KwCell,

    #[token("chandle")]
    KwChandle,

    #[token("checker")]
    KwChecker,

    #[token("class")]
    KwClass,

    #[token("clocking")]
    KwClocking,

    #[token("cmos")]
    KwCmos,

    #[token("config")]
    KwConfig,

    #[token("const")]
    KwConst,

    #[token("constraint")]
    KwConstraint,

    #[token("context")]
    KwContext,

    #[token("continue")]
    KwContinue,

    #[token("cover")]
    KwCover,

    #[token("covergroup")]
    KwCovergroup,

    #[token("coverpoint")]
    KwCoverpoint,

    #[token("cross")]
    KwCross,

    #[token("deassign")]
    KwDeassign,

    #[token("default")]
    KwDefault,

    #[token("defparam")]
    KwDefparam,

    #[token("design")]
    KwDesign,

    #[token("disable")]
    KwDisable,

    #[token("dist")]
    KwDist,

    #[token("do")]
    KwDo,

    #[token("edge")]
    KwEdge,

    #[token("else")]
    KwElse,

    #[token("end")]
    KwEnd,

    #[token("endcase")]
    KwEndcase,

    #[token("endchecker")]
    KwEndchecker,

    #[token("endclass")]
    KwEndclass,

    #[token("endclocking")]
    KwEndclocking,

    #[token("endconfig")]
    KwEndconfig,

    #[token("endfunction")]
    KwEndfunction,

    #[token("endgenerate")]
    KwEndgenerate,

    #[token("endgroup")]
    KwEndgroup,

    #[token("endinterface")]
    KwEndinterface,

    #[token("endmodule")]
    KwEndmodule,

    #[token("endpackage")]
    KwEndpackage,

    #[token("endprimitive")]
    KwEndprimitive,

    #[token("endprogram")]
    KwEndprogram,

    #[token("endproperty")]
    KwEndproperty,

    #[token("endsequence")]
    KwEndsequence,

    #[token("endspecify")]
    KwEndspecify,

    #[token("endtable")]
    KwEndtable,

    #[token("endtask")]
    KwEndtask,

    #[token("enum")]
    KwEnum,

    #[token("event")]
    KwEvent,

    #[token("eventually")]
    KwEventually,

    #[token("expect")]
    KwExpect,

    #[token("export")]
    KwExport,

    #[token("extends")]
    KwExtends,

    #[token("extern")]
    KwExtern,

    #[token("final")]
    KwFinal,

    #[token("first_match")]
    KwFirstMatch,

    #[token("for")]
    KwFor,

    #[token("force")]
    KwForce,

    #[token("foreach")]
    KwForeach,

    #[token("forever")]
    KwForever,

    #[token("fork")]
    KwFork,

    #[token("forkjoin")]
    KwForkjoin,

    #[token("function")]
    KwFunction,

    #[token("generate")]
    KwGenerate,

    #[token("genvar")]
    KwGenvar,

    #[token("global")]
    KwGlobal,

    #[token("highz0")]
    KwHighz0,

    #[token("highz1")]
    KwHighz1,

    #[token("if")]
    KwIf,

    #[token("iff")]
    KwIff,

    #[token("ifnone")]
    KwIfnone,

    #[token("ignore_bins")]
    KwIgnoreBins,

    #[token("illegal_bins")]
    KwIllegalBins,

    #[token("implements")]
    KwImplements,

    #[token("implies")]
    KwImplies,

    #[token("import")]
    KwImport,

    #[token("incdir")]
    KwIncdir,

    #[token("include")]
    KwInclude,

    #[token("initial")]
    KwInitial,

    #[token("inout")]
    KwInout,

    #[token("input")]
    KwInput,

    #[token("inside")]
    KwInside,

    #[token("instance")]
    KwInstance,

    #[token("int")]
    KwInt,

    #[token("integer")]
    KwInteger,

    #[token("interconnect")]
    KwInterconnect,

    #[token("interface")]
    KwInterface,

    #[token("intersect")]
    KwIntersect,

    #[token("join")]
    KwJoin,

    #[token("join_any")]
    KwJoinAny,

    #[token("join_none")]
    KwJoinNone,

    #[token("large")]
    KwLarge,

    #[token("let")]
    KwLet,

    #[token("liblist")]
    KwLiblist,

    #[token("library")]
    KwLibrary,

    #[token("local")]
    KwLocal,

    #[token("localparam")]
    KwLocalparam,

    #[token("logic")]
    KwLogic,

    #[token("longint")]
    KwLongint,

    #[token("macromodule")]
    KwMacromodule,

    #[token("matches")]
    KwMatches,

    #[token("medium")]
    KwMedium,

    #[token("modport")]
    KwModport,

    #[token("module")]
    KwModule,

    #[token("nand")]
    KwNand,

    #[token("negedge")]
    KwNegedge,

    #[token("nettype")]
    KwNettype,

    #[token("new")]
    KwNew,

    #[token("nexttime")]
    KwNexttime,

    #[token("nmos")]
    KwNmos,

    #[token("nor")]
    KwNor,

    #[token("noshowcancelled")]
    KwNoshowcancelled,

    #[token("not")]
    KwNot,

    #[token("notif0")]
    KwNotif0,

    #[token("notif1")]
    KwNotif1,

    #[token("null")]
    KwNull,

    #[token("or")]
    KwOr,

    #[token("output")]
    KwOutput,

    #[token("package")]
    KwPackage,

    #[token("packed")]
    KwPacked,

    #[token("parameter")]
    KwParameter,

    #[token("pmos")]
    KwPmos,

    #[token("posedge")]
    KwPosedge,

    #[token("primitive")]
    KwPrimitive,

    #[token("priority")]
    KwPriority,

    #[token("program")]
    KwProgram,

    #[token("property")]
    KwProperty,

    #[token("protected")]
    KwProtected,

    #[token("pull0")]
    KwPull0,

    #[token("pull1")]
    KwPull1,

    #[token("pulldown")]
    KwPulldown,

    #[token("pullup")]
    KwPullup,

    #[token("pulsestyle_ondetect")]
    KwPulsestyleOndetect,

    #[token("pulsestyle_onevent")]
    KwPulsestyleOnevent,

    #[token("pure")]
    KwPure,

    #[token("rand")]
    KwRand,

    #[token("randc")]
    KwRandc,

    #[token("randcase")]
    KwRandcase,

    #[token("randsequence")]
    KwRandsequence,

    #[token("rcmos")]
    KwRcmos,

    #[token("real")]
    KwReal,

    #[token("realtime")]
    KwRealtime,

    #[token("ref")]
    KwRef,

    #[token("reg")]
    KwReg,

    #[token("reject_on")]
    KwRejectOn,

    #[token("release")]
    KwRelease,

    #[token("repeat")]
    KwRepeat,

    #[token("restrict")]
    KwRestrict,

    #[token("return")]
    KwReturn,

    #[token("rnmos")]
    KwRnmos,

    #[token("rpmos")]
    KwRpmos,

    #[token("rtran")]
    KwRtran,

    #[token("rtranif0")]
    KwRtranif0,

    #[token("rtranif1")]
    KwRtranif1,

    #[token("s_always")]
    KwSAlways,

    #[token("s_eventually")]
    KwSEventually,

    #[token("s_nexttime")]
    KwSNexttime,

    #[token("s_until")]
    KwSUntil,

    #[token("s_until_with")]
    KwSUntilWith,

    #[token("scalared")]
    KwScalared,

    #[token("sequence")]
    KwSequence,

    #[token("shortint")]
    KwShortint,

    #[token("shortreal")]
    KwShortreal,

    #[token("showcancelled")]
    KwShowcancelled,

    #[token("signed")]
    KwSigned,

    #[token("small")]
    KwSmall,

    #[token("soft")]
    KwSoft,

    #[token("solve")]
    KwSolve,

    #[token("specify")]
    KwSpecify,

    #[token("specparam")]
    KwSpecparam,

    #[token("static")]
    KwStatic,

    #[token("string")]
    KwString,

    #[token("strong")]
    KwStrong,

    #[token("strong0")]
    KwStrong0,

    #[token("strong1")]
    KwStrong1,

    #[token("struct")]
    KwStruct,

    #[token("super")]
    KwSuper,

    #[token("supply0")]
    KwSupply0,

    #[token("supply1")]
    KwSupply1,

    #[token("sync_accept_on")]
    KwSyncAcceptOn,

    #[token("sync_reject_on")]
    KwSyncRejectOn,

    #[token("table")]
    KwTable,

    #[token("tagged")]
    KwTagged,

    #[token("task")]
    KwTask,

    #[token("this")]
    KwThis,

    #[token("throughout")]
    KwThroughout,

    #[token("time")]
    KwTime,

    #[token("timeprecision")]
    KwTimeprecision,

    #[token("timeunit")]
    KwTimeunit,

    #[token("tran")]
    KwTran,

    #[token("tranif0")]
    KwTranif0,

    #[token("tranif1")]
    KwTranif1,

    #[token("tri")]
    KwTri,

    #[token("tri0")]
    KwTri0,

    #[token("tri1")]
    KwTri1,

    #[token("triand")]
    KwTriand,

    #[token("trior")]
    KwTrior,

    #[token("trireg")]
    KwTrireg,

    #[token("type")]
    KwType,

    #[token("typedef")]
    KwTypedef,

    #[token("union")]
    KwUnion,

    #[token("unique")]
    KwUnique,

    #[token("unique0")]
    KwUnique0,

    #[token("unsigned")]
    KwUnsigned,

    #[token("until")]
    KwUntil,

    #[token("until_with")]
    KwUntilWith,

    #[token("untyped")]
    KwUntyped,

    #[token("use")]
    KwUse,

    #[token("uwire")]
    KwUwire,

    #[token("var")]
    KwVar,

    #[token("vectored")]
    KwVectored,

    #[token("virtual")]
    KwVirtual,

    #[token("void")]
    KwVoid,

    #[token("wait")]
    KwWait,

    #[token("wait_order")]
    KwWaitOrder,

    #[token("wand")]
    KwWand,

    #[token("weak")]
    KwWeak,

    #[token("weak0")]
    KwWeak0,

    #[token("weak1")]
    KwWeak1,

    #[token("while")]
    KwWhile,

    #[token("wildcard")]
    KwWildcard,

    #[token("wire")]
    KwWire,

    #[token("with")]
    KwWith,

    #[token("within")]
    KwWithin,

    #[token("wor")]
    KwWor,

    #[token("xnor")]
    KwXnor,

    #[token("xor")]
    KwXor,

    // --- Punctuation and operators ---

    #[token("'{")]
    ApostropheLBrace,

    #[token("'")]
    Apostrophe,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token("::")]
    ColonColon,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token(".*")]
    DotStar,

    #[token(".")]
    Dot,

    #[token("##")]
    PoundPound,

    #[token("#")]
    Pound,

    #[token("@")]
    At,

    #[token("$")]
    Dollar,

    #[token("?")]
    Question,

    #[token("+:")]
    PlusColon,

    #[token("-:")]
    MinusColon,

    #[token("++")]
    PlusPlus,

    #[token("--")]
    MinusMinus,

    #[token("+=")]
    PlusEquals,

    #[token("-=")]
    MinusEquals,

    #[token("*=")]
    StarEquals,

    #[token("/=")]
    SlashEquals,

    #[token("%=")]
    PercentEquals,

    #[token("&=")]
    AndEquals,

    #[token("|=")]
    OrEquals,

    #[token("^=")]
    XorEquals,

    #[token("<<=")]
    ShiftLeftEquals,

    #[token(">>=")]
    ShiftRightEquals,

    #[token("<<<=")]
    ArithShiftLeftEquals,

    #[token(">>>=")]
    ArithShiftRightEquals,

    #[token("**")]
    StarStar,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("===")]
    CaseEquals,

    #[token("!==")]
    CaseNotEquals,

    #[token("==?")]
    WildcardEquals,

    #[token("!=?")]
    WildcardNotEquals,

    #[token("==")]
    EqualsEquals,

    #[token("!=")]
    NotEquals,

    #[token("=>")]
    EqualsArrow,

    #[token("=")]
    Equals,

    #[token("->")]
    MinusArrow,

    #[token("<->")]
    LessMinusArrow,

    #[token("|->")]
    OrMinusArrow,

    #[token("|=>")]
    OrEqualsArrow,

    #[token("&&&")]
    TripleAnd,

    #[token("&&")]
    AndAnd,

    #[token("&")]
    And,

    #[token("||")]
    OrOr,

    #[token("|")]
    Or,

    #[token("^~")]
    XorTilde,

    #[token("~^")]
    TildeXor,

    #[token("^")]
    Xor,

    #[token("~&")]
    TildeAnd,

    #[token("~|")]
    TildeOr,

    #[token("~")]
    Tilde,

    #[token("<<<")]
    ArithShiftLeft,

    #[token(">>>")]
    ArithShiftRight,

    #[token("<<")]
    ShiftLeft,

    #[token(">>")]
    ShiftRight,

    #[token("<=")]
    LessEquals,

    #[token(">=")]
    GreaterEquals,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    #[token("!")]
    Exclam,

    // --- Literals ---

    /// Decimal integer, possibly with `_` separators.
    #[regex(r"[0-9][0-9_]*")]
    IntLiteral,

    /// Based vector literal: `'b1010`, `'shFF`, ... An optional size is a
    /// separate preceding `IntLiteral` token.
    #[regex(r"'[sS]?[dD][0-9xXzZ?_]+")]
    #[regex(r"'[sS]?[bB][01xXzZ?_]+")]
    #[regex(r"'[sS]?[oO][0-7xXzZ?_]+")]
    #[regex(r"'[sS]?[hH][0-9a-fA-FxXzZ?_]+")]
    VectorLiteral,

    /// `'0`, `'1`, `'x`, `'z`.
    #[regex(r"'[01xXzZ]")]
    UnbasedUnsizedLiteral,

    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9][0-9_]*)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9][0-9_]*")]
    RealLiteral,

    /// A number with a time unit suffix: `10ns`, `1.5us`.
    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?(s|ms|us|ns|ps|fs)")]
    TimeLiteral,

    /// Complete string literal including quotes. Escapes decode later.
    #[regex(r#""([^"\\\n]|\\.|\\\n)*""#)]
    StringLiteral,

    // --- Identifiers and directives ---

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_$]*")]
    Ident,

    /// `\top.mod[0]` style escaped identifier, through the next whitespace.
    #[regex(r"\\[!-~]+")]
    EscapedIdent,

    /// `$display`, `$fatal`, ...
    #[regex(r"\$[a-zA-Z_$][a-zA-Z0-9_$]*")]
    SystemIdent,

    /// `` `name ``: a compiler directive or macro usage.
    #[regex(r"`[a-zA-Z_][a-zA-Z0-9_$]*")]
    Directive,

    /// `` `` `` token paste inside a macro body.
    #[token("``")]
    MacroPaste,

    /// `` `" `` macro stringification quote.
    #[token("`\"")]
    MacroQuote,

    /// `` `\`" `` escaped quote inside stringification.
    #[token("`\\`\"")]
    MacroEscapedQuote,

    /// Backslash-newline line continuation (only meaningful in directives).
    #[token("\\\n")]
    #[token("\\\r\n")]
    LineContinuation,

    // --- Trivia ---

    #[regex(r"[ \t]+")]
    Whitespace,

    #[token("\n")]
    #[token("\r\n")]
    #[token("\r")]
    Newline,

    #[regex(r"//[^\n]*", allow_greedy = true)]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*+/")]
    BlockComment,

    /// The original text of a consumed preprocessor directive line.
    DirectiveTrivia,

    /// The original text of a conditional region that was not taken.
    DisabledText,

    /// Tokens skipped during error recovery.
    SkippedText,

    /// Zero-width marker at a macro expansion boundary.
    MacroMarker,

    // --- Special ---

    /// Unrecognized bytes, coalesced.
    ErrorToken,

    /// End of input. Emitted exactly once per stream; never stored in trees.
    Eof,

    // --- Node kinds (non-terminals) ---

    CompilationUnit, TimeunitsDecl, ModuleDecl, InterfaceDecl, ProgramDecl, PackageDecl,
    UdpDecl, ModuleHeader, ParameterPortList, ParameterPort, AnsiPortList, AnsiPort,
    NonAnsiPortList, NonAnsiPort, PortDecl, PackageImportDecl, PackageImportItem, PackageExportDecl,
    DataDecl, NetDecl, NettypeDecl, TypedefDecl, Declarator, Init,
    Dimension, ParameterDecl, LocalparamDecl, ParamAssignment, ContinuousAssign, AssignItem,
    DelayControl, EventControl, EventExpr, DriveStrength, ChargeStrength, GenvarDecl,
    HierarchyInstantiation, ParamValueAssignment, HierarchicalInstance, OrderedPortConnection, NamedPortConnection, WildcardPortConnection,
    ModportDecl, ModportItem, ModportSimplePortList, ModportNamedPort, ModportExplicitPort, ModportSubroutinePortList,
    ModportSubroutinePort, ModportClockingPort, ClockingDecl, ClockingItem, DefaultSkewItem, ClockingSkew,
    ClockingDeclAssign, SequenceDecl, PropertyDecl, LetDecl, AssertionPortList, AssertionPort,
    ElabSystemTask, FunctionDecl, TaskDecl, TfPortList, TfPort, ProceduralBlock,
    GenerateRegion, IfGenerate, CaseGenerate, LoopGenerate, GenerateBlock, EmptyMember,
    UdpPortList, UdpPortDecl, UdpBody, UdpInitial, UdpEntry, BlockStatement,
    ConditionalStatement, CaseStatement, CaseItem, ForLoop, ForeachLoop, WhileLoop,
    DoWhileLoop, RepeatLoop, ForeverLoop, TimingControlStatement, ExpressionStatement, AssignmentStatement,
    ProceduralAssignStatement, JumpStatement, DisableStatement, WaitStatement, EventTriggerStatement, EmptyStatement,
    VariableDeclStatement, RandsequenceStatement, RsProduction, RsRule, RsProdItem, RsCodeBlock,
    RsIfElse, RsRepeat, RsCase, RsCaseItem, WeightClause, Literal,
    NameRef, ScopedName, HierarchicalName, SelectExpr, BitSelect, RangeSelect,
    MemberExpr, CallExpr, ArgList, OrderedArg, NamedArg, UnaryExpr,
    BinaryExpr, PostfixUnaryExpr, ConditionalExpr, InsideExpr, OpenRange, ConcatExpr,
    ReplicationExpr, MultipleConcat, CastExpr, SignCastExpr, AssignmentPatternExpr, PatternMember,
    ParenExpr, MinTypMaxExpr, SequenceDelayExpr, StreamConcatExpr, ImplicitType, IntegerType,
    NamedType, EnumType, EnumMember, StructType, UnionType, StructField,
    TypeReference, ErrorNode,

    // Must be last; used for bounds checking in `kind_from_raw`.
    #[doc(hidden)]
    __LAST,
}

use SyntaxKind::*;

impl SyntaxKind {
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Whitespace
                | Newline
                | LineComment
                | BlockComment
                | DirectiveTrivia
                | DisabledText
                | SkippedText
                | MacroMarker
        )
    }

    #[inline]
    pub fn is_keyword(self) -> bool {
        (self as u16) <= (KwXor as u16)
    }

    /// The keyword profile that first introduced this keyword.
    pub fn keyword_version(self) -> Option<KeywordProfile> {
        use KeywordProfile::*;
        Some(match self {
            KwAlways | KwAnd | KwAssign | KwBegin
            | KwBuf | KwBufif0 | KwBufif1 | KwCase
            | KwCasex | KwCasez | KwCmos | KwDeassign
            | KwDefault | KwDefparam | KwDisable | KwEdge
            | KwElse | KwEnd | KwEndcase | KwEndfunction
            | KwEndmodule | KwEndprimitive | KwEndspecify | KwEndtable
            | KwEndtask | KwEvent | KwFor | KwForce
            | KwForever | KwFork | KwFunction | KwHighz0
            | KwHighz1 | KwIf | KwIfnone | KwInitial
            | KwInout | KwInput | KwInteger | KwJoin
            | KwLarge | KwMacromodule | KwMedium | KwModule
            | KwNand | KwNegedge | KwNmos | KwNor
            | KwNot | KwNotif0 | KwNotif1 | KwOr
            | KwOutput | KwParameter | KwPmos | KwPosedge
            | KwPrimitive | KwPull0 | KwPull1 | KwPulldown
            | KwPullup | KwRcmos | KwReal | KwRealtime
            | KwReg | KwRelease | KwRepeat | KwRnmos
            | KwRpmos | KwRtran | KwRtranif0 | KwRtranif1
            | KwScalared | KwSmall | KwSpecify | KwSpecparam
            | KwStrong0 | KwStrong1 | KwSupply0 | KwSupply1
            | KwTable | KwTask | KwTime | KwTran
            | KwTranif0 | KwTranif1 | KwTri | KwTri0
            | KwTri1 | KwTriand | KwTrior | KwTrireg
            | KwVectored | KwWait | KwWand | KwWeak0
            | KwWeak1 | KwWhile | KwWire | KwWor
            | KwXnor | KwXor => V1995,
            KwAutomatic | KwCell | KwConfig | KwDesign
            | KwEndconfig | KwEndgenerate | KwGenerate | KwGenvar
            | KwIncdir | KwInclude | KwInstance | KwLiblist
            | KwLibrary | KwLocalparam | KwNoshowcancelled | KwPulsestyleOndetect
            | KwPulsestyleOnevent | KwShowcancelled | KwSigned | KwUnsigned
            | KwUse => V2001,
            KwUwire => V2005,
            KwAlias | KwAlwaysComb | KwAlwaysFf | KwAlwaysLatch
            | KwAssert | KwAssume | KwBefore | KwBind
            | KwBins | KwBinsof | KwBit | KwBreak
            | KwByte | KwChandle | KwClass | KwClocking
            | KwConst | KwConstraint | KwContext | KwContinue
            | KwCover | KwCovergroup | KwCoverpoint | KwCross
            | KwDist | KwDo | KwEndclass | KwEndclocking
            | KwEndgroup | KwEndinterface | KwEndpackage | KwEndprogram
            | KwEndproperty | KwEndsequence | KwEnum | KwExpect
            | KwExport | KwExtends | KwExtern | KwFinal
            | KwFirstMatch | KwForeach | KwForkjoin | KwIff
            | KwIgnoreBins | KwIllegalBins | KwImport | KwInside
            | KwInt | KwInterface | KwIntersect | KwJoinAny
            | KwJoinNone | KwLocal | KwLogic | KwLongint
            | KwMatches | KwModport | KwNew | KwNull
            | KwPackage | KwPacked | KwPriority | KwProgram
            | KwProperty | KwProtected | KwPure | KwRand
            | KwRandc | KwRandcase | KwRandsequence | KwRef
            | KwReturn | KwSequence | KwShortint | KwShortreal
            | KwSolve | KwStatic | KwString | KwStruct
            | KwSuper | KwTagged | KwThis | KwThroughout
            | KwTimeprecision | KwTimeunit | KwType | KwTypedef
            | KwUnion | KwUnique | KwVar | KwVirtual
            | KwVoid | KwWaitOrder | KwWildcard | KwWith
            | KwWithin => Sv2005,
            KwAcceptOn | KwChecker | KwEndchecker | KwEventually
            | KwGlobal | KwImplies | KwLet | KwNexttime
            | KwRejectOn | KwRestrict | KwSAlways | KwSEventually
            | KwSNexttime | KwSUntil | KwSUntilWith | KwStrong
            | KwSyncAcceptOn | KwSyncRejectOn | KwUnique0 | KwUntil
            | KwUntilWith | KwUntyped | KwWeak => Sv2009,
            KwImplements | KwInterconnect | KwNettype | KwSoft => Sv2012,
            _ => return None,
        })
    }
}
/// A keyword profile selects which reserved words are active. Later profiles
/// are supersets of earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum KeywordProfile {
    V1995,
    V2001,
    V2005,
    Sv2005,
    Sv2009,
    Sv2012,
    #[default]
    Sv2017,
}

impl KeywordProfile {
    /// Parses a `begin_keywords` version string.
    pub fn from_version(version: &str) -> Option<Self> {
        Some(match version {
            "1364-1995" => KeywordProfile::V1995,
            "1364-2001" | "1364-2001-noconfig" => KeywordProfile::V2001,
            "1364-2005" => KeywordProfile::V2005,
            "1800-2005" => KeywordProfile::Sv2005,
            "1800-2009" => KeywordProfile::Sv2009,
            "1800-2012" => KeywordProfile::Sv2012,
            "1800-2017" => KeywordProfile::Sv2017,
            _ => return None,
        })
    }

    /// Whether `kind` is reserved under this profile.
    pub fn contains(self, kind: SyntaxKind) -> bool {
        match kind.keyword_version() {
            Some(version) => version <= self,
            None => false,
        }
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    #[inline]
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language tag for Rowan's tree types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SvLang {}

impl Language for SvLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 < __LAST as u16);
        // SAFETY: value is in bounds and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for Rowan types parameterized by our language.
pub type SyntaxNode = rowan::SyntaxNode<SvLang>;
pub type SyntaxToken = rowan::SyntaxToken<SvLang>;
pub type SyntaxElement = rowan::NodeOrToken<SyntaxNode, SyntaxToken>;

const TOKEN_SET_WORDS: usize = 6;

/// Bitset of token `SyntaxKind`s for O(1) membership testing. Sized to hold
/// every token kind (all of which precede the node kinds in the enum).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TokenSet([u64; TOKEN_SET_WORDS]);

impl TokenSet {
    pub const EMPTY: TokenSet = TokenSet([0; TOKEN_SET_WORDS]);

    /// Panics at compile time if any kind's discriminant is out of range.
    #[inline]
    pub const fn new(kinds: &[SyntaxKind]) -> Self {
        let mut bits = [0u64; TOKEN_SET_WORDS];
        let mut i = 0;
        while i < kinds.len() {
            let kind = kinds[i] as u16;
            assert!(
                kind < (TOKEN_SET_WORDS * 64) as u16,
                "SyntaxKind value exceeds TokenSet capacity"
            );
            bits[kind as usize / 64] |= 1 << (kind % 64);
            i += 1;
        }
        TokenSet(bits)
    }

    #[inline]
    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        let kind = kind as u16;
        if kind >= (TOKEN_SET_WORDS * 64) as u16 {
            return false;
        }
        self.0[kind as usize / 64] & (1 << (kind % 64)) != 0
    }

    #[inline]
    pub const fn union(self, other: TokenSet) -> TokenSet {
        let mut bits = [0u64; TOKEN_SET_WORDS];
        let mut i = 0;
        while i < TOKEN_SET_WORDS {
            bits[i] = self.0[i] | other.0[i];
            i += 1;
        }
        TokenSet(bits)
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_set();
        for i in 0..(TOKEN_SET_WORDS * 64) as u16 {
            if self.contains(unsafe { std::mem::transmute::<u16, SyntaxKind>(i) })
                && i < __LAST as u16
            {
                let kind: SyntaxKind = unsafe { std::mem::transmute(i) };
                list.entry(&kind);
            }
        }
        list.finish()
    }
}

/// Pre-defined token sets for the parser.
pub mod token_sets {
    use super::*;

    /// Kinds that can begin an integral/vector data type keyword.
    pub const INTEGER_TYPE_KEYWORDS: TokenSet = TokenSet::new(&[
        KwBit, KwLogic, KwReg, KwByte, KwShortint, KwInt, KwLongint, KwInteger, KwTime,
    ]);

    pub const REAL_TYPE_KEYWORDS: TokenSet = TokenSet::new(&[KwReal, KwShortreal, KwRealtime]);

    pub const NET_TYPE_KEYWORDS: TokenSet = TokenSet::new(&[
        KwWire, KwTri, KwTri0, KwTri1, KwTriand, KwTrior, KwTrireg, KwWand, KwWor, KwSupply0,
        KwSupply1, KwUwire, KwInterconnect,
    ]);

    pub const DIRECTION_KEYWORDS: TokenSet = TokenSet::new(&[KwInput, KwOutput, KwInout, KwRef]);

    /// FIRST set of any data type (named types need lookahead on Ident).
    pub const DATA_TYPE_FIRST: TokenSet = INTEGER_TYPE_KEYWORDS
        .union(REAL_TYPE_KEYWORDS)
        .union(TokenSet::new(&[
            KwString, KwEvent, KwChandle, KwEnum, KwStruct, KwUnion, KwVoid, KwType, Ident,
            EscapedIdent, KwSigned, KwUnsigned, LBracket,
        ]));

    /// FIRST set of an expression.
    pub const EXPR_FIRST: TokenSet = TokenSet::new(&[
        IntLiteral,
        VectorLiteral,
        UnbasedUnsizedLiteral,
        RealLiteral,
        TimeLiteral,
        StringLiteral,
        Ident,
        EscapedIdent,
        SystemIdent,
        LParen,
        LBrace,
        ApostropheLBrace,
        Plus,
        Minus,
        Exclam,
        Tilde,
        And,
        Or,
        Xor,
        TildeAnd,
        TildeOr,
        TildeXor,
        XorTilde,
        PlusPlus,
        MinusMinus,
        Dollar,
        KwNull,
        KwThis,
        KwSigned,
        KwUnsigned,
    ]);

    /// Tokens that reliably end a member; used for recovery.
    pub const MEMBER_RECOVERY: TokenSet = TokenSet::new(&[
        Semicolon, KwEndmodule, KwEndinterface, KwEndprogram, KwEndpackage, KwEndprimitive,
        KwEndfunction, KwEndtask, KwEndgenerate, KwEnd, KwEndclocking, KwEndproperty,
        KwEndsequence, KwEndtable, Eof,
    ]);

    /// Tokens that reliably end a statement; used for recovery.
    pub const STMT_RECOVERY: TokenSet = TokenSet::new(&[
        Semicolon, KwEnd, KwEndcase, KwEndmodule, KwEndfunction, KwEndtask, KwJoin, KwJoinAny,
        KwJoinNone, Eof,
    ]);

    /// Kinds that can start a module/interface/package member.
    pub const MEMBER_FIRST: TokenSet = NET_TYPE_KEYWORDS.union(TokenSet::new(&[
        KwModule, KwInterface, KwProgram, KwPackage, KwPrimitive, KwImport, KwExport, KwParameter,
        KwLocalparam, KwTypedef, KwNettype, KwGenvar, KwAssign, KwModport, KwClocking, KwDefault,
        KwSequence, KwProperty, KwLet, KwFunction, KwTask, KwInitial, KwFinal, KwAlways,
        KwAlwaysComb, KwAlwaysFf, KwAlwaysLatch, KwGenerate, KwIf, KwCase, KwFor, KwVar, KwConst,
        KwStatic, KwAutomatic, KwInput, KwOutput, KwInout, KwRef, KwTimeunit, KwTimeprecision,
        Semicolon,
    ]));
}
