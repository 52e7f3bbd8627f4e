//! Diagnostic codes and their default severities and message templates.

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Error,
    Fatal,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Fatal => write!(f, "fatal"),
        }
    }
}

macro_rules! diagnostic_kinds {
    ($($variant:ident => ($severity:ident, $template:literal),)*) => {
        /// Stable symbolic identifier for every diagnostic the front-end can
        /// produce. Tools filter on these; the numeric value is not stable,
        /// the name is.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum DiagnosticKind {
            $($variant,)*
        }

        impl DiagnosticKind {
            /// The code name as written in suppression configuration.
            pub fn code(self) -> &'static str {
                match self {
                    $(DiagnosticKind::$variant => stringify!($variant),)*
                }
            }

            /// Default severity; the engine's policy table can override it.
            pub fn severity(self) -> Severity {
                match self {
                    $(DiagnosticKind::$variant => Severity::$severity,)*
                }
            }

            /// Message template. `{}` placeholders are substituted with the
            /// diagnostic's arguments in order.
            pub fn template(self) -> &'static str {
                match self {
                    $(DiagnosticKind::$variant => $template,)*
                }
            }
        }
    };
}

diagnostic_kinds! {
    // Lexer
    UnknownToken => (Error, "unknown character '{}' in input"),
    UnterminatedBlockComment => (Error, "block comment is not terminated"),
    UnterminatedString => (Error, "string literal is not terminated"),
    InvalidEscapeCode => (Error, "unknown character escape '\\{}'"),
    EmbeddedNull => (Error, "embedded NUL character in source text"),
    MissingVectorDigits => (Error, "vector literal has no digits"),
    InvalidVectorDigit => (Error, "digit '{}' is not valid in base '{}'"),
    VectorLiteralTooWide => (Error, "vector literal wider than {} bits is not supported"),
    MissingExponentDigits => (Error, "real literal exponent has no digits"),
    EscapedIdentifierEmpty => (Error, "escaped identifier has no body"),

    // Preprocessor
    UnknownDirective => (Error, "unknown compiler directive '`{}'"),
    UnknownMacro => (Error, "macro '{}' is not defined"),
    MacroRedefinition => (Warning, "macro '{}' redefined with a different body"),
    InvalidMacroName => (Error, "'{}' cannot be used as a macro name"),
    ExpectedMacroName => (Error, "expected macro name after directive"),
    ExpectedMacroArgs => (Error, "macro '{}' requires an argument list"),
    TooManyMacroArgs => (Error, "too many arguments to macro '{}'"),
    MissingMacroArg => (Error, "no value and no default for macro parameter '{}'"),
    UnterminatedMacroArgList => (Error, "macro argument list is not terminated"),
    MacroPasteFailed => (Error, "token paste result '{}' is not a single valid token"),
    UnbalancedConditional => (Error, "'`{}' with no matching '`ifdef'"),
    MissingEndIfDirective => (Error, "'`ifdef' region is never closed with '`endif'"),
    ExpectedIncludeFileName => (Error, "expected \"filename\" or <filename> after '`include'"),
    IncludeNotFound => (Error, "include file '{}' not found"),
    IncludeDepthExceeded => (Error, "include depth exceeds limit of {}"),
    ExpectedConditionalName => (Error, "expected macro name after conditional directive"),
    InvalidTimescale => (Error, "invalid '`timescale' specification"),
    InvalidLineDirective => (Error, "invalid '`line' directive"),
    ExpectedNetType => (Error, "expected a net type or 'none' after '`default_nettype'"),
    UnrecognizedKeywordVersion => (Error, "unrecognized keyword version '{}'"),
    MismatchedEndKeywords => (Error, "'`end_keywords' with no matching '`begin_keywords'"),

    // Parser
    ExpectedToken => (Error, "expected {}"),
    ExpectedIdentifier => (Error, "expected an identifier"),
    ExpectedExpression => (Error, "expected an expression"),
    ExpectedStatement => (Error, "expected a statement"),
    ExpectedMember => (Error, "expected a module item"),
    ExpectedDataType => (Error, "expected a data type"),
    SkippedTokens => (Error, "unexpected tokens skipped"),
    PortDeclInANSIModule => (Error, "port declarations are not allowed in a module with an ANSI port list"),
    MixedAnsiPortStyles => (Error, "cannot mix ANSI and non-ANSI port declarations"),
    DirectionOnModportExpression => (Error, "modport expression port cannot repeat a direction"),
    CaseItemRequired => (Error, "case statement has no items"),
    ExpectedProduction => (Error, "expected a randsequence production"),

    // Names and lookup
    UndeclaredIdentifier => (Error, "use of undeclared identifier '{}'"),
    UsedBeforeDeclared => (Error, "'{}' is used before its declaration"),
    DuplicateDefinition => (Error, "'{}' is already declared in this scope"),
    UnknownPackage => (Error, "unknown package '{}'"),
    ImportNameCollision => (Error, "import of '{}' collides with a local declaration"),
    UnknownModule => (Error, "unknown module, interface, or program '{}'"),
    NotAValue => (Error, "'{}' does not name a value"),
    NotAType => (Error, "'{}' is not a type"),
    NotASubroutine => (Error, "'{}' is not a task or function"),
    RecursiveDefinition => (Error, "'{}' is defined recursively"),

    // Declarations
    AutomaticNotAllowedHere => (Warning, "'automatic' is only allowed in procedural contexts; treated as static"),
    StaticInitializerMustBeExplicit => (Error, "initializing a static variable in a procedural context requires the 'static' keyword"),
    ConstVarWithoutInitializer => (Error, "'const' variable '{}' must have an initializer"),
    DelayNotAllowedOnNettype => (Error, "delay is not allowed on a net of user-defined net type"),
    NetInitializerInPackage => (Error, "nets in a package cannot have initializers"),
    ParameterHasNoValue => (Error, "parameter '{}' has no default and no override value"),
    TooManyParamAssignments => (Error, "too many parameter overrides for '{}'"),
    DuplicatePortConnection => (Error, "port '{}' is connected more than once"),
    UnknownPort => (Error, "'{}' is not a port of '{}'"),
    MismatchedTimeScales => (Error, "time scale conflicts with an earlier declaration"),

    // Clocking and modports
    MultipleDefaultInputSkew => (Error, "clocking block already has a default input skew"),
    MultipleDefaultOutputSkew => (Error, "clocking block already has a default output skew"),
    InvalidClockingSignal => (Error, "'{}' does not name a signal in the enclosing scope"),
    ClockingOutputNotAssignable => (Error, "clocking output '{}' must reference an assignable signal"),
    UnknownClockingBlock => (Error, "'{}' is not a clocking block"),
    BadModportPort => (Error, "'{}' cannot appear in a modport; only variables and nets can"),

    // Assertions
    AssertionPortDirection => (Error, "a local {} port is not allowed in a {} declaration"),
    AssertionPortOutputDefault => (Error, "a local output or inout port cannot have a default value"),

    // Primitives
    PrimitiveOutputFirst => (Error, "the output of a primitive must be its first port"),
    PrimitiveWrongOutputCount => (Error, "a primitive requires exactly one output port"),
    PrimitivePortMissing => (Error, "primitive port '{}' is never declared in the body"),
    PrimitivePortDup => (Error, "primitive port '{}' is declared more than once"),
    PrimitiveRegNotOutput => (Error, "'reg' specifier names '{}' which is not the output"),
    PrimitiveInitialInCombinational => (Error, "an 'initial' statement requires a sequential primitive"),
    PrimitiveInitialTarget => (Error, "primitive 'initial' must assign the output port"),
    PrimitiveInitVal => (Error, "primitive initial value must be 0, 1, or 1'bx"),
    UnsupportedUdpPortList => (Error, "wildcard primitive port lists are not supported"),

    // Elaboration tasks and constants
    BadFinishNum => (Error, "$fatal finish number must be 0, 1, or 2"),
    StaticAssert => (Error, "static assertion failed{}"),
    ElabTaskMessage => (Note, "{}"),
    UnknownFormatSpecifier => (Error, "unknown format specifier '%{}'"),
    ExpressionNotConstant => (Error, "expression is not constant"),
    ExpressionNotAssignable => (Error, "expression is not assignable"),
    DivideByZero => (Error, "division by zero in constant expression"),
    WrongNumberArgs => (Error, "expected {} arguments, found {}"),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_variant_names() {
        assert_eq!(DiagnosticKind::UnknownDirective.code(), "UnknownDirective");
        assert_eq!(DiagnosticKind::MismatchedTimeScales.severity(), Severity::Error);
        assert_eq!(
            DiagnosticKind::AutomaticNotAllowedHere.severity(),
            Severity::Warning
        );
    }
}
