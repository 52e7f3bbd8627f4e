//! Typed wrappers for expression and type nodes.

use crate::cst::{SyntaxKind, SyntaxNode, SyntaxToken};
use crate::token::TokenValue;

use super::{ast_node, child_exprs, first_token_of};

ast_node!(Literal, Literal);
ast_node!(NameRef, NameRef);
ast_node!(ScopedName, ScopedName);
ast_node!(MemberExpr, MemberExpr);
ast_node!(SelectExpr, SelectExpr);
ast_node!(BitSelect, BitSelect);
ast_node!(RangeSelect, RangeSelect);
ast_node!(CallExpr, CallExpr);
ast_node!(ArgList, ArgList);
ast_node!(OrderedArg, OrderedArg);
ast_node!(NamedArg, NamedArg);
ast_node!(UnaryExpr, UnaryExpr);
ast_node!(BinaryExpr, BinaryExpr);
ast_node!(PostfixUnaryExpr, PostfixUnaryExpr);
ast_node!(ConditionalExpr, ConditionalExpr);
ast_node!(InsideExpr, InsideExpr);
ast_node!(OpenRange, OpenRange);
ast_node!(ConcatExpr, ConcatExpr);
ast_node!(ReplicationExpr, ReplicationExpr);
ast_node!(MultipleConcat, MultipleConcat);
ast_node!(CastExpr, CastExpr);
ast_node!(SignCastExpr, SignCastExpr);
ast_node!(AssignmentPatternExpr, AssignmentPatternExpr);
ast_node!(PatternMember, PatternMember);
ast_node!(ParenExpr, ParenExpr);
ast_node!(MinTypMaxExpr, MinTypMaxExpr);
ast_node!(SequenceDelayExpr, SequenceDelayExpr);
ast_node!(StreamConcatExpr, StreamConcatExpr);

/// Any expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Literal(Literal),
    NameRef(NameRef),
    ScopedName(ScopedName),
    MemberExpr(MemberExpr),
    SelectExpr(SelectExpr),
    CallExpr(CallExpr),
    UnaryExpr(UnaryExpr),
    BinaryExpr(BinaryExpr),
    PostfixUnaryExpr(PostfixUnaryExpr),
    ConditionalExpr(ConditionalExpr),
    InsideExpr(InsideExpr),
    ConcatExpr(ConcatExpr),
    ReplicationExpr(ReplicationExpr),
    CastExpr(CastExpr),
    SignCastExpr(SignCastExpr),
    AssignmentPatternExpr(AssignmentPatternExpr),
    ParenExpr(ParenExpr),
    MinTypMaxExpr(MinTypMaxExpr),
    SequenceDelayExpr(SequenceDelayExpr),
    StreamConcatExpr(StreamConcatExpr),
}

impl Expr {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        Some(match node.kind() {
            SyntaxKind::Literal => Expr::Literal(Literal(node)),
            SyntaxKind::NameRef => Expr::NameRef(NameRef(node)),
            SyntaxKind::ScopedName => Expr::ScopedName(ScopedName(node)),
            SyntaxKind::MemberExpr => Expr::MemberExpr(MemberExpr(node)),
            SyntaxKind::SelectExpr => Expr::SelectExpr(SelectExpr(node)),
            SyntaxKind::CallExpr => Expr::CallExpr(CallExpr(node)),
            SyntaxKind::UnaryExpr => Expr::UnaryExpr(UnaryExpr(node)),
            SyntaxKind::BinaryExpr => Expr::BinaryExpr(BinaryExpr(node)),
            SyntaxKind::PostfixUnaryExpr => Expr::PostfixUnaryExpr(PostfixUnaryExpr(node)),
            SyntaxKind::ConditionalExpr => Expr::ConditionalExpr(ConditionalExpr(node)),
            SyntaxKind::InsideExpr => Expr::InsideExpr(InsideExpr(node)),
            SyntaxKind::ConcatExpr => Expr::ConcatExpr(ConcatExpr(node)),
            SyntaxKind::ReplicationExpr => Expr::ReplicationExpr(ReplicationExpr(node)),
            SyntaxKind::CastExpr => Expr::CastExpr(CastExpr(node)),
            SyntaxKind::SignCastExpr => Expr::SignCastExpr(SignCastExpr(node)),
            SyntaxKind::AssignmentPatternExpr => {
                Expr::AssignmentPatternExpr(AssignmentPatternExpr(node))
            }
            SyntaxKind::ParenExpr => Expr::ParenExpr(ParenExpr(node)),
            SyntaxKind::MinTypMaxExpr => Expr::MinTypMaxExpr(MinTypMaxExpr(node)),
            SyntaxKind::SequenceDelayExpr => Expr::SequenceDelayExpr(SequenceDelayExpr(node)),
            SyntaxKind::StreamConcatExpr => Expr::StreamConcatExpr(StreamConcatExpr(node)),
            _ => return None,
        })
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Expr::Literal(n) => n.syntax(),
            Expr::NameRef(n) => n.syntax(),
            Expr::ScopedName(n) => n.syntax(),
            Expr::MemberExpr(n) => n.syntax(),
            Expr::SelectExpr(n) => n.syntax(),
            Expr::CallExpr(n) => n.syntax(),
            Expr::UnaryExpr(n) => n.syntax(),
            Expr::BinaryExpr(n) => n.syntax(),
            Expr::PostfixUnaryExpr(n) => n.syntax(),
            Expr::ConditionalExpr(n) => n.syntax(),
            Expr::InsideExpr(n) => n.syntax(),
            Expr::ConcatExpr(n) => n.syntax(),
            Expr::ReplicationExpr(n) => n.syntax(),
            Expr::CastExpr(n) => n.syntax(),
            Expr::SignCastExpr(n) => n.syntax(),
            Expr::AssignmentPatternExpr(n) => n.syntax(),
            Expr::ParenExpr(n) => n.syntax(),
            Expr::MinTypMaxExpr(n) => n.syntax(),
            Expr::SequenceDelayExpr(n) => n.syntax(),
            Expr::StreamConcatExpr(n) => n.syntax(),
        }
    }

    /// First child expression of a node, the workhorse for unwrapping.
    pub fn first_child(node: &SyntaxNode) -> Option<Expr> {
        node.children().find_map(Expr::cast)
    }
}

impl Literal {
    /// All literal tokens (a sized literal has a size token and a based
    /// value token; adjacent strings appear as separate tokens).
    pub fn tokens(&self) -> impl Iterator<Item = SyntaxToken> + '_ {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
    }

    /// Decodes this literal's value by re-lexing its token text.
    pub fn value(&self) -> Option<TokenValue> {
        crate::lexer::decode_literal_tokens(self.tokens().map(|t| (t.kind(), t.text().to_string())))
    }
}

impl NameRef {
    pub fn token(&self) -> Option<SyntaxToken> {
        first_token_of(
            &self.0,
            &[
                SyntaxKind::Ident,
                SyntaxKind::EscapedIdent,
                SyntaxKind::SystemIdent,
                SyntaxKind::KwNew,
            ],
        )
    }

    pub fn text(&self) -> String {
        self.token().map(|t| t.text().to_string()).unwrap_or_default()
    }
}

impl ScopedName {
    /// The scope part: a `NameRef` or a nested `ScopedName`.
    pub fn scope(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }

    /// Name after the last `::`.
    pub fn name_token(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::Ident)
            .last()
    }
}

impl MemberExpr {
    pub fn base(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }

    pub fn member_token(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| matches!(t.kind(), SyntaxKind::Ident | SyntaxKind::EscapedIdent))
            .last()
    }
}

impl SelectExpr {
    pub fn base(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }

    pub fn bit_select(&self) -> Option<BitSelect> {
        self.0.children().find_map(BitSelect::cast)
    }

    pub fn range_select(&self) -> Option<RangeSelect> {
        self.0.children().find_map(RangeSelect::cast)
    }
}

impl BitSelect {
    pub fn index(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }
}

impl RangeSelect {
    pub fn bounds(&self) -> (Option<Expr>, Option<Expr>) {
        let mut exprs = child_exprs(&self.0);
        (exprs.next(), exprs.next())
    }
}

impl CallExpr {
    pub fn callee(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }

    pub fn args(&self) -> Option<ArgList> {
        self.0.children().find_map(ArgList::cast)
    }
}

impl ArgList {
    pub fn ordered(&self) -> impl Iterator<Item = OrderedArg> + '_ {
        self.0.children().filter_map(OrderedArg::cast)
    }

    pub fn named(&self) -> impl Iterator<Item = NamedArg> + '_ {
        self.0.children().filter_map(NamedArg::cast)
    }
}

impl OrderedArg {
    pub fn expr(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }
}

impl NamedArg {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        first_token_of(&self.0, &[SyntaxKind::Ident])
    }

    pub fn expr(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }
}

impl UnaryExpr {
    pub fn op_token(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| !t.kind().is_trivia())
    }

    pub fn operand(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }
}

impl BinaryExpr {
    pub fn lhs(&self) -> Option<Expr> {
        child_exprs(&self.0).next()
    }

    pub fn rhs(&self) -> Option<Expr> {
        child_exprs(&self.0).nth(1)
    }

    pub fn op_token(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| !t.kind().is_trivia())
    }
}

impl PostfixUnaryExpr {
    pub fn operand(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }

    pub fn op_token(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| !t.kind().is_trivia())
            .last()
    }
}

impl ConditionalExpr {
    pub fn condition(&self) -> Option<Expr> {
        child_exprs(&self.0).next()
    }

    pub fn when_true(&self) -> Option<Expr> {
        child_exprs(&self.0).nth(1)
    }

    pub fn when_false(&self) -> Option<Expr> {
        child_exprs(&self.0).nth(2)
    }
}

impl InsideExpr {
    pub fn operand(&self) -> Option<Expr> {
        child_exprs(&self.0).next()
    }

    pub fn ranges(&self) -> impl Iterator<Item = SyntaxNode> + '_ {
        self.0
            .children()
            .filter(|n| n.kind() == SyntaxKind::OpenRange || Expr::cast(n.clone()).is_some())
            .skip(1)
    }
}

impl ConcatExpr {
    pub fn operands(&self) -> impl Iterator<Item = Expr> + '_ {
        child_exprs(&self.0)
    }
}

impl ReplicationExpr {
    pub fn count(&self) -> Option<Expr> {
        child_exprs(&self.0).next()
    }

    pub fn concat(&self) -> Option<MultipleConcat> {
        self.0.children().find_map(MultipleConcat::cast)
    }
}

impl MultipleConcat {
    pub fn operands(&self) -> impl Iterator<Item = Expr> + '_ {
        child_exprs(&self.0)
    }
}

impl CastExpr {
    /// Target type when the cast is written with a type keyword.
    pub fn target_type(&self) -> Option<super::DataType> {
        self.0.children().find_map(super::DataType::cast)
    }

    /// Target when written as `name'(...)` or `size'(...)`.
    pub fn target_expr(&self) -> Option<Expr> {
        child_exprs(&self.0).next()
    }

    pub fn operand(&self) -> Option<Expr> {
        child_exprs(&self.0).last()
    }
}

impl SignCastExpr {
    pub fn signing_token(&self) -> Option<SyntaxToken> {
        first_token_of(&self.0, &[SyntaxKind::KwSigned, SyntaxKind::KwUnsigned])
    }

    pub fn operand(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }
}

impl ParenExpr {
    pub fn inner(&self) -> Option<Expr> {
        Expr::first_child(&self.0)
    }
}

impl MinTypMaxExpr {
    pub fn typ(&self) -> Option<Expr> {
        child_exprs(&self.0).nth(1)
    }
}

impl AssignmentPatternExpr {
    pub fn members(&self) -> impl Iterator<Item = SyntaxNode> + '_ {
        self.0.children()
    }
}
