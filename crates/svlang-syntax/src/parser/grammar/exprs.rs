//! Expression parsing: precedence climbing over the published operator
//! table, plus the primary/postfix zoo (names, selects, calls, casts,
//! concatenations, assignment patterns).

use svlang_core::diagnostics::DiagnosticKind;

use crate::cst::SyntaxKind::{self, *};
use crate::cst::token_sets;
use crate::parser::Parser;

/// Binding power of the conditional `?:`. Right-associative.
const COND_BP: u8 = 4;
/// Binding power of `inside`.
const INSIDE_BP: u8 = 17;
const UNARY_BP: u8 = 28;

/// `(left, right)` binding powers for infix operators. Right-associative
/// operators have `right < left`.
fn binary_bp(kind: SyntaxKind) -> Option<(u8, u8)> {
    Some(match kind {
        MinusArrow | LessMinusArrow => (2, 1),
        OrOr => (5, 6),
        AndAnd => (7, 8),
        Or => (9, 10),
        Xor | TildeXor | XorTilde => (11, 12),
        And => (13, 14),
        EqualsEquals | NotEquals | CaseEquals | CaseNotEquals | WildcardEquals
        | WildcardNotEquals => (15, 16),
        Less | LessEquals | Greater | GreaterEquals => (17, 18),
        ShiftLeft | ShiftRight | ArithShiftLeft | ArithShiftRight => (19, 20),
        Plus | Minus => (21, 22),
        Star | Slash | Percent => (23, 24),
        StarStar => (26, 25),
        _ => return None,
    })
}

impl Parser<'_> {
    pub(crate) fn parse_expr(&mut self) {
        self.parse_expr_bp(0);
    }

    /// Parses the left-hand side of a statement-level assignment: binds
    /// tighter than the comparison operators so a top-level `<=` stays
    /// available as the nonblocking assignment operator.
    pub(crate) fn parse_lvalue_expr(&mut self) {
        self.parse_expr_bp(18);
    }

    /// Parse an expression, or report and synthesize a missing name if the
    /// current token cannot start one.
    pub(crate) fn parse_expr_or_error(&mut self) -> bool {
        if self.at_expr_start() {
            self.parse_expr();
            true
        } else {
            self.error_plain(DiagnosticKind::ExpectedExpression);
            self.start_node(NameRef);
            self.missing_token(Ident);
            self.finish_node();
            false
        }
    }

    pub(crate) fn at_expr_start(&mut self) -> bool {
        self.at_set(token_sets::EXPR_FIRST) || self.at_type_keyword_cast()
    }

    fn at_type_keyword_cast(&mut self) -> bool {
        (token_sets::INTEGER_TYPE_KEYWORDS.contains(self.current())
            || token_sets::REAL_TYPE_KEYWORDS.contains(self.current())
            || self.at(KwString))
            && self.nth(1) == Apostrophe
    }

    pub(crate) fn parse_expr_bp(&mut self, min_bp: u8) {
        if !self.enter_recursion() {
            self.start_node(ErrorNode);
            while !self.at_eof() {
                self.bump();
            }
            self.finish_node();
            return;
        }

        let cp = self.checkpoint();
        self.parse_unary_or_primary();

        loop {
            let kind = self.current();

            if kind == Question && COND_BP >= min_bp {
                self.start_node_at(cp, ConditionalExpr);
                self.bump();
                self.parse_expr_bp(0);
                self.expect(Colon, "':' in conditional expression");
                self.parse_expr_bp(COND_BP - 1);
                self.finish_node();
                continue;
            }

            if kind == KwInside && INSIDE_BP >= min_bp {
                self.start_node_at(cp, InsideExpr);
                self.bump();
                self.parse_open_range_list();
                self.finish_node();
                continue;
            }

            let Some((lbp, rbp)) = binary_bp(kind) else { break };
            if lbp < min_bp {
                break;
            }
            self.start_node_at(cp, BinaryExpr);
            self.bump();
            self.parse_expr_bp(rbp);
            self.finish_node();
        }

        self.exit_recursion();
    }

    /// `{ value_range {, value_range} }` after `inside`.
    pub(crate) fn parse_open_range_list(&mut self) {
        self.expect(LBrace, "'{' after 'inside'");
        loop {
            self.parse_open_range();
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(RBrace, "'}' closing range list");
    }

    /// `expr` or `[low:high]`.
    pub(crate) fn parse_open_range(&mut self) {
        if self.at(LBracket) {
            self.start_node(OpenRange);
            self.bump();
            self.parse_expr();
            self.expect(Colon, "':' in value range");
            self.parse_expr();
            self.expect(RBracket, "']' closing value range");
            self.finish_node();
        } else {
            self.parse_expr_or_error();
        }
    }

    fn parse_unary_or_primary(&mut self) {
        match self.current() {
            Plus | Minus | Exclam | Tilde | And | Or | Xor | TildeAnd | TildeOr | TildeXor
            | XorTilde | PlusPlus | MinusMinus => {
                self.start_node(UnaryExpr);
                self.bump();
                self.parse_expr_bp(UNARY_BP);
                self.finish_node();
            }
            _ => self.parse_primary_with_postfix(),
        }
    }

    fn parse_primary_with_postfix(&mut self) {
        let cp = self.checkpoint();
        self.parse_primary();
        self.parse_postfix(cp);
    }

    fn parse_primary(&mut self) {
        match self.current() {
            IntLiteral => {
                self.start_node(Literal);
                self.bump();
                // `8'hFF`: the size and the based value are separate tokens.
                if self.at(VectorLiteral) {
                    self.bump();
                }
                self.finish_node();
            }
            VectorLiteral | UnbasedUnsizedLiteral | RealLiteral | TimeLiteral | Dollar | KwNull
            | KwThis => {
                self.start_node(Literal);
                self.bump();
                self.finish_node();
            }
            StringLiteral => {
                self.start_node(Literal);
                self.bump();
                // Adjacent string literals concatenate.
                while self.at(StringLiteral) {
                    self.bump();
                }
                self.finish_node();
            }
            Ident | EscapedIdent | SystemIdent => {
                self.start_node(NameRef);
                self.bump();
                self.finish_node();
            }
            LParen => self.parse_paren_or_min_typ_max(),
            LBrace => self.parse_concatenation(),
            ApostropheLBrace => self.parse_assignment_pattern(),
            KwSigned | KwUnsigned if self.nth(1) == Apostrophe => {
                self.start_node(SignCastExpr);
                self.bump();
                self.bump();
                self.expect(LParen, "'(' after cast");
                self.parse_expr();
                self.expect(RParen, "')' closing cast");
                self.finish_node();
            }
            kind if (token_sets::INTEGER_TYPE_KEYWORDS.contains(kind)
                || token_sets::REAL_TYPE_KEYWORDS.contains(kind)
                || kind == KwString)
                && self.nth(1) == Apostrophe =>
            {
                self.start_node(CastExpr);
                self.parse_data_type();
                self.expect(Apostrophe, "' in cast");
                self.expect(LParen, "'(' after cast");
                self.parse_expr();
                self.expect(RParen, "')' closing cast");
                self.finish_node();
            }
            KwNew => {
                self.start_node(CallExpr);
                self.start_node(NameRef);
                self.bump();
                self.finish_node();
                if self.at(LParen) {
                    self.parse_arg_list();
                }
                self.finish_node();
            }
            _ => {
                self.error_plain(DiagnosticKind::ExpectedExpression);
                self.start_node(NameRef);
                self.missing_token(Ident);
                self.finish_node();
            }
        }
    }

    fn parse_postfix(&mut self, cp: rowan::Checkpoint) {
        loop {
            match self.current() {
                ColonColon => {
                    self.start_node_at(cp, ScopedName);
                    self.bump();
                    self.expect(Ident, "name after '::'");
                    self.finish_node();
                }
                Dot => {
                    self.start_node_at(cp, MemberExpr);
                    self.bump();
                    if self.at(Ident) || self.at(EscapedIdent) {
                        self.bump();
                    } else {
                        self.expect(Ident, "member name after '.'");
                    }
                    self.finish_node();
                }
                LBracket => {
                    self.start_node_at(cp, SelectExpr);
                    self.bump();
                    self.parse_selector();
                    self.expect(RBracket, "']' closing select");
                    self.finish_node();
                }
                LParen => {
                    self.start_node_at(cp, CallExpr);
                    self.parse_arg_list();
                    self.finish_node();
                }
                Apostrophe if self.nth(1) == LParen => {
                    self.start_node_at(cp, CastExpr);
                    self.bump();
                    self.bump();
                    self.parse_expr();
                    self.expect(RParen, "')' closing cast");
                    self.finish_node();
                }
                PlusPlus | MinusMinus => {
                    self.start_node_at(cp, PostfixUnaryExpr);
                    self.bump();
                    self.finish_node();
                }
                _ => return,
            }
        }
    }

    /// `[expr]`, `[a:b]`, `[a+:w]`, `[a-:w]`, and `[$]`-style bounds.
    fn parse_selector(&mut self) {
        let cp = self.checkpoint();
        self.parse_expr_or_error();
        match self.current() {
            Colon => {
                self.start_node_at(cp, RangeSelect);
                self.bump();
                self.parse_expr_or_error();
                self.finish_node();
            }
            PlusColon | MinusColon => {
                self.start_node_at(cp, RangeSelect);
                self.bump();
                self.parse_expr_or_error();
                self.finish_node();
            }
            _ => {
                self.start_node_at(cp, BitSelect);
                self.finish_node();
            }
        }
    }

    /// `(expr)` or `(a : b : c)` min:typ:max.
    fn parse_paren_or_min_typ_max(&mut self) {
        self.start_node(ParenExpr);
        self.bump();
        let cp = self.checkpoint();
        self.parse_expr_or_error();
        if self.at(Colon) {
            self.start_node_at(cp, MinTypMaxExpr);
            self.bump();
            self.parse_expr_or_error();
            if self.eat(Colon) {
                self.parse_expr_or_error();
            }
            self.finish_node();
        }
        self.expect(RParen, "')' closing parenthesized expression");
        self.finish_node();
    }

    /// `{}`, `{a, b}`, `{n{a, b}}`, and `{<< {a}}` streams.
    fn parse_concatenation(&mut self) {
        let cp = self.checkpoint();
        self.bump(); // '{'

        if self.at(RBrace) {
            self.start_node_at(cp, ConcatExpr);
            self.bump();
            self.finish_node();
            return;
        }

        if self.at(ShiftLeft) || self.at(ShiftRight) {
            self.start_node_at(cp, StreamConcatExpr);
            self.bump();
            if !self.at(LBrace) {
                // Optional slice size before the inner concatenation.
                self.parse_expr_or_error();
            }
            self.expect(LBrace, "'{' in streaming concatenation");
            loop {
                self.parse_expr_or_error();
                if !self.eat(Comma) {
                    break;
                }
            }
            self.expect(RBrace, "'}' in streaming concatenation");
            self.expect(RBrace, "'}' closing streaming concatenation");
            self.finish_node();
            return;
        }

        self.parse_expr_or_error();

        if self.at(LBrace) {
            // `{count {items}}` replication.
            self.start_node_at(cp, ReplicationExpr);
            self.start_node(MultipleConcat);
            self.bump();
            loop {
                self.parse_expr_or_error();
                if !self.eat(Comma) {
                    break;
                }
            }
            self.expect(RBrace, "'}' closing replicated items");
            self.finish_node();
            self.expect(RBrace, "'}' closing replication");
            self.finish_node();
            return;
        }

        self.start_node_at(cp, ConcatExpr);
        while self.eat(Comma) {
            self.parse_expr_or_error();
        }
        self.expect(RBrace, "'}' closing concatenation");
        self.finish_node();
    }

    /// `'{1, 2}`, `'{default: 0}`, `'{a: 1, b: 2}`.
    fn parse_assignment_pattern(&mut self) {
        self.start_node(AssignmentPatternExpr);
        self.bump(); // '{
        if !self.at(RBrace) {
            loop {
                self.parse_pattern_member();
                if !self.eat(Comma) {
                    break;
                }
            }
        }
        self.expect(RBrace, "'}' closing assignment pattern");
        self.finish_node();
    }

    fn parse_pattern_member(&mut self) {
        let cp = self.checkpoint();
        if self.at(KwDefault) {
            self.start_node_at(cp, PatternMember);
            self.bump();
            self.expect(Colon, "':' after 'default'");
            self.parse_expr_or_error();
            self.finish_node();
            return;
        }
        self.parse_expr_or_error();
        if self.at(Colon) {
            self.start_node_at(cp, PatternMember);
            self.bump();
            self.parse_expr_or_error();
            self.finish_node();
        }
    }

    /// `( [args] )` with ordered, named (`.name(expr)`), and empty slots.
    pub(crate) fn parse_arg_list(&mut self) {
        self.start_node(ArgList);
        self.bump(); // '('
        if !self.at(RParen) {
            loop {
                self.parse_arg();
                if !self.eat(Comma) {
                    break;
                }
            }
        }
        self.expect(RParen, "')' closing argument list");
        self.finish_node();
    }

    fn parse_arg(&mut self) {
        if self.at(Dot) {
            self.start_node(NamedArg);
            self.bump();
            self.expect(Ident, "argument name after '.'");
            if self.eat(LParen) {
                if !self.at(RParen) {
                    self.parse_expr_or_error();
                }
                self.expect(RParen, "')' closing named argument");
            }
            self.finish_node();
        } else if self.at(Comma) || self.at(RParen) {
            // Empty positional slot.
            self.start_node(OrderedArg);
            self.finish_node();
        } else {
            self.start_node(OrderedArg);
            self.parse_expr_or_error();
            self.finish_node();
        }
    }
}
