//! Assertion declaration parsing: `sequence`, `property`, and `let`
//! declarations with assertion port lists, plus the sequence/property
//! expression layer (`##` delays, `|->` implication, temporal operators).

use crate::cst::SyntaxKind::{self, *};
use crate::cst::{TokenSet, token_sets};
use crate::parser::Parser;

/// Infix operators specific to sequence and property expressions.
const PROPERTY_BINOPS: TokenSet = TokenSet::new(&[
    OrMinusArrow,
    OrEqualsArrow,
    KwImplies,
    KwIff,
    KwUntil,
    KwUntilWith,
    KwSUntil,
    KwSUntilWith,
    KwOr,
    KwAnd,
]);

const SEQUENCE_BINOPS: TokenSet = TokenSet::new(&[KwThroughout, KwWithin, KwIntersect]);

const PROPERTY_PREFIXES: TokenSet = TokenSet::new(&[
    KwNot,
    KwNexttime,
    KwSNexttime,
    KwAlways,
    KwSAlways,
    KwEventually,
    KwSEventually,
    KwAcceptOn,
    KwRejectOn,
    KwSyncAcceptOn,
    KwSyncRejectOn,
]);

impl Parser<'_> {
    pub(crate) fn parse_sequence_decl(&mut self) {
        self.start_node(SequenceDecl);
        self.bump(); // sequence
        self.expect(Ident, "sequence name");
        if self.at(LParen) {
            self.parse_assertion_port_list();
        }
        self.expect(Semicolon, "';' after sequence header");
        self.parse_sequence_expr();
        self.eat(Semicolon);
        self.expect(KwEndsequence, "'endsequence'");
        if self.eat(Colon) {
            self.expect(Ident, "sequence name after ':'");
        }
        self.finish_node();
    }

    pub(crate) fn parse_property_decl(&mut self) {
        self.start_node(PropertyDecl);
        self.bump(); // property
        self.expect(Ident, "property name");
        if self.at(LParen) {
            self.parse_assertion_port_list();
        }
        self.expect(Semicolon, "';' after property header");
        self.parse_property_expr();
        self.eat(Semicolon);
        self.expect(KwEndproperty, "'endproperty'");
        if self.eat(Colon) {
            self.expect(Ident, "property name after ':'");
        }
        self.finish_node();
    }

    pub(crate) fn parse_let_decl(&mut self) {
        self.start_node(LetDecl);
        self.bump(); // let
        self.expect(Ident, "let name");
        if self.at(LParen) {
            self.parse_assertion_port_list();
        }
        self.expect(Equals, "'=' in let declaration");
        self.parse_expr_or_error();
        self.expect(Semicolon, "';' after let declaration");
        self.finish_node();
    }

    /// `( [local [direction]] [type] name [dims] [= default], ... )`
    pub(crate) fn parse_assertion_port_list(&mut self) {
        self.start_node(AssertionPortList);
        self.bump(); // '('
        if !self.at(RParen) {
            loop {
                self.parse_assertion_port();
                if !self.eat(Comma) {
                    break;
                }
            }
        }
        self.expect(RParen, "')' closing assertion ports");
        self.finish_node();
    }

    fn parse_assertion_port(&mut self) {
        self.start_node(AssertionPort);
        if self.eat(KwLocal) {
            if token_sets::DIRECTION_KEYWORDS.contains(self.current()) {
                self.bump();
            }
        }
        match self.current() {
            KwUntyped | KwSequence | KwProperty | KwEvent => {
                self.bump();
            }
            // A type is only present when a name follows it; a lone name
            // inherits the previous port's type.
            _ if self.at_data_type() => self.parse_data_type(),
            _ => {}
        }
        if self.at(Ident) || self.at(EscapedIdent) {
            self.bump();
        } else {
            self.expect(Ident, "assertion port name");
        }
        self.parse_dimensions();
        if self.at(Equals) {
            self.start_node(Init);
            self.bump();
            self.parse_property_expr();
            self.finish_node();
        }
        self.finish_node();
    }

    /// Property layer: prefixes like `not`, then sequence expressions joined
    /// by implication and temporal operators. Right-associative throughout,
    /// which matches the reference rules for implication.
    pub(crate) fn parse_property_expr(&mut self) {
        let cp = self.checkpoint();
        if self.at_set(PROPERTY_PREFIXES) {
            self.start_node(UnaryExpr);
            self.bump();
            // `nexttime [n]` / `always [n:m]` windows.
            if self.at(LBracket) {
                self.parse_dimension();
            }
            self.parse_property_expr();
            self.finish_node();
        } else {
            self.parse_sequence_expr();
        }

        while self.at_set(PROPERTY_BINOPS) {
            self.start_node_at(cp, BinaryExpr);
            self.bump();
            self.parse_property_expr();
            self.finish_node();
        }
    }

    /// Sequence layer: `##` cycle delays and sequence-only binary operators
    /// over plain boolean expressions.
    pub(crate) fn parse_sequence_expr(&mut self) {
        let cp = self.checkpoint();

        if self.at(PoundPound) {
            // Leading delay: `##1 req`.
            self.start_node(SequenceDelayExpr);
            self.parse_cycle_delay();
            self.parse_sequence_expr();
            self.finish_node();
            return;
        }

        self.parse_expr();

        loop {
            if self.at(PoundPound) {
                self.start_node_at(cp, SequenceDelayExpr);
                self.parse_cycle_delay();
                self.parse_expr();
                self.finish_node();
                continue;
            }
            if self.at_set(SEQUENCE_BINOPS) {
                self.start_node_at(cp, BinaryExpr);
                self.bump();
                self.parse_expr();
                self.finish_node();
                continue;
            }
            break;
        }
    }

    /// `##n`, `##[n:m]`, `##[+]`, `##[*]`.
    fn parse_cycle_delay(&mut self) {
        self.bump(); // '##'
        match self.current() {
            LBracket => self.parse_dimension(),
            IntLiteral => {
                self.start_node(Literal);
                self.bump();
                self.finish_node();
            }
            Ident => {
                self.start_node(NameRef);
                self.bump();
                self.finish_node();
            }
            _ => {
                self.expect(IntLiteral, "cycle delay value");
            }
        }
    }
}
