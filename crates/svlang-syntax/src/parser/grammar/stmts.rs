//! Statement parsing: procedural blocks, control flow, assignments, and
//! timing controls.

use svlang_core::diagnostics::DiagnosticKind;

use crate::cst::SyntaxKind::{self, *};
use crate::cst::{TokenSet, token_sets};
use crate::parser::Parser;

const ASSIGN_OPS: TokenSet = TokenSet::new(&[
    Equals,
    LessEquals,
    PlusEquals,
    MinusEquals,
    StarEquals,
    SlashEquals,
    PercentEquals,
    AndEquals,
    OrEquals,
    XorEquals,
    ShiftLeftEquals,
    ShiftRightEquals,
    ArithShiftLeftEquals,
    ArithShiftRightEquals,
]);

impl Parser<'_> {
    pub(crate) fn parse_statement(&mut self) {
        match self.current() {
            Semicolon => {
                self.start_node(EmptyStatement);
                self.bump();
                self.finish_node();
            }
            KwBegin | KwFork => self.parse_block(),
            KwUnique | KwUnique0 | KwPriority => {
                // Modifier applies to the following if or case.
                match self.nth(1) {
                    KwIf => self.parse_conditional(),
                    _ => self.parse_case(),
                }
            }
            KwIf => self.parse_conditional(),
            KwCase | KwCasex | KwCasez => self.parse_case(),
            KwFor => self.parse_for(),
            KwForeach => self.parse_foreach(),
            KwWhile => {
                self.start_node(WhileLoop);
                self.bump();
                self.expect(LParen, "'(' after 'while'");
                self.parse_expr_or_error();
                self.expect(RParen, "')' closing condition");
                self.parse_statement();
                self.finish_node();
            }
            KwDo => {
                self.start_node(DoWhileLoop);
                self.bump();
                self.parse_statement();
                self.expect(KwWhile, "'while' after do body");
                self.expect(LParen, "'(' after 'while'");
                self.parse_expr_or_error();
                self.expect(RParen, "')' closing condition");
                self.expect(Semicolon, "';' after do-while");
                self.finish_node();
            }
            KwRepeat => {
                self.start_node(RepeatLoop);
                self.bump();
                self.expect(LParen, "'(' after 'repeat'");
                self.parse_expr_or_error();
                self.expect(RParen, "')' closing count");
                self.parse_statement();
                self.finish_node();
            }
            KwForever => {
                self.start_node(ForeverLoop);
                self.bump();
                self.parse_statement();
                self.finish_node();
            }
            KwReturn => {
                self.start_node(JumpStatement);
                self.bump();
                if !self.at(Semicolon) {
                    self.parse_expr_or_error();
                }
                self.expect(Semicolon, "';' after 'return'");
                self.finish_node();
            }
            KwBreak | KwContinue => {
                self.start_node(JumpStatement);
                self.bump();
                self.expect(Semicolon, "';' after jump statement");
                self.finish_node();
            }
            KwDisable => {
                self.start_node(DisableStatement);
                self.bump();
                if !self.eat(KwFork) {
                    self.parse_expr_or_error();
                }
                self.expect(Semicolon, "';' after 'disable'");
                self.finish_node();
            }
            KwWait => {
                self.start_node(WaitStatement);
                self.bump();
                if self.eat(KwFork) {
                    self.expect(Semicolon, "';' after 'wait fork'");
                } else {
                    self.expect(LParen, "'(' after 'wait'");
                    self.parse_expr_or_error();
                    self.expect(RParen, "')' closing wait condition");
                    self.parse_statement();
                }
                self.finish_node();
            }
            MinusArrow => {
                self.start_node(EventTriggerStatement);
                self.bump();
                self.parse_expr_or_error();
                self.expect(Semicolon, "';' after event trigger");
                self.finish_node();
            }
            At => {
                self.start_node(TimingControlStatement);
                self.parse_event_control();
                self.parse_statement();
                self.finish_node();
            }
            Pound => {
                self.start_node(TimingControlStatement);
                self.parse_delay_control();
                self.parse_statement();
                self.finish_node();
            }
            KwRandsequence => self.parse_randsequence(),
            KwAssign | KwForce | KwRelease => {
                self.start_node(ProceduralAssignStatement);
                let releasing = self.at(KwRelease);
                self.bump();
                self.parse_expr_or_error();
                if !releasing && self.at_set(ASSIGN_OPS) {
                    self.bump();
                    self.parse_expr_or_error();
                }
                self.expect(Semicolon, "';' after procedural assignment");
                self.finish_node();
            }
            _ if self.at_variable_decl_start() => {
                self.start_node(VariableDeclStatement);
                self.parse_data_declaration(true);
                self.finish_node();
            }
            _ if self.at_expr_start() => self.parse_expr_statement(),
            _ => {
                self.error_plain(DiagnosticKind::ExpectedStatement);
                self.skip_current();
            }
        }
    }

    /// `begin [:name] ... end [:name]` and the fork flavors.
    pub(crate) fn parse_block(&mut self) {
        self.start_node(BlockStatement);
        let forked = self.at(KwFork);
        self.bump();
        if self.eat(Colon) {
            self.expect(Ident, "block name after ':'");
        }
        let ends: TokenSet = TokenSet::new(&[KwEnd, KwJoin, KwJoinAny, KwJoinNone]);
        while !self.at_set(ends) && !self.at_eof() {
            if self.at_set(token_sets::MEMBER_RECOVERY) && !self.at(Semicolon) {
                break;
            }
            self.parse_statement();
        }
        if forked {
            if !self.eat(KwJoin) && !self.eat(KwJoinAny) && !self.eat(KwJoinNone) {
                self.expect(KwJoin, "'join' closing fork");
            }
        } else {
            self.expect(KwEnd, "'end' closing block");
        }
        if self.eat(Colon) {
            self.expect(Ident, "block name after ':'");
        }
        self.finish_node();
    }

    fn parse_conditional(&mut self) {
        self.start_node(ConditionalStatement);
        if matches!(self.current(), KwUnique | KwUnique0 | KwPriority) {
            self.bump();
        }
        self.expect(KwIf, "'if'");
        self.expect(LParen, "'(' after 'if'");
        self.parse_expr_or_error();
        self.expect(RParen, "')' closing condition");
        self.parse_statement();
        if self.eat(KwElse) {
            self.parse_statement();
        }
        self.finish_node();
    }

    fn parse_case(&mut self) {
        self.start_node(CaseStatement);
        if matches!(self.current(), KwUnique | KwUnique0 | KwPriority) {
            self.bump();
        }
        if !matches!(self.current(), KwCase | KwCasex | KwCasez) {
            self.expect(KwCase, "'case'");
        } else {
            self.bump();
        }
        self.expect(LParen, "'(' after case keyword");
        self.parse_expr_or_error();
        self.expect(RParen, "')' closing case expression");
        self.eat(KwInside);

        let mut any_items = false;
        while !self.at(KwEndcase) && !self.at_eof() {
            if self.at_set(token_sets::MEMBER_RECOVERY) && !self.at(Semicolon) {
                break;
            }
            self.parse_case_item();
            any_items = true;
        }
        if !any_items {
            self.error_plain(DiagnosticKind::CaseItemRequired);
        }
        self.expect(KwEndcase, "'endcase'");
        self.finish_node();
    }

    fn parse_case_item(&mut self) {
        self.start_node(CaseItem);
        if self.eat(KwDefault) {
            self.eat(Colon);
        } else {
            loop {
                self.parse_open_range();
                if !self.eat(Comma) {
                    break;
                }
            }
            self.expect(Colon, "':' after case item expressions");
        }
        self.parse_statement();
        self.finish_node();
    }

    fn parse_for(&mut self) {
        self.start_node(ForLoop);
        self.bump();
        self.expect(LParen, "'(' after 'for'");
        if !self.at(Semicolon) {
            if self.at_variable_decl_start() {
                self.parse_data_declaration(false);
            } else {
                loop {
                    self.parse_for_assignment();
                    if !self.eat(Comma) {
                        break;
                    }
                }
            }
        }
        self.expect(Semicolon, "';' after for initializer");
        if !self.at(Semicolon) {
            self.parse_expr_or_error();
        }
        self.expect(Semicolon, "';' after for condition");
        if !self.at(RParen) {
            loop {
                self.parse_for_assignment();
                if !self.eat(Comma) {
                    break;
                }
            }
        }
        self.expect(RParen, "')' closing for header");
        self.parse_statement();
        self.finish_node();
    }

    /// A step or initializer: `x = e`, `x += e`, `x++`, or a bare call.
    fn parse_for_assignment(&mut self) {
        let cp = self.checkpoint();
        if self.at_expr_start() {
            self.parse_lvalue_expr();
        } else {
            self.parse_expr_or_error();
        }
        if self.at_set(ASSIGN_OPS) {
            self.start_node_at(cp, AssignmentStatement);
            self.bump();
            self.parse_expr_or_error();
            self.finish_node();
        }
    }

    fn parse_foreach(&mut self) {
        self.start_node(ForeachLoop);
        self.bump();
        self.expect(LParen, "'(' after 'foreach'");
        // `array[i, j]`: a name followed by loop variables in brackets.
        let cp = self.checkpoint();
        self.start_node(NameRef);
        if self.at(Ident) || self.at(EscapedIdent) {
            self.bump();
        } else {
            self.expect(Ident, "array name in foreach");
        }
        self.finish_node();
        while self.at(Dot) {
            self.start_node_at(cp, MemberExpr);
            self.bump();
            self.expect(Ident, "member name after '.'");
            self.finish_node();
        }
        if self.at(LBracket) {
            self.start_node(Dimension);
            self.bump();
            loop {
                if self.at(Ident) {
                    self.start_node(NameRef);
                    self.bump();
                    self.finish_node();
                }
                if !self.eat(Comma) {
                    break;
                }
            }
            self.expect(RBracket, "']' closing loop variables");
            self.finish_node();
        }
        self.expect(RParen, "')' closing foreach header");
        self.parse_statement();
        self.finish_node();
    }

    /// Expression-leading statement: assignment or a bare expression call.
    fn parse_expr_statement(&mut self) {
        let cp = self.checkpoint();
        self.parse_lvalue_expr();
        if self.at_set(ASSIGN_OPS) {
            self.start_node_at(cp, AssignmentStatement);
            self.bump();
            // Intra-assignment timing control: `a = #5 b;` / `a <= @(e) b;`
            if self.at(Pound) {
                self.parse_delay_control();
            } else if self.at(At) {
                self.parse_event_control();
            }
            self.parse_expr_or_error();
            self.expect(Semicolon, "';' after assignment");
            self.finish_node();
        } else {
            self.start_node_at(cp, ExpressionStatement);
            self.expect(Semicolon, "';' after expression");
            self.finish_node();
        }
    }

    /// `@ident`, `@(...)`, `@*`, `@(*)`.
    pub(crate) fn parse_event_control(&mut self) {
        self.start_node(EventControl);
        self.bump(); // '@'
        match self.current() {
            Star => {
                self.bump();
            }
            LParen => {
                self.bump();
                if self.at(Star) {
                    self.bump();
                } else {
                    self.parse_event_expr();
                }
                self.expect(RParen, "')' closing event control");
            }
            Ident | EscapedIdent => {
                self.start_node(NameRef);
                self.bump();
                self.finish_node();
            }
            _ => {
                self.expect(LParen, "event expression after '@'");
            }
        }
        self.finish_node();
    }

    /// `posedge a iff en or negedge b, c`.
    pub(crate) fn parse_event_expr(&mut self) {
        self.start_node(EventExpr);
        loop {
            if matches!(self.current(), KwPosedge | KwNegedge | KwEdge) {
                self.bump();
            }
            self.parse_expr_or_error();
            if self.eat(KwIff) {
                self.parse_expr_or_error();
            }
            if !self.eat(KwOr) && !self.eat(Comma) {
                break;
            }
        }
        self.finish_node();
    }

    /// `#10`, `#(1:2:3)`, `#delay_id`.
    pub(crate) fn parse_delay_control(&mut self) {
        self.start_node(DelayControl);
        self.bump(); // '#'
        match self.current() {
            LParen => {
                self.bump();
                self.parse_expr_or_error();
                if self.eat(Colon) {
                    self.parse_expr_or_error();
                    if self.eat(Colon) {
                        self.parse_expr_or_error();
                    }
                }
                // Two- and three-value forms: `#(rise, fall [, turnoff])`.
                while self.eat(Comma) {
                    self.parse_expr_or_error();
                }
                self.expect(RParen, "')' closing delay");
            }
            _ => {
                self.parse_expr_or_error();
            }
        }
        self.finish_node();
    }

    /// Whether a variable declaration begins at the current statement
    /// position.
    pub(crate) fn at_variable_decl_start(&mut self) -> bool {
        match self.current() {
            KwVar | KwConst | KwStatic | KwAutomatic => true,
            KwEnum | KwStruct | KwUnion | KwString | KwEvent | KwChandle => true,
            kind if token_sets::INTEGER_TYPE_KEYWORDS.contains(kind) => {
                // `int'(x)` is a cast expression, not a declaration.
                self.nth(1) != Apostrophe
            }
            kind if token_sets::REAL_TYPE_KEYWORDS.contains(kind) => self.nth(1) != Apostrophe,
            Ident | EscapedIdent => {
                let mut la = self.lookahead();
                super::types::named_type_then_declarator(&mut la)
            }
            _ => false,
        }
    }
}

#[allow(dead_code)]
pub(crate) fn is_assignment_op(kind: SyntaxKind) -> bool {
    ASSIGN_OPS.contains(kind)
}
