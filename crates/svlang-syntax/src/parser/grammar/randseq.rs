//! `randsequence` statement parsing: productions with return types and
//! formal arguments, rules with weights, and the rule-item forms (references
//! with bound arguments, code blocks, if-else, repeat, case).

use svlang_core::diagnostics::DiagnosticKind;

use crate::cst::SyntaxKind::*;
use crate::parser::Parser;

impl Parser<'_> {
    pub(crate) fn parse_randsequence(&mut self) {
        self.start_node(RandsequenceStatement);
        self.bump(); // randsequence
        self.expect(LParen, "'(' after 'randsequence'");
        if self.at(Ident) {
            self.start_node(NameRef);
            self.bump();
            self.finish_node();
        }
        self.expect(RParen, "')' after start production");

        let mut any = false;
        while !self.at(KwEndsequence) && !self.at_eof() {
            if matches!(self.current(), KwEnd | KwEndmodule | KwEndfunction | KwEndtask) {
                break;
            }
            self.parse_rs_production();
            any = true;
        }
        if !any {
            self.error_plain(DiagnosticKind::ExpectedProduction);
        }
        self.expect(KwEndsequence, "'endsequence'");
        self.finish_node();
    }

    /// `[type] name [(ports)] : rule | rule | ... ;`
    fn parse_rs_production(&mut self) {
        self.start_node(RsProduction);
        if self.at(KwVoid) || self.at_data_type() {
            self.parse_data_type();
        }
        self.expect(Ident, "production name");
        if self.at(LParen) {
            self.parse_tf_port_list();
        }
        self.expect(Colon, "':' before production rules");
        loop {
            self.parse_rs_rule();
            if !self.eat(Or) {
                break;
            }
        }
        self.expect(Semicolon, "';' after production");
        self.finish_node();
    }

    /// A rule: production items, optionally weighted with `:= expr`.
    fn parse_rs_rule(&mut self) {
        self.start_node(RsRule);
        loop {
            match self.current() {
                Ident | EscapedIdent => self.parse_rs_prod_item(),
                LBrace => self.parse_rs_code_block(),
                KwIf => {
                    self.start_node(RsIfElse);
                    self.bump();
                    self.expect(LParen, "'(' after 'if'");
                    self.parse_expr_or_error();
                    self.expect(RParen, "')' closing condition");
                    self.parse_rs_prod_item_or_block();
                    if self.eat(KwElse) {
                        self.parse_rs_prod_item_or_block();
                    }
                    self.finish_node();
                }
                KwRepeat => {
                    self.start_node(RsRepeat);
                    self.bump();
                    self.expect(LParen, "'(' after 'repeat'");
                    self.parse_expr_or_error();
                    self.expect(RParen, "')' closing count");
                    self.parse_rs_prod_item_or_block();
                    self.finish_node();
                }
                KwCase => self.parse_rs_case(),
                KwRand => {
                    // `rand join` interleaving; parse the keyword pair then
                    // the joined items.
                    self.bump();
                    self.eat(KwJoin);
                    if self.at(LParen) {
                        self.bump();
                        self.parse_expr_or_error();
                        self.expect(RParen, "')' after join expression");
                    }
                }
                _ => break,
            }
        }
        if self.at(Colon) && self.nth(1) == Equals {
            // `:=` weight; the two tokens sit adjacent.
            self.start_node(WeightClause);
            self.bump();
            self.bump();
            self.parse_expr_or_error();
            self.finish_node();
            if self.at(LBrace) {
                self.parse_rs_code_block();
            }
        }
        self.finish_node();
    }

    /// `name [(args)]` reference to another production.
    fn parse_rs_prod_item(&mut self) {
        self.start_node(RsProdItem);
        self.start_node(NameRef);
        self.bump();
        self.finish_node();
        if self.at(LParen) {
            self.parse_arg_list();
        }
        self.finish_node();
    }

    fn parse_rs_prod_item_or_block(&mut self) {
        match self.current() {
            LBrace => self.parse_rs_code_block(),
            Ident | EscapedIdent => self.parse_rs_prod_item(),
            _ => {
                self.expect(Ident, "production reference");
            }
        }
    }

    /// `{ statements }` executed when the rule fires.
    fn parse_rs_code_block(&mut self) {
        self.start_node(RsCodeBlock);
        self.bump(); // '{'
        while !self.at(RBrace) && !self.at_eof() {
            if matches!(self.current(), KwEndsequence | KwEndmodule) {
                break;
            }
            self.parse_statement();
        }
        self.expect(RBrace, "'}' closing code block");
        self.finish_node();
    }

    fn parse_rs_case(&mut self) {
        self.start_node(RsCase);
        self.bump(); // case
        self.expect(LParen, "'(' after 'case'");
        self.parse_expr_or_error();
        self.expect(RParen, "')' closing case expression");
        while !self.at(KwEndcase) && !self.at_eof() {
            self.start_node(RsCaseItem);
            if self.eat(KwDefault) {
                self.eat(Colon);
            } else {
                loop {
                    self.parse_expr_or_error();
                    if !self.eat(Comma) {
                        break;
                    }
                }
                self.expect(Colon, "':' after case item");
            }
            self.parse_rs_prod_item_or_block();
            self.expect(Semicolon, "';' after case item");
            self.finish_node();
        }
        self.expect(KwEndcase, "'endcase'");
        self.finish_node();
    }
}
