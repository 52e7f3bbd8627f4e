//! User-defined primitive parsing: `primitive ... endprimitive` with ANSI or
//! non-ANSI port styles, port declarations, an optional `initial` row, and
//! the state table.

use crate::cst::SyntaxKind::{self, *};
use crate::cst::token_sets;
use crate::parser::Parser;

impl Parser<'_> {
    pub(crate) fn parse_udp_decl(&mut self) {
        self.start_node(UdpDecl);
        self.bump(); // primitive
        self.expect(Ident, "primitive name");
        self.parse_udp_port_list();
        self.expect(Semicolon, "';' after primitive header");

        self.start_node(UdpBody);
        loop {
            match self.current() {
                KwInput | KwOutput => self.parse_udp_port_decl(),
                KwReg => self.parse_udp_port_decl(),
                KwInitial => {
                    self.start_node(UdpInitial);
                    self.bump();
                    self.parse_expr_or_error();
                    if self.at(Equals) {
                        self.bump();
                        self.parse_expr_or_error();
                    }
                    self.expect(Semicolon, "';' after initial value");
                    self.finish_node();
                }
                KwTable => {
                    self.bump();
                    while !self.at(KwEndtable) && !self.at_eof() {
                        if self.at(KwEndprimitive) {
                            break;
                        }
                        self.parse_udp_entry();
                    }
                    self.expect(KwEndtable, "'endtable'");
                }
                KwEndprimitive | Eof => break,
                Semicolon => {
                    self.start_node(EmptyMember);
                    self.bump();
                    self.finish_node();
                }
                _ => {
                    self.expect(KwTable, "primitive body item");
                    self.skip_current();
                }
            }
        }
        self.finish_node(); // body

        self.expect(KwEndprimitive, "'endprimitive'");
        if self.eat(Colon) {
            self.expect(Ident, "primitive name after ':'");
        }
        self.finish_node();
    }

    fn parse_udp_port_list(&mut self) {
        self.start_node(UdpPortList);
        self.expect(LParen, "'(' opening primitive ports");
        match self.current() {
            // `(.*)` wildcard port list; recognized here, rejected during
            // elaboration.
            DotStar => {
                self.bump();
            }
            Star => {
                self.bump();
            }
            RParen => {}
            _ => {
                loop {
                    if token_sets::DIRECTION_KEYWORDS.contains(self.current()) {
                        // ANSI style port declarations inline.
                        self.start_node(UdpPortDecl);
                        self.bump();
                        self.eat(KwReg);
                        if self.at(Ident) || self.at(EscapedIdent) {
                            self.bump();
                        } else {
                            self.expect(Ident, "port name");
                        }
                        if self.at(Equals) {
                            self.start_node(Init);
                            self.bump();
                            self.parse_expr_or_error();
                            self.finish_node();
                        }
                        self.finish_node();
                    } else {
                        self.start_node(NonAnsiPort);
                        if self.at(Ident) || self.at(EscapedIdent) {
                            self.bump();
                        } else {
                            self.expect(Ident, "port name");
                        }
                        self.finish_node();
                    }
                    if !self.eat(Comma) {
                        break;
                    }
                }
            }
        }
        self.expect(RParen, "')' closing primitive ports");
        self.finish_node();
    }

    /// `output reg q;` / `input a, b;` / standalone `reg q;`
    fn parse_udp_port_decl(&mut self) {
        self.start_node(UdpPortDecl);
        if self.at(KwInput) || self.at(KwOutput) {
            self.bump();
        }
        self.eat(KwReg);
        loop {
            if self.at(Ident) || self.at(EscapedIdent) {
                self.bump();
            } else {
                self.expect(Ident, "port name");
                break;
            }
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(Semicolon, "';' after port declaration");
        self.finish_node();
    }

    /// One table row: level/edge symbols and separators up to ';'. The row
    /// is kept as raw tokens; elaboration interprets the symbols.
    fn parse_udp_entry(&mut self) {
        self.start_node(UdpEntry);
        while !self.at(Semicolon) && !self.at(KwEndtable) && !self.at_eof() {
            self.bump();
        }
        self.eat(Semicolon);
        self.finish_node();
    }
}
