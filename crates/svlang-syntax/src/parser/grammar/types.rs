//! Data type parsing: built-in integer/real types, enums, packed structs and
//! unions, named types, and packed/unpacked dimensions.

use crate::cst::SyntaxKind::{self, *};
use crate::cst::token_sets;
use crate::parser::{Lookahead, Parser};

impl Parser<'_> {
    /// Parses a data type. Call only when a type can start here; use
    /// [`parse_data_type_or_implicit`](Self::parse_data_type_or_implicit)
    /// when the type may be omitted.
    pub(crate) fn parse_data_type(&mut self) {
        match self.current() {
            kind if token_sets::INTEGER_TYPE_KEYWORDS.contains(kind) => {
                self.start_node(IntegerType);
                self.bump();
                self.parse_optional_signing();
                self.parse_dimensions();
                self.finish_node();
            }
            kind if token_sets::REAL_TYPE_KEYWORDS.contains(kind) => {
                self.start_node(IntegerType);
                self.bump();
                self.finish_node();
            }
            KwString | KwEvent | KwChandle | KwVoid => {
                self.start_node(IntegerType);
                self.bump();
                self.finish_node();
            }
            KwEnum => self.parse_enum_type(),
            KwStruct | KwUnion => self.parse_struct_or_union(),
            KwType => {
                self.start_node(TypeReference);
                self.bump();
                self.expect(LParen, "'(' after 'type'");
                self.parse_expr();
                self.expect(RParen, "')' closing type reference");
                self.finish_node();
            }
            Ident | EscapedIdent => {
                self.start_node(NamedType);
                let cp = self.checkpoint();
                self.start_node(NameRef);
                self.bump();
                self.finish_node();
                while self.at(ColonColon) {
                    self.start_node_at(cp, ScopedName);
                    self.bump();
                    self.expect(Ident, "name after '::'");
                    self.finish_node();
                }
                self.parse_dimensions();
                self.finish_node();
            }
            _ => self.parse_implicit_type(),
        }
    }

    /// Implicit type: optional signing plus packed dimensions, possibly
    /// entirely empty.
    pub(crate) fn parse_implicit_type(&mut self) {
        self.start_node(ImplicitType);
        self.parse_optional_signing();
        self.parse_dimensions();
        self.finish_node();
    }

    /// A type when one is present, otherwise an (empty) implicit type.
    pub(crate) fn parse_data_type_or_implicit(&mut self) {
        if self.at_data_type() {
            self.parse_data_type();
        } else {
            self.parse_implicit_type();
        }
    }

    /// Whether a data type (not merely an implicit one) begins here. A bare
    /// identifier only counts when a declarator name follows it, which is
    /// what separates `mytype x;` from the expression `mytype;`.
    pub(crate) fn at_data_type(&mut self) -> bool {
        let kind = self.current();
        if token_sets::INTEGER_TYPE_KEYWORDS.contains(kind)
            || token_sets::REAL_TYPE_KEYWORDS.contains(kind)
            || matches!(
                kind,
                KwString | KwEvent | KwChandle | KwVoid | KwEnum | KwStruct | KwUnion | KwType
            )
        {
            return true;
        }
        if matches!(kind, Ident | EscapedIdent) {
            let mut la = self.lookahead();
            return named_type_then_declarator(&mut la);
        }
        false
    }

    pub(crate) fn parse_optional_signing(&mut self) {
        if self.at(KwSigned) || self.at(KwUnsigned) {
            self.bump();
        }
    }

    /// Zero or more `[...]` dimensions: ranges, sizes, `[]`, `[$]`, `[*]`.
    pub(crate) fn parse_dimensions(&mut self) {
        while self.at(LBracket) {
            self.parse_dimension();
        }
    }

    pub(crate) fn parse_dimension(&mut self) {
        self.start_node(Dimension);
        self.bump(); // '['
        match self.current() {
            RBracket => {}
            Dollar => {
                self.bump();
                if self.eat(Colon) {
                    self.parse_expr_or_error();
                }
            }
            Star => {
                self.bump();
            }
            _ => {
                self.parse_expr_or_error();
                if self.eat(Colon) {
                    self.parse_expr_or_error();
                }
            }
        }
        self.expect(RBracket, "']' closing dimension");
        self.finish_node();
    }

    fn parse_enum_type(&mut self) {
        self.start_node(EnumType);
        self.bump(); // enum
        if !self.at(LBrace) {
            self.parse_data_type();
        }
        self.expect(LBrace, "'{' opening enum body");
        if !self.at(RBrace) {
            loop {
                self.parse_enum_member();
                if !self.eat(Comma) {
                    break;
                }
            }
        }
        self.expect(RBrace, "'}' closing enum body");
        self.parse_dimensions();
        self.finish_node();
    }

    fn parse_enum_member(&mut self) {
        self.start_node(EnumMember);
        self.expect(Ident, "enum member name");
        self.parse_dimensions();
        if self.at(Equals) {
            self.start_node(Init);
            self.bump();
            self.parse_expr_or_error();
            self.finish_node();
        }
        self.finish_node();
    }

    fn parse_struct_or_union(&mut self) {
        let kind = if self.at(KwStruct) { StructType } else { UnionType };
        self.start_node(kind);
        self.bump();
        self.eat(KwTagged);
        self.eat(KwPacked);
        self.parse_optional_signing();
        self.expect(LBrace, "'{' opening struct body");
        while !self.at(RBrace) && !self.at_eof() {
            self.parse_struct_field();
        }
        self.expect(RBrace, "'}' closing struct body");
        self.parse_dimensions();
        self.finish_node();
    }

    fn parse_struct_field(&mut self) {
        self.start_node(StructField);
        self.eat(KwRand);
        self.eat(KwRandc);
        self.parse_data_type_or_implicit();
        loop {
            self.parse_declarator();
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(Semicolon, "';' after struct member");
        self.finish_node();
    }

    /// `name [dims] [= init]`.
    pub(crate) fn parse_declarator(&mut self) {
        self.start_node(Declarator);
        if self.at(Ident) || self.at(EscapedIdent) {
            self.bump();
        } else {
            self.expect(Ident, "declarator name");
        }
        self.parse_dimensions();
        if self.at(Equals) {
            self.start_node(Init);
            self.bump();
            self.parse_expr_or_error();
            self.finish_node();
        }
        self.finish_node();
    }
}

/// Scans past `name[::name] [dims]` and reports whether a declarator-looking
/// identifier follows.
pub(crate) fn named_type_then_declarator(la: &mut Lookahead<'_>) -> bool {
    if !matches!(la.peek(), Ident | EscapedIdent) {
        return false;
    }
    la.bump();
    while la.peek() == ColonColon {
        la.bump();
        if la.peek() != Ident {
            return false;
        }
        la.bump();
    }
    while la.peek() == LBracket {
        if !la.skip_balanced(LBracket, RBracket) {
            return false;
        }
    }
    matches!(la.peek(), Ident | EscapedIdent)
}

#[allow(dead_code)]
pub(crate) fn is_type_keyword(kind: SyntaxKind) -> bool {
    token_sets::INTEGER_TYPE_KEYWORDS.contains(kind)
        || token_sets::REAL_TYPE_KEYWORDS.contains(kind)
        || matches!(kind, KwString | KwEvent | KwChandle | KwVoid)
}
