//! Declaration parsing: data, nets, parameters, typedefs, nettypes, package
//! imports, continuous assigns, genvars, instantiations, modports, and
//! clocking blocks.

use crate::cst::SyntaxKind::{self, *};
use crate::cst::{TokenSet, token_sets};
use crate::parser::Parser;

const STRENGTH_KEYWORDS: TokenSet = TokenSet::new(&[
    KwSupply0, KwSupply1, KwStrong0, KwStrong1, KwPull0, KwPull1, KwWeak0, KwWeak1, KwHighz0,
    KwHighz1,
]);

const CHARGE_KEYWORDS: TokenSet = TokenSet::new(&[KwSmall, KwMedium, KwLarge]);

impl Parser<'_> {
    /// `[const] [var] [static|automatic] type declarators [;]`
    pub(crate) fn parse_data_declaration(&mut self, terminated: bool) {
        self.start_node(DataDecl);
        while matches!(self.current(), KwConst | KwVar | KwStatic | KwAutomatic) {
            self.bump();
        }
        self.parse_data_type_or_implicit();
        loop {
            self.parse_declarator();
            if !self.eat(Comma) {
                break;
            }
        }
        if terminated {
            self.expect(Semicolon, "';' after declaration");
        }
        self.finish_node();
    }

    /// `wire [7:0] w = x;` and every other built-in net flavor.
    pub(crate) fn parse_net_declaration(&mut self) {
        self.start_node(NetDecl);
        self.bump(); // net type keyword
        if self.at(LParen) && STRENGTH_KEYWORDS.contains(self.nth(1)) {
            self.parse_drive_strength();
        } else if self.at(LParen) && CHARGE_KEYWORDS.contains(self.nth(1)) {
            self.start_node(ChargeStrength);
            self.bump();
            self.bump();
            self.expect(RParen, "')' closing charge strength");
            self.finish_node();
        }
        if self.at(KwVectored) || self.at(KwScalared) {
            self.bump();
        }
        self.parse_data_type_or_implicit();
        if self.at(Pound) {
            self.parse_delay_control();
        }
        loop {
            self.parse_declarator();
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(Semicolon, "';' after net declaration");
        self.finish_node();
    }

    fn parse_drive_strength(&mut self) {
        self.start_node(DriveStrength);
        self.bump(); // '('
        self.bump(); // first strength
        if self.eat(Comma) {
            if STRENGTH_KEYWORDS.contains(self.current()) {
                self.bump();
            } else {
                self.expect(KwStrong0, "drive strength keyword");
            }
        }
        self.expect(RParen, "')' closing drive strength");
        self.finish_node();
    }

    /// `parameter ... ` / `localparam ...`; in a parameter port list the
    /// terminating ';' is absent and the keyword may be implied.
    pub(crate) fn parse_parameter_decl(&mut self, terminated: bool) {
        let node = if self.at(KwLocalparam) {
            LocalparamDecl
        } else {
            ParameterDecl
        };
        self.start_node(node);
        if self.at(KwParameter) || self.at(KwLocalparam) {
            self.bump();
        }
        if self.at(KwType) && self.nth(1) != LParen {
            // Type parameter: `parameter type T = int`.
            self.bump();
            loop {
                self.parse_type_param_assignment();
                if !(self.at(Comma) && self.nth(1) == Ident && self.nth(2) == Equals) {
                    break;
                }
                self.bump();
            }
        } else {
            self.parse_data_type_or_implicit();
            loop {
                self.parse_param_assignment();
                if !(self.at(Comma)
                    && matches!(self.nth(1), Ident | EscapedIdent)
                    && !matches!(self.nth(2), Ident | EscapedIdent))
                {
                    break;
                }
                self.bump();
            }
        }
        if terminated {
            self.expect(Semicolon, "';' after parameter declaration");
        }
        self.finish_node();
    }

    fn parse_param_assignment(&mut self) {
        self.start_node(ParamAssignment);
        self.expect(Ident, "parameter name");
        self.parse_dimensions();
        if self.at(Equals) {
            self.start_node(Init);
            self.bump();
            self.parse_expr_or_error();
            self.finish_node();
        }
        self.finish_node();
    }

    fn parse_type_param_assignment(&mut self) {
        self.start_node(ParamAssignment);
        self.expect(Ident, "type parameter name");
        if self.at(Equals) {
            self.start_node(Init);
            self.bump();
            self.parse_data_type();
            self.finish_node();
        }
        self.finish_node();
    }

    /// `typedef enum {...} state_t;`
    pub(crate) fn parse_typedef(&mut self) {
        self.start_node(TypedefDecl);
        self.bump(); // typedef
        self.parse_data_type_or_implicit();
        self.expect(Ident, "typedef name");
        self.parse_dimensions();
        self.expect(Semicolon, "';' after typedef");
        self.finish_node();
    }

    /// `nettype logic[3:0] bus_t [with resolver];`
    pub(crate) fn parse_nettype_decl(&mut self) {
        self.start_node(NettypeDecl);
        self.bump(); // nettype
        self.parse_data_type_or_implicit();
        self.expect(Ident, "nettype name");
        if self.eat(KwWith) {
            self.start_node(NameRef);
            self.expect(Ident, "resolution function name");
            self.finish_node();
        }
        self.expect(Semicolon, "';' after nettype declaration");
        self.finish_node();
    }

    /// `import p::*, q::name;`
    pub(crate) fn parse_package_import(&mut self) {
        self.start_node(PackageImportDecl);
        self.bump(); // import
        loop {
            self.start_node(PackageImportItem);
            self.expect(Ident, "package name");
            self.expect(ColonColon, "'::' in import");
            if !self.eat(Star) {
                self.expect(Ident, "imported name or '*'");
            }
            self.finish_node();
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(Semicolon, "';' after import");
        self.finish_node();
    }

    /// `export p::name;` / `export *::*;`
    pub(crate) fn parse_package_export(&mut self) {
        self.start_node(PackageExportDecl);
        self.bump(); // export
        loop {
            self.start_node(PackageImportItem);
            if !self.eat(Star) {
                self.expect(Ident, "package name or '*'");
            }
            self.expect(ColonColon, "'::' in export");
            if !self.eat(Star) {
                self.expect(Ident, "exported name or '*'");
            }
            self.finish_node();
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(Semicolon, "';' after export");
        self.finish_node();
    }

    /// `assign [strength] [#delay] lhs = rhs, lhs = rhs;`
    pub(crate) fn parse_continuous_assign(&mut self) {
        self.start_node(ContinuousAssign);
        self.bump(); // assign
        if self.at(LParen) && STRENGTH_KEYWORDS.contains(self.nth(1)) {
            self.parse_drive_strength();
        }
        if self.at(Pound) {
            self.parse_delay_control();
        }
        loop {
            self.start_node(AssignItem);
            self.parse_expr_or_error();
            self.expect(Equals, "'=' in continuous assignment");
            self.parse_expr_or_error();
            self.finish_node();
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(Semicolon, "';' after continuous assignment");
        self.finish_node();
    }

    pub(crate) fn parse_genvar_decl(&mut self) {
        self.start_node(GenvarDecl);
        self.bump(); // genvar
        loop {
            self.parse_declarator();
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(Semicolon, "';' after genvar declaration");
        self.finish_node();
    }

    /// `$error("...", a)` and friends at member level.
    pub(crate) fn parse_elab_system_task(&mut self) {
        self.start_node(ElabSystemTask);
        self.bump(); // system identifier
        if self.at(LParen) {
            self.parse_arg_list();
        }
        self.expect(Semicolon, "';' after elaboration task");
        self.finish_node();
    }

    /// `mod_name #(params) inst1 (ports), inst2 (ports);`
    pub(crate) fn parse_hierarchy_instantiation(&mut self) {
        self.start_node(HierarchyInstantiation);
        self.start_node(NameRef);
        self.bump(); // definition name
        self.finish_node();
        if self.at(Pound) {
            self.start_node(ParamValueAssignment);
            self.bump();
            if self.at(LParen) {
                self.parse_arg_list();
            } else {
                // `#5` style delays on gate-like instances.
                self.parse_expr_or_error();
            }
            self.finish_node();
        }
        loop {
            self.parse_hierarchical_instance();
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(Semicolon, "';' after instantiation");
        self.finish_node();
    }

    fn parse_hierarchical_instance(&mut self) {
        self.start_node(HierarchicalInstance);
        self.expect(Ident, "instance name");
        self.parse_dimensions();
        self.expect(LParen, "'(' opening port connections");
        if !self.at(RParen) {
            loop {
                self.parse_port_connection();
                if !self.eat(Comma) {
                    break;
                }
            }
        }
        self.expect(RParen, "')' closing port connections");
        self.finish_node();
    }

    fn parse_port_connection(&mut self) {
        match self.current() {
            DotStar => {
                self.start_node(WildcardPortConnection);
                self.bump();
                self.finish_node();
            }
            Dot => {
                self.start_node(NamedPortConnection);
                self.bump();
                self.expect(Ident, "port name after '.'");
                if self.eat(LParen) {
                    if !self.at(RParen) {
                        self.parse_expr_or_error();
                    }
                    self.expect(RParen, "')' closing port connection");
                }
                self.finish_node();
            }
            Comma | RParen => {
                self.start_node(OrderedPortConnection);
                self.finish_node();
            }
            _ => {
                self.start_node(OrderedPortConnection);
                self.parse_expr_or_error();
                self.finish_node();
            }
        }
    }

    /// `modport mp (input a, output .b(expr), import f, clocking cb);`
    pub(crate) fn parse_modport_decl(&mut self) {
        self.start_node(ModportDecl);
        self.bump(); // modport
        loop {
            self.parse_modport_item();
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(Semicolon, "';' after modport declaration");
        self.finish_node();
    }

    fn parse_modport_item(&mut self) {
        self.start_node(ModportItem);
        self.expect(Ident, "modport name");
        self.expect(LParen, "'(' opening modport ports");
        while !self.at(RParen) && !self.at_eof() {
            match self.current() {
                kind if token_sets::DIRECTION_KEYWORDS.contains(kind) => {
                    self.parse_modport_simple_ports()
                }
                KwImport | KwExport => self.parse_modport_subroutine_ports(),
                KwClocking => {
                    self.start_node(ModportClockingPort);
                    self.bump();
                    self.expect(Ident, "clocking block name");
                    self.finish_node();
                    if !self.eat(Comma) {
                        break;
                    }
                }
                _ => {
                    self.expect(KwInput, "port direction, 'import', or 'clocking'");
                    break;
                }
            }
        }
        self.expect(RParen, "')' closing modport ports");
        self.finish_node();
    }

    fn parse_modport_simple_ports(&mut self) {
        self.start_node(ModportSimplePortList);
        self.bump(); // direction
        loop {
            match self.current() {
                Dot => {
                    self.start_node(ModportExplicitPort);
                    self.bump();
                    self.expect(Ident, "port name after '.'");
                    self.expect(LParen, "'(' opening port expression");
                    if !self.at(RParen) {
                        self.parse_expr_or_error();
                    }
                    self.expect(RParen, "')' closing port expression");
                    self.finish_node();
                }
                Ident | EscapedIdent => {
                    self.start_node(ModportNamedPort);
                    self.bump();
                    self.finish_node();
                }
                _ => {
                    self.expect(Ident, "modport port name");
                    break;
                }
            }
            // Stop before the next section; the comma belongs to the list.
            if self.at(Comma)
                && (token_sets::DIRECTION_KEYWORDS.contains(self.nth(1))
                    || matches!(self.nth(1), KwImport | KwExport | KwClocking))
            {
                self.bump();
                break;
            }
            if !self.eat(Comma) {
                break;
            }
        }
        self.finish_node();
    }

    fn parse_modport_subroutine_ports(&mut self) {
        self.start_node(ModportSubroutinePortList);
        self.bump(); // import | export
        loop {
            self.start_node(ModportSubroutinePort);
            match self.current() {
                KwTask | KwFunction => {
                    // Full prototype form.
                    let is_function = self.at(KwFunction);
                    self.bump();
                    if is_function {
                        self.parse_data_type_or_implicit();
                    }
                    self.expect(Ident, "subroutine name");
                    if self.at(LParen) {
                        self.parse_tf_port_list();
                    }
                }
                Ident | EscapedIdent => {
                    self.start_node(NameRef);
                    self.bump();
                    self.finish_node();
                }
                _ => {
                    self.expect(Ident, "subroutine name");
                    self.finish_node();
                    break;
                }
            }
            self.finish_node();
            if self.at(Comma)
                && (token_sets::DIRECTION_KEYWORDS.contains(self.nth(1))
                    || matches!(self.nth(1), KwImport | KwExport | KwClocking))
            {
                self.bump();
                break;
            }
            if !self.eat(Comma) {
                break;
            }
        }
        self.finish_node();
    }

    /// `[default] clocking [name] @(edge clk); items... endclocking [:name]`
    pub(crate) fn parse_clocking_decl(&mut self) {
        self.start_node(ClockingDecl);
        if self.at(KwDefault) || self.at(KwGlobal) {
            self.bump();
        }
        self.expect(KwClocking, "'clocking'");
        if self.at(Ident) {
            self.bump();
        }
        if self.at(At) {
            self.parse_event_control();
        } else {
            self.expect(At, "'@' clocking event");
        }
        self.expect(Semicolon, "';' after clocking header");

        while !self.at(KwEndclocking) && !self.at_eof() {
            if self.at_set(token_sets::MEMBER_RECOVERY) && !self.at(Semicolon) {
                break;
            }
            self.parse_clocking_item();
        }
        self.expect(KwEndclocking, "'endclocking'");
        if self.eat(Colon) {
            self.expect(Ident, "clocking block name after ':'");
        }
        self.finish_node();
    }

    fn parse_clocking_item(&mut self) {
        match self.current() {
            KwDefault => {
                self.start_node(DefaultSkewItem);
                self.bump();
                while self.at(KwInput) || self.at(KwOutput) {
                    self.bump();
                    if self.at_clocking_skew() {
                        self.parse_clocking_skew();
                    }
                }
                self.expect(Semicolon, "';' after default skew");
                self.finish_node();
            }
            KwInput | KwOutput | KwInout => {
                self.start_node(ClockingItem);
                self.bump();
                if self.at_clocking_skew() {
                    self.parse_clocking_skew();
                }
                if self.at(KwOutput) {
                    self.bump();
                    if self.at_clocking_skew() {
                        self.parse_clocking_skew();
                    }
                }
                loop {
                    self.start_node(ClockingDeclAssign);
                    self.expect(Ident, "clocking signal name");
                    if self.at(Equals) {
                        self.start_node(Init);
                        self.bump();
                        self.parse_expr_or_error();
                        self.finish_node();
                    }
                    self.finish_node();
                    if !self.eat(Comma) {
                        break;
                    }
                }
                self.expect(Semicolon, "';' after clocking signals");
                self.finish_node();
            }
            Semicolon => {
                self.start_node(EmptyMember);
                self.bump();
                self.finish_node();
            }
            _ => {
                self.expect(KwInput, "clocking item");
                self.skip_current();
            }
        }
    }

    fn at_clocking_skew(&mut self) -> bool {
        matches!(self.current(), KwPosedge | KwNegedge | KwEdge | Pound)
    }

    fn parse_clocking_skew(&mut self) {
        self.start_node(ClockingSkew);
        if matches!(self.current(), KwPosedge | KwNegedge | KwEdge) {
            self.bump();
        }
        if self.at(Pound) {
            self.parse_delay_control();
        }
        self.finish_node();
    }

    /// Non-ANSI body port declaration: `input [7:0] a, b;`
    pub(crate) fn parse_port_decl(&mut self) {
        self.start_node(PortDecl);
        self.bump(); // direction
        if token_sets::NET_TYPE_KEYWORDS.contains(self.current()) || self.at(KwVar) {
            self.bump();
        }
        self.parse_data_type_or_implicit();
        loop {
            self.parse_declarator();
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(Semicolon, "';' after port declaration");
        self.finish_node();
    }

    /// `timeunit 1ns / 1ps;` / `timeprecision 1ps;`
    pub(crate) fn parse_timeunits_decl(&mut self) {
        self.start_node(TimeunitsDecl);
        self.bump(); // timeunit | timeprecision
        if self.at(TimeLiteral) {
            self.start_node(Literal);
            self.bump();
            self.finish_node();
        } else {
            self.expect(TimeLiteral, "time literal");
        }
        if self.eat(Slash) {
            if self.at(TimeLiteral) {
                self.start_node(Literal);
                self.bump();
                self.finish_node();
            } else {
                self.expect(TimeLiteral, "time precision literal");
            }
        }
        self.expect(Semicolon, "';' after time unit declaration");
        self.finish_node();
    }
}

#[allow(dead_code)]
pub(crate) fn is_strength(kind: SyntaxKind) -> bool {
    STRENGTH_KEYWORDS.contains(kind)
}
