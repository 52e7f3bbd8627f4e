//! Hierarchy items: compilation-unit members, module/interface/program and
//! package declarations, port lists, subroutines, and generate constructs.

use svlang_core::diagnostics::DiagnosticKind;

use crate::cst::SyntaxKind::{self, *};
use crate::cst::token_sets;
use crate::parser::Parser;

impl Parser<'_> {
    /// Parses one member at compilation-unit, package, or module level.
    pub(crate) fn parse_member(&mut self) {
        self.parse_member_in(false);
    }

    pub(crate) fn parse_member_in(&mut self, ansi_module: bool) {
        match self.current() {
            KwModule | KwMacromodule => self.parse_module_like(ModuleDecl, KwEndmodule),
            KwInterface => self.parse_module_like(InterfaceDecl, KwEndinterface),
            KwProgram => self.parse_module_like(ProgramDecl, KwEndprogram),
            KwPackage => self.parse_package(),
            KwPrimitive => self.parse_udp_decl(),
            KwImport => self.parse_package_import(),
            KwExport => self.parse_package_export(),
            KwTimeunit | KwTimeprecision => self.parse_timeunits_decl(),
            KwParameter | KwLocalparam => self.parse_parameter_decl(true),
            KwTypedef => self.parse_typedef(),
            KwNettype => self.parse_nettype_decl(),
            KwGenvar => self.parse_genvar_decl(),
            KwAssign => self.parse_continuous_assign(),
            KwModport => self.parse_modport_decl(),
            KwClocking => self.parse_clocking_decl(),
            KwDefault | KwGlobal if self.nth(1) == KwClocking => self.parse_clocking_decl(),
            KwSequence => self.parse_sequence_decl(),
            KwProperty => self.parse_property_decl(),
            KwLet => self.parse_let_decl(),
            KwFunction => self.parse_function_decl(),
            KwTask => self.parse_task_decl(),
            KwInitial | KwFinal | KwAlways | KwAlwaysComb | KwAlwaysFf | KwAlwaysLatch => {
                self.start_node(ProceduralBlock);
                self.bump();
                self.parse_statement();
                self.finish_node();
            }
            KwGenerate => {
                self.start_node(GenerateRegion);
                self.bump();
                while !self.at(KwEndgenerate) && !self.at_eof() {
                    if matches!(
                        self.current(),
                        KwEndmodule | KwEndinterface | KwEndprogram | KwEndpackage
                    ) {
                        break;
                    }
                    self.parse_member();
                }
                self.expect(KwEndgenerate, "'endgenerate'");
                self.finish_node();
            }
            KwIf => self.parse_if_generate(),
            KwCase => self.parse_case_generate(),
            KwFor => self.parse_loop_generate(),
            KwBegin => self.parse_generate_block(),
            KwInput | KwOutput | KwInout | KwRef => {
                if ansi_module {
                    self.error_plain(DiagnosticKind::PortDeclInANSIModule);
                }
                self.parse_port_decl();
            }
            kind if token_sets::NET_TYPE_KEYWORDS.contains(kind) => self.parse_net_declaration(),
            Semicolon => {
                self.start_node(EmptyMember);
                self.bump();
                self.finish_node();
            }
            SystemIdent => self.parse_elab_system_task(),
            KwConst | KwVar | KwStatic | KwAutomatic => self.parse_data_declaration(true),
            kind if token_sets::INTEGER_TYPE_KEYWORDS.contains(kind)
                || token_sets::REAL_TYPE_KEYWORDS.contains(kind)
                || matches!(
                    kind,
                    KwString | KwEvent | KwChandle | KwEnum | KwStruct | KwUnion
                ) =>
            {
                self.parse_data_declaration(true)
            }
            Ident | EscapedIdent => {
                if self.at_hierarchy_instantiation() {
                    self.parse_hierarchy_instantiation();
                } else if self.at_data_type() {
                    self.parse_data_declaration(true);
                } else {
                    self.recover_until(
                        DiagnosticKind::ExpectedMember,
                        token_sets::MEMBER_FIRST,
                    );
                }
            }
            Eof => {}
            _ => {
                self.recover_until(DiagnosticKind::ExpectedMember, token_sets::MEMBER_FIRST);
            }
        }
    }

    /// `name inst (...)` or `name #(...) inst (...)`.
    fn at_hierarchy_instantiation(&mut self) -> bool {
        if self.nth(1) == Pound {
            return true;
        }
        let mut la = self.lookahead();
        la.bump(); // definition name
        if !matches!(la.peek(), Ident | EscapedIdent) {
            return false;
        }
        la.bump(); // instance name
        while la.peek() == LBracket {
            if !la.skip_balanced(LBracket, RBracket) {
                return false;
            }
        }
        la.peek() == LParen
    }

    fn parse_module_like(&mut self, node: SyntaxKind, end_kw: SyntaxKind) {
        self.start_node(node);
        self.start_node(ModuleHeader);
        self.bump(); // module | interface | program
        if self.at(KwAutomatic) || self.at(KwStatic) {
            self.bump();
        }
        self.expect(Ident, "declaration name");
        if self.at(Pound) {
            self.parse_parameter_port_list();
        }
        let mut ansi = false;
        if self.at(LParen) {
            ansi = self.parse_port_list();
        }
        self.expect(Semicolon, "';' after header");
        self.finish_node(); // header

        while !self.at(end_kw) && !self.at_eof() {
            if matches!(
                self.current(),
                KwEndmodule | KwEndinterface | KwEndprogram | KwEndpackage | KwEndprimitive
            ) {
                break;
            }
            self.parse_member_in(ansi);
        }
        self.expect(end_kw, "matching end keyword");
        if self.eat(Colon) {
            self.expect(Ident, "name after ':'");
        }
        self.finish_node();
    }

    fn parse_package(&mut self) {
        self.start_node(PackageDecl);
        self.start_node(ModuleHeader);
        self.bump(); // package
        if self.at(KwAutomatic) || self.at(KwStatic) {
            self.bump();
        }
        self.expect(Ident, "package name");
        self.expect(Semicolon, "';' after package header");
        self.finish_node();

        while !self.at(KwEndpackage) && !self.at_eof() {
            if matches!(self.current(), KwEndmodule | KwEndinterface | KwEndprogram) {
                break;
            }
            self.parse_member();
        }
        self.expect(KwEndpackage, "'endpackage'");
        if self.eat(Colon) {
            self.expect(Ident, "package name after ':'");
        }
        self.finish_node();
    }

    /// `#( parameter ... , ... )`
    fn parse_parameter_port_list(&mut self) {
        self.start_node(ParameterPortList);
        self.bump(); // '#'
        self.expect(LParen, "'(' opening parameter ports");
        if !self.at(RParen) {
            loop {
                self.start_node(ParameterPort);
                self.parse_parameter_decl(false);
                self.finish_node();
                if !self.eat(Comma) {
                    break;
                }
            }
        }
        self.expect(RParen, "')' closing parameter ports");
        self.finish_node();
    }

    /// Parses the port list; returns true when it is ANSI style.
    fn parse_port_list(&mut self) -> bool {
        // `(a, b, c)` is non-ANSI; anything with directions or types is ANSI.
        let non_ansi =
            matches!(self.nth(1), Ident | EscapedIdent) && matches!(self.nth(2), Comma | RParen);

        if non_ansi {
            self.start_node(NonAnsiPortList);
            self.bump(); // '('
            loop {
                self.start_node(NonAnsiPort);
                if self.at(Ident) || self.at(EscapedIdent) {
                    self.bump();
                } else {
                    self.expect(Ident, "port name");
                }
                self.finish_node();
                if !self.eat(Comma) {
                    break;
                }
            }
            self.expect(RParen, "')' closing port list");
            self.finish_node();
            false
        } else {
            self.start_node(AnsiPortList);
            self.bump(); // '('
            if !self.at(RParen) {
                loop {
                    self.parse_ansi_port();
                    if !self.eat(Comma) {
                        break;
                    }
                }
            }
            self.expect(RParen, "')' closing port list");
            self.finish_node();
            true
        }
    }

    fn parse_ansi_port(&mut self) {
        self.start_node(AnsiPort);
        if token_sets::DIRECTION_KEYWORDS.contains(self.current()) {
            self.bump();
        }
        if token_sets::NET_TYPE_KEYWORDS.contains(self.current()) || self.at(KwVar) {
            self.bump();
        }
        // `iface.modport name` interface port.
        if self.at(Ident) && self.nth(1) == Dot && self.nth(2) == Ident && self.nth(3) == Ident {
            self.start_node(NamedType);
            self.start_node(NameRef);
            self.bump();
            self.finish_node();
            self.bump(); // '.'
            self.bump(); // modport name
            self.finish_node();
        } else {
            self.parse_data_type_or_implicit();
        }
        if self.at(Ident) || self.at(EscapedIdent) {
            self.bump();
        } else {
            self.expect(Ident, "port name");
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

    // --- subroutines --------------------------------------------------------

    pub(crate) fn parse_function_decl(&mut self) {
        self.start_node(FunctionDecl);
        self.bump(); // function
        if self.at(KwAutomatic) || self.at(KwStatic) {
            self.bump();
        }
        // Return type then name, or bare name with implicit return.
        if self.at(KwVoid) || self.at_data_type() {
            self.parse_data_type();
        } else {
            self.parse_implicit_type();
        }
        self.expect(Ident, "function name");
        if self.at(LParen) {
            self.parse_tf_port_list();
        }
        self.expect(Semicolon, "';' after function header");
        self.parse_tf_body(KwEndfunction);
        self.expect(KwEndfunction, "'endfunction'");
        if self.eat(Colon) {
            self.expect(Ident, "function name after ':'");
        }
        self.finish_node();
    }

    pub(crate) fn parse_task_decl(&mut self) {
        self.start_node(TaskDecl);
        self.bump(); // task
        if self.at(KwAutomatic) || self.at(KwStatic) {
            self.bump();
        }
        self.expect(Ident, "task name");
        if self.at(LParen) {
            self.parse_tf_port_list();
        }
        self.expect(Semicolon, "';' after task header");
        self.parse_tf_body(KwEndtask);
        self.expect(KwEndtask, "'endtask'");
        if self.eat(Colon) {
            self.expect(Ident, "task name after ':'");
        }
        self.finish_node();
    }

    fn parse_tf_body(&mut self, end_kw: SyntaxKind) {
        while !self.at(end_kw) && !self.at_eof() {
            if matches!(
                self.current(),
                KwEndmodule | KwEndinterface | KwEndprogram | KwEndpackage
            ) {
                break;
            }
            self.parse_statement();
        }
    }

    /// `( [direction] type name [= default], ... )`
    pub(crate) fn parse_tf_port_list(&mut self) {
        self.start_node(TfPortList);
        self.bump(); // '('
        if !self.at(RParen) {
            loop {
                self.parse_tf_port();
                if !self.eat(Comma) {
                    break;
                }
            }
        }
        self.expect(RParen, "')' closing port list");
        self.finish_node();
    }

    fn parse_tf_port(&mut self) {
        self.start_node(TfPort);
        if token_sets::DIRECTION_KEYWORDS.contains(self.current()) {
            self.bump();
        }
        self.eat(KwConst);
        self.eat(KwVar);
        self.parse_data_type_or_implicit();
        if self.at(Ident) || self.at(EscapedIdent) {
            self.bump();
        } else {
            self.expect(Ident, "argument name");
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

    // --- generate -----------------------------------------------------------

    fn parse_if_generate(&mut self) {
        self.start_node(IfGenerate);
        self.bump(); // if
        self.expect(LParen, "'(' after 'if'");
        self.parse_expr_or_error();
        self.expect(RParen, "')' closing condition");
        self.parse_generate_item();
        if self.eat(KwElse) {
            self.parse_generate_item();
        }
        self.finish_node();
    }

    fn parse_case_generate(&mut self) {
        self.start_node(CaseGenerate);
        self.bump(); // case
        self.expect(LParen, "'(' after 'case'");
        self.parse_expr_or_error();
        self.expect(RParen, "')' closing case expression");
        while !self.at(KwEndcase) && !self.at_eof() {
            self.start_node(CaseItem);
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
            self.parse_generate_item();
            self.finish_node();
        }
        self.expect(KwEndcase, "'endcase'");
        self.finish_node();
    }

    fn parse_loop_generate(&mut self) {
        self.start_node(LoopGenerate);
        self.bump(); // for
        self.expect(LParen, "'(' after 'for'");
        self.eat(KwGenvar);
        self.expect(Ident, "loop variable");
        self.expect(Equals, "'=' in loop initializer");
        self.parse_expr_or_error();
        self.expect(Semicolon, "';' after initializer");
        self.parse_expr_or_error();
        self.expect(Semicolon, "';' after condition");
        if !self.at(RParen) {
            self.parse_expr_or_error();
            if stmts_assign_op(self.current()) {
                self.bump();
                self.parse_expr_or_error();
            }
        }
        self.expect(RParen, "')' closing loop header");
        self.parse_generate_item();
        self.finish_node();
    }

    fn parse_generate_item(&mut self) {
        if self.at(KwBegin) {
            self.parse_generate_block();
        } else {
            self.parse_member();
        }
    }

    fn parse_generate_block(&mut self) {
        self.start_node(GenerateBlock);
        self.bump(); // begin
        if self.eat(Colon) {
            self.expect(Ident, "block name after ':'");
        }
        while !self.at(KwEnd) && !self.at_eof() {
            if matches!(
                self.current(),
                KwEndmodule | KwEndinterface | KwEndprogram | KwEndpackage | KwEndgenerate
            ) {
                break;
            }
            self.parse_member();
        }
        self.expect(KwEnd, "'end' closing generate block");
        if self.eat(Colon) {
            self.expect(Ident, "block name after ':'");
        }
        self.finish_node();
    }
}

fn stmts_assign_op(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        Equals
            | PlusEquals
            | MinusEquals
            | StarEquals
            | SlashEquals
            | PercentEquals
            | AndEquals
            | OrEquals
            | XorEquals
            | ShiftLeftEquals
            | ShiftRightEquals
            | ArithShiftLeftEquals
            | ArithShiftRightEquals
    )
}
