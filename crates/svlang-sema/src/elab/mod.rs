//! Scope population: turning syntax members into symbols.
//!
//! Symbols are created eagerly, in source order, as scopes are bound; the
//! data hanging off them (types, values, delays) resolves lazily. Each
//! submodule owns the elaboration rules for one declaration family.

mod assertions;
mod clocking;
mod instances;
mod modports;
mod randseq;
mod tasks;
mod udp;

use svlang_core::diagnostics::DiagnosticKind;
use svlang_core::source::FileSpan;
use svlang_syntax::ast::{self, Member};
use svlang_syntax::cst::{SyntaxKind, SyntaxNode};
use svlang_syntax::{TimeScaleValue, TokenValue};

use crate::symbol::{
    DeclaredType, DefinitionKind, Direction, Lifetime, LookupLocation, NetKind, ScopeId,
    SubroutineKind, SymbolData, SymbolId, SymbolKind, VarFlags,
};
use crate::value::SvInt;
use crate::{Compilation, LookupFlags};

/// Context threaded through scope population.
#[derive(Clone, Copy)]
pub(crate) struct BindCtx {
    pub tree: u32,
    pub scope_owner: SymbolId,
    pub scope: ScopeId,
    pub procedural: bool,
}

impl Compilation {
    /// Binds one parsed tree as a compilation unit under the root.
    pub(crate) fn bind_unit(&mut self, tree: u32) {
        if let Some(scale) = self.tree(tree).time_scale() {
            self.set_time_scale(scale.unit, None);
        }

        let unit_name = self.intern("");
        let root = self.root();
        let root_scope = self.symbol(root).scope.expect("root is a scope");
        let decl_index = self.next_decl_index();
        let unit = self.alloc_symbol(SymbolData {
            name: unit_name,
            span: None,
            parent: Some(root),
            scope: None,
            decl_index,
            kind: SymbolKind::CompilationUnit,
        });
        let scope = self.alloc_scope();
        self.symbol_mut(unit).scope = Some(scope);
        self.add_member(root_scope, unit);

        let ctx = BindCtx {
            tree,
            scope_owner: unit,
            scope,
            procedural: false,
        };
        let ast_root = self.tree(tree).ast_root();
        let members: Vec<_> = ast_root.members().collect();
        for member in members {
            self.bind_member(ctx, &member);
        }
    }

    pub(crate) fn bind_member(&mut self, ctx: BindCtx, member: &Member) {
        match member {
            Member::Module(decl) => {
                self.bind_definition(ctx, DefinitionKind::Module, decl.name(), decl.syntax())
            }
            Member::Interface(decl) => {
                self.bind_definition(ctx, DefinitionKind::Interface, decl.name(), decl.syntax())
            }
            Member::Program(decl) => {
                self.bind_definition(ctx, DefinitionKind::Program, decl.name(), decl.syntax())
            }
            Member::Package(decl) => self.bind_package(ctx, decl),
            Member::Udp(decl) => self.bind_udp(ctx, decl),
            Member::Import(decl) => self.bind_import(ctx, decl),
            Member::Export(decl) => self.bind_export(ctx, decl),
            Member::Timeunits(decl) => self.bind_timeunits(ctx, decl),
            Member::Data(decl) => self.bind_data_decl(ctx, decl),
            Member::Net(decl) => self.bind_net_decl(ctx, decl),
            Member::Nettype(decl) => self.bind_nettype_decl(ctx, decl),
            Member::Typedef(decl) => self.bind_typedef(ctx, decl),
            Member::Parameter(decl) => {
                self.bind_parameter_decl(ctx, decl.decl_type(), decl.assignments(), decl.is_type_param(), false)
            }
            Member::Localparam(decl) => {
                self.bind_parameter_decl(ctx, decl.decl_type(), decl.assignments(), decl.is_type_param(), true)
            }
            Member::ContinuousAssign(decl) => self.bind_continuous_assign(ctx, decl),
            Member::Genvar(decl) => self.bind_genvar(ctx, decl),
            Member::Instantiation(decl) => self.bind_instantiation(ctx, decl),
            Member::Modport(decl) => self.bind_modport_decl(ctx, decl),
            Member::Clocking(decl) => self.bind_clocking_decl(ctx, decl),
            Member::Sequence(decl) => self.bind_sequence_decl(ctx, decl),
            Member::Property(decl) => self.bind_property_decl(ctx, decl),
            Member::Let(decl) => self.bind_let_decl(ctx, decl),
            Member::ElabTask(task) => self.bind_elab_task(ctx, task),
            Member::Function(decl) => self.bind_subroutine(
                ctx,
                SubroutineKind::Function,
                decl.name(),
                decl.lifetime(),
                decl.return_type(),
                decl.tf_ports().collect(),
                decl.syntax(),
            ),
            Member::Task(decl) => self.bind_subroutine(
                ctx,
                SubroutineKind::Task,
                decl.name(),
                decl.lifetime(),
                None,
                decl.tf_ports().collect(),
                decl.syntax(),
            ),
            Member::Procedural(decl) => self.bind_procedural_block(ctx, decl),
            Member::GenerateRegion(region) => {
                let members: Vec<_> = region.members().collect();
                for member in members {
                    self.bind_member(ctx, &member);
                }
            }
            Member::IfGenerate(r#gen) => self.bind_if_generate(ctx, r#gen),
            Member::CaseGenerate(r#gen) => self.bind_case_generate(ctx, r#gen),
            Member::LoopGenerate(r#gen) => self.bind_loop_generate(ctx, r#gen),
            Member::GenerateBlock(block) => {
                self.bind_generate_block(ctx, block.name(), block.members().collect(), None);
            }
            Member::PortDecl(decl) => self.bind_port_decl(ctx, decl),
            Member::Empty(decl) => {
                let span = self.span_of(ctx.tree, decl.syntax());
                let name = self.intern("");
                self.new_member(ctx, name, span, SymbolKind::EmptyMember);
            }
        }
    }

    // --- shared helpers -----------------------------------------------------

    /// Allocates a symbol and adds it to the context scope.
    pub(crate) fn new_member(
        &mut self,
        ctx: BindCtx,
        name: svlang_core::intern::Name,
        span: Option<FileSpan>,
        kind: SymbolKind,
    ) -> SymbolId {
        let decl_index = self.next_decl_index();
        let symbol = self.alloc_symbol(SymbolData {
            name,
            span,
            parent: Some(ctx.scope_owner),
            scope: None,
            decl_index,
            kind,
        });
        self.add_member(ctx.scope, symbol);
        symbol
    }

    /// Allocates a scope-owning symbol and adds it to the context scope.
    pub(crate) fn new_scope_member(
        &mut self,
        ctx: BindCtx,
        name: svlang_core::intern::Name,
        span: Option<FileSpan>,
        kind: SymbolKind,
        procedural: bool,
    ) -> (SymbolId, ScopeId) {
        let symbol = self.new_member(ctx, name, span, kind);
        let scope = self.alloc_scope();
        self.scope_data_mut(scope).is_procedural = procedural;
        self.symbol_mut(symbol).scope = Some(scope);
        (symbol, scope)
    }

    pub(crate) fn token_name(
        &mut self,
        token: Option<svlang_syntax::SyntaxToken>,
    ) -> svlang_core::intern::Name {
        match token {
            Some(t) => self.intern(t.text()),
            None => self.intern(""),
        }
    }

    // --- definitions and packages -------------------------------------------

    fn bind_definition(
        &mut self,
        ctx: BindCtx,
        kind: DefinitionKind,
        name: Option<svlang_syntax::SyntaxToken>,
        syntax: &SyntaxNode,
    ) {
        let name = self.token_name(name);
        let span = self.span_of(ctx.tree, syntax);
        let symbol = self.new_member(
            ctx,
            name,
            span,
            SymbolKind::Definition {
                kind,
                tree: ctx.tree,
                syntax: syntax.clone(),
                default_body: None,
            },
        );
        self.register_definition(name, symbol);
    }

    fn bind_package(&mut self, ctx: BindCtx, decl: &ast::PackageDecl) {
        let name = self.token_name(decl.name());
        let span = self.span_of(ctx.tree, decl.syntax());
        let (symbol, scope) = self.new_scope_member(ctx, name, span, SymbolKind::Package, false);
        self.register_package(name, symbol);

        let inner = BindCtx {
            tree: ctx.tree,
            scope_owner: symbol,
            scope,
            procedural: false,
        };
        let members: Vec<_> = decl.members().collect();
        for member in members {
            self.bind_member(inner, &member);
        }
    }

    // --- imports --------------------------------------------------------------

    fn bind_import(&mut self, ctx: BindCtx, decl: &ast::PackageImportDecl) {
        let items: Vec<_> = decl.items().collect();
        for item in items {
            let Some(pkg_token) = item.package() else { continue };
            let pkg_text = pkg_token.text().to_string();
            let pkg_name = self.intern(&pkg_text);
            let span = self.span_of(ctx.tree, item.syntax());

            let Some(package) = self.packages.get(&pkg_name).copied() else {
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::UnknownPackage, span)
                        .arg(pkg_text)
                        .emit();
                }
                continue;
            };

            if item.is_wildcard() {
                let decl_index = self.next_decl_index();
                self.scope_data_mut(ctx.scope)
                    .wildcard_imports
                    .push(crate::symbol::WildcardImport {
                        package,
                        decl_index,
                    });
            } else if let Some(imported) = item.imported() {
                let member_text = imported.text().to_string();
                let member_name = self.intern(&member_text);
                let pkg_scope = self.symbol(package).scope;
                let target = pkg_scope
                    .and_then(|s| self.scope_data(s).name_map.get(&member_name).copied());
                match target {
                    Some(target) => {
                        let scope = self.scope_data_mut(ctx.scope);
                        if scope.name_map.contains_key(&member_name) {
                            if let Some(span) = span {
                                self.diagnostics_mut()
                                    .report(DiagnosticKind::ImportNameCollision, span)
                                    .arg(member_text)
                                    .emit();
                            }
                        } else {
                            scope.imported.insert(member_name, target);
                        }
                    }
                    None => {
                        if let Some(span) = span {
                            self.diagnostics_mut()
                                .report(DiagnosticKind::UndeclaredIdentifier, span)
                                .arg(member_text)
                                .emit();
                        }
                    }
                }
            }
        }
    }

    fn bind_export(&mut self, ctx: BindCtx, decl: &ast::PackageExportDecl) {
        let items: Vec<_> = decl.items().collect();
        for item in items {
            let Some(pkg_token) = item.package() else { continue };
            let pkg_text = pkg_token.text().to_string();
            let pkg_name = self.intern(&pkg_text);
            if let Some(package) = self.packages.get(&pkg_name).copied() {
                self.scope_data_mut(ctx.scope).exports.push(package);
            }
        }
    }

    // --- time units -----------------------------------------------------------

    fn bind_timeunits(&mut self, ctx: BindCtx, decl: &ast::TimeunitsDecl) {
        let is_unit = decl.keyword().map(|t| t.kind()) == Some(SyntaxKind::KwTimeunit);
        if !is_unit {
            return;
        }
        let Some(first) = decl.literals().next() else {
            return;
        };
        let Some(TokenValue::Time { value, unit }) = first.value() else {
            return;
        };
        if value.fract() != 0.0 {
            return;
        }
        let scale = TimeScaleValue {
            magnitude: value as u16,
            unit,
        };
        let span = self.span_of(ctx.tree, decl.syntax());
        match self.established_time_scale() {
            Some(existing) if scale_seconds(existing) != scale_seconds(scale) => {
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::MismatchedTimeScales, span)
                        .emit();
                }
            }
            Some(_) => {}
            None => self.set_time_scale(scale, span),
        }
    }

    // --- data declarations -----------------------------------------------------

    pub(crate) fn bind_data_decl(&mut self, ctx: BindCtx, decl: &ast::DataDecl) {
        // A declaration whose named type resolves to a nettype declares
        // user-defined nets, not variables.
        if let Some(nettype) = self.nettype_target(ctx, decl) {
            self.bind_user_defined_nets(ctx, decl, nettype);
            return;
        }

        let has_const = decl.has_modifier(SyntaxKind::KwConst);
        let has_static = decl.has_modifier(SyntaxKind::KwStatic);
        let has_automatic = decl.has_modifier(SyntaxKind::KwAutomatic);

        let lifetime = if has_automatic {
            if !ctx.procedural {
                if let Some(span) = self.span_of(ctx.tree, decl.syntax()) {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::AutomaticNotAllowedHere, span)
                        .emit();
                }
                Lifetime::Static
            } else {
                Lifetime::Automatic
            }
        } else if has_static {
            Lifetime::Static
        } else if ctx.procedural {
            self.scope_data(ctx.scope).default_lifetime
        } else {
            Lifetime::Static
        };

        let type_syntax = decl.decl_type().map(|t| t.syntax().clone());
        if let Some(node) = &type_syntax {
            self.bind_enum_members(ctx, node);
        }

        let declarators: Vec<_> = decl.declarators().collect();
        for declarator in declarators {
            let name = self.token_name(declarator.name());
            let span = self
                .span_of(ctx.tree, declarator.syntax())
                .or_else(|| self.span_of(ctx.tree, decl.syntax()));
            let initializer = declarator.init().and_then(|i| i.expr()).map(|e| e.syntax().clone());

            // A static variable with an initializer inside a procedural
            // context must say `static` explicitly.
            if ctx.procedural
                && lifetime == Lifetime::Static
                && !has_static
                && !has_automatic
                && initializer.is_some()
                && let Some(span) = span
            {
                self.diagnostics_mut()
                    .report(DiagnosticKind::StaticInitializerMustBeExplicit, span)
                    .emit();
            }

            if has_const && initializer.is_none() {
                let name_text = self.names.resolve(name).to_string();
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::ConstVarWithoutInitializer, span)
                        .arg(name_text)
                        .emit();
                }
            }

            let mut declared = DeclaredType::from_syntax(ctx.tree, type_syntax.clone());
            declared.dims = declarator.dimensions().map(|d| d.syntax().clone()).collect();
            if lifetime == Lifetime::Automatic {
                declared.flags.automatic_initializer = true;
            }

            self.new_member(
                ctx,
                name,
                span,
                SymbolKind::Variable {
                    declared,
                    initializer,
                    lifetime,
                    flags: VarFlags {
                        is_const: has_const,
                        ..VarFlags::default()
                    },
                },
            );
        }
    }

    /// The nettype symbol a data declaration's type names, if any.
    fn nettype_target(&mut self, ctx: BindCtx, decl: &ast::DataDecl) -> Option<SymbolId> {
        let Some(ast::DataType::Named(named)) = decl.decl_type() else {
            return None;
        };
        let name_text = named.name_token()?.text().to_string();
        let name = self.intern(&name_text);
        let target = if let Some(pkg) = named.package_token() {
            let pkg_name = self.intern(pkg.text());
            let package = self.packages.get(&pkg_name).copied()?;
            let scope = self.symbol(package).scope?;
            self.scope_data(scope).name_map.get(&name).copied()?
        } else {
            self.lookup(
                ctx.scope_owner,
                name,
                LookupLocation::ANYWHERE,
                LookupFlags::default(),
            )?
        };
        matches!(self.symbol(target).kind, SymbolKind::Nettype { .. }).then_some(target)
    }

    fn bind_user_defined_nets(&mut self, ctx: BindCtx, decl: &ast::DataDecl, nettype: SymbolId) {
        let in_package = matches!(self.symbol(ctx.scope_owner).kind, SymbolKind::Package);
        let declarators: Vec<_> = decl.declarators().collect();
        for declarator in declarators {
            let name = self.token_name(declarator.name());
            let span = self.span_of(ctx.tree, declarator.syntax());
            let initializer =
                declarator.init().and_then(|i| i.expr()).map(|e| e.syntax().clone());

            if in_package && initializer.is_some() {
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::NetInitializerInPackage, span)
                        .emit();
                }
            }

            // The net's declared type is an alias of the nettype's.
            let mut declared = DeclaredType::linked(ctx.tree, nettype);
            declared.dims = declarator.dimensions().map(|d| d.syntax().clone()).collect();
            declared.flags.net_type = true;

            self.new_member(
                ctx,
                name,
                span,
                SymbolKind::Net {
                    declared,
                    net_kind: NetKind::UserDefined(nettype),
                    initializer,
                    decl_syntax: Some(decl.syntax().clone()),
                    delay: None,
                    implicit: false,
                },
            );
        }
    }

    pub(crate) fn bind_net_decl(&mut self, ctx: BindCtx, decl: &ast::NetDecl) {
        let net_kw = decl
            .net_type()
            .map(|t| t.kind())
            .unwrap_or(SyntaxKind::KwWire);
        let in_package = matches!(self.symbol(ctx.scope_owner).kind, SymbolKind::Package);
        let type_syntax = decl.decl_type().map(|t| t.syntax().clone());

        let declarators: Vec<_> = decl.declarators().collect();
        for declarator in declarators {
            let name = self.token_name(declarator.name());
            let span = self.span_of(ctx.tree, declarator.syntax());
            let initializer =
                declarator.init().and_then(|i| i.expr()).map(|e| e.syntax().clone());

            if in_package && initializer.is_some() {
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::NetInitializerInPackage, span)
                        .emit();
                }
            }

            let mut declared = DeclaredType::from_syntax(ctx.tree, type_syntax.clone());
            declared.dims = declarator.dimensions().map(|d| d.syntax().clone()).collect();
            declared.flags.net_type = true;

            self.new_member(
                ctx,
                name,
                span,
                SymbolKind::Net {
                    declared,
                    net_kind: NetKind::Builtin(net_kw),
                    initializer,
                    decl_syntax: Some(decl.syntax().clone()),
                    delay: None,
                    implicit: false,
                },
            );
        }
    }

    /// A net's delay value, computed lazily from the parent declaration.
    pub fn net_delay(&mut self, symbol: SymbolId) -> Option<SvInt> {
        if let SymbolKind::Net {
            delay: Some(delay), ..
        } = &self.symbol(symbol).kind
        {
            return *delay;
        }
        let (decl_syntax, net_kind, tree) = match &self.symbol(symbol).kind {
            SymbolKind::Net {
                decl_syntax,
                net_kind,
                declared,
                ..
            } => (decl_syntax.clone(), *net_kind, declared.tree),
            _ => return None,
        };

        let delay_expr = decl_syntax
            .and_then(ast::NetDecl::cast)
            .and_then(|d| d.delay())
            .and_then(|d| d.expr());

        let computed = match delay_expr {
            Some(expr) => {
                if let NetKind::UserDefined(_) = net_kind {
                    if let Some(span) = self.symbol(symbol).span {
                        self.diagnostics_mut()
                            .report(DiagnosticKind::DelayNotAllowedOnNettype, span)
                            .emit();
                    }
                    None
                } else {
                    let owner = crate::declared::symbol_scope_owner(self, symbol);
                    let at = LookupLocation(self.symbol(symbol).decl_index);
                    self.eval_expr_in(owner, at, tree, &expr)
                        .and_then(|v| v.as_int())
                }
            }
            None => None,
        };

        if let SymbolKind::Net { delay, .. } = &mut self.symbol_mut(symbol).kind {
            *delay = Some(computed);
        }
        computed
    }

    // --- other declarations ----------------------------------------------------

    fn bind_nettype_decl(&mut self, ctx: BindCtx, decl: &ast::NettypeDecl) {
        let name = self.token_name(decl.name());
        let span = self.span_of(ctx.tree, decl.syntax());
        let declared =
            DeclaredType::from_syntax(ctx.tree, decl.decl_type().map(|t| t.syntax().clone()));
        let resolver = decl
            .resolver()
            .and_then(|r| r.token())
            .map(|t| self.intern(t.text()));
        self.new_member(ctx, name, span, SymbolKind::Nettype { declared, resolver });
    }

    fn bind_typedef(&mut self, ctx: BindCtx, decl: &ast::TypedefDecl) {
        if let Some(ty) = decl.decl_type() {
            self.bind_enum_members(ctx, ty.syntax());
        }
        let name = self.token_name(decl.name());
        let span = self.span_of(ctx.tree, decl.syntax());
        let mut declared =
            DeclaredType::from_syntax(ctx.tree, decl.decl_type().map(|t| t.syntax().clone()));
        declared.dims = decl
            .syntax()
            .children()
            .filter(|n| n.kind() == SyntaxKind::Dimension)
            .collect();
        self.new_member(ctx, name, span, SymbolKind::TypeAlias { declared });
    }

    pub(crate) fn bind_parameter_decl(
        &mut self,
        ctx: BindCtx,
        decl_type: Option<ast::DataType>,
        assignments: impl Iterator<Item = ast::ParamAssignment>,
        is_type: bool,
        is_local: bool,
    ) {
        let type_syntax = decl_type.map(|t| t.syntax().clone());
        let assignments: Vec<_> = assignments.collect();
        for assignment in assignments {
            let name = self.token_name(assignment.name());
            let span = self.span_of(ctx.tree, assignment.syntax());
            let init = assignment.init().and_then(|i| {
                if is_type {
                    i.init_type().map(|t| t.syntax().clone())
                } else {
                    i.expr().map(|e| e.syntax().clone())
                }
            });
            let declared = DeclaredType::from_syntax(ctx.tree, type_syntax.clone());
            self.new_member(
                ctx,
                name,
                span,
                SymbolKind::Parameter {
                    declared,
                    init,
                    is_local,
                    is_type,
                    value: None,
                    override_value: None,
                },
            );
        }
    }

    fn bind_genvar(&mut self, ctx: BindCtx, decl: &ast::GenvarDecl) {
        let declarators: Vec<_> = decl.declarators().collect();
        for declarator in declarators {
            let name = self.token_name(declarator.name());
            let span = self.span_of(ctx.tree, declarator.syntax());
            self.new_member(ctx, name, span, SymbolKind::Genvar);
        }
    }

    /// Enum members declared inside a type spill into the enclosing scope,
    /// with eagerly computed values.
    pub(crate) fn bind_enum_members(&mut self, ctx: BindCtx, type_syntax: &SyntaxNode) {
        let enums: Vec<_> = type_syntax
            .descendants()
            .filter_map(ast::EnumType::cast)
            .collect();
        for enum_type in enums {
            let mut previous: Option<SvInt> = None;
            let members: Vec<_> = enum_type.members().collect();
            for member in members {
                let name = self.token_name(member.name());
                let span = self.span_of(ctx.tree, member.syntax());
                let value = match member.init().and_then(|i| i.expr()) {
                    Some(expr) => {
                        let at = LookupLocation(self.decl_counter + 1);
                        self.eval_expr_in(ctx.scope_owner, at, ctx.tree, &expr)
                            .and_then(|v| v.as_int())
                    }
                    None => match previous {
                        Some(prev) => Some(SvInt::from_i64(prev.as_i64() + 1)),
                        None => Some(SvInt::from_i64(0)),
                    },
                };
                previous = value;
                self.new_member(ctx, name, span, SymbolKind::EnumValue { value });
            }
        }
    }

    // --- continuous assigns ------------------------------------------------------

    fn bind_continuous_assign(&mut self, ctx: BindCtx, decl: &ast::ContinuousAssign) {
        let items: Vec<_> = decl.items().collect();
        for item in items {
            let span = self.span_of(ctx.tree, item.syntax());
            if let Some(lhs) = item.lhs() {
                self.ensure_assign_lhs(ctx, &lhs);
            }
            let name = self.intern("");
            self.new_member(
                ctx,
                name,
                span,
                SymbolKind::ContinuousAssign {
                    tree: ctx.tree,
                    syntax: item.syntax().clone(),
                },
            );
        }
    }

    /// Implicit-net creation: a bare identifier on a continuous assign LHS
    /// that resolves to nothing becomes a one-bit net of the active default
    /// net type, unless that is `none`.
    fn ensure_assign_lhs(&mut self, ctx: BindCtx, lhs: &ast::Expr) {
        let base = assign_base_name(lhs);
        let Some((name_node, bare)) = base else { return };
        let Some(token) = name_node.token() else { return };
        let text = token.text().to_string();
        let name = self.intern(&text);

        let found = self.lookup(
            ctx.scope_owner,
            name,
            LookupLocation::ANYWHERE,
            LookupFlags {
                allow_declared_after: true,
                no_parent: false,
            },
        );
        if found.is_some() {
            return;
        }

        let span = self.span_of(ctx.tree, name_node.syntax());
        let index = self.token_index_of(ctx.tree, name_node.syntax());
        let default = index
            .map(|i| self.tree(ctx.tree).default_nettype().at(i))
            .unwrap_or_default();

        if !bare || default == svlang_syntax::DefaultNetType::None {
            if let Some(span) = span {
                self.diagnostics_mut()
                    .report(DiagnosticKind::UndeclaredIdentifier, span)
                    .arg(text)
                    .emit();
            }
            return;
        }

        let net_kw = match default {
            svlang_syntax::DefaultNetType::Wire => SyntaxKind::KwWire,
            svlang_syntax::DefaultNetType::Tri => SyntaxKind::KwTri,
            svlang_syntax::DefaultNetType::Tri0 => SyntaxKind::KwTri0,
            svlang_syntax::DefaultNetType::Tri1 => SyntaxKind::KwTri1,
            svlang_syntax::DefaultNetType::Triand => SyntaxKind::KwTriand,
            svlang_syntax::DefaultNetType::Trior => SyntaxKind::KwTrior,
            svlang_syntax::DefaultNetType::Trireg => SyntaxKind::KwTrireg,
            svlang_syntax::DefaultNetType::Wand => SyntaxKind::KwWand,
            svlang_syntax::DefaultNetType::Wor => SyntaxKind::KwWor,
            svlang_syntax::DefaultNetType::Uwire => SyntaxKind::KwUwire,
            svlang_syntax::DefaultNetType::None => unreachable!("checked above"),
        };

        let declared = DeclaredType::from_syntax(ctx.tree, None);
        self.new_member(
            ctx,
            name,
            span,
            SymbolKind::Net {
                declared,
                net_kind: NetKind::Builtin(net_kw),
                initializer: None,
                decl_syntax: None,
                delay: None,
                implicit: true,
            },
        );
    }

    // --- ports, subroutines, procedures ------------------------------------------

    fn bind_port_decl(&mut self, ctx: BindCtx, decl: &ast::PortDecl) {
        let direction = decl
            .direction()
            .and_then(|t| Direction::from_token(t.kind()))
            .unwrap_or(Direction::In);
        let type_syntax = decl.port_type().map(|t| t.syntax().clone());
        let declarators: Vec<_> = decl.declarators().collect();
        for declarator in declarators {
            let name = self.token_name(declarator.name());
            let span = self.span_of(ctx.tree, declarator.syntax());
            let mut declared = DeclaredType::from_syntax(ctx.tree, type_syntax.clone());
            declared.dims = declarator.dimensions().map(|d| d.syntax().clone()).collect();

            // Non-ANSI input/inout ports without `var` are nets; outputs with
            // a variable type are variables.
            let is_var = matches!(direction, Direction::Out | Direction::Ref)
                && matches!(
                    decl.port_type(),
                    Some(ast::DataType::Integer(_)) | Some(ast::DataType::Named(_))
                );
            if is_var {
                self.new_member(
                    ctx,
                    name,
                    span,
                    SymbolKind::Variable {
                        declared,
                        initializer: None,
                        lifetime: Lifetime::Static,
                        flags: VarFlags::default(),
                    },
                );
            } else {
                declared.flags.net_type = true;
                self.new_member(
                    ctx,
                    name,
                    span,
                    SymbolKind::Net {
                        declared,
                        net_kind: NetKind::Builtin(SyntaxKind::KwWire),
                        initializer: None,
                        decl_syntax: None,
                        delay: None,
                        implicit: false,
                    },
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn bind_subroutine(
        &mut self,
        ctx: BindCtx,
        kind: SubroutineKind,
        name: Option<svlang_syntax::SyntaxToken>,
        lifetime: Option<svlang_syntax::SyntaxToken>,
        return_type: Option<ast::DataType>,
        ports: Vec<ast::TfPort>,
        syntax: &SyntaxNode,
    ) {
        let name = self.token_name(name);
        let span = self.span_of(ctx.tree, syntax);
        let lifetime = match lifetime.map(|t| t.kind()) {
            Some(SyntaxKind::KwAutomatic) => Lifetime::Automatic,
            _ => Lifetime::Static,
        };
        let return_declared =
            DeclaredType::from_syntax(ctx.tree, return_type.map(|t| t.syntax().clone()));

        let (symbol, scope) = self.new_scope_member(
            ctx,
            name,
            span,
            SymbolKind::Subroutine {
                kind,
                return_type: return_declared,
                lifetime,
            },
            true,
        );
        self.scope_data_mut(scope).default_lifetime = lifetime;

        let inner = BindCtx {
            tree: ctx.tree,
            scope_owner: symbol,
            scope,
            procedural: true,
        };

        let mut previous: Option<SymbolId> = None;
        for port in ports {
            previous = Some(self.bind_tf_port(inner, &port, previous));
        }

        // Block-level declarations inside the body become members so the
        // subroutine is a real scope; statements stay as syntax.
        let decls: Vec<_> = syntax
            .children()
            .filter_map(ast::VariableDeclStatement::cast)
            .collect();
        for decl_stmt in decls {
            if let Some(decl) = decl_stmt
                .syntax()
                .children()
                .find_map(ast::DataDecl::cast)
            {
                self.bind_data_decl(inner, &decl);
            }
        }
    }

    /// One task/function formal. A port with no type inherits the previous
    /// formal's declared type.
    pub(crate) fn bind_tf_port(
        &mut self,
        ctx: BindCtx,
        port: &ast::TfPort,
        previous: Option<SymbolId>,
    ) -> SymbolId {
        let name = self.token_name(port.name());
        let span = self.span_of(ctx.tree, port.syntax());
        let direction = port
            .direction()
            .and_then(|t| Direction::from_token(t.kind()))
            .unwrap_or(Direction::In);

        let explicit_type = port.port_type().and_then(|t| match &t {
            ast::DataType::Implicit(i) if i.is_empty() => None,
            other => Some(other.syntax().clone()),
        });
        let mut declared = match (&explicit_type, previous) {
            (None, Some(prev)) => DeclaredType::linked(ctx.tree, prev),
            _ => DeclaredType::from_syntax(ctx.tree, explicit_type),
        };
        declared.dims = port.syntax().children().filter(|n| n.kind() == SyntaxKind::Dimension).collect();
        declared.flags.formal_arg_merge_var = true;

        let default = port
            .default_value()
            .and_then(|i| i.expr())
            .map(|e| e.syntax().clone());
        self.new_member(
            ctx,
            name,
            span,
            SymbolKind::FormalArg {
                declared,
                direction,
                default,
            },
        )
    }

    fn bind_procedural_block(&mut self, ctx: BindCtx, decl: &ast::ProceduralBlock) {
        let keyword = decl
            .keyword()
            .map(|t| t.kind())
            .unwrap_or(SyntaxKind::KwInitial);
        let name = self.intern("");
        let span = self.span_of(ctx.tree, decl.syntax());
        let (symbol, scope) =
            self.new_scope_member(ctx, name, span, SymbolKind::ProceduralBlock { keyword }, true);

        let inner = BindCtx {
            tree: ctx.tree,
            scope_owner: symbol,
            scope,
            procedural: true,
        };
        // Randsequence statements anywhere under the block introduce
        // production symbols.
        let randseqs: Vec<_> = decl
            .syntax()
            .descendants()
            .filter_map(ast::RandsequenceStatement::cast)
            .collect();
        for statement in randseqs {
            self.bind_randsequence(inner, &statement);
        }
    }

    // --- generate ------------------------------------------------------------

    fn bind_if_generate(&mut self, ctx: BindCtx, r#gen: &ast::IfGenerate) {
        let condition = r#gen
            .syntax()
            .children()
            .find_map(ast::Expr::cast)
            .and_then(|e| {
                let at = LookupLocation(self.decl_counter + 1);
                self.eval_expr_in(ctx.scope_owner, at, ctx.tree, &e)
            })
            .and_then(|v| v.to_bool());

        let branches: Vec<_> = r#gen
            .syntax()
            .children()
            .filter(|n| {
                matches!(
                    n.kind(),
                    SyntaxKind::GenerateBlock
                ) || Member::cast(n.clone()).is_some()
            })
            .collect();
        let taken = match condition {
            Some(true) => branches.first().cloned(),
            Some(false) => branches.get(1).cloned(),
            None => None,
        };
        if let Some(node) = taken {
            self.bind_generate_item(ctx, &node);
        }
    }

    fn bind_case_generate(&mut self, ctx: BindCtx, r#gen: &ast::CaseGenerate) {
        let at = LookupLocation(self.decl_counter + 1);
        let selector = r#gen
            .syntax()
            .children()
            .find_map(ast::Expr::cast)
            .and_then(|e| self.eval_expr_in(ctx.scope_owner, at, ctx.tree, &e));
        let Some(selector) = selector.and_then(|v| v.as_int()) else {
            return;
        };

        let items: Vec<_> = r#gen
            .syntax()
            .children()
            .filter(|n| n.kind() == SyntaxKind::CaseItem)
            .collect();
        let mut default_item: Option<SyntaxNode> = None;
        for item in &items {
            let is_default = item
                .children_with_tokens()
                .filter_map(|e| e.into_token())
                .any(|t| t.kind() == SyntaxKind::KwDefault);
            let body = item
                .children()
                .find(|n| n.kind() == SyntaxKind::GenerateBlock || Member::cast(n.clone()).is_some());
            if is_default {
                default_item = body;
                continue;
            }
            let exprs: Vec<_> = item
                .children()
                .filter_map(ast::Expr::cast)
                .collect();
            // The last expression-looking child may be the body itself when
            // the item is a bare member; bound below via `body`.
            for expr in exprs {
                if Some(expr.syntax()) == body.as_ref() {
                    continue;
                }
                let value = self.eval_expr_in(ctx.scope_owner, at, ctx.tree, &expr);
                if let Some(value) = value.and_then(|v| v.as_int())
                    && value.as_i64() == selector.as_i64()
                {
                    if let Some(body) = &body {
                        self.bind_generate_item(ctx, body);
                    }
                    return;
                }
            }
        }
        if let Some(body) = default_item {
            self.bind_generate_item(ctx, &body);
        }
    }

    fn bind_loop_generate(&mut self, ctx: BindCtx, r#gen: &ast::LoopGenerate) {
        let exprs: Vec<_> = r#gen.syntax().children().filter_map(ast::Expr::cast).collect();
        let var_token = r#gen
            .syntax()
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind() == SyntaxKind::Ident);
        let Some(var_token) = var_token else { return };
        let var_name = self.intern(var_token.text());
        let body = r#gen
            .syntax()
            .children()
            .find(|n| n.kind() == SyntaxKind::GenerateBlock || Member::cast(n.clone()).is_some());
        let Some(body) = body else { return };

        // exprs: initial value, condition, step (the step may be an
        // assignment statement whose pieces are expressions).
        let at = LookupLocation(self.decl_counter + 1);
        let Some(initial) = exprs
            .first()
            .and_then(|e| self.eval_expr_in(ctx.scope_owner, at, ctx.tree, e))
            .and_then(|v| v.as_int())
        else {
            return;
        };

        let mut value = initial.as_i64();
        for _ in 0..4096 {
            // Evaluate the loop condition with the genvar bound.
            let Some(condition) = exprs.get(1) else { break };
            let Some(result) =
                self.eval_with_genvar(ctx, condition, var_name, value)
            else {
                break;
            };
            if !result {
                break;
            }

            let block_name = {
                let base = ast::GenerateBlock::cast(body.clone())
                    .and_then(|b| b.name())
                    .map(|t| t.text().to_string())
                    .unwrap_or_else(|| "genblk".to_string());
                format!("{base}[{value}]")
            };
            let block_name = self.intern(&block_name);
            let members = match ast::GenerateBlock::cast(body.clone()) {
                Some(block) => block.members().collect(),
                None => Member::cast(body.clone()).into_iter().collect(),
            };
            self.bind_generate_block(ctx, None, members, Some((block_name, var_name, value)));

            // Step: `i = i + expr` evaluated with the genvar bound.
            let step = exprs.get(2..).and_then(|rest| rest.last());
            match step {
                Some(step_expr) => {
                    let next = self.eval_genvar_step(ctx, step_expr, var_name, value);
                    match next {
                        Some(next) if next != value => value = next,
                        _ => break,
                    }
                }
                None => break,
            }
        }
    }

    fn eval_with_genvar(
        &mut self,
        ctx: BindCtx,
        expr: &ast::Expr,
        genvar: svlang_core::intern::Name,
        value: i64,
    ) -> Option<bool> {
        let shadow = self.push_genvar_shadow(ctx, genvar, value);
        let at = LookupLocation::ANYWHERE;
        let result = self.eval_expr_in(shadow, at, ctx.tree, expr);
        result.and_then(|v| v.to_bool())
    }

    fn eval_genvar_step(
        &mut self,
        ctx: BindCtx,
        expr: &ast::Expr,
        genvar: svlang_core::intern::Name,
        value: i64,
    ) -> Option<i64> {
        let shadow = self.push_genvar_shadow(ctx, genvar, value);
        let result = self.eval_expr_in(shadow, LookupLocation::ANYWHERE, ctx.tree, expr);
        result.and_then(|v| v.as_int()).map(|v| v.as_i64())
    }

    /// An anonymous scope holding the genvar's current value, layered over
    /// the generate context for evaluation.
    fn push_genvar_shadow(
        &mut self,
        ctx: BindCtx,
        genvar: svlang_core::intern::Name,
        value: i64,
    ) -> SymbolId {
        let shadow_name = self.intern("");
        let shadow_decl_index = self.next_decl_index();
        let shadow = self.alloc_symbol(SymbolData {
            name: shadow_name,
            span: None,
            parent: Some(ctx.scope_owner),
            scope: None,
            decl_index: shadow_decl_index,
            kind: SymbolKind::GenerateBlock,
        });
        let scope = self.alloc_scope();
        self.symbols[shadow.0 as usize].scope = Some(scope);
        let bound_decl_index = self.next_decl_index();
        let bound = self.alloc_symbol(SymbolData {
            name: genvar,
            span: None,
            parent: Some(shadow),
            scope: None,
            decl_index: bound_decl_index,
            kind: SymbolKind::EnumValue {
                value: Some(SvInt::from_i64(value)),
            },
        });
        self.scope_data_mut(scope).members.push(bound);
        self.scope_data_mut(scope).name_map.insert(genvar, bound);
        shadow
    }

    fn bind_generate_item(&mut self, ctx: BindCtx, node: &SyntaxNode) {
        if let Some(block) = ast::GenerateBlock::cast(node.clone()) {
            self.bind_generate_block(ctx, block.name(), block.members().collect(), None);
        } else if let Some(member) = Member::cast(node.clone()) {
            self.bind_member(ctx, &member);
        }
    }

    fn bind_generate_block(
        &mut self,
        ctx: BindCtx,
        name_token: Option<svlang_syntax::SyntaxToken>,
        members: Vec<Member>,
        loop_binding: Option<(svlang_core::intern::Name, svlang_core::intern::Name, i64)>,
    ) {
        let name = match (&loop_binding, name_token) {
            (Some((indexed, _, _)), _) => *indexed,
            (None, token) => self.token_name(token),
        };
        let (symbol, scope) =
            self.new_scope_member(ctx, name, None, SymbolKind::GenerateBlock, ctx.procedural);
        let inner = BindCtx {
            tree: ctx.tree,
            scope_owner: symbol,
            scope,
            procedural: ctx.procedural,
        };

        if let Some((_, genvar, value)) = loop_binding {
            let decl_index = self.next_decl_index();
            let bound = self.alloc_symbol(SymbolData {
                name: genvar,
                span: None,
                parent: Some(symbol),
                scope: None,
                decl_index,
                kind: SymbolKind::EnumValue {
                    value: Some(SvInt::from_i64(value)),
                },
            });
            self.scope_data_mut(scope).members.push(bound);
            self.scope_data_mut(scope).name_map.insert(genvar, bound);
        }

        for member in members {
            self.bind_member(inner, &member);
        }
    }
}

/// Absolute length of a time scale value in seconds, for comparisons.
fn scale_seconds(value: TimeScaleValue) -> f64 {
    f64::from(value.magnitude) * 10f64.powi(value.unit.magnitude())
}

/// The base name of an assignment LHS, plus whether the LHS is exactly that
/// bare name (only bare names can create implicit nets).
fn assign_base_name(expr: &ast::Expr) -> Option<(ast::NameRef, bool)> {
    match expr {
        ast::Expr::NameRef(name) => Some((name.clone(), true)),
        ast::Expr::SelectExpr(select) => {
            assign_base_name(&select.base()?).map(|(n, _)| (n, false))
        }
        ast::Expr::MemberExpr(member) => {
            assign_base_name(&member.base()?).map(|(n, _)| (n, false))
        }
        ast::Expr::ConcatExpr(_) => None,
        _ => None,
    }
}
