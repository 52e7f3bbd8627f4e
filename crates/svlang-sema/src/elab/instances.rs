//! Definitions, parameter binding, and instance bodies.
//!
//! A module/interface/program declaration is a *definition*; every
//! parameter-bound realization is an *instance body*. Bodies are cached by
//! their canonicalized parameter values, so two instantiations with
//! identical bindings share one body symbol.

use svlang_core::diagnostics::DiagnosticKind;
use svlang_core::intern::Name;
use svlang_syntax::ast::{self, Member};
use svlang_syntax::cst::{SyntaxKind, SyntaxNode};

use crate::symbol::{
    DeclaredType, Direction, Lifetime, LookupLocation, NetKind, ParamKey, ParamValue, SymbolData,
    SymbolId, SymbolKind, VarFlags,
};
use crate::Compilation;

use super::BindCtx;

impl Compilation {
    /// Forces elaboration of every definition's default body, so that all
    /// diagnostics the design can produce are produced.
    pub fn elaborate(&mut self) {
        let definitions: Vec<_> = self.definitions().collect();
        for definition in definitions {
            self.definition_body(definition);
        }
    }

    /// The parameter-free realization of a definition, created on demand.
    pub fn definition_body(&mut self, definition: SymbolId) -> Option<SymbolId> {
        if let SymbolKind::Definition {
            default_body: Some(body),
            ..
        } = &self.symbol(definition).kind
        {
            return Some(*body);
        }
        let body = self.instance_body(definition, Vec::new())?;
        if let SymbolKind::Definition { default_body, .. } =
            &mut self.symbol_mut(definition).kind
        {
            *default_body = Some(body);
        }
        Some(body)
    }

    /// Creates (or finds) the instance body for a definition with the given
    /// evaluated parameter overrides.
    pub(crate) fn instance_body(
        &mut self,
        definition: SymbolId,
        overrides: Vec<(Name, ParamValue)>,
    ) -> Option<SymbolId> {
        let (tree, syntax) = match &self.symbol(definition).kind {
            SymbolKind::Definition { tree, syntax, .. } => (*tree, syntax.clone()),
            _ => return None,
        };

        // A definition that instantiates itself would recurse forever.
        if !self.eval_in_progress_insert(definition) {
            self.report_recursive(definition);
            return None;
        }

        let def_name = self.symbol(definition).name;
        let def_parent = self.symbol(definition).parent;

        // Build the body first; parameter values only become comparable
        // once the parameters exist in a scope.
        let body_span = self.symbol(definition).span;
        let decl_index = self.next_decl_index();
        let body = self.alloc_symbol(SymbolData {
            name: def_name,
            span: body_span,
            parent: def_parent,
            scope: None,
            decl_index,
            kind: SymbolKind::InstanceBody {
                definition,
                params: Vec::new(),
            },
        });
        let scope = self.alloc_scope();
        self.symbol_mut(body).scope = Some(scope);

        let ctx = BindCtx {
            tree,
            scope_owner: body,
            scope,
            procedural: false,
        };

        let header = syntax.children().find_map(ast::ModuleHeader::cast);
        let mut formal_names = Vec::new();
        if let Some(header) = &header {
            if let Some(params) = header.parameter_ports() {
                let ports: Vec<_> = params.ports().collect();
                for port in ports {
                    formal_names.extend(self.bind_parameter_port(ctx, &port, &overrides));
                }
            }
            if let Some(ports) = header.ansi_ports() {
                let ports: Vec<_> = ports.ports().collect();
                for port in ports {
                    self.bind_ansi_port(ctx, &port);
                }
            }
        }

        let members: Vec<_> = body_members(&syntax);
        for member in members {
            self.bind_member(ctx, &member);
        }

        // Canonicalize: the bound values of the non-local formals.
        let mut key: ParamKey = Vec::new();
        for (name, symbol) in formal_names {
            if let Some(value) = self.param_value(symbol) {
                key.push((name, value));
            }
        }

        self.eval_in_progress_remove(definition);

        if let Some(&shared) = self.instance_cache().get(&(definition, key.clone())) {
            // An identical body already exists; the one just built becomes
            // unreachable and the shared body is the canonical identity.
            return Some(shared);
        }
        self.instance_cache().insert((definition, key.clone()), body);
        if let SymbolKind::InstanceBody { params, .. } = &mut self.symbol_mut(body).kind {
            *params = key;
        }
        Some(body)
    }

    /// Binds the parameters of one parameter-port entry, attaching override
    /// values where the instantiation supplied them. Returns the non-local
    /// formals created.
    fn bind_parameter_port(
        &mut self,
        ctx: BindCtx,
        port: &ast::ParameterPort,
        overrides: &[(Name, ParamValue)],
    ) -> Vec<(Name, SymbolId)> {
        let before = self.scope_data(ctx.scope).members.len();
        match port.decl() {
            Some(Member::Parameter(decl)) => self.bind_parameter_decl(
                ctx,
                decl.decl_type(),
                decl.assignments(),
                decl.is_type_param(),
                false,
            ),
            Some(Member::Localparam(decl)) => self.bind_parameter_decl(
                ctx,
                decl.decl_type(),
                decl.assignments(),
                decl.is_type_param(),
                true,
            ),
            _ => {}
        }

        let created: Vec<_> = self.scope_data(ctx.scope).members[before..].to_vec();
        let mut formals = Vec::new();
        for symbol in created {
            let name = self.symbol(symbol).name;
            let is_local = matches!(
                self.symbol(symbol).kind,
                SymbolKind::Parameter { is_local: true, .. }
            );
            if is_local {
                continue;
            }
            if let Some((_, value)) = overrides.iter().find(|(n, _)| *n == name)
                && let SymbolKind::Parameter { override_value, .. } =
                    &mut self.symbol_mut(symbol).kind
            {
                *override_value = Some(value.clone());
            }
            formals.push((name, symbol));
        }
        formals
    }

    /// One ANSI port becomes a net or variable member of the body.
    fn bind_ansi_port(&mut self, ctx: BindCtx, port: &ast::AnsiPort) {
        let name = self.token_name(port.name());
        let span = self.span_of(ctx.tree, port.syntax());
        let direction = port
            .direction()
            .and_then(|t| Direction::from_token(t.kind()))
            .unwrap_or(Direction::In);

        let type_syntax = port.port_type().map(|t| t.syntax().clone());
        let declared = DeclaredType::from_syntax(ctx.tree, type_syntax.clone());
        let initializer = port.init().and_then(|i| i.expr()).map(|e| e.syntax().clone());

        // Outputs with a data type (or anything marked `var`) are variables;
        // inputs and inouts default to nets even when a data type is given.
        let is_var = port.is_var_port()
            || (!port.is_net_port()
                && matches!(direction, Direction::Out | Direction::Ref)
                && matches!(
                    port.port_type(),
                    Some(ast::DataType::Integer(_))
                        | Some(ast::DataType::Enum(_))
                        | Some(ast::DataType::Struct(_))
                        | Some(ast::DataType::Named(_))
                ));

        if is_var {
            self.new_member(
                ctx,
                name,
                span,
                SymbolKind::Variable {
                    declared,
                    initializer,
                    lifetime: Lifetime::Static,
                    flags: VarFlags::default(),
                },
            );
        } else {
            let mut declared = declared;
            declared.flags.net_type = true;
            self.new_member(
                ctx,
                name,
                span,
                SymbolKind::Net {
                    declared,
                    net_kind: NetKind::Builtin(SyntaxKind::KwWire),
                    initializer,
                    decl_syntax: None,
                    delay: None,
                    implicit: false,
                },
            );
        }
    }

    /// Binds `mod #(...) u0 (...), u1 (...);`.
    pub(crate) fn bind_instantiation(&mut self, ctx: BindCtx, inst: &ast::HierarchyInstantiation) {
        let Some(def_token) = inst.definition_name() else {
            return;
        };
        let def_text = def_token.text().to_string();
        let def_name = self.intern(&def_text);
        let span = self.span_of(ctx.tree, inst.syntax());

        let Some(definition) = self.lookup_definition(def_name) else {
            if let Some(span) = span {
                self.diagnostics_mut()
                    .report(DiagnosticKind::UnknownModule, span)
                    .arg(def_text)
                    .emit();
            }
            return;
        };

        let formal_names = self.definition_param_names(definition);
        let overrides = self.evaluate_param_overrides(ctx, inst, definition, &formal_names);

        let port_names = self.definition_port_names(definition);
        let instances: Vec<_> = inst.instances().collect();
        for instance in instances {
            self.check_port_connections(ctx, &instance, &def_text, &port_names);

            let body = self.instance_body(definition, overrides.clone());
            let Some(body) = body else { continue };
            let name = self.token_name(instance.name());
            let span = self.span_of(ctx.tree, instance.syntax());
            self.new_member(ctx, name, span, SymbolKind::Instance { body });
        }
    }

    /// Names of a definition's non-local formal parameters, in order.
    fn definition_param_names(&mut self, definition: SymbolId) -> Vec<Name> {
        let syntax = match &self.symbol(definition).kind {
            SymbolKind::Definition { syntax, .. } => syntax.clone(),
            _ => return Vec::new(),
        };
        let mut names = Vec::new();
        let header = syntax.children().find_map(ast::ModuleHeader::cast);
        if let Some(params) = header.and_then(|h| h.parameter_ports()) {
            let ports: Vec<_> = params.ports().collect();
            for port in ports {
                let decl = match port.decl() {
                    Some(Member::Parameter(decl)) => Some(decl),
                    _ => None,
                };
                if let Some(decl) = decl {
                    let assignments: Vec<_> = decl.assignments().collect();
                    for assignment in assignments {
                        names.push(self.token_name(assignment.name()));
                    }
                }
            }
        }
        names
    }

    fn definition_port_names(&mut self, definition: SymbolId) -> Vec<Name> {
        let syntax = match &self.symbol(definition).kind {
            SymbolKind::Definition { syntax, .. } => syntax.clone(),
            _ => return Vec::new(),
        };
        let mut names = Vec::new();
        let header = syntax.children().find_map(ast::ModuleHeader::cast);
        if let Some(header) = header {
            if let Some(ports) = header.ansi_ports() {
                let ports: Vec<_> = ports.ports().collect();
                for port in ports {
                    names.push(self.token_name(port.name()));
                }
            }
            if let Some(ports) = header.non_ansi_ports() {
                let ports: Vec<_> = ports.ports().collect();
                for port in ports {
                    names.push(self.token_name(port.name()));
                }
            }
        }
        names
    }

    fn evaluate_param_overrides(
        &mut self,
        ctx: BindCtx,
        inst: &ast::HierarchyInstantiation,
        definition: SymbolId,
        formal_names: &[Name],
    ) -> Vec<(Name, ParamValue)> {
        let Some(args) = inst.param_assignment().and_then(|p| p.args()) else {
            return Vec::new();
        };
        let at = LookupLocation(self.decl_counter + 1);
        let mut overrides = Vec::new();

        let ordered: Vec<_> = args.ordered().collect();
        if ordered.len() > formal_names.len() && !ordered.is_empty() {
            let def_text = self.symbol_name(definition).to_string();
            if let Some(span) = self.span_of(ctx.tree, args.syntax()) {
                self.diagnostics_mut()
                    .report(DiagnosticKind::TooManyParamAssignments, span)
                    .arg(def_text)
                    .emit();
            }
        }
        for (index, arg) in ordered.iter().enumerate() {
            let Some(name) = formal_names.get(index) else { break };
            if let Some(expr) = arg.expr()
                && let Some(value) = self.eval_expr_in(ctx.scope_owner, at, ctx.tree, &expr)
            {
                overrides.push((*name, ParamValue::Const(value)));
            }
        }

        let named: Vec<_> = args.named().collect();
        for arg in named {
            let Some(token) = arg.name_token() else { continue };
            let name = self.intern(token.text());
            if let Some(expr) = arg.expr()
                && let Some(value) = self.eval_expr_in(ctx.scope_owner, at, ctx.tree, &expr)
            {
                overrides.push((name, ParamValue::Const(value)));
            }
        }
        overrides
    }

    fn check_port_connections(
        &mut self,
        ctx: BindCtx,
        instance: &ast::HierarchicalInstance,
        def_text: &str,
        port_names: &[Name],
    ) {
        let mut seen: Vec<Name> = Vec::new();
        let connections: Vec<_> = instance.connections().collect();
        for connection in connections {
            if connection.kind() != SyntaxKind::NamedPortConnection {
                continue;
            }
            let Some(named) = ast::NamedPortConnection::cast(connection) else {
                continue;
            };
            let Some(token) = named.name() else { continue };
            let text = token.text().to_string();
            let name = self.intern(&text);
            let span = self.span_of(ctx.tree, named.syntax());

            if seen.contains(&name) {
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::DuplicatePortConnection, span)
                        .arg(text)
                        .emit();
                }
                continue;
            }
            seen.push(name);

            if !port_names.contains(&name) {
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::UnknownPort, span)
                        .arg(text)
                        .arg(def_text)
                        .emit();
                }
            }
        }
    }
}

/// Direct body members of a module-like declaration, skipping the header.
fn body_members(syntax: &SyntaxNode) -> Vec<Member> {
    syntax.children().filter_map(Member::cast).collect()
}
