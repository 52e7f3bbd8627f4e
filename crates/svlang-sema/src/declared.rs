//! Declared-type resolution.
//!
//! Every value symbol owns a `DeclaredType` slot that starts as syntax,
//! may be linked to another symbol's slot, and resolves on first query to an
//! interned `TypeId`. Resolution is idempotent and recursion-guarded:
//! re-entering a slot that is already resolving reports
//! `RecursiveDefinition` and yields the error type.

use svlang_core::diagnostics::DiagnosticKind;
use svlang_syntax::SyntaxNode;
use svlang_syntax::ast::{self, DataType};
use svlang_syntax::cst::SyntaxKind;

use crate::symbol::{DeclaredType, LookupLocation, SymbolId, SymbolKind};
use crate::types::{IntegralKind, RealKind, Type, TypeId};
use crate::{Compilation, LookupFlags};

impl Compilation {
    /// The resolved type of a value symbol. Lazy, memoized, cycle-guarded.
    pub fn type_of(&mut self, symbol: SymbolId) -> TypeId {
        let Some(declared) = self.declared_type_of(symbol) else {
            return self.types_mut().error();
        };
        if let Some(resolved) = declared.resolved {
            return resolved;
        }

        if !self.eval_in_progress_insert(symbol) {
            let span = self.symbol(symbol).span;
            let name = self.symbol_name(symbol).to_string();
            if let Some(span) = span {
                self.diagnostics_mut()
                    .report(DiagnosticKind::RecursiveDefinition, span)
                    .arg(name)
                    .emit();
            }
            let error = self.types_mut().error();
            self.store_resolved(symbol, error);
            return error;
        }

        let declared = self
            .declared_type_of(symbol)
            .expect("checked above")
            .clone();
        let resolved = self.resolve_declared(symbol, &declared);
        self.eval_in_progress_remove(symbol);
        self.store_resolved(symbol, resolved);
        resolved
    }

    fn resolve_declared(&mut self, symbol: SymbolId, declared: &DeclaredType) -> TypeId {
        let base = if let Some(link) = declared.link {
            self.type_of(link)
        } else {
            match &declared.type_syntax {
                Some(node) => self.resolve_type_syntax(symbol, declared.tree, node.clone()),
                None => {
                    // No syntax at all: an implicit logic, which is what net
                    // declarations without a data type get.
                    self.types_mut().logic()
                }
            }
        };
        self.apply_unpacked_dims(symbol, declared.tree, base, &declared.dims)
    }

    /// Resolves a data type syntax node in the name context of `symbol`.
    pub(crate) fn resolve_type_syntax(
        &mut self,
        symbol: SymbolId,
        tree: u32,
        node: SyntaxNode,
    ) -> TypeId {
        let Some(data_type) = DataType::cast(node) else {
            return self.types_mut().error();
        };
        match data_type {
            DataType::Integer(ty) => self.resolve_integer_type(symbol, tree, &ty),
            DataType::Implicit(ty) => {
                let signed = matches!(
                    ty.signing().map(|t| t.kind()),
                    Some(SyntaxKind::KwSigned)
                );
                let base = self.types_mut().integral(IntegralKind::Logic, signed);
                let dims: Vec<_> = ty.dimensions().collect();
                self.apply_packed_dims(symbol, tree, base, &dims)
            }
            DataType::Named(ty) => self.resolve_named_type(symbol, tree, &ty),
            DataType::Enum(ty) => self.resolve_enum_type(symbol, tree, &ty),
            DataType::Struct(ty) => {
                let fields = self.resolve_struct_fields(symbol, tree, ty.fields());
                let packed = ty.is_packed();
                let decl = self.types_mut().fresh_decl_tag();
                self.types_mut().intern(Type::Struct {
                    packed,
                    fields,
                    decl,
                })
            }
            DataType::Union(ty) => {
                let fields = self.resolve_struct_fields(symbol, tree, ty.fields());
                let packed = ty.is_packed();
                let decl = self.types_mut().fresh_decl_tag();
                self.types_mut().intern(Type::Union {
                    packed,
                    fields,
                    decl,
                })
            }
            DataType::TypeRef(ty) => {
                // `type(expr)`: take the type of a name if one is in reach.
                let expr = ast::Expr::first_child(ty.syntax());
                match expr {
                    Some(ast::Expr::NameRef(name)) => {
                        let text = name.text();
                        let interned = self.intern(&text);
                        let at = LookupLocation(self.symbol(symbol).decl_index);
                        match self.lookup(symbol_scope_owner(self, symbol), interned, at, LookupFlags::default())
                        {
                            Some(target) => self.type_of(target),
                            None => self.types_mut().error(),
                        }
                    }
                    _ => self.types_mut().error(),
                }
            }
        }
    }

    fn resolve_integer_type(
        &mut self,
        symbol: SymbolId,
        tree: u32,
        ty: &ast::IntegerType,
    ) -> TypeId {
        let keyword = ty.keyword().map(|t| t.kind());
        let explicit_signing = ty.signing().map(|t| t.kind());

        let base = match keyword {
            Some(SyntaxKind::KwBit) => self.integral_with(IntegralKind::Bit, explicit_signing),
            Some(SyntaxKind::KwLogic) => self.integral_with(IntegralKind::Logic, explicit_signing),
            Some(SyntaxKind::KwReg) => self.integral_with(IntegralKind::Reg, explicit_signing),
            Some(SyntaxKind::KwByte) => self.integral_with(IntegralKind::Byte, explicit_signing),
            Some(SyntaxKind::KwShortint) => {
                self.integral_with(IntegralKind::ShortInt, explicit_signing)
            }
            Some(SyntaxKind::KwInt) => self.integral_with(IntegralKind::Int, explicit_signing),
            Some(SyntaxKind::KwLongint) => {
                self.integral_with(IntegralKind::LongInt, explicit_signing)
            }
            Some(SyntaxKind::KwInteger) => {
                self.integral_with(IntegralKind::Integer, explicit_signing)
            }
            Some(SyntaxKind::KwTime) => self.integral_with(IntegralKind::Time, explicit_signing),
            Some(SyntaxKind::KwReal) => self.types_mut().intern(Type::Real(RealKind::Real)),
            Some(SyntaxKind::KwShortreal) => {
                self.types_mut().intern(Type::Real(RealKind::ShortReal))
            }
            Some(SyntaxKind::KwRealtime) => {
                self.types_mut().intern(Type::Real(RealKind::RealTime))
            }
            Some(SyntaxKind::KwString) => self.types_mut().intern(Type::String),
            Some(SyntaxKind::KwChandle) => self.types_mut().intern(Type::Chandle),
            Some(SyntaxKind::KwEvent) => self.types_mut().intern(Type::Event),
            Some(SyntaxKind::KwVoid) => self.types_mut().intern(Type::Void),
            _ => self.types_mut().error(),
        };

        let dims: Vec<_> = ty.dimensions().collect();
        self.apply_packed_dims(symbol, tree, base, &dims)
    }

    fn integral_with(&mut self, kind: IntegralKind, signing: Option<SyntaxKind>) -> TypeId {
        let signed = match signing {
            Some(SyntaxKind::KwSigned) => true,
            Some(SyntaxKind::KwUnsigned) => false,
            _ => kind.default_signed(),
        };
        self.types_mut().integral(kind, signed)
    }

    fn resolve_named_type(&mut self, symbol: SymbolId, tree: u32, ty: &ast::NamedType) -> TypeId {
        let Some(name_token) = ty.name_token() else {
            return self.types_mut().error();
        };
        let text = name_token.text().to_string();
        let name = self.intern(&text);
        let span = self.span_of(tree, ty.syntax());

        let target = if let Some(pkg_token) = ty.package_token() {
            let pkg_text = pkg_token.text().to_string();
            let pkg_name = self.intern(&pkg_text);
            match self.packages.get(&pkg_name).copied() {
                Some(pkg) => {
                    let scope = self.symbol(pkg).scope;
                    scope.and_then(|s| self.scope_data(s).name_map.get(&name).copied())
                }
                None => {
                    if let Some(span) = span {
                        self.diagnostics_mut()
                            .report(DiagnosticKind::UnknownPackage, span)
                            .arg(pkg_text)
                            .emit();
                    }
                    return self.types_mut().error();
                }
            }
        } else {
            let at = LookupLocation(self.symbol(symbol).decl_index);
            let owner = symbol_scope_owner(self, symbol);
            self.lookup(
                owner,
                name,
                at,
                LookupFlags {
                    allow_declared_after: true,
                    no_parent: false,
                },
            )
        };

        let Some(target) = target else {
            if let Some(span) = span {
                self.diagnostics_mut()
                    .report(DiagnosticKind::UndeclaredIdentifier, span)
                    .arg(text)
                    .emit();
            }
            return self.types_mut().error();
        };

        let base = match &self.symbol(target).kind {
            SymbolKind::TypeAlias { .. }
            | SymbolKind::Nettype { .. }
            | SymbolKind::Parameter { is_type: true, .. } => self.named_target_type(target),
            _ => {
                if let Some(span) = span {
                    self.diagnostics_mut()
                        .report(DiagnosticKind::NotAType, span)
                        .arg(text)
                        .emit();
                }
                self.types_mut().error()
            }
        };

        let dims: Vec<_> = ty.dimensions().collect();
        self.apply_packed_dims(symbol, tree, base, &dims)
    }

    fn named_target_type(&mut self, target: SymbolId) -> TypeId {
        if let SymbolKind::Parameter { is_type: true, .. } = &self.symbol(target).kind {
            match self.param_value(target) {
                Some(crate::ParamValue::Type(ty)) => ty,
                _ => self.types_mut().error(),
            }
        } else {
            self.type_of(target)
        }
    }

    fn resolve_enum_type(&mut self, symbol: SymbolId, tree: u32, ty: &ast::EnumType) -> TypeId {
        let base = match ty.base_type() {
            Some(base) => self.resolve_type_syntax(symbol, tree, base.syntax().clone()),
            None => self.types_mut().int(),
        };
        let decl = self.types_mut().fresh_decl_tag();
        self.types_mut().intern(Type::Enum {
            base,
            decl,
            name: None,
        })
    }

    fn resolve_struct_fields(
        &mut self,
        symbol: SymbolId,
        tree: u32,
        fields: impl Iterator<Item = ast::StructField>,
    ) -> Vec<(svlang_core::intern::Name, TypeId)> {
        let mut out = Vec::new();
        for field in fields {
            let field_type = match field.field_type() {
                Some(ty) => self.resolve_type_syntax(symbol, tree, ty.syntax().clone()),
                None => self.types_mut().error(),
            };
            for declarator in field.declarators() {
                if let Some(name) = declarator.name() {
                    let name = self.intern(name.text());
                    out.push((name, field_type));
                }
            }
        }
        out
    }

    /// Applies `[left:right]` / `[size]` packed dimensions, innermost last.
    pub(crate) fn apply_packed_dims(
        &mut self,
        symbol: SymbolId,
        tree: u32,
        base: TypeId,
        dims: &[ast::Dimension],
    ) -> TypeId {
        let mut ty = base;
        for dim in dims.iter().rev() {
            let (left, right) = self.eval_dimension(symbol, tree, dim);
            ty = self.types_mut().packed_array(ty, left, right);
        }
        ty
    }

    fn apply_unpacked_dims(
        &mut self,
        symbol: SymbolId,
        tree: u32,
        base: TypeId,
        dims: &[SyntaxNode],
    ) -> TypeId {
        let mut ty = base;
        for node in dims.iter().rev() {
            let Some(dim) = ast::Dimension::cast(node.clone()) else {
                continue;
            };
            let (left, right) = if dim.is_range() {
                self.eval_dimension(symbol, tree, &dim)
            } else {
                // `[n]` means `[0:n-1]` in unpacked position.
                let (size, _) = self.eval_dimension(symbol, tree, &dim);
                (0, size.saturating_sub(1))
            };
            ty = self.types_mut().unpacked_array(ty, left, right);
        }
        ty
    }

    /// Evaluates a dimension's bounds as constants. `[a:b]` yields `(a, b)`;
    /// `[n]` yields `(n, 0)`.
    pub(crate) fn eval_dimension(
        &mut self,
        symbol: SymbolId,
        tree: u32,
        dim: &ast::Dimension,
    ) -> (i32, i32) {
        let owner = symbol_scope_owner(self, symbol);
        let at = LookupLocation(self.symbol(symbol).decl_index);
        let (left, right) = dim.bounds();
        let eval = |comp: &mut Compilation, expr: Option<ast::Expr>| -> Option<i32> {
            let expr = expr?;
            let value = comp.eval_expr_in(owner, at, tree, &expr)?;
            Some(value.as_int()?.as_i64() as i32)
        };
        let l = eval(self, left).unwrap_or(0);
        let r = eval(self, right).unwrap_or(0);
        (l, r)
    }

    // --- declared-type slot plumbing ---------------------------------------

    pub(crate) fn declared_type_of(&self, symbol: SymbolId) -> Option<&DeclaredType> {
        match &self.symbol(symbol).kind {
            SymbolKind::Parameter { declared, .. }
            | SymbolKind::Variable { declared, .. }
            | SymbolKind::Net { declared, .. }
            | SymbolKind::Nettype { declared, .. }
            | SymbolKind::TypeAlias { declared }
            | SymbolKind::FormalArg { declared, .. }
            | SymbolKind::ClockingVar { declared, .. }
            | SymbolKind::RsProduction {
                return_type: declared,
            }
            | SymbolKind::Subroutine {
                return_type: declared,
                ..
            } => Some(declared),
            SymbolKind::AssertionPort { declared, .. } => declared.as_ref(),
            _ => None,
        }
    }

    fn store_resolved(&mut self, symbol: SymbolId, ty: TypeId) {
        let data = self.symbol_mut(symbol);
        let slot = match &mut data.kind {
            SymbolKind::Parameter { declared, .. }
            | SymbolKind::Variable { declared, .. }
            | SymbolKind::Net { declared, .. }
            | SymbolKind::Nettype { declared, .. }
            | SymbolKind::TypeAlias { declared }
            | SymbolKind::FormalArg { declared, .. }
            | SymbolKind::ClockingVar { declared, .. }
            | SymbolKind::RsProduction {
                return_type: declared,
            }
            | SymbolKind::Subroutine {
                return_type: declared,
                ..
            } => Some(declared),
            SymbolKind::AssertionPort { declared, .. } => declared.as_mut(),
            _ => None,
        };
        if let Some(slot) = slot {
            slot.resolved = Some(ty);
        }
    }

    pub(crate) fn eval_in_progress_insert(&mut self, symbol: SymbolId) -> bool {
        self.eval_in_progress.insert(symbol)
    }

    pub(crate) fn eval_in_progress_remove(&mut self, symbol: SymbolId) {
        self.eval_in_progress.remove(&symbol);
    }
}

/// The scope to resolve names in when resolving `symbol`'s own type: the
/// symbol's parent, or the symbol itself if it is a scope (subroutine return
/// types can mention their own formals' types).
pub(crate) fn symbol_scope_owner(compilation: &Compilation, symbol: SymbolId) -> SymbolId {
    if compilation.symbol(symbol).scope.is_some() {
        symbol
    } else {
        compilation
            .symbol(symbol)
            .parent
            .unwrap_or(compilation.root())
    }
}
