//! Elaboration-time constant evaluation.
//!
//! Evaluates parameter values, dimension bounds, enum member values,
//! static-assert conditions, and elaboration task arguments. Anything that
//! cannot be folded yields `None`; callers decide whether that deserves an
//! `ExpressionNotConstant` diagnostic. Unknown (x/z) bits propagate
//! conservatively except through the case-equality operators.

use svlang_core::diagnostics::DiagnosticKind;
use svlang_syntax::TokenValue;
use svlang_syntax::ast::{self, Expr};
use svlang_syntax::cst::SyntaxKind;

use crate::symbol::{LookupLocation, SymbolId, SymbolKind};
use crate::value::{ConstValue, SvInt};
use crate::{Compilation, LookupFlags, ParamValue};

impl Compilation {
    /// Evaluates an expression in the name context of `scope_owner`.
    pub(crate) fn eval_expr_in(
        &mut self,
        scope_owner: SymbolId,
        at: LookupLocation,
        tree: u32,
        expr: &Expr,
    ) -> Option<ConstValue> {
        match expr {
            Expr::Literal(lit) => literal_value(lit),
            Expr::ParenExpr(inner) => self.eval_expr_in(scope_owner, at, tree, &inner.inner()?),
            Expr::MinTypMaxExpr(mtm) => {
                self.eval_expr_in(scope_owner, at, tree, &mtm.typ()?)
            }
            Expr::NameRef(name) => {
                let text = name.text();
                let interned = self.intern(&text);
                let symbol = self.lookup(scope_owner, interned, at, LookupFlags::default())?;
                self.symbol_const_value(symbol)
            }
            Expr::ScopedName(scoped) => {
                let symbol = self.resolve_scoped_name(scoped)?;
                self.symbol_const_value(symbol)
            }
            Expr::UnaryExpr(unary) => {
                let op = unary.op_token()?.kind();
                let value = self.eval_expr_in(scope_owner, at, tree, &unary.operand()?)?;
                eval_unary(op, value)
            }
            Expr::BinaryExpr(binary) => {
                let op = binary.op_token()?.kind();
                let lhs = self.eval_expr_in(scope_owner, at, tree, &binary.lhs()?)?;
                let rhs = self.eval_expr_in(scope_owner, at, tree, &binary.rhs()?)?;
                eval_binary(op, lhs, rhs)
            }
            Expr::ConditionalExpr(cond) => {
                let test = self.eval_expr_in(scope_owner, at, tree, &cond.condition()?)?;
                match test.to_bool() {
                    Some(true) => self.eval_expr_in(scope_owner, at, tree, &cond.when_true()?),
                    Some(false) => self.eval_expr_in(scope_owner, at, tree, &cond.when_false()?),
                    None => Some(ConstValue::Int(SvInt::unknown(32))),
                }
            }
            Expr::CastExpr(cast) => {
                let value = self.eval_expr_in(scope_owner, at, tree, &cast.operand()?)?;
                match cast.target_type() {
                    Some(target) => {
                        let ty = self.resolve_type_syntax(scope_owner, tree, target.syntax().clone());
                        let width = self.type_interner().packed_width(ty)?;
                        Some(ConstValue::Int(value.as_int()?.resize(width)))
                    }
                    None => {
                        // `size'(x)` with a constant size.
                        let size = self.eval_expr_in(scope_owner, at, tree, &cast.target_expr()?)?;
                        let width = size.as_int()?.as_i64().clamp(1, 64) as u32;
                        Some(ConstValue::Int(value.as_int()?.resize(width)))
                    }
                }
            }
            Expr::SignCastExpr(cast) => {
                let signed = cast.signing_token()?.kind() == SyntaxKind::KwSigned;
                let mut value = self.eval_expr_in(scope_owner, at, tree, &cast.operand()?)?.as_int()?;
                value.signed = signed;
                Some(ConstValue::Int(value))
            }
            Expr::ConcatExpr(concat) => {
                let mut result = SvInt::new(0, 1, false);
                let mut total = 0u32;
                for operand in concat.operands() {
                    let value = self
                        .eval_expr_in(scope_owner, at, tree, &operand)?
                        .as_int()?;
                    let width = value.width;
                    total = (total + width).min(64);
                    result = SvInt {
                        value: (result.value << width.min(63)) | value.value,
                        xz: (result.xz << width.min(63)) | value.xz,
                        width: total,
                        signed: false,
                    };
                }
                Some(ConstValue::Int(result))
            }
            Expr::ReplicationExpr(repl) => {
                let count = self
                    .eval_expr_in(scope_owner, at, tree, &repl.count()?)?
                    .as_int()?
                    .as_i64();
                let concat = repl.concat()?;
                let mut values = Vec::new();
                for operand in concat.operands() {
                    values.push(self.eval_expr_in(scope_owner, at, tree, &operand)?.as_int()?);
                }
                let mut result = SvInt::new(0, 1, false);
                let mut total = 0u32;
                for _ in 0..count.clamp(0, 64) {
                    for value in &values {
                        total = (total + value.width).min(64);
                        result = SvInt {
                            value: (result.value << value.width.min(63)) | value.value,
                            xz: (result.xz << value.width.min(63)) | value.xz,
                            width: total,
                            signed: false,
                        };
                    }
                }
                Some(ConstValue::Int(result))
            }
            Expr::InsideExpr(inside) => {
                let needle = self.eval_expr_in(scope_owner, at, tree, &inside.operand()?)?;
                let needle = needle.as_int()?.as_i64();
                for range in inside.ranges() {
                    if range.kind() == SyntaxKind::OpenRange {
                        let mut bounds = range.children().filter_map(Expr::cast);
                        let (low, high) = (bounds.next()?, bounds.next()?);
                        let low = self.eval_expr_in(scope_owner, at, tree, &low)?;
                        let high = self.eval_expr_in(scope_owner, at, tree, &high)?;
                        if (low.as_int()?.as_i64()..=high.as_int()?.as_i64()).contains(&needle) {
                            return Some(ConstValue::int(1));
                        }
                    } else if let Some(expr) = Expr::cast(range.clone()) {
                        let value = self.eval_expr_in(scope_owner, at, tree, &expr)?;
                        if value.as_int()?.as_i64() == needle {
                            return Some(ConstValue::int(1));
                        }
                    }
                }
                Some(ConstValue::int(0))
            }
            _ => None,
        }
    }

    /// Resolves `pkg::name` to the member symbol.
    pub(crate) fn resolve_scoped_name(&mut self, scoped: &ast::ScopedName) -> Option<SymbolId> {
        let pkg_name = match scoped.scope()? {
            Expr::NameRef(name) => name.text(),
            _ => return None,
        };
        let member = scoped.name_token()?.text().to_string();
        let pkg_interned = self.intern(&pkg_name);
        let member_interned = self.intern(&member);
        let package = self.packages.get(&pkg_interned).copied()?;
        let scope = self.symbol(package).scope?;
        self.scope_data(scope).name_map.get(&member_interned).copied()
    }

    /// The constant value of a symbol, if it has one.
    pub(crate) fn symbol_const_value(&mut self, symbol: SymbolId) -> Option<ConstValue> {
        match &self.symbol(symbol).kind {
            SymbolKind::Parameter { .. } => match self.param_value(symbol)? {
                ParamValue::Const(value) => Some(value),
                ParamValue::Type(_) => None,
            },
            SymbolKind::EnumValue { value } => value.map(ConstValue::Int),
            SymbolKind::Variable {
                flags, initializer, ..
            } if flags.is_const || flags.compiler_generated => {
                let initializer = initializer.clone()?;
                let declared_tree = self.declared_type_of(symbol)?.tree;
                if !self.eval_in_progress_insert(symbol) {
                    self.report_recursive(symbol);
                    return None;
                }
                let expr = Expr::cast(initializer)?;
                let owner = crate::declared::symbol_scope_owner(self, symbol);
                let at = LookupLocation(self.symbol(symbol).decl_index);
                let value = self.eval_expr_in(owner, at, declared_tree, &expr);
                self.eval_in_progress_remove(symbol);
                value
            }
            _ => None,
        }
    }

    /// The bound value of a parameter: the instantiation override if one
    /// exists, otherwise the declared default. Memoized.
    pub fn param_value(&mut self, symbol: SymbolId) -> Option<ParamValue> {
        if let SymbolKind::Parameter {
            value: Some(value), ..
        } = &self.symbol(symbol).kind
        {
            return Some(value.clone());
        }

        let (override_value, init, is_type, tree) = match &self.symbol(symbol).kind {
            SymbolKind::Parameter {
                override_value,
                init,
                is_type,
                declared,
                ..
            } => (
                override_value.clone(),
                init.clone(),
                *is_type,
                declared.tree,
            ),
            _ => return None,
        };

        if !self.eval_in_progress_insert(symbol) {
            self.report_recursive(symbol);
            return None;
        }

        let value = if let Some(value) = override_value {
            Some(value)
        } else if let Some(init) = init {
            let owner = crate::declared::symbol_scope_owner(self, symbol);
            let at = LookupLocation(self.symbol(symbol).decl_index);
            if is_type {
                let ty = ast::DataType::cast(init.clone())
                    .map(|t| self.resolve_type_syntax(symbol, tree, t.syntax().clone()));
                ty.map(ParamValue::Type)
            } else {
                Expr::cast(init)
                    .and_then(|e| self.eval_expr_in(owner, at, tree, &e))
                    .map(ParamValue::Const)
            }
        } else {
            None
        };
        self.eval_in_progress_remove(symbol);

        if value.is_none() {
            let span = self.symbol(symbol).span;
            let name = self.symbol_name(symbol).to_string();
            if let Some(span) = span {
                self.diagnostics_mut()
                    .report(DiagnosticKind::ParameterHasNoValue, span)
                    .arg(name)
                    .emit();
            }
        }

        if let SymbolKind::Parameter { value: slot, .. } = &mut self.symbol_mut(symbol).kind {
            *slot = value.clone();
        }
        value
    }

    /// Evaluates a value symbol's initializer (or bound value) as a
    /// constant, when it is one.
    pub fn initializer_value(&mut self, symbol: SymbolId) -> Option<ConstValue> {
        let (init, tree) = match &self.symbol(symbol).kind {
            SymbolKind::Variable {
                initializer: Some(init),
                declared,
                ..
            }
            | SymbolKind::Net {
                initializer: Some(init),
                declared,
                ..
            } => (init.clone(), declared.tree),
            _ => return self.symbol_const_value(symbol),
        };
        let expr = Expr::cast(init)?;
        let owner = crate::declared::symbol_scope_owner(self, symbol);
        let at = LookupLocation(self.symbol(symbol).decl_index);
        self.eval_expr_in(owner, at, tree, &expr)
    }

    pub(crate) fn report_recursive(&mut self, symbol: SymbolId) {
        let span = self.symbol(symbol).span;
        let name = self.symbol_name(symbol).to_string();
        if let Some(span) = span {
            self.diagnostics_mut()
                .report(DiagnosticKind::RecursiveDefinition, span)
                .arg(name)
                .emit();
        }
    }
}

/// Decodes a literal AST node into a constant.
pub(crate) fn literal_value(lit: &ast::Literal) -> Option<ConstValue> {
    match lit.value()? {
        TokenValue::Integer {
            value,
            xz,
            width,
            signed,
            base,
        } => {
            // Unsized literals are 32 bits. An unbased unsized ('x, '1)
            // nominally fills its context; it evaluates as one bit here.
            let width = match width {
                Some(w) => w,
                None if base.is_none() && xz != 0 => 1,
                None => 32,
            };
            Some(ConstValue::Int(SvInt {
                value,
                xz,
                width: width.clamp(1, 64),
                signed,
            }))
        }
        TokenValue::Real(r) => Some(ConstValue::Real(r)),
        TokenValue::Str(s) => Some(ConstValue::Str(s)),
        TokenValue::Time { value, .. } => Some(ConstValue::Real(value)),
    }
}

fn eval_unary(op: SyntaxKind, value: ConstValue) -> Option<ConstValue> {
    use SyntaxKind::*;
    if let ConstValue::Real(r) = value {
        return Some(match op {
            Plus => ConstValue::Real(r),
            Minus => ConstValue::Real(-r),
            Exclam => ConstValue::int((r == 0.0) as i64),
            _ => return None,
        });
    }
    let v = value.as_int()?;
    if v.has_unknown() && !matches!(op, Plus) {
        return Some(ConstValue::Int(SvInt::unknown(v.width)));
    }
    let result = match op {
        Plus => return Some(ConstValue::Int(v)),
        Minus => SvInt::from_i64(v.as_i64().wrapping_neg()),
        Exclam => SvInt::new((v.value == 0) as u64, 1, false),
        Tilde => SvInt {
            value: !v.value & if v.width >= 64 { u64::MAX } else { (1 << v.width) - 1 },
            xz: 0,
            width: v.width,
            signed: v.signed,
        },
        And => SvInt::new(
            (v.value.count_ones() == v.width.min(64)) as u64,
            1,
            false,
        ),
        Or => SvInt::new((v.value != 0) as u64, 1, false),
        Xor => SvInt::new((v.value.count_ones() % 2) as u64, 1, false),
        TildeAnd => SvInt::new((v.value.count_ones() != v.width.min(64)) as u64, 1, false),
        TildeOr => SvInt::new((v.value == 0) as u64, 1, false),
        TildeXor | XorTilde => SvInt::new((v.value.count_ones() % 2 == 0) as u64, 1, false),
        _ => return None,
    };
    Some(ConstValue::Int(result))
}

fn eval_binary(op: SyntaxKind, lhs: ConstValue, rhs: ConstValue) -> Option<ConstValue> {
    use SyntaxKind::*;

    // Case equality sees x/z bits as ordinary values.
    if matches!(op, CaseEquals | CaseNotEquals) {
        let l = lhs.as_int()?;
        let r = rhs.as_int()?;
        let equal = l.value == r.value && l.xz == r.xz;
        return Some(ConstValue::int(
            (equal == matches!(op, CaseEquals)) as i64,
        ));
    }

    if let (ConstValue::Real(l), Some(r)) = (&lhs, as_real(&rhs)) {
        return eval_real_binary(op, *l, r);
    }
    if let (Some(l), ConstValue::Real(r)) = (as_real(&lhs), &rhs) {
        return eval_real_binary(op, l, *r);
    }
    if let (ConstValue::Str(l), ConstValue::Str(r)) = (&lhs, &rhs) {
        return Some(match op {
            EqualsEquals => ConstValue::int((l == r) as i64),
            NotEquals => ConstValue::int((l != r) as i64),
            _ => return None,
        });
    }

    let l = lhs.as_int()?;
    let r = rhs.as_int()?;
    if l.has_unknown() || r.has_unknown() {
        return Some(ConstValue::Int(SvInt::unknown(l.width.max(r.width))));
    }
    let (a, b) = (l.as_i64(), r.as_i64());
    let result = match op {
        Plus => ConstValue::int(a.wrapping_add(b)),
        Minus => ConstValue::int(a.wrapping_sub(b)),
        Star => ConstValue::int(a.wrapping_mul(b)),
        Slash => {
            if b == 0 {
                return Some(ConstValue::Int(SvInt::unknown(l.width.max(r.width))));
            }
            ConstValue::int(a.wrapping_div(b))
        }
        Percent => {
            if b == 0 {
                return Some(ConstValue::Int(SvInt::unknown(l.width.max(r.width))));
            }
            ConstValue::int(a.wrapping_rem(b))
        }
        StarStar => ConstValue::int((a as f64).powi(b as i32) as i64),
        ShiftLeft | ArithShiftLeft => ConstValue::int(if b >= 64 { 0 } else { a.wrapping_shl(b as u32) }),
        ShiftRight => ConstValue::int(if b >= 64 { 0 } else { ((l.value) >> b.max(0)) as i64 }),
        ArithShiftRight => ConstValue::int(a.wrapping_shr(b.clamp(0, 63) as u32)),
        And => ConstValue::int(a & b),
        Or => ConstValue::int(a | b),
        Xor => ConstValue::int(a ^ b),
        TildeXor | XorTilde => ConstValue::int(!(a ^ b)),
        AndAnd => ConstValue::int(((a != 0) && (b != 0)) as i64),
        OrOr => ConstValue::int(((a != 0) || (b != 0)) as i64),
        EqualsEquals | WildcardEquals => ConstValue::int((a == b) as i64),
        NotEquals | WildcardNotEquals => ConstValue::int((a != b) as i64),
        Less => ConstValue::int((a < b) as i64),
        LessEquals => ConstValue::int((a <= b) as i64),
        Greater => ConstValue::int((a > b) as i64),
        GreaterEquals => ConstValue::int((a >= b) as i64),
        MinusArrow => ConstValue::int(((a == 0) || (b != 0)) as i64),
        LessMinusArrow => ConstValue::int(((a != 0) == (b != 0)) as i64),
        _ => return None,
    };
    Some(result)
}

fn as_real(value: &ConstValue) -> Option<f64> {
    match value {
        ConstValue::Real(r) => Some(*r),
        ConstValue::Int(v) if !v.has_unknown() => Some(v.as_i64() as f64),
        _ => None,
    }
}

fn eval_real_binary(op: SyntaxKind, l: f64, r: f64) -> Option<ConstValue> {
    use SyntaxKind::*;
    Some(match op {
        Plus => ConstValue::Real(l + r),
        Minus => ConstValue::Real(l - r),
        Star => ConstValue::Real(l * r),
        Slash => ConstValue::Real(l / r),
        StarStar => ConstValue::Real(l.powf(r)),
        EqualsEquals => ConstValue::int((l == r) as i64),
        NotEquals => ConstValue::int((l != r) as i64),
        Less => ConstValue::int((l < r) as i64),
        LessEquals => ConstValue::int((l <= r) as i64),
        Greater => ConstValue::int((l > r) as i64),
        GreaterEquals => ConstValue::int((l >= r) as i64),
        AndAnd => ConstValue::int(((l != 0.0) && (r != 0.0)) as i64),
        OrOr => ConstValue::int(((l != 0.0) || (r != 0.0)) as i64),
        _ => return None,
    })
}
