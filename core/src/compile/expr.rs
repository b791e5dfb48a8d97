use std::sync::Arc;

use tracing::trace;

use crate::compile::{
    Binding, CompileErrorKind, CompileResult, CompiledExpr, Comp, Constant, ExprFn, Fun, KindVisitor, ResultType,
    SpecializedKind, expect_kind, specialize,
};
use crate::expr::{ArrayLen, Element, Expr, Literal, TypeExpr};
use crate::rt::{Env, RuntimeError};
use crate::token::Span;
use crate::typ::{MAX_ARRAY_LEN, RType, UntypedConst};
use crate::util::fast_map::{FastHashSet, fast_hash_set_new};
use crate::val::{Complex, MapKey, MapValue, Value};

/// Loads a variable slot as kind `K`.
struct LoadSlot(usize);

impl KindVisitor for LoadSlot {
    fn visit<K: SpecializedKind>(self) -> ExprFn {
        let slot = self.0;
        K::into_expr_fn(Arc::new(move |env: &mut Env| expect_kind::<K>(env.get(slot)?)))
    }
}

fn literal(lit: &Literal) -> UntypedConst {
    match lit {
        Literal::Bool(b) => UntypedConst::bool(*b),
        Literal::Int(v) => UntypedConst::int(*v),
        Literal::Float(v) => UntypedConst::float(*v),
        Literal::Imag(v) => UntypedConst::complex(0.0, *v),
        Literal::Char(c) => UntypedConst::rune(*c),
        Literal::Str(s) => UntypedConst::string(s.as_str()),
    }
}

/// `-v` for a typed constant; `None` when the result does not fit.
fn negate_value(value: &Value) -> Option<Value> {
    match value {
        Value::Float32(v) => Some(Value::Float32(-v)),
        Value::Float64(v) => Some(Value::Float64(-v)),
        Value::Complex64(c) => Some(Value::Complex64(Complex::new(-c.re, -c.im))),
        Value::Complex128(c) => Some(Value::Complex128(Complex::new(-c.re, -c.im))),
        other => Value::from_integer(other.kind(), -other.as_i128()?),
    }
}

/// Elements of an array or slice literal, by position. `None` marks a slot
/// left to the zero value.
type Slots = Vec<Option<CompiledExpr>>;

impl Comp {
    /// Compile any expression. Map index expressions keep their comma-ok
    /// result type.
    pub fn expr(&self, expr: &Expr) -> CompileResult<CompiledExpr> {
        self.expr_at(expr, None)
    }

    /// `span` is the source range of `expr`, reported with its errors.
    fn expr_at(&self, expr: &Expr, span: Option<Span>) -> CompileResult<CompiledExpr> {
        match expr {
            Expr::Spanned(inner, span) => self.expr_at(inner, Some(*span)),
            Expr::Lit(lit) => Ok(CompiledExpr::untyped(literal(lit))),
            Expr::Ident(name) => self.ident(name, span),
            Expr::Paren(inner) => self.expr(inner),
            Expr::Index(node) => self.compile_index(node),
            Expr::Composite { ty, elems } => self.composite(ty, elems, span),
            Expr::AddrOf(inner) => self.addr_of(inner, span),
            Expr::Deref(inner) => self.deref_expr(inner, span),
            Expr::Neg(inner) => self.negate(inner, span),
            Expr::Call(callee, args) => self.call(callee, args, span),
        }
    }

    /// Compile an expression in single-value context.
    pub fn expr1(&self, expr: &Expr) -> CompileResult<CompiledExpr> {
        Ok(self.expr(expr)?.into_single())
    }

    fn ident(&self, name: &str, span: Option<Span>) -> CompileResult<CompiledExpr> {
        match self.scope().lookup(name) {
            Some(Binding::Var { slot, ty }) => {
                trace!(name, slot, ty = %ty, "load variable");
                let fun = specialize(ty, LoadSlot(*slot));
                Ok(CompiledExpr::from_fun(ResultType::Single(ty.clone()), fun))
            }
            Some(Binding::Const(value)) => Ok(value.clone()),
            Some(Binding::Func(func)) => {
                let ty = func.ty().clone();
                let func = func.clone();
                let fun = ExprFn::Generic(Arc::new(move |_: &mut Env| Ok(Value::Func(Some(func.clone())))));
                Ok(CompiledExpr::from_fun(ResultType::Single(ty), fun))
            }
            None if RType::predeclared(name).is_some() => Err(self.errorf(
                CompileErrorKind::TypeError,
                span,
                format!("{} (type) is not an expression", name),
            )),
            None => Err(self.errorf(CompileErrorKind::Undefined, span, format!("undefined: {}", name))),
        }
    }

    /// Resolve a written type. `[...]T` is only valid as the type of a
    /// composite literal and is handled there. Errors carry `span`, the
    /// range of the expression the type is written in.
    pub fn resolve_type(&self, ty: &TypeExpr, span: Option<Span>) -> CompileResult<RType> {
        match ty {
            TypeExpr::Named(name) => RType::predeclared(name)
                .ok_or_else(|| self.errorf(CompileErrorKind::Undefined, span, format!("undefined: {}", name))),
            TypeExpr::Array(ArrayLen::Fixed(len), elem) => Ok(RType::array(
                self.array_len(*len, span)?,
                self.resolve_type(elem, span)?,
            )),
            TypeExpr::Array(ArrayLen::Inferred, _) => Err(self.errorf(
                CompileErrorKind::TypeError,
                span,
                "invalid use of [...] array (outside a composite literal)",
            )),
            TypeExpr::Slice(elem) => Ok(RType::slice(self.resolve_type(elem, span)?)),
            TypeExpr::Map(key, value) => {
                let key = self.resolve_type(key, span)?;
                if !key.is_comparable() {
                    return Err(self.errorf(
                        CompileErrorKind::TypeError,
                        span,
                        format!("invalid map key type {}", key),
                    ));
                }
                Ok(RType::map(key, self.resolve_type(value, span)?))
            }
            TypeExpr::Pointer(elem) => Ok(RType::pointer(self.resolve_type(elem, span)?)),
        }
    }

    fn array_len(&self, len: usize, span: Option<Span>) -> CompileResult<usize> {
        if len > MAX_ARRAY_LEN {
            return Err(self.errorf(
                CompileErrorKind::TypeError,
                span,
                format!("array length {} too large (max {})", len, MAX_ARRAY_LEN),
            ));
        }
        Ok(len)
    }

    /// Give `value` the type `ty`: constants are converted, anything else
    /// must already have exactly that type.
    pub(crate) fn assign_conv(&self, mut value: CompiledExpr, ty: &RType, src: &Expr, context: &str) -> CompileResult<CompiledExpr> {
        if value.is_const() {
            value
                .const_to(ty)
                .map_err(|err| self.errorf(CompileErrorKind::TypeError, src.span(), err.to_string()))?;
            return Ok(value);
        }
        if value.ty().assignable_to(ty) {
            return Ok(value);
        }
        Err(self.errorf(
            CompileErrorKind::TypeError,
            src.span(),
            format!("cannot use {} <{}> as <{}> in {}", src, value.ty(), ty, context),
        ))
    }

    fn composite(&self, ty: &TypeExpr, elems: &[Element], span: Option<Span>) -> CompileResult<CompiledExpr> {
        match ty {
            TypeExpr::Array(len, elem) => {
                let elem_ty = self.resolve_type(elem, span)?;
                let limit = match len {
                    ArrayLen::Fixed(n) => Some(self.array_len(*n, span)?),
                    ArrayLen::Inferred => None,
                };
                let slots = self.sequence_slots(&elem_ty, elems, limit, span)?;
                let ty = RType::array(slots.len(), elem_ty.clone());
                Ok(build_sequence(ty, &elem_ty, slots, Value::array))
            }
            TypeExpr::Slice(elem) => {
                let elem_ty = self.resolve_type(elem, span)?;
                let slots = self.sequence_slots(&elem_ty, elems, None, span)?;
                Ok(build_sequence(RType::slice(elem_ty.clone()), &elem_ty, slots, Value::slice))
            }
            TypeExpr::Map(..) => {
                let ty = self.resolve_type(ty, span)?;
                self.map_literal(ty, elems, span)
            }
            other => Err(self.errorf(
                CompileErrorKind::TypeError,
                span,
                format!("invalid composite literal type {}", other),
            )),
        }
    }

    /// Index errors point at the element, or at the whole literal (`span`)
    /// when the element has no recorded range.
    fn sequence_slots(
        &self,
        elem_ty: &RType,
        elems: &[Element],
        limit: Option<usize>,
        span: Option<Span>,
    ) -> CompileResult<Slots> {
        let mut slots: Slots = Vec::with_capacity(elems.len());
        let mut next = 0usize;
        for elem in elems {
            let at = elem.key.as_ref().unwrap_or(&elem.value).span().or(span);
            if let Some(key) = &elem.key {
                next = self.literal_index(key, at)?;
            }
            if let Some(len) = limit
                && next >= len
            {
                return Err(self.errorf(
                    CompileErrorKind::TypeError,
                    at,
                    format!("array index {} out of bounds [0:{}]", next, len),
                ));
            }
            if next >= MAX_ARRAY_LEN {
                return Err(self.errorf(
                    CompileErrorKind::TypeError,
                    at,
                    format!("array index {} too large (max {})", next, MAX_ARRAY_LEN - 1),
                ));
            }
            let value = self.expr1(&elem.value)?;
            let value = self.assign_conv(value, elem_ty, &elem.value, "array or slice literal")?;
            if slots.len() <= next {
                slots.resize_with(next + 1, || None);
            }
            if slots[next].is_some() {
                return Err(self.errorf(
                    CompileErrorKind::TypeError,
                    at,
                    format!("duplicate index {} in array or slice literal", next),
                ));
            }
            slots[next] = Some(value);
            next += 1;
        }
        if let Some(len) = limit {
            slots.resize_with(len, || None);
        }
        Ok(slots)
    }

    /// Explicit index of a keyed array or slice element.
    fn literal_index(&self, key: &Expr, span: Option<Span>) -> CompileResult<usize> {
        let mut index = self.expr1(key)?;
        let bad_index = || {
            self.errorf(
                CompileErrorKind::TypeError,
                span,
                format!("index {} must be non-negative integer constant", key),
            )
        };
        if !index.is_const() || index.const_to(&RType::Int).is_err() {
            return Err(bad_index());
        }
        match index.const_value() {
            Some(Value::Int(i)) => usize::try_from(i).map_err(|_| bad_index()),
            _ => Err(bad_index()),
        }
    }

    fn map_literal(&self, ty: RType, elems: &[Element], span: Option<Span>) -> CompileResult<CompiledExpr> {
        let (key_ty, value_ty) = match &ty {
            RType::Map(key, value) => ((**key).clone(), (**value).clone()),
            other => {
                return Err(self.errorf(
                    CompileErrorKind::TypeError,
                    span,
                    format!("invalid composite literal type {}", other),
                ));
            }
        };

        let mut seen: FastHashSet<MapKey> = fast_hash_set_new();
        let mut entries = Vec::with_capacity(elems.len());
        for elem in elems {
            let Some(key_expr) = &elem.key else {
                let at = elem.value.span().or(span);
                return Err(self.errorf(CompileErrorKind::TypeError, at, "missing key in map literal"));
            };
            let key = self.assign_conv(self.expr1(key_expr)?, &key_ty, key_expr, "map literal")?;
            if let Some(k) = key.const_value()
                && !seen.insert(MapKey::new(k))
            {
                return Err(self.errorf(
                    CompileErrorKind::TypeError,
                    key_expr.span().or(span),
                    format!("duplicate key {} in map literal", key_expr),
                ));
            }
            let value = self.assign_conv(self.expr1(&elem.value)?, &value_ty, &elem.value, "map literal")?;
            entries.push((key, value));
        }

        if entries.iter().all(|(k, v)| k.is_const() && v.is_const()) {
            let map: MapValue = entries
                .iter()
                .filter_map(|(k, v)| Some((k.const_value()?, v.const_value()?)))
                .collect();
            return Ok(CompiledExpr::constant(ty, Value::map(map)));
        }

        let funs: Vec<(Fun<Value>, Fun<Value>)> = entries.iter().map(|(k, v)| (k.value_fun(), v.value_fun())).collect();
        let fun: Fun<Value> = Arc::new(move |env: &mut Env| {
            let mut map = MapValue::with_capacity(funs.len());
            for (key, value) in &funs {
                let k = key(env)?;
                let v = value(env)?;
                map.insert(k, v);
            }
            Ok(Value::map(map))
        });
        Ok(CompiledExpr::from_fun(ResultType::Single(ty), ExprFn::Generic(fun)))
    }

    /// `&e` for composite literals and variables. The pointer refers to a
    /// snapshot of the value taken when the expression is evaluated.
    fn addr_of(&self, inner: &Expr, span: Option<Span>) -> CompileResult<CompiledExpr> {
        let addressable = match inner.unparen() {
            Expr::Composite { .. } => true,
            Expr::Ident(name) => matches!(self.scope().lookup(name), Some(Binding::Var { .. })),
            _ => false,
        };
        if !addressable {
            return Err(self.errorf(
                CompileErrorKind::InvalidOperation,
                span,
                format!("invalid operation: cannot take address of {}", inner),
            ));
        }
        let value = self.expr1(inner)?;
        let ty = RType::pointer(value.ty().clone());
        let fun = value.value_fun();
        Ok(CompiledExpr::from_fun(
            ResultType::Single(ty),
            ExprFn::Generic(Arc::new(move |env: &mut Env| Ok(Value::pointer_to(fun(env)?)))),
        ))
    }

    fn negate(&self, inner: &Expr, span: Option<Span>) -> CompileResult<CompiledExpr> {
        let value = self.expr1(inner)?;
        match value.constant_ref() {
            Some(Constant::Untyped(c)) => c.negate().map(CompiledExpr::untyped).ok_or_else(|| {
                self.errorf(
                    CompileErrorKind::TypeError,
                    span,
                    format!("invalid operation: operator - not defined on {} (untyped {} constant)", inner, c.kind),
                )
            }),
            Some(Constant::Typed(v)) => match negate_value(v) {
                Some(negated) => Ok(CompiledExpr::constant(value.ty().clone(), negated)),
                None => Err(self.errorf(
                    CompileErrorKind::TypeError,
                    span,
                    format!("constant -{} overflows {}", v, value.ty()),
                )),
            },
            _ => Err(self.errorf(
                CompileErrorKind::TypeError,
                span,
                format!("invalid operation: -{} (operand must be constant)", inner),
            )),
        }
    }

    fn call(&self, callee: &Expr, args: &[Expr], span: Option<Span>) -> CompileResult<CompiledExpr> {
        if let Expr::Ident(name) = callee.unparen()
            && self.scope().lookup(name).is_none()
            && let Some(ty) = RType::predeclared(name)
        {
            return self.conversion(ty, args, span);
        }

        let func = self.expr1(callee)?;
        let (params, result) = match func.ty() {
            RType::Func { params, result } => (params.clone(), (**result).clone()),
            other => {
                return Err(self.errorf(
                    CompileErrorKind::InvalidOperation,
                    span,
                    format!("invalid operation: cannot call non-function {} (type {})", callee, other),
                ));
            }
        };
        if params.len() != args.len() {
            return Err(self.errorf(
                CompileErrorKind::TypeError,
                span,
                format!(
                    "wrong number of arguments in call to {}: have {}, want {}",
                    callee,
                    args.len(),
                    params.len()
                ),
            ));
        }

        let mut arg_funs = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(&params) {
            let compiled = self.assign_conv(self.expr1(arg)?, param, arg, "argument")?;
            arg_funs.push(compiled.value_fun());
        }
        let func = func.value_fun();
        let fun: Fun<Value> = Arc::new(move |env: &mut Env| {
            let host = match func(env)? {
                Value::Func(Some(host)) => host,
                Value::Func(None) => return Err(RuntimeError::NilDereference),
                other => {
                    return Err(RuntimeError::KindMismatch {
                        expected: "func",
                        found: other.kind_name(),
                    });
                }
            };
            let mut values = Vec::with_capacity(arg_funs.len());
            for arg in &arg_funs {
                values.push(arg(env)?);
            }
            host.call(env, &values)
        });
        Ok(CompiledExpr::from_generic(result, fun))
    }

    /// `T(x)`. Constants are converted with the usual representability
    /// rules; other operands must already have type `T`.
    fn conversion(&self, ty: RType, args: &[Expr], span: Option<Span>) -> CompileResult<CompiledExpr> {
        let [arg] = args else {
            return Err(self.errorf(
                CompileErrorKind::TypeError,
                span,
                format!("wrong argument count in conversion to {}", ty),
            ));
        };
        let mut value = self.expr1(arg)?;
        if value.is_const() {
            value
                .const_to(&ty)
                .map_err(|err| self.errorf(CompileErrorKind::TypeError, span, err.to_string()))?;
            return Ok(value);
        }
        if value.ty() == &ty {
            return Ok(value);
        }
        Err(self.errorf(
            CompileErrorKind::TypeError,
            span,
            format!("cannot convert {} (variable of type {}) to {}", arg, value.ty(), ty),
        ))
    }
}

/// Array or slice literal from its slots. Constant when every element is.
fn build_sequence(ty: RType, elem_ty: &RType, slots: Slots, wrap: fn(Vec<Value>) -> Value) -> CompiledExpr {
    let zero = elem_ty.zero();
    if slots.iter().flatten().all(CompiledExpr::is_const) {
        let values = slots
            .iter()
            .map(|slot| slot.as_ref().and_then(CompiledExpr::const_value).unwrap_or_else(|| zero.clone()))
            .collect();
        return CompiledExpr::constant(ty, wrap(values));
    }

    let funs: Vec<Option<Fun<Value>>> = slots.iter().map(|slot| slot.as_ref().map(CompiledExpr::value_fun)).collect();
    let fun: Fun<Value> = Arc::new(move |env: &mut Env| {
        let mut values = Vec::with_capacity(funs.len());
        for f in &funs {
            values.push(match f {
                Some(f) => f(env)?,
                None => zero.clone(),
            });
        }
        Ok(wrap(values))
    });
    CompiledExpr::from_fun(ResultType::Single(ty), ExprFn::Generic(fun))
}
