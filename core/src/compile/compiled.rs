//! Compiled expressions and their kind-specialized closures.

use std::fmt;
use std::sync::Arc;

use crate::rt::{Env, RtResult, RuntimeError};
use crate::typ::{ConstError, Kind, RType, UntypedConst, convert_typed};
use crate::val::{ElemKind, Lookup, Value, kinds, with_scalar_kinds};

/// Closure produced by compilation, invoked once per evaluation.
pub type Fun<T> = Arc<dyn Fn(&mut Env) -> RtResult<T> + Send + Sync>;

macro_rules! expr_fn_enum {
    ( ; $($kind:ident => $repr:ty),* ) => {
        /// Closure specialized on the kind of its result, so callers receive
        /// the unboxed payload instead of a [`Value`].
        #[derive(Clone)]
        pub enum ExprFn {
            $($kind(Fun<$repr>),)*
            /// Array, slice, map, pointer and func results
            Generic(Fun<Value>),
            /// `(value, found)` map lookups
            CommaOk(Fun<Lookup>),
        }

        impl ExprFn {
            /// Invoke and box the result; comma-ok closures yield their value.
            pub fn call_value(&self, env: &mut Env) -> RtResult<Value> {
                match self {
                    $(ExprFn::$kind(f) => f(env).map(Value::$kind),)*
                    ExprFn::Generic(f) => f(env),
                    ExprFn::CommaOk(f) => f(env).map(|lookup| lookup.value),
                }
            }

            /// Erase the specialization.
            pub fn into_generic(self) -> Fun<Value> {
                match self {
                    $(ExprFn::$kind(f) => Arc::new(move |env: &mut Env| f(env).map(Value::$kind)),)*
                    ExprFn::Generic(f) => f,
                    ExprFn::CommaOk(f) => Arc::new(move |env: &mut Env| f(env).map(|lookup| lookup.value)),
                }
            }

            pub fn variant_name(&self) -> &'static str {
                match self {
                    $(ExprFn::$kind(_) => Kind::$kind.name(),)*
                    ExprFn::Generic(_) => "generic",
                    ExprFn::CommaOk(_) => "comma-ok",
                }
            }
        }

        $(
            impl SpecializedKind for kinds::$kind {
                #[inline]
                fn into_expr_fn(f: Fun<$repr>) -> ExprFn {
                    ExprFn::$kind(f)
                }

                #[inline]
                fn from_expr_fn(f: &ExprFn) -> Option<Fun<$repr>> {
                    match f {
                        ExprFn::$kind(f) => Some(f.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

/// Element kinds that have a matching [`ExprFn`] variant.
pub trait SpecializedKind: ElemKind {
    fn into_expr_fn(f: Fun<Self::Repr>) -> ExprFn;

    fn from_expr_fn(f: &ExprFn) -> Option<Fun<Self::Repr>>;
}

with_scalar_kinds!(expr_fn_enum!());

impl SpecializedKind for kinds::Any {
    #[inline]
    fn into_expr_fn(f: Fun<Value>) -> ExprFn {
        ExprFn::Generic(f)
    }

    #[inline]
    fn from_expr_fn(f: &ExprFn) -> Option<Fun<Value>> {
        match f {
            ExprFn::Generic(f) => Some(f.clone()),
            _ => None,
        }
    }
}

impl fmt::Debug for ExprFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprFn::{}", self.variant_name())
    }
}

/// Closure builder that is generic over the result kind. [`specialize`]
/// picks the kind from a type and instantiates the builder once.
pub trait KindVisitor {
    fn visit<K: SpecializedKind>(self) -> ExprFn;
}

macro_rules! specialize_by_kind {
    ($ty:ident, $visitor:ident ; $($kind:ident => $repr:ty),*) => {
        match $ty.kind() {
            $(Kind::$kind => $visitor.visit::<kinds::$kind>(),)*
            _ => $visitor.visit::<kinds::Any>(),
        }
    };
}

/// Instantiate `visitor` for the kind of `ty`; composite kinds use the
/// generic fallback.
pub fn specialize<V: KindVisitor>(ty: &RType, visitor: V) -> ExprFn {
    with_scalar_kinds!(specialize_by_kind!(ty, visitor))
}

/// Payload of `value` as kind `K`.
#[inline]
pub fn expect_kind<K: ElemKind>(value: &Value) -> RtResult<K::Repr> {
    K::fetch(value).ok_or(RuntimeError::KindMismatch {
        expected: K::NAME,
        found: value.kind_name(),
    })
}

/// Narrows a generic closure to the specialized variant of its kind.
pub struct Narrow(pub Fun<Value>);

impl KindVisitor for Narrow {
    fn visit<K: SpecializedKind>(self) -> ExprFn {
        if let Some(generic) = K::from_expr_fn(&ExprFn::Generic(self.0.clone())) {
            return K::into_expr_fn(generic);
        }
        let f = self.0;
        K::into_expr_fn(Arc::new(move |env: &mut Env| expect_kind::<K>(&f(env)?)))
    }
}

/// Static type of a compiled expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultType {
    Single(RType),
    /// `(T, bool)` produced by map lookups
    CommaOk(RType),
}

impl ResultType {
    pub fn value_type(&self) -> &RType {
        match self {
            ResultType::Single(ty) | ResultType::CommaOk(ty) => ty,
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultType::Single(ty) => write!(f, "{}", ty),
            ResultType::CommaOk(ty) => write!(f, "({}, bool)", ty),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Untyped(UntypedConst),
    Typed(Value),
    Lookup(Lookup),
}

#[derive(Debug, Clone)]
pub enum Body {
    Const(Constant),
    Fun(ExprFn),
}

/// Result of compiling one expression: its type plus either a literal or a
/// closure to invoke against an [`Env`].
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    result_type: ResultType,
    body: Body,
}

impl CompiledExpr {
    pub fn untyped(value: UntypedConst) -> Self {
        Self {
            result_type: ResultType::Single(value.ty()),
            body: Body::Const(Constant::Untyped(value)),
        }
    }

    pub fn constant(ty: RType, value: Value) -> Self {
        Self {
            result_type: ResultType::Single(ty),
            body: Body::Const(Constant::Typed(value)),
        }
    }

    pub fn from_fun(result_type: ResultType, fun: ExprFn) -> Self {
        Self {
            result_type,
            body: Body::Fun(fun),
        }
    }

    /// Closure result of type `ty`, narrowed to the specialized variant.
    pub fn from_generic(ty: RType, fun: Fun<Value>) -> Self {
        let fun = specialize(&ty, Narrow(fun));
        Self::from_fun(ResultType::Single(ty), fun)
    }

    pub(crate) fn from_parts(result_type: ResultType, body: Body) -> Self {
        Self { result_type, body }
    }

    pub fn result_type(&self) -> &ResultType {
        &self.result_type
    }

    /// Type of the (first) value.
    pub fn ty(&self) -> &RType {
        self.result_type.value_type()
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    #[inline]
    pub fn is_const(&self) -> bool {
        matches!(self.body, Body::Const(_))
    }

    #[inline]
    pub fn is_untyped(&self) -> bool {
        matches!(self.body, Body::Const(Constant::Untyped(_)))
    }

    #[inline]
    pub fn is_comma_ok(&self) -> bool {
        matches!(self.result_type, ResultType::CommaOk(_))
    }

    pub fn constant_ref(&self) -> Option<&Constant> {
        match &self.body {
            Body::Const(c) => Some(c),
            Body::Fun(_) => None,
        }
    }

    /// Constant value in its concrete form; untyped constants take their
    /// default type.
    pub fn const_value(&self) -> Option<Value> {
        match &self.body {
            Body::Const(Constant::Typed(v)) => Some(v.clone()),
            Body::Const(Constant::Untyped(c)) => c.default_value().ok(),
            Body::Const(Constant::Lookup(l)) => Some(l.value.clone()),
            Body::Fun(_) => None,
        }
    }

    /// Convert a constant to `ty`, the way an assignment or an index
    /// position would.
    pub fn const_to(&mut self, ty: &RType) -> Result<(), ConstError> {
        let value = match &self.body {
            Body::Const(Constant::Untyped(c)) => c.convert(ty)?,
            Body::Const(Constant::Typed(v)) => convert_typed(v, self.ty(), ty)?,
            _ => return Err(ConstError::new(format!("value of type {} is not a constant", self.result_type))),
        };
        self.result_type = ResultType::Single(ty.clone());
        self.body = Body::Const(Constant::Typed(value));
        Ok(())
    }

    /// Give an untyped constant its default type; other expressions are
    /// left alone.
    pub fn const_to_default(&mut self) -> Result<(), ConstError> {
        if let Body::Const(Constant::Untyped(c)) = &self.body {
            let ty = c.default_type();
            self.const_to(&ty)?;
        }
        Ok(())
    }

    /// Single-value view: a comma-ok expression contributes its value.
    pub fn into_single(self) -> CompiledExpr {
        let ty = match self.result_type {
            ResultType::Single(_) => return self,
            ResultType::CommaOk(ty) => ty,
        };
        match self.body {
            Body::Const(Constant::Lookup(lookup)) => CompiledExpr::constant(ty, lookup.value),
            Body::Const(other) => CompiledExpr::from_parts(ResultType::Single(ty), Body::Const(other)),
            Body::Fun(fun) => CompiledExpr::from_generic(ty, fun.into_generic()),
        }
    }

    /// Closure returning the value as a [`Value`].
    pub fn value_fun(&self) -> Fun<Value> {
        match &self.body {
            Body::Fun(fun) => fun.clone().into_generic(),
            Body::Const(Constant::Untyped(c)) => match c.default_value() {
                Ok(v) => Arc::new(move |_: &mut Env| Ok(v.clone())),
                Err(err) => {
                    let msg = err.to_string();
                    Arc::new(move |_: &mut Env| Err(RuntimeError::Constant(msg.clone())))
                }
            },
            Body::Const(Constant::Typed(v)) => {
                let v = v.clone();
                Arc::new(move |_: &mut Env| Ok(v.clone()))
            }
            Body::Const(Constant::Lookup(l)) => {
                let v = l.value.clone();
                Arc::new(move |_: &mut Env| Ok(v.clone()))
            }
        }
    }

    /// Closure returning the unboxed payload of kind `K`.
    pub fn fun_of<K: SpecializedKind>(&self) -> Fun<K::Repr> {
        if let Body::Fun(fun) = &self.body
            && let Some(f) = K::from_expr_fn(fun)
        {
            return f;
        }
        if let Some(repr) = self.const_value().as_ref().and_then(K::fetch) {
            return Arc::new(move |_: &mut Env| Ok(repr.clone()));
        }
        let generic = self.value_fun();
        Arc::new(move |env: &mut Env| expect_kind::<K>(&generic(env)?))
    }

    /// Closure form of the expression, specialized by its result kind.
    pub fn with_fun(&self) -> ExprFn {
        match &self.body {
            Body::Fun(fun) => fun.clone(),
            Body::Const(Constant::Lookup(l)) => {
                let l = l.clone();
                ExprFn::CommaOk(Arc::new(move |_: &mut Env| Ok(l.clone())))
            }
            Body::Const(Constant::Untyped(c)) => specialize(&c.default_type(), Narrow(self.value_fun())),
            Body::Const(Constant::Typed(_)) => specialize(self.ty(), Narrow(self.value_fun())),
        }
    }

    /// Evaluate to a single value.
    pub fn eval(&self, env: &mut Env) -> RtResult<Value> {
        match &self.body {
            Body::Fun(fun) => fun.call_value(env),
            Body::Const(Constant::Typed(v)) => Ok(v.clone()),
            Body::Const(Constant::Untyped(c)) => c.default_value().map_err(|e| RuntimeError::Constant(e.to_string())),
            Body::Const(Constant::Lookup(l)) => Ok(l.value.clone()),
        }
    }

    /// Evaluate a comma-ok expression to its `(value, found)` pair.
    pub fn eval_comma_ok(&self, env: &mut Env) -> RtResult<Lookup> {
        match &self.body {
            Body::Fun(ExprFn::CommaOk(f)) => f(env),
            Body::Const(Constant::Lookup(l)) => Ok(l.clone()),
            _ => Err(RuntimeError::KindMismatch {
                expected: "comma-ok",
                found: self.ty().kind().name(),
            }),
        }
    }
}
