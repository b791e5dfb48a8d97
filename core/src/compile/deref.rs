use std::sync::Arc;

use crate::compile::{CompileErrorKind, CompileResult, CompiledExpr, Comp, ExprFn, ResultType};
use crate::expr::Expr;
use crate::rt::Env;
use crate::token::Span;
use crate::typ::RType;

impl Comp {
    /// `(*p)` for a pointer to an array, used as the object of an index
    /// expression. Nil pointers fail with a nil dereference before any
    /// bounds check.
    pub(crate) fn deref_array(&self, obj: &CompiledExpr) -> Option<CompiledExpr> {
        let pointee = obj.ty().elem()?.clone();
        let pointer = obj.value_fun();
        let fun = ExprFn::Generic(Arc::new(move |env: &mut Env| pointer(env)?.pointee()));
        Some(CompiledExpr::from_fun(ResultType::Single(pointee), fun))
    }

    /// General `*e`.
    pub(crate) fn deref_expr(&self, inner: &Expr, span: Option<Span>) -> CompileResult<CompiledExpr> {
        let obj = self.expr1(inner)?;
        let pointee = match obj.ty() {
            RType::Pointer(elem) => (**elem).clone(),
            other => {
                return Err(self.errorf(
                    CompileErrorKind::InvalidOperation,
                    span,
                    format!("invalid operation: cannot indirect {} (type {})", inner, other),
                ));
            }
        };
        let pointer = obj.value_fun();
        Ok(CompiledExpr::from_generic(
            pointee,
            Arc::new(move |env: &mut Env| pointer(env)?.pointee()),
        ))
    }
}
