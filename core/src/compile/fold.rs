use tracing::debug;

use crate::compile::{Body, CompiledExpr, Constant, ExprFn, FoldMode, ResultType};
use crate::rt::Env;
use crate::typ::{RType, UntypedConst};

/// Evaluate a closure whose operands are all constant and replace it with
/// the resulting literal.
///
/// The closure runs once against a detached environment. When that run
/// fails, e.g. a constant index past the end of a constant array, the
/// expression is returned unchanged so the failure surfaces at invocation.
pub fn fold_constant(expr: CompiledExpr, mode: FoldMode) -> CompiledExpr {
    let fun = match expr.body() {
        Body::Fun(fun) => fun,
        Body::Const(_) => return expr,
    };

    let mut env = Env::detached();
    let folded = match fun {
        ExprFn::CommaOk(f) => f(&mut env).map(Constant::Lookup),
        other => other.call_value(&mut env).map(|value| match (mode, expr.ty()) {
            (FoldMode::KeepUntyped, RType::Untyped(kind)) => match UntypedConst::from_value(*kind, &value) {
                Some(c) => Constant::Untyped(c),
                None => Constant::Typed(value),
            },
            _ => Constant::Typed(value),
        }),
    };

    match folded {
        Ok(constant) => {
            let result_type = match (&constant, expr.result_type()) {
                (Constant::Typed(_), ResultType::Single(RType::Untyped(kind))) => ResultType::Single(kind.default_type()),
                (_, other) => other.clone(),
            };
            debug!(ty = %result_type, "folded constant index expression");
            CompiledExpr::from_parts(result_type, Body::Const(constant))
        }
        Err(err) => {
            debug!(%err, "constant index expression not folded");
            expr
        }
    }
}
