use std::sync::Arc;

use tracing::trace;

use crate::compile::{CompileErrorKind, CompileResult, CompiledExpr, Comp, ExprFn, Fun, ResultType};
use crate::expr::IndexNode;
use crate::rt::{Env, RtResult};
use crate::val::{Lookup, MapKey, Value};

/// Comma-ok lookup. A missing key, or a nil map, yields the zero value and
/// `found == false`; absence is never an error.
#[inline]
fn lookup(map: &Value, key: &MapKey, zero: &Value) -> RtResult<Lookup> {
    Ok(match map.map_get(key)? {
        Some(value) => Lookup::found(value.clone()),
        None => Lookup::absent(zero.clone()),
    })
}

impl Comp {
    pub(crate) fn map_index(&self, node: &IndexNode, obj: &CompiledExpr, mut idx: CompiledExpr) -> CompileResult<CompiledExpr> {
        let (key_ty, value_ty) = match (obj.ty().key(), obj.ty().elem()) {
            (Some(key), Some(value)) => (key.clone(), value.clone()),
            _ => return Err(self.unindexable(node, obj)),
        };

        let object = obj.value_fun();
        let zero = value_ty.zero();

        let fun: Fun<Lookup> = if idx.is_const() {
            idx.const_to(&key_ty)
                .map_err(|err| self.errorf(CompileErrorKind::TypeError, node.span, err.to_string()))?;
            let key = match idx.const_value() {
                Some(value) => MapKey::new(value),
                None => return Err(self.errorf(CompileErrorKind::TypeError, node.span, "map key is not a value")),
            };
            trace!(key = %key.value(), "map index: constant key");
            Arc::new(move |env: &mut Env| {
                let map = object(env)?;
                lookup(&map, &key, &zero)
            })
        } else if !idx.ty().assignable_to(&key_ty) {
            return Err(self.errorf(
                CompileErrorKind::TypeError,
                node.span,
                format!("cannot use {} <{}> as <{}> in map index", node.index, idx.ty(), key_ty),
            ));
        } else {
            trace!("map index: dynamic key");
            let key_fun = idx.value_fun();
            Arc::new(move |env: &mut Env| {
                let map = object(env)?;
                let key = MapKey::new(key_fun(env)?);
                lookup(&map, &key, &zero)
            })
        };

        Ok(CompiledExpr::from_fun(ResultType::CommaOk(value_ty), ExprFn::CommaOk(fun)))
    }
}
