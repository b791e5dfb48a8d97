use std::sync::Arc;

use tracing::trace;

use crate::compile::{
    CompileErrorKind, CompileResult, CompiledExpr, Comp, ExprFn, Fun, KindVisitor, ResultType, SpecializedKind,
    expect_kind, specialize,
};
use crate::expr::IndexNode;
use crate::rt::{Env, RtResult};
use crate::typ::{Kind, RType};
use crate::val::{ElemKind, Value, kinds};

/// Where an element index comes from; fixed when the closure is built.
#[derive(Clone)]
pub(crate) enum IndexSource {
    Const(i64),
    Dynamic(Fun<i64>),
}

impl IndexSource {
    fn shape(&self) -> &'static str {
        match self {
            IndexSource::Const(_) => "constant index",
            IndexSource::Dynamic(_) => "dynamic index",
        }
    }
}

/// Bounds-checked element of `seq` as kind `K`.
#[inline]
fn element<K: ElemKind>(seq: &Value, i: i64) -> RtResult<K::Repr> {
    expect_kind::<K>(seq.index(i)?)
}

/// Element access closure for one element kind.
pub(crate) fn fetch_elements<K: ElemKind>(object: Fun<Value>, index: IndexSource) -> Fun<K::Repr> {
    match index {
        IndexSource::Const(i) => Arc::new(move |env: &mut Env| {
            let seq = object(env)?;
            element::<K>(&seq, i)
        }),
        IndexSource::Dynamic(index) => Arc::new(move |env: &mut Env| {
            let seq = object(env)?;
            let i = index(env)?;
            element::<K>(&seq, i)
        }),
    }
}

pub(crate) struct FetchElements {
    pub object: Fun<Value>,
    pub index: IndexSource,
}

impl KindVisitor for FetchElements {
    fn visit<K: SpecializedKind>(self) -> ExprFn {
        K::into_expr_fn(fetch_elements::<K>(self.object, self.index))
    }
}

impl Comp {
    /// Array, slice and string indexing. `obj` has already been given a
    /// concrete type.
    pub(crate) fn sequence_index(&self, node: &IndexNode, obj: &CompiledExpr, mut idx: CompiledExpr) -> CompileResult<CompiledExpr> {
        let index = if idx.is_const() {
            idx.const_to(&RType::Int)
                .map_err(|err| self.errorf(CompileErrorKind::TypeError, node.span, err.to_string()))?;
            match idx.const_value() {
                Some(Value::Int(i)) => IndexSource::Const(i),
                _ => IndexSource::Dynamic(idx.fun_of::<kinds::Int>()),
            }
        } else if !idx.ty().assignable_to(&RType::Int) {
            return Err(self.errorf(
                CompileErrorKind::TypeError,
                node.span,
                format!("non-integer {} index: {} <{}>", obj.ty().kind(), node.index, idx.ty()),
            ));
        } else {
            IndexSource::Dynamic(idx.fun_of::<kinds::Int>())
        };

        if obj.ty().kind() == Kind::String {
            return Ok(self.string_index(obj, index));
        }

        let elem = match obj.ty().elem() {
            Some(elem) => elem.clone(),
            None => return Err(self.unindexable(node, obj)),
        };
        trace!(elem = %elem, shape = index.shape(), "sequence index closure");

        let fun = specialize(
            &elem,
            FetchElements {
                object: obj.value_fun(),
                index,
            },
        );
        Ok(CompiledExpr::from_fun(ResultType::Single(elem), fun))
    }
}
