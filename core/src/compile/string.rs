use std::sync::Arc;

use tracing::trace;

use crate::compile::sequence::IndexSource;
use crate::compile::{CompiledExpr, Comp, ExprFn, Fun, ResultType};
use crate::rt::Env;
use crate::typ::RType;
use crate::val::{Value, kinds, string_byte};

impl Comp {
    /// Byte access into a string; the result is the raw `uint8` at the
    /// offset, not a decoded character.
    pub(crate) fn string_index(&self, obj: &CompiledExpr, index: IndexSource) -> CompiledExpr {
        let fun: Fun<u8> = match (obj.const_value(), index) {
            (Some(Value::String(s)), IndexSource::Dynamic(index)) => {
                trace!("string index: constant string, dynamic index");
                Arc::new(move |env: &mut Env| string_byte(&s, index(env)?))
            }
            (_, IndexSource::Const(i)) => {
                trace!(index = i, "string index: constant index");
                let object = obj.fun_of::<kinds::String>();
                Arc::new(move |env: &mut Env| string_byte(&object(env)?, i))
            }
            (_, IndexSource::Dynamic(index)) => {
                trace!("string index: dynamic string and index");
                let object = obj.fun_of::<kinds::String>();
                Arc::new(move |env: &mut Env| {
                    let s = object(env)?;
                    let i = index(env)?;
                    string_byte(&s, i)
                })
            }
        };
        CompiledExpr::from_fun(ResultType::Single(RType::Uint8), ExprFn::Uint8(fun))
    }
}
