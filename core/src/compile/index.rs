use tracing::debug;

use crate::compile::fold::fold_constant;
use crate::compile::{CompileError, CompileErrorKind, CompileResult, CompiledExpr, Comp};
use crate::expr::IndexNode;
use crate::typ::Kind;

impl Comp {
    /// Compile `object[index]`.
    ///
    /// Arrays, slices and strings go to the sequence indexer, maps to the
    /// comma-ok lookup, and pointers to arrays are dereferenced one level
    /// first. When both operands are constant the result is folded.
    pub fn compile_index(&self, node: &IndexNode) -> CompileResult<CompiledExpr> {
        let mut obj = self.expr1(&node.object)?;
        let idx = self.expr1(&node.index)?;
        obj.const_to_default()
            .map_err(|err| self.errorf(CompileErrorKind::TypeError, node.span, err.to_string()))?;
        let both_const = obj.is_const() && idx.is_const();

        let ty = obj.ty().clone();
        debug!(expr = %node, kind = %ty.kind(), both_const, "compile index");

        let compiled = match ty.kind() {
            Kind::Array | Kind::Slice | Kind::String => self.sequence_index(node, &obj, idx)?,
            Kind::Map => self.map_index(node, &obj, idx)?,
            Kind::Pointer if ty.elem().is_some_and(|elem| elem.kind() == Kind::Array) => {
                match self.deref_array(&obj) {
                    Some(deref) => self.sequence_index(node, &deref, idx)?,
                    None => return Err(self.unindexable(node, &obj)),
                }
            }
            _ => return Err(self.unindexable(node, &obj)),
        };

        if both_const && self.options().fold_constants {
            return Ok(fold_constant(compiled, self.options().fold_mode));
        }
        Ok(compiled)
    }

    pub(crate) fn unindexable(&self, node: &IndexNode, obj: &CompiledExpr) -> CompileError {
        self.errorf(
            CompileErrorKind::InvalidOperation,
            node.span,
            format!("invalid operation: {} (type {} does not support indexing)", node, obj.ty()),
        )
    }
}
