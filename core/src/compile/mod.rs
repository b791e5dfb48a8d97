//! Closure compiler.
//!
//! Expressions are compiled once into [`CompiledExpr`] values holding either
//! a constant or a closure specialized on the kind of its result; invoking
//! the closure against an [`Env`](crate::rt::Env) performs the work.

mod comp;
mod compiled;
mod deref;
mod error;
mod expr;
mod fold;
mod index;
mod map;
mod options;
mod sequence;
mod string;

#[cfg(test)]
mod index_test;

pub use comp::{Binding, Comp, Scope};
pub use compiled::{
    Body, CompiledExpr, Constant, ExprFn, Fun, KindVisitor, Narrow, ResultType, SpecializedKind, expect_kind, specialize,
};
pub use error::{CollectingSink, CompileError, CompileErrorKind, CompileResult, DiagnosticSink, TracingSink};
pub use fold::fold_constant;
pub use options::{CompileOptions, FoldMode};
