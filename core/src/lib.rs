pub mod ast;
pub mod compile;
pub mod expr;
pub mod interp;
pub mod rt;
pub mod stmt;
pub mod token;
pub mod typ;
pub mod util;
pub mod val;

pub use compile::{CompileError, CompileOptions, CompiledExpr, Comp, FoldMode};
pub use interp::{EvalError, Evaluated, Interp};
pub use rt::{Env, RuntimeError};
pub use typ::RType;
pub use val::{HostFn, Value};

#[cfg(test)]
mod interp_test;
