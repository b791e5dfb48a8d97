mod kind;
mod numeric;
mod types;
mod untyped;

#[cfg(test)]
mod types_test;

pub use kind::Kind;
pub use numeric::{NumericClass, NumericHierarchy};
pub use types::{MAX_ARRAY_LEN, RType};
pub use untyped::{ConstError, UntypedConst, UntypedKind, UntypedValue, convert_typed};
