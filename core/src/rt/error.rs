use std::fmt;

/// Failure raised while invoking a compiled closure.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Sequence or string access outside `0..len`.
    IndexOutOfRange { index: i64, len: usize },
    /// Dereference of a nil pointer.
    NilDereference,
    /// A value did not carry the kind its static type promised.
    KindMismatch { expected: &'static str, found: &'static str },
    /// Variable slot missing from the environment.
    UnboundSlot(usize),
    /// Untyped constant that cannot take its default type.
    Constant(String),
    /// Failure reported by a host function.
    Host(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::IndexOutOfRange { index, len } => {
                write!(f, "runtime error: index out of range [{}] with length {}", index, len)
            }
            RuntimeError::NilDereference => f.write_str("runtime error: invalid memory address or nil pointer dereference"),
            RuntimeError::KindMismatch { expected, found } => {
                write!(f, "runtime error: expected {} value, found {}", expected, found)
            }
            RuntimeError::UnboundSlot(slot) => write!(f, "runtime error: variable slot {} is not bound", slot),
            RuntimeError::Constant(msg) => write!(f, "runtime error: {}", msg),
            RuntimeError::Host(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {}

pub type RtResult<T> = Result<T, RuntimeError>;
