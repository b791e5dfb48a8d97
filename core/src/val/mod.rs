use std::fmt;
use std::sync::Arc;

use crate::rt::{Env, RtResult, RuntimeError};
use crate::typ::{Kind, RType};

mod display;
mod map;
mod scalar;


pub use map::{MapKey, MapValue};
pub use scalar::{ElemKind, kinds};
pub(crate) use scalar::with_scalar_kinds;

/// Complex number with `re` and `im` parts of the same float width.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T> Complex<T> {
    pub const fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
}

/// Runtime value: a kind tag plus its concrete payload.
///
/// Scalar variants are named after their `Kind` so that the element-kind
/// table in `scalar.rs` can address them generically.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint(u64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Uintptr(usize),
    Float32(f32),
    Float64(f64),
    Complex64(Complex<f32>),
    Complex128(Complex<f64>),
    /// String type, wrapped in Arc<str> for efficient cloning
    String(Arc<str>),
    /// Fixed-length array contents
    Array(Arc<[Value]>),
    /// Slice contents; a nil slice is empty
    Slice(Arc<[Value]>),
    /// Map; `None` is the nil map
    Map(Option<Arc<MapValue>>),
    /// Pointer; `None` is the nil pointer
    Pointer(Option<Arc<Value>>),
    /// Host function; `None` is the nil func
    Func(Option<HostFn>),
}

/// Result of a comma-ok map access: `v, ok := m[k]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub value: Value,
    pub found: bool,
}

impl Lookup {
    #[inline]
    pub fn found(value: Value) -> Self {
        Self { value, found: true }
    }

    #[inline]
    pub fn absent(zero: Value) -> Self {
        Self { value: zero, found: false }
    }
}

pub type HostFnImpl = dyn Fn(&mut Env, &[Value]) -> RtResult<Value> + Send + Sync;

/// Function supplied by the embedding program and callable from expressions.
#[derive(Clone)]
pub struct HostFn {
    name: Arc<str>,
    ty: RType,
    f: Arc<HostFnImpl>,
}

impl HostFn {
    pub fn new<F>(name: &str, params: Vec<RType>, result: RType, f: F) -> Self
    where
        F: Fn(&mut Env, &[Value]) -> RtResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            ty: RType::func(params, result),
            f: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &RType {
        &self.ty
    }

    #[inline]
    pub fn call(&self, env: &mut Env, args: &[Value]) -> RtResult<Value> {
        (self.f)(env, args)
    }
}

impl fmt::Debug for HostFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFn")
            .field("name", &self.name)
            .field("ty", &self.ty.to_string())
            .finish()
    }
}

impl PartialEq for HostFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Int8(_) => Kind::Int8,
            Value::Int16(_) => Kind::Int16,
            Value::Int32(_) => Kind::Int32,
            Value::Int64(_) => Kind::Int64,
            Value::Uint(_) => Kind::Uint,
            Value::Uint8(_) => Kind::Uint8,
            Value::Uint16(_) => Kind::Uint16,
            Value::Uint32(_) => Kind::Uint32,
            Value::Uint64(_) => Kind::Uint64,
            Value::Uintptr(_) => Kind::Uintptr,
            Value::Float32(_) => Kind::Float32,
            Value::Float64(_) => Kind::Float64,
            Value::Complex64(_) => Kind::Complex64,
            Value::Complex128(_) => Kind::Complex128,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Slice(_) => Kind::Slice,
            Value::Map(_) => Kind::Map,
            Value::Pointer(_) => Kind::Pointer,
            Value::Func(_) => Kind::Func,
        }
    }

    #[inline]
    pub fn kind_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn string(s: &str) -> Value {
        Value::String(Arc::from(s))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Arc::from(items))
    }

    pub fn slice(items: Vec<Value>) -> Value {
        Value::Slice(Arc::from(items))
    }

    pub fn map(map: MapValue) -> Value {
        Value::Map(Some(Arc::new(map)))
    }

    pub fn pointer_to(value: Value) -> Value {
        Value::Pointer(Some(Arc::new(value)))
    }

    /// Build an integer value of `kind`, or `None` when `v` does not fit.
    pub fn from_integer(kind: Kind, v: i128) -> Option<Value> {
        let value = match kind {
            Kind::Int => Value::Int(i64::try_from(v).ok()?),
            Kind::Int8 => Value::Int8(i8::try_from(v).ok()?),
            Kind::Int16 => Value::Int16(i16::try_from(v).ok()?),
            Kind::Int32 => Value::Int32(i32::try_from(v).ok()?),
            Kind::Int64 => Value::Int64(i64::try_from(v).ok()?),
            Kind::Uint => Value::Uint(u64::try_from(v).ok()?),
            Kind::Uint8 => Value::Uint8(u8::try_from(v).ok()?),
            Kind::Uint16 => Value::Uint16(u16::try_from(v).ok()?),
            Kind::Uint32 => Value::Uint32(u32::try_from(v).ok()?),
            Kind::Uint64 => Value::Uint64(u64::try_from(v).ok()?),
            Kind::Uintptr => Value::Uintptr(usize::try_from(v).ok()?),
            _ => return None,
        };
        Some(value)
    }

    pub fn from_float(kind: Kind, v: f64) -> Option<Value> {
        match kind {
            Kind::Float32 => Some(Value::Float32(v as f32)),
            Kind::Float64 => Some(Value::Float64(v)),
            _ => None,
        }
    }

    /// Integer payload widened to i128.
    pub fn as_i128(&self) -> Option<i128> {
        let v = match self {
            Value::Int(v) | Value::Int64(v) => *v as i128,
            Value::Int8(v) => *v as i128,
            Value::Int16(v) => *v as i128,
            Value::Int32(v) => *v as i128,
            Value::Uint(v) | Value::Uint64(v) => *v as i128,
            Value::Uint8(v) => *v as i128,
            Value::Uint16(v) => *v as i128,
            Value::Uint32(v) => *v as i128,
            Value::Uintptr(v) => *v as i128,
            _ => return None,
        };
        Some(v)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Number of elements of an array, slice, string or map.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Array(items) | Value::Slice(items) => Some(items.len()),
            Value::String(s) => Some(s.len()),
            Value::Map(map) => Some(map.as_ref().map_or(0, |m| m.len())),
            _ => None,
        }
    }

    /// Bounds-checked element of an array or slice.
    #[inline]
    pub fn index(&self, i: i64) -> RtResult<&Value> {
        match self {
            Value::Array(items) | Value::Slice(items) => usize::try_from(i)
                .ok()
                .and_then(|pos| items.get(pos))
                .ok_or(RuntimeError::IndexOutOfRange { index: i, len: items.len() }),
            other => Err(RuntimeError::KindMismatch {
                expected: "array or slice",
                found: other.kind_name(),
            }),
        }
    }

    /// Entry of a map; a nil map has no entries.
    #[inline]
    pub fn map_get(&self, key: &MapKey) -> RtResult<Option<&Value>> {
        match self {
            Value::Map(map) => Ok(map.as_deref().and_then(|m| m.get(key))),
            other => Err(RuntimeError::KindMismatch {
                expected: "map",
                found: other.kind_name(),
            }),
        }
    }

    /// One-level pointer dereference.
    #[inline]
    pub fn pointee(&self) -> RtResult<Value> {
        match self {
            Value::Pointer(Some(pointee)) => Ok(Value::clone(pointee)),
            Value::Pointer(None) => Err(RuntimeError::NilDereference),
            other => Err(RuntimeError::KindMismatch {
                expected: "ptr",
                found: other.kind_name(),
            }),
        }
    }
}

/// Raw byte of `s` at offset `i`.
#[inline]
pub fn string_byte(s: &str, i: i64) -> RtResult<u8> {
    usize::try_from(i)
        .ok()
        .and_then(|pos| s.as_bytes().get(pos).copied())
        .ok_or(RuntimeError::IndexOutOfRange { index: i, len: s.len() })
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}
