use std::fmt;
use std::sync::Arc;

use crate::typ::{Kind, UntypedKind};
use crate::val::{Complex, MapValue, Value};

/// Largest array length, and largest index in an array or slice literal,
/// that the compiler accepts. Zero values are built eagerly, so this also
/// caps their size.
pub const MAX_ARRAY_LEN: usize = 1 << 20;

/// Runtime type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RType {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,

    /// Fixed-length array: [N]T
    Array(usize, Box<RType>),
    /// Slice: []T
    Slice(Box<RType>),
    /// Map: map[K]V
    Map(Box<RType>, Box<RType>),
    /// Pointer: *T
    Pointer(Box<RType>),
    /// Host function signature
    Func {
        params: Vec<RType>,
        result: Box<RType>,
    },

    /// Type of a constant that has not been given a concrete type yet
    Untyped(UntypedKind),
}

impl RType {
    pub fn array(len: usize, elem: RType) -> RType {
        RType::Array(len, Box::new(elem))
    }

    pub fn slice(elem: RType) -> RType {
        RType::Slice(Box::new(elem))
    }

    pub fn map(key: RType, value: RType) -> RType {
        RType::Map(Box::new(key), Box::new(value))
    }

    pub fn pointer(elem: RType) -> RType {
        RType::Pointer(Box::new(elem))
    }

    pub fn func(params: Vec<RType>, result: RType) -> RType {
        RType::Func {
            params,
            result: Box::new(result),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            RType::Bool => Kind::Bool,
            RType::Int => Kind::Int,
            RType::Int8 => Kind::Int8,
            RType::Int16 => Kind::Int16,
            RType::Int32 => Kind::Int32,
            RType::Int64 => Kind::Int64,
            RType::Uint => Kind::Uint,
            RType::Uint8 => Kind::Uint8,
            RType::Uint16 => Kind::Uint16,
            RType::Uint32 => Kind::Uint32,
            RType::Uint64 => Kind::Uint64,
            RType::Uintptr => Kind::Uintptr,
            RType::Float32 => Kind::Float32,
            RType::Float64 => Kind::Float64,
            RType::Complex64 => Kind::Complex64,
            RType::Complex128 => Kind::Complex128,
            RType::String => Kind::String,
            RType::Array(..) => Kind::Array,
            RType::Slice(_) => Kind::Slice,
            RType::Map(..) => Kind::Map,
            RType::Pointer(_) => Kind::Pointer,
            RType::Func { .. } => Kind::Func,
            RType::Untyped(_) => Kind::Untyped,
        }
    }

    /// Scalar type for a scalar kind.
    pub fn from_kind(kind: Kind) -> Option<RType> {
        let ty = match kind {
            Kind::Bool => RType::Bool,
            Kind::Int => RType::Int,
            Kind::Int8 => RType::Int8,
            Kind::Int16 => RType::Int16,
            Kind::Int32 => RType::Int32,
            Kind::Int64 => RType::Int64,
            Kind::Uint => RType::Uint,
            Kind::Uint8 => RType::Uint8,
            Kind::Uint16 => RType::Uint16,
            Kind::Uint32 => RType::Uint32,
            Kind::Uint64 => RType::Uint64,
            Kind::Uintptr => RType::Uintptr,
            Kind::Float32 => RType::Float32,
            Kind::Float64 => RType::Float64,
            Kind::Complex64 => RType::Complex64,
            Kind::Complex128 => RType::Complex128,
            Kind::String => RType::String,
            _ => return None,
        };
        Some(ty)
    }

    /// Resolve a predeclared type name.
    pub fn predeclared(name: &str) -> Option<RType> {
        let ty = match name {
            "bool" => RType::Bool,
            "int" => RType::Int,
            "int8" => RType::Int8,
            "int16" => RType::Int16,
            "int32" | "rune" => RType::Int32,
            "int64" => RType::Int64,
            "uint" => RType::Uint,
            "uint8" | "byte" => RType::Uint8,
            "uint16" => RType::Uint16,
            "uint32" => RType::Uint32,
            "uint64" => RType::Uint64,
            "uintptr" => RType::Uintptr,
            "float32" => RType::Float32,
            "float64" => RType::Float64,
            "complex64" => RType::Complex64,
            "complex128" => RType::Complex128,
            "string" => RType::String,
            _ => return None,
        };
        Some(ty)
    }

    /// Element type of arrays, slices and pointers; value type of maps.
    pub fn elem(&self) -> Option<&RType> {
        match self {
            RType::Array(_, elem) | RType::Slice(elem) | RType::Pointer(elem) => Some(elem),
            RType::Map(_, value) => Some(value),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&RType> {
        match self {
            RType::Map(key, _) => Some(key),
            _ => None,
        }
    }

    #[inline]
    pub fn is_untyped(&self) -> bool {
        matches!(self, RType::Untyped(_))
    }

    /// Only identical types are assignable; untyped constants are converted
    /// explicitly before any assignability check.
    pub fn assignable_to(&self, target: &RType) -> bool {
        self == target
    }

    /// Whether values of this type may be compared with `==`, and thus used
    /// as map keys.
    pub fn is_comparable(&self) -> bool {
        match self {
            RType::Slice(_) | RType::Map(..) | RType::Func { .. } => false,
            RType::Array(_, elem) => elem.is_comparable(),
            _ => true,
        }
    }

    /// Zero value of this type.
    pub fn zero(&self) -> Value {
        match self {
            RType::Bool => Value::Bool(false),
            RType::Int => Value::Int(0),
            RType::Int8 => Value::Int8(0),
            RType::Int16 => Value::Int16(0),
            RType::Int32 => Value::Int32(0),
            RType::Int64 => Value::Int64(0),
            RType::Uint => Value::Uint(0),
            RType::Uint8 => Value::Uint8(0),
            RType::Uint16 => Value::Uint16(0),
            RType::Uint32 => Value::Uint32(0),
            RType::Uint64 => Value::Uint64(0),
            RType::Uintptr => Value::Uintptr(0),
            RType::Float32 => Value::Float32(0.0),
            RType::Float64 => Value::Float64(0.0),
            RType::Complex64 => Value::Complex64(Complex::default()),
            RType::Complex128 => Value::Complex128(Complex::default()),
            RType::String => Value::String(Arc::from("")),
            RType::Array(len, elem) => {
                let zero = elem.zero();
                Value::Array((0..*len).map(|_| zero.clone()).collect())
            }
            RType::Slice(_) => Value::Slice(Arc::from(Vec::new())),
            RType::Map(..) => Value::Map(None::<Arc<MapValue>>),
            RType::Pointer(_) => Value::Pointer(None),
            RType::Func { .. } => Value::Func(None),
            RType::Untyped(kind) => kind.default_type().zero(),
        }
    }
}

impl fmt::Display for RType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RType::Array(len, elem) => write!(f, "[{}]{}", len, elem),
            RType::Slice(elem) => write!(f, "[]{}", elem),
            RType::Map(key, value) => write!(f, "map[{}]{}", key, value),
            RType::Pointer(elem) => write!(f, "*{}", elem),
            RType::Func { params, result } => {
                f.write_str("func(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") {}", result)
            }
            RType::Untyped(kind) => write!(f, "untyped {}", kind),
            scalar => f.write_str(scalar.kind().name()),
        }
    }
}
