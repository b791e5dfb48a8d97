use std::fmt;
use std::sync::Arc;

use crate::typ::{Kind, NumericClass, NumericHierarchy, RType};
use crate::val::{Complex, Value};

/// Flavour of an untyped constant; decides its default type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UntypedKind {
    Bool,
    Rune,
    Int,
    Float,
    Complex,
    String,
}

impl UntypedKind {
    pub fn default_type(self) -> RType {
        match self {
            UntypedKind::Bool => RType::Bool,
            UntypedKind::Rune => RType::Int32,
            UntypedKind::Int => RType::Int,
            UntypedKind::Float => RType::Float64,
            UntypedKind::Complex => RType::Complex128,
            UntypedKind::String => RType::String,
        }
    }

    fn name(self) -> &'static str {
        match self {
            UntypedKind::Bool => "bool",
            UntypedKind::Rune => "rune",
            UntypedKind::Int => "int",
            UntypedKind::Float => "float",
            UntypedKind::Complex => "complex",
            UntypedKind::String => "string",
        }
    }
}

impl fmt::Display for UntypedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Exact payload of an untyped constant.
#[derive(Debug, Clone, PartialEq)]
pub enum UntypedValue {
    Bool(bool),
    Int(i128),
    Float(f64),
    Complex(f64, f64),
    String(Arc<str>),
}

/// A constant whose concrete representation type is still open.
#[derive(Debug, Clone, PartialEq)]
pub struct UntypedConst {
    pub kind: UntypedKind,
    pub value: UntypedValue,
}

/// Failure to represent a constant in a target type.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstError {
    pub message: String,
}

impl ConstError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for ConstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConstError {}

impl UntypedConst {
    pub fn bool(v: bool) -> Self {
        Self {
            kind: UntypedKind::Bool,
            value: UntypedValue::Bool(v),
        }
    }

    pub fn int(v: i128) -> Self {
        Self {
            kind: UntypedKind::Int,
            value: UntypedValue::Int(v),
        }
    }

    pub fn rune(c: char) -> Self {
        Self {
            kind: UntypedKind::Rune,
            value: UntypedValue::Int(c as i128),
        }
    }

    pub fn float(v: f64) -> Self {
        Self {
            kind: UntypedKind::Float,
            value: UntypedValue::Float(v),
        }
    }

    pub fn complex(re: f64, im: f64) -> Self {
        Self {
            kind: UntypedKind::Complex,
            value: UntypedValue::Complex(re, im),
        }
    }

    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self {
            kind: UntypedKind::String,
            value: UntypedValue::String(s.into()),
        }
    }

    pub fn ty(&self) -> RType {
        RType::Untyped(self.kind)
    }

    pub fn default_type(&self) -> RType {
        self.kind.default_type()
    }

    pub fn default_value(&self) -> Result<Value, ConstError> {
        self.convert(&self.default_type())
    }

    /// Arithmetic negation, keeping the flavour.
    pub fn negate(&self) -> Option<UntypedConst> {
        let value = match &self.value {
            UntypedValue::Int(v) => UntypedValue::Int(v.checked_neg()?),
            UntypedValue::Float(v) => UntypedValue::Float(-v),
            UntypedValue::Complex(re, im) => UntypedValue::Complex(-re, -im),
            UntypedValue::Bool(_) | UntypedValue::String(_) => return None,
        };
        Some(UntypedConst { kind: self.kind, value })
    }

    /// Convert to a concrete value of `ty`, failing when the constant is not
    /// representable there.
    pub fn convert(&self, ty: &RType) -> Result<Value, ConstError> {
        let kind = ty.kind();
        match (&self.value, NumericHierarchy::classify(kind)) {
            (UntypedValue::Bool(b), _) if kind == Kind::Bool => Ok(Value::Bool(*b)),
            (UntypedValue::String(s), _) if kind == Kind::String => Ok(Value::String(s.clone())),
            (UntypedValue::Int(v), Some(class)) => self.numeric(*v as f64, 0.0, Some(*v), class, ty),
            (UntypedValue::Float(v), Some(class)) => self.numeric(*v, 0.0, None, class, ty),
            (UntypedValue::Complex(re, im), Some(class)) => self.numeric(*re, *im, None, class, ty),
            _ => Err(self.cannot_convert(ty)),
        }
    }

    fn numeric(&self, re: f64, im: f64, exact: Option<i128>, class: NumericClass, ty: &RType) -> Result<Value, ConstError> {
        let kind = ty.kind();
        match class {
            NumericClass::Integer => {
                if im != 0.0 {
                    return Err(ConstError::new(format!("constant {} truncated to integer", self)));
                }
                let int = match exact {
                    Some(v) => v,
                    None => NumericHierarchy::integral(re)
                        .ok_or_else(|| ConstError::new(format!("constant {} truncated to integer", self)))?,
                };
                Value::from_integer(kind, int).ok_or_else(|| ConstError::new(format!("constant {} overflows {}", self, ty)))
            }
            NumericClass::Float => {
                if im != 0.0 {
                    return Err(ConstError::new(format!("constant {} truncated to real", self)));
                }
                if kind == Kind::Float32 && re.is_finite() && (re as f32).is_infinite() {
                    return Err(ConstError::new(format!("constant {} overflows {}", self, ty)));
                }
                Value::from_float(kind, re).ok_or_else(|| self.cannot_convert(ty))
            }
            NumericClass::Complex => Ok(match kind {
                Kind::Complex64 => Value::Complex64(Complex::new(re as f32, im as f32)),
                _ => Value::Complex128(Complex::new(re, im)),
            }),
        }
    }

    fn cannot_convert(&self, ty: &RType) -> ConstError {
        ConstError::new(format!("cannot convert {} (untyped {} constant) to {}", self, self.kind, ty))
    }

    /// Rebuild an untyped constant from a folded value of the default type.
    pub fn from_value(kind: UntypedKind, value: &Value) -> Option<UntypedConst> {
        let value = match (kind, value) {
            (UntypedKind::Bool, Value::Bool(b)) => UntypedValue::Bool(*b),
            (UntypedKind::String, Value::String(s)) => UntypedValue::String(s.clone()),
            (UntypedKind::Float, Value::Float64(v)) => UntypedValue::Float(*v),
            (UntypedKind::Complex, Value::Complex128(c)) => UntypedValue::Complex(c.re, c.im),
            (UntypedKind::Int | UntypedKind::Rune, other) => UntypedValue::Int(other.as_i128()?),
            _ => return None,
        };
        Some(UntypedConst { kind, value })
    }
}

/// Convert an already typed constant. Identical types pass through; integer
/// constants may move between integer types when the value fits.
pub fn convert_typed(value: &Value, from: &RType, to: &RType) -> Result<Value, ConstError> {
    if from == to {
        return Ok(value.clone());
    }
    if from.kind().is_integer()
        && to.kind().is_integer()
        && let Some(v) = value.as_i128()
    {
        return Value::from_integer(to.kind(), v)
            .ok_or_else(|| ConstError::new(format!("constant {} overflows {}", value, to)));
    }
    Err(ConstError::new(format!("cannot use {} (constant of type {}) as {} value", value, from, to)))
}

impl fmt::Display for UntypedConst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            UntypedValue::Bool(b) => write!(f, "{}", b),
            UntypedValue::Int(v) if self.kind == UntypedKind::Rune => match u32::try_from(*v).ok().and_then(char::from_u32) {
                Some(c) => write!(f, "{:?}", c),
                None => write!(f, "{}", v),
            },
            UntypedValue::Int(v) => write!(f, "{}", v),
            UntypedValue::Float(v) => write!(f, "{}", v),
            UntypedValue::Complex(re, im) => write!(f, "({}{:+}i)", re, im),
            UntypedValue::String(s) => write!(f, "{:?}", s),
        }
    }
}
