use crate::typ::Kind;

/// Coarse-grained numeric hierarchy used by constant conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumericClass {
    Integer,
    Float,
    Complex,
}

pub struct NumericHierarchy;

impl NumericHierarchy {
    /// Classify a kind into the numeric hierarchy if possible.
    pub fn classify(kind: Kind) -> Option<NumericClass> {
        if kind.is_integer() {
            Some(NumericClass::Integer)
        } else if kind.is_float() {
            Some(NumericClass::Float)
        } else if kind.is_complex() {
            Some(NumericClass::Complex)
        } else {
            None
        }
    }

    /// Float-to-integer conversion only succeeds for integral values.
    pub fn integral(value: f64) -> Option<i128> {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 1.7e38 {
            Some(value as i128)
        } else {
            None
        }
    }
}
