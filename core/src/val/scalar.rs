//! Element-kind table.
//!
//! Every scalar kind is listed once in [`with_scalar_kinds!`] together with
//! its Rust representation. Callers expand the table into enum variants,
//! match arms or marker types instead of spelling out one branch per kind.

use crate::val::Value;

/// Uniform fetch-by-kind access to the payload of a [`Value`].
pub trait ElemKind: 'static {
    /// Unboxed representation handed out by specialized closures.
    type Repr: Clone + Send + Sync + 'static;

    /// Kind name used in runtime mismatch errors.
    const NAME: &'static str;

    fn fetch(value: &Value) -> Option<Self::Repr>;

    fn wrap(repr: Self::Repr) -> Value;
}

/// Invoke `$callback!` with `$args ; Kind => Repr, ...` for every scalar kind.
macro_rules! with_scalar_kinds {
    ($callback:ident ! ( $($args:tt)* )) => {
        $callback! {
            $($args)* ;
            Bool => bool,
            Int => i64,
            Int8 => i8,
            Int16 => i16,
            Int32 => i32,
            Int64 => i64,
            Uint => u64,
            Uint8 => u8,
            Uint16 => u16,
            Uint32 => u32,
            Uint64 => u64,
            Uintptr => usize,
            Float32 => f32,
            Float64 => f64,
            Complex64 => $crate::val::Complex<f32>,
            Complex128 => $crate::val::Complex<f64>,
            String => ::std::sync::Arc<str>
        }
    };
}

pub(crate) use with_scalar_kinds;

/// Marker types implementing [`ElemKind`], one per scalar kind plus
/// [`kinds::Any`] for composite elements.
pub mod kinds {
    use super::ElemKind;
    use crate::typ::Kind;
    use crate::val::Value;

    macro_rules! scalar_markers {
        ( ; $($kind:ident => $repr:ty),* ) => {
            $(
                #[doc = concat!("Marker for `", stringify!($kind), "` elements.")]
                pub struct $kind;

                impl ElemKind for $kind {
                    type Repr = $repr;

                    const NAME: &'static str = Kind::$kind.name();

                    #[inline]
                    #[allow(clippy::clone_on_copy)]
                    fn fetch(value: &Value) -> Option<$repr> {
                        match value {
                            Value::$kind(v) => Some(v.clone()),
                            _ => None,
                        }
                    }

                    #[inline]
                    fn wrap(repr: $repr) -> Value {
                        Value::$kind(repr)
                    }
                }
            )*
        };
    }

    super::with_scalar_kinds!(scalar_markers!());

    /// Fallback for array, slice, map, pointer and func elements.
    pub struct Any;

    impl ElemKind for Any {
        type Repr = Value;

        const NAME: &'static str = "value";

        #[inline]
        fn fetch(value: &Value) -> Option<Value> {
            Some(value.clone())
        }

        #[inline]
        fn wrap(repr: Value) -> Value {
            repr
        }
    }
}
