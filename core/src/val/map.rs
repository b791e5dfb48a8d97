use std::hash::{Hash, Hasher};
use std::mem;
use std::sync::Arc;

use crate::util::fast_map::{FastHashMap, fast_hash_map_with_capacity};
use crate::val::Value;

/// Hashable wrapper used as map key.
///
/// Equality follows `==` on the key kinds: floats compare numerically
/// (`+0 == -0`, NaN never matches), arrays element-wise and pointers by
/// identity.
#[derive(Debug, Clone)]
pub struct MapKey(pub Value);

impl MapKey {
    #[inline]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        key_eq(&self.0, &other.0)
    }
}

impl Eq for MapKey {}

impl Hash for MapKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_key(&self.0, state);
    }
}

fn key_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(x), Value::Array(y)) => x.len() == y.len() && x.iter().zip(y.iter()).all(|(l, r)| key_eq(l, r)),
        (Value::Pointer(x), Value::Pointer(y)) => match (x, y) {
            (Some(x), Some(y)) => Arc::ptr_eq(x, y),
            (None, None) => true,
            _ => false,
        },
        _ => a == b,
    }
}

#[inline]
fn positive_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

fn hash_key<H: Hasher>(value: &Value, state: &mut H) {
    mem::discriminant(value).hash(state);
    match value {
        Value::Bool(v) => v.hash(state),
        Value::Int(v) | Value::Int64(v) => v.hash(state),
        Value::Int8(v) => v.hash(state),
        Value::Int16(v) => v.hash(state),
        Value::Int32(v) => v.hash(state),
        Value::Uint(v) | Value::Uint64(v) => v.hash(state),
        Value::Uint8(v) => v.hash(state),
        Value::Uint16(v) => v.hash(state),
        Value::Uint32(v) => v.hash(state),
        Value::Uintptr(v) => v.hash(state),
        Value::Float32(v) => positive_zero(*v as f64).to_bits().hash(state),
        Value::Float64(v) => positive_zero(*v).to_bits().hash(state),
        Value::Complex64(c) => {
            positive_zero(c.re as f64).to_bits().hash(state);
            positive_zero(c.im as f64).to_bits().hash(state);
        }
        Value::Complex128(c) => {
            positive_zero(c.re).to_bits().hash(state);
            positive_zero(c.im).to_bits().hash(state);
        }
        Value::String(s) => s.hash(state),
        Value::Array(items) => {
            for item in items.iter() {
                hash_key(item, state);
            }
        }
        Value::Pointer(p) => p.as_ref().map(|p| Arc::as_ptr(p) as usize).hash(state),
        // Not comparable; the type layer rejects them as key types.
        Value::Slice(_) | Value::Map(_) | Value::Func(_) => {}
    }
}

/// Immutable-after-construction map contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapValue {
    entries: FastHashMap<MapKey, Value>,
}

impl MapValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: fast_hash_map_with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        self.entries.insert(MapKey(key), value)
    }

    #[inline]
    pub fn get(&self, key: &MapKey) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.contains_key(&MapKey(key.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (&k.0, v))
    }
}

impl FromIterator<(Value, Value)> for MapValue {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = MapValue::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
