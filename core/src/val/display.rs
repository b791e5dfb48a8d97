use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::val::{Complex, Lookup, MapValue, Value};

fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        return f.write_str("NaN");
    }
    if v.is_infinite() {
        return f.write_str(if v > 0.0 { "+Inf" } else { "-Inf" });
    }
    if v.fract() == 0.0 && v.abs() < 1e21 {
        let mut buf = itoa::Buffer::new();
        return f.write_str(buf.format(v as i128));
    }
    let mut buf = ryu::Buffer::new();
    f.write_str(buf.format_finite(v))
}

fn write_complex(f: &mut fmt::Formatter<'_>, c: Complex<f64>) -> fmt::Result {
    f.write_str("(")?;
    write_float(f, c.re)?;
    if c.im >= 0.0 || c.im.is_nan() {
        f.write_str("+")?;
    }
    write_float(f, c.im)?;
    f.write_str("i)")
}

fn sorted_entries(map: &MapValue) -> Vec<(String, &Value)> {
    let mut entries: Vec<(String, &Value)> = map.iter().map(|(k, v)| (k.to_string(), v)).collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

/// Formats values the way `%v` would: strings unquoted, sequences in
/// brackets, maps with keys in sorted order.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ibuf = itoa::Buffer::new();
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(v) | Value::Int64(v) => f.write_str(ibuf.format(*v)),
            Value::Int8(v) => f.write_str(ibuf.format(*v)),
            Value::Int16(v) => f.write_str(ibuf.format(*v)),
            Value::Int32(v) => f.write_str(ibuf.format(*v)),
            Value::Uint(v) | Value::Uint64(v) => f.write_str(ibuf.format(*v)),
            Value::Uint8(v) => f.write_str(ibuf.format(*v)),
            Value::Uint16(v) => f.write_str(ibuf.format(*v)),
            Value::Uint32(v) => f.write_str(ibuf.format(*v)),
            Value::Uintptr(v) => f.write_str(ibuf.format(*v)),
            Value::Float32(v) => write_float(f, *v as f64),
            Value::Float64(v) => write_float(f, *v),
            Value::Complex64(c) => write_complex(f, Complex::new(c.re as f64, c.im as f64)),
            Value::Complex128(c) => write_complex(f, *c),
            Value::String(s) => f.write_str(s),
            Value::Array(items) | Value::Slice(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(None) => f.write_str("map[]"),
            Value::Map(Some(map)) => {
                f.write_str("map[")?;
                for (i, (k, v)) in sorted_entries(map).into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", k, v)?;
                }
                f.write_str("]")
            }
            Value::Pointer(None) | Value::Func(None) => f.write_str("<nil>"),
            Value::Pointer(Some(pointee)) => write!(f, "&{}", pointee),
            Value::Func(Some(func)) => write!(f, "<func {}>", func.name()),
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.found)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(v) | Value::Int64(v) => serializer.serialize_i64(*v),
            Value::Int8(v) => serializer.serialize_i8(*v),
            Value::Int16(v) => serializer.serialize_i16(*v),
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::Uint(v) | Value::Uint64(v) => serializer.serialize_u64(*v),
            Value::Uint8(v) => serializer.serialize_u8(*v),
            Value::Uint16(v) => serializer.serialize_u16(*v),
            Value::Uint32(v) => serializer.serialize_u32(*v),
            Value::Uintptr(v) => serializer.serialize_u64(*v as u64),
            Value::Float32(v) => serializer.serialize_f32(*v),
            Value::Float64(v) => serializer.serialize_f64(*v),
            Value::Complex64(c) => [c.re, c.im].serialize(serializer),
            Value::Complex128(c) => [c.re, c.im].serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) | Value::Slice(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(None) => serializer.serialize_map(Some(0))?.end(),
            Value::Map(Some(map)) => {
                let entries = sorted_entries(map);
                let mut out = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    out.serialize_entry(&k, v)?;
                }
                out.end()
            }
            Value::Pointer(None) | Value::Func(None) => serializer.serialize_unit(),
            Value::Pointer(Some(pointee)) => pointee.serialize(serializer),
            // Functions can't be serialized, use placeholder
            Value::Func(Some(_)) => serializer.serialize_str("<function>"),
        }
    }
}

impl Serialize for Lookup {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("value", &self.value)?;
        map.serialize_entry("found", &self.found)?;
        map.end()
    }
}
