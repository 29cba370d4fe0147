use std::fmt;

use bytes::{Buf, BufMut};

use super::format::FieldKind;

/// One scalar inside a values tuple. Each variant pairs with exactly one
/// `FieldKind`; packing never converts between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Value {
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::Bool(_) => FieldKind::Bool,
            Value::I8(_) => FieldKind::I8,
            Value::U8(_) => FieldKind::U8,
            Value::I16(_) => FieldKind::I16,
            Value::U16(_) => FieldKind::U16,
            Value::I32(_) => FieldKind::I32,
            Value::U32(_) => FieldKind::U32,
            Value::I64(_) => FieldKind::I64,
            Value::U64(_) => FieldKind::U64,
            Value::F32(_) => FieldKind::F32,
            Value::F64(_) => FieldKind::F64,
        }
    }

    pub(crate) fn put<B: BufMut>(&self, buf: &mut B) {
        match *self {
            Value::Bool(v) => buf.put_u8(v as u8),
            Value::I8(v) => buf.put_i8(v),
            Value::U8(v) => buf.put_u8(v),
            Value::I16(v) => buf.put_i16_le(v),
            Value::U16(v) => buf.put_u16_le(v),
            Value::I32(v) => buf.put_i32_le(v),
            Value::U32(v) => buf.put_u32_le(v),
            Value::I64(v) => buf.put_i64_le(v),
            Value::U64(v) => buf.put_u64_le(v),
            Value::F32(v) => buf.put_f32_le(v),
            Value::F64(v) => buf.put_f64_le(v),
        }
    }

    /// Read one value of `kind`. The caller guarantees `buf` holds at least
    /// `kind.width()` bytes.
    pub(crate) fn get<B: Buf>(kind: FieldKind, buf: &mut B) -> Self {
        match kind {
            FieldKind::Bool => Value::Bool(buf.get_u8() != 0),
            FieldKind::I8 => Value::I8(buf.get_i8()),
            FieldKind::U8 => Value::U8(buf.get_u8()),
            FieldKind::I16 => Value::I16(buf.get_i16_le()),
            FieldKind::U16 => Value::U16(buf.get_u16_le()),
            FieldKind::I32 => Value::I32(buf.get_i32_le()),
            FieldKind::U32 => Value::U32(buf.get_u32_le()),
            FieldKind::I64 => Value::I64(buf.get_i64_le()),
            FieldKind::U64 => Value::U64(buf.get_u64_le()),
            FieldKind::F32 => Value::F32(buf.get_f32_le()),
            FieldKind::F64 => Value::F64(buf.get_f64_le()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v.into()),
            Value::U8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

/// Display helper for a whole tuple, e.g. `(42, 3.14)`
pub struct DisplayValues<'a>(pub &'a [Value]);

impl fmt::Display for DisplayValues<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str(")")
    }
}
