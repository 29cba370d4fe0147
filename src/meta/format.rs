//! Format descriptors: the compact text that describes a chunk's field layout
//!
//! Codes follow the familiar struct-module letters, always in standard sizes,
//! little-endian and without alignment padding.

use std::fmt;

use super::error::MetaError;

/// Upper bound on the number of fields a descriptor may expand to
pub const MAX_FIELDS: usize = 4096;

/// A single primitive field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl FieldKind {
    /// Map a descriptor code to its field kind
    pub fn from_code(code: char) -> Option<Self> {
        let kind = match code {
            '?' => FieldKind::Bool,
            'b' => FieldKind::I8,
            'B' => FieldKind::U8,
            'h' => FieldKind::I16,
            'H' => FieldKind::U16,
            'i' | 'l' => FieldKind::I32,
            'I' | 'L' => FieldKind::U32,
            'q' => FieldKind::I64,
            'Q' => FieldKind::U64,
            'f' => FieldKind::F32,
            'd' => FieldKind::F64,
            _ => return None,
        };
        Some(kind)
    }

    /// Packed width in bytes
    pub const fn width(self) -> usize {
        match self {
            FieldKind::Bool | FieldKind::I8 | FieldKind::U8 => 1,
            FieldKind::I16 | FieldKind::U16 => 2,
            FieldKind::I32 | FieldKind::U32 | FieldKind::F32 => 4,
            FieldKind::I64 | FieldKind::U64 | FieldKind::F64 => 8,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Bool => "bool",
            FieldKind::I8 => "int8",
            FieldKind::U8 => "uint8",
            FieldKind::I16 => "int16",
            FieldKind::U16 => "uint16",
            FieldKind::I32 => "int32",
            FieldKind::U32 => "uint32",
            FieldKind::I64 => "int64",
            FieldKind::U64 => "uint64",
            FieldKind::F32 => "float32",
            FieldKind::F64 => "float64",
        };
        f.write_str(name)
    }
}

/// Parsed descriptor. Keeps the original text since that is what travels on
/// the wire and what incoming chunks are compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    descriptor: String,
    fields: Vec<FieldKind>,
    payload_len: usize,
}

impl FormatSpec {
    pub fn parse(descriptor: &str) -> Result<Self, MetaError> {
        let invalid = |reason: String| MetaError::InvalidFormatSpec {
            descriptor: descriptor.to_owned(),
            reason,
        };

        let mut fields = Vec::new();
        let mut count: Option<usize> = None;

        for (pos, c) in descriptor.char_indices() {
            if c.is_ascii_whitespace() {
                if count.is_some() {
                    return Err(invalid(format!("repeat count not followed by a code at {pos}")));
                }
                continue;
            }

            if let Some(digit) = c.to_digit(10) {
                let next = count
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(digit as usize))
                    .ok_or_else(|| invalid(format!("repeat count overflows at {pos}")))?;
                count = Some(next);
                continue;
            }

            let kind = FieldKind::from_code(c)
                .ok_or_else(|| invalid(format!("unknown field code {c:?} at {pos}")))?;

            let repeat = match count.take() {
                Some(0) => return Err(invalid(format!("zero repeat count before {c:?}"))),
                Some(n) => n,
                None => 1,
            };
            if repeat > MAX_FIELDS - fields.len() {
                return Err(invalid(format!("more than {MAX_FIELDS} fields")));
            }
            fields.extend(std::iter::repeat(kind).take(repeat));
        }

        if count.is_some() {
            return Err(invalid("trailing repeat count without a field code".into()));
        }
        if fields.is_empty() {
            return Err(invalid("no fields".into()));
        }

        let payload_len = fields.iter().map(|f| f.width()).sum();

        Ok(Self {
            descriptor: descriptor.to_owned(),
            fields,
            payload_len,
        })
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn fields(&self) -> &[FieldKind] {
        &self.fields
    }

    /// Sum of all field widths
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor)
    }
}
