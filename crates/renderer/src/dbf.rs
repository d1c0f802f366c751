//! dBase III attribute tables (`.dbf`) for shapefiles.
//!
//! The schema is inferred from the feature properties: every key seen across
//! the features becomes a field, in first-seen order. Field types follow the
//! values: integers map to `N(18,0)`, other numbers to `N(24,15)`, booleans to
//! `L(1)` and everything else to a character field wide enough for the
//! longest value.

use chrono::{Datelike, NaiveDate};
use forecast_common::Feature;
use serde_json::Value;

use crate::error::ShapefileError;

/// dBase III without memo
const VERSION: u8 = 0x03;
const HEADER_TERMINATOR: u8 = 0x0D;
const END_OF_FILE: u8 = 0x1A;
const RECORD_ACTIVE: u8 = b' ';

const HEADER_SIZE: usize = 32;
const DESCRIPTOR_SIZE: usize = 32;

/// Field names are stored in 11 bytes, null terminated.
pub const MAX_NAME_LEN: usize = 10;
pub const MAX_CHARACTER_LEN: usize = 254;
pub const MAX_FIELDS: usize = 255;

const INTEGER_WIDTH: u8 = 18;
const FLOAT_WIDTH: u8 = 24;
const FLOAT_DECIMALS: u8 = 15;

/// dBase field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Character,
    Numeric,
    Logical,
}

impl FieldKind {
    fn code(self) -> u8 {
        match self {
            FieldKind::Character => b'C',
            FieldKind::Numeric => b'N',
            FieldKind::Logical => b'L',
        }
    }
}

/// One column of the attribute table.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Name as stored (at most 10 bytes).
    pub name: String,
    /// Property key the values come from.
    pub key: String,
    pub kind: FieldKind,
    pub length: u8,
    pub decimals: u8,
}

/// Attribute table ready to encode.
#[derive(Debug, Clone)]
pub struct DbfTable<'a> {
    pub fields: Vec<FieldDescriptor>,
    features: &'a [Feature],
}

/// Value class seen for a key, widened as more values arrive.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Inferred {
    Unknown,
    Integer,
    Float,
    Logical,
    Character,
}

impl Inferred {
    fn widen(self, value: &Value) -> Self {
        let seen = match value {
            Value::Null => return self,
            Value::Bool(_) => Inferred::Logical,
            Value::Number(n) if n.is_i64() || n.is_u64() => Inferred::Integer,
            Value::Number(_) => Inferred::Float,
            _ => Inferred::Character,
        };

        match (self, seen) {
            (Inferred::Unknown, s) => s,
            (a, b) if a == b => a,
            (Inferred::Integer, Inferred::Float) | (Inferred::Float, Inferred::Integer) => {
                Inferred::Float
            }
            _ => Inferred::Character,
        }
    }
}

impl<'a> DbfTable<'a> {
    /// Infer the schema from the properties of `features`.
    pub fn from_features(features: &'a [Feature]) -> Result<Self, ShapefileError> {
        let mut columns: Vec<(String, Inferred, usize)> = Vec::new();

        for properties in features.iter().filter_map(|f| f.properties.as_ref()) {
            for (key, value) in properties.iter() {
                let index = match columns.iter().position(|(k, _, _)| k == key) {
                    Some(index) => index,
                    None => {
                        columns.push((key.to_string(), Inferred::Unknown, 0));
                        columns.len() - 1
                    }
                };
                let column = &mut columns[index];
                column.1 = column.1.widen(value);
                column.2 = column.2.max(character_value(value).len());
            }
        }

        if columns.len() > MAX_FIELDS {
            return Err(ShapefileError::TooManyFields(columns.len()));
        }

        let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(columns.len());
        for (key, inferred, longest) in columns {
            let name = unique_field_name(&key, &fields);
            let (kind, length, decimals) = match inferred {
                Inferred::Integer => (FieldKind::Numeric, INTEGER_WIDTH, 0),
                Inferred::Float => (FieldKind::Numeric, FLOAT_WIDTH, FLOAT_DECIMALS),
                Inferred::Logical => (FieldKind::Logical, 1, 0),
                Inferred::Unknown | Inferred::Character => (
                    FieldKind::Character,
                    longest.clamp(1, MAX_CHARACTER_LEN) as u8,
                    0,
                ),
            };
            fields.push(FieldDescriptor {
                name,
                key,
                kind,
                length,
                decimals,
            });
        }

        Ok(Self { fields, features })
    }

    pub fn record_length(&self) -> usize {
        1 + self.fields.iter().map(|f| f.length as usize).sum::<usize>()
    }

    pub fn header_length(&self) -> usize {
        HEADER_SIZE + DESCRIPTOR_SIZE * self.fields.len() + 1
    }

    /// Encode the complete `.dbf` file. `updated` is the header date.
    pub fn encode(&self, updated: NaiveDate) -> Vec<u8> {
        let record_length = self.record_length();
        let header_length = self.header_length();
        let mut buf =
            Vec::with_capacity(header_length + record_length * self.features.len() + 1);

        // Header
        buf.push(VERSION);
        buf.push((updated.year() - 1900).clamp(0, 255) as u8);
        buf.push(updated.month() as u8);
        buf.push(updated.day() as u8);
        buf.extend_from_slice(&(self.features.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(header_length as u16).to_le_bytes());
        buf.extend_from_slice(&(record_length as u16).to_le_bytes());
        buf.extend_from_slice(&[0u8; 20]);

        // Field descriptors
        for field in &self.fields {
            let mut name = [0u8; 11];
            name[..field.name.len()].copy_from_slice(field.name.as_bytes());
            buf.extend_from_slice(&name);
            buf.push(field.kind.code());
            buf.extend_from_slice(&[0u8; 4]);
            buf.push(field.length);
            buf.push(field.decimals);
            buf.extend_from_slice(&[0u8; 14]);
        }
        buf.push(HEADER_TERMINATOR);

        // Records
        for feature in self.features {
            buf.push(RECORD_ACTIVE);
            for field in &self.fields {
                let value = feature.property(&field.key).unwrap_or(&Value::Null);
                buf.extend_from_slice(&encode_value(field, value));
            }
        }

        buf.push(END_OF_FILE);
        buf
    }
}

/// Field name truncated to 10 bytes on a char boundary, made unique among
/// the fields already named.
fn unique_field_name(key: &str, existing: &[FieldDescriptor]) -> String {
    let base = truncate_bytes(key, MAX_NAME_LEN);
    let base = if base.is_empty() { "FIELD" } else { base };
    let taken = |name: &str| existing.iter().any(|f| f.name == name);

    if !taken(base) {
        return base.to_string();
    }

    (1..)
        .map(|n| {
            let suffix = format!("_{}", n);
            format!("{}{}", truncate_bytes(base, MAX_NAME_LEN - suffix.len()), suffix)
        })
        .find(|name| !taken(name))
        .unwrap_or_else(|| base.to_string())
}

/// Longest prefix of `s` that fits in `max` bytes.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Text stored for a value in a character field.
fn character_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn encode_value(field: &FieldDescriptor, value: &Value) -> Vec<u8> {
    let width = field.length as usize;

    let text = match (field.kind, value) {
        (_, Value::Null) => String::new(),
        (FieldKind::Logical, Value::Bool(true)) => "T".to_string(),
        (FieldKind::Logical, Value::Bool(false)) => "F".to_string(),
        (FieldKind::Logical, _) => "?".to_string(),
        (FieldKind::Numeric, Value::Number(n)) => {
            let formatted = if field.decimals == 0 {
                n.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() => format!("{:.*}", field.decimals as usize, f),
                    _ => String::new(),
                }
            };
            if formatted.len() > width {
                "*".repeat(width)
            } else {
                format!("{:>width$}", formatted, width = width)
            }
        }
        (FieldKind::Numeric, _) => String::new(),
        (FieldKind::Character, value) => {
            let text = character_value(value);
            truncate_bytes(&text, width).to_string()
        }
    };

    let mut bytes = text.into_bytes();
    bytes.resize(width, b' ');
    bytes
}
