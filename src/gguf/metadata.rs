//! GGUF metadata values and the ordered key-value table

use crate::error::{FixtureError, Result};
use crate::format::endian::{
    write_f32, write_f64, write_i16, write_i32, write_i64, write_i8, write_string, write_u16,
    write_u32, write_u64, write_u8,
};
use crate::format::types::GGUFValueType;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// A metadata value in a GGUF file
///
/// In manifests a value is written as `{ type = "string", value = "llama" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum MetadataValue {
    /// 8-bit unsigned integer
    U8(u8),
    /// 8-bit signed integer
    I8(i8),
    /// 16-bit unsigned integer
    U16(u16),
    /// 16-bit signed integer
    I16(i16),
    /// 32-bit unsigned integer
    U32(u32),
    /// 32-bit signed integer
    I32(i32),
    /// 32-bit floating point
    F32(f32),
    /// Boolean value
    Bool(bool),
    /// UTF-8 string
    String(String),
    /// 64-bit unsigned integer
    U64(u64),
    /// 64-bit signed integer
    I64(i64),
    /// 64-bit floating point
    F64(f64),
}

impl MetadataValue {
    /// Get the type tag of this metadata value
    pub fn value_type(&self) -> GGUFValueType {
        match self {
            MetadataValue::U8(_) => GGUFValueType::U8,
            MetadataValue::I8(_) => GGUFValueType::I8,
            MetadataValue::U16(_) => GGUFValueType::U16,
            MetadataValue::I16(_) => GGUFValueType::I16,
            MetadataValue::U32(_) => GGUFValueType::U32,
            MetadataValue::I32(_) => GGUFValueType::I32,
            MetadataValue::F32(_) => GGUFValueType::F32,
            MetadataValue::Bool(_) => GGUFValueType::Bool,
            MetadataValue::String(_) => GGUFValueType::String,
            MetadataValue::U64(_) => GGUFValueType::U64,
            MetadataValue::I64(_) => GGUFValueType::I64,
            MetadataValue::F64(_) => GGUFValueType::F64,
        }
    }

    /// Serialized size of the value bytes (the tag is not included)
    pub fn serialized_size(&self) -> usize {
        match self {
            MetadataValue::String(s) => 8 + s.len(), // length prefix + string data
            other => other.value_type().size_in_bytes().unwrap_or_default(),
        }
    }

    /// Write the value bytes (without the tag)
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            MetadataValue::U8(v) => write_u8(writer, *v),
            MetadataValue::I8(v) => write_i8(writer, *v),
            MetadataValue::U16(v) => write_u16(writer, *v),
            MetadataValue::I16(v) => write_i16(writer, *v),
            MetadataValue::U32(v) => write_u32(writer, *v),
            MetadataValue::I32(v) => write_i32(writer, *v),
            MetadataValue::F32(v) => write_f32(writer, *v),
            MetadataValue::Bool(v) => write_u8(writer, u8::from(*v)),
            MetadataValue::String(s) => write_string(writer, s),
            MetadataValue::U64(v) => write_u64(writer, *v),
            MetadataValue::I64(v) => write_i64(writer, *v),
            MetadataValue::F64(v) => write_f64(writer, *v),
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataValue::U8(v) => write!(f, "{}", v),
            MetadataValue::I8(v) => write!(f, "{}", v),
            MetadataValue::U16(v) => write!(f, "{}", v),
            MetadataValue::I16(v) => write!(f, "{}", v),
            MetadataValue::U32(v) => write!(f, "{}", v),
            MetadataValue::I32(v) => write!(f, "{}", v),
            MetadataValue::F32(v) => write!(f, "{}", v),
            MetadataValue::Bool(v) => write!(f, "{}", v),
            MetadataValue::String(v) => write!(f, "\"{}\"", v),
            MetadataValue::U64(v) => write!(f, "{}", v),
            MetadataValue::I64(v) => write!(f, "{}", v),
            MetadataValue::F64(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for MetadataValue {
                fn from(value: $ty) -> Self {
                    MetadataValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    f32 => F32,
    bool => Bool,
    String => String,
    u64 => U64,
    i64 => I64,
    f64 => F64,
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

/// One key-value pair of the metadata table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: MetadataValue,
}

impl MetadataEntry {
    pub fn new(key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    /// Key length prefix + key + tag + value
    pub fn serialized_size(&self) -> usize {
        8 + self.key.len() + 4 + self.value.serialized_size()
    }

    /// Write `key_len:u64, key, type_tag:u32, value`
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_string(writer, &self.key)?;
        write_u32(writer, self.value.value_type().as_u32())?;
        self.value.write_to(writer)
    }
}

/// Metadata table, kept in declaration order
///
/// Duplicate keys are kept as written; lookups see the last one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: Vec<MetadataEntry>,
}

impl Metadata {
    /// Create a new empty metadata table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key-value pair
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.entries.push(MetadataEntry::new(key, value));
    }

    /// Get the value a reader would end up with for `key`
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.iter().rev().find(|e| e.key == key).map(|e| &e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetadataEntry> {
        self.entries.iter()
    }

    /// Reject entries a GGUF writer cannot represent
    pub fn validate(&self) -> Result<()> {
        if let Some(entry) = self.entries.iter().find(|e| e.key.is_empty()) {
            return Err(FixtureError::InvalidMetadata(format!(
                "Metadata key cannot be empty (value {})",
                entry.value
            )));
        }
        Ok(())
    }

    /// Write every entry in declaration order
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for entry in &self.entries {
            entry.write_to(writer)?;
        }
        Ok(())
    }

    /// Calculate the serialized size of all metadata
    pub fn serialized_size(&self) -> usize {
        self.entries.iter().map(MetadataEntry::serialized_size).sum()
    }
}

impl FromIterator<MetadataEntry> for Metadata {
    fn from_iter<I: IntoIterator<Item = MetadataEntry>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = &'a MetadataEntry;
    type IntoIter = std::slice::Iter<'a, MetadataEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_value_types() {
        let val = MetadataValue::U32(42);
        assert_eq!(val.value_type(), GGUFValueType::U32);

        let val = MetadataValue::from("hello");
        assert_eq!(val.value_type(), GGUFValueType::String);
        assert_eq!(val, MetadataValue::String("hello".into()));

        assert_eq!(MetadataValue::from(true).value_type(), GGUFValueType::Bool);
        assert_eq!(MetadataValue::from(-1i64).value_type(), GGUFValueType::I64);
    }

    #[test]
    fn test_value_display() {
        let arch = MetadataValue::from("llama");
        assert_eq!(arch.to_string(), "\"llama\"");
        assert_eq!(arch.value_type().to_string(), "string");
        assert_eq!(MetadataValue::U32(32).to_string(), "32");
        assert_eq!(GGUFValueType::Bool.to_string(), "bool");
    }

    #[test]
    fn test_string_entry_layout() {
        let entry = MetadataEntry::new("general.architecture", "llama");
        let mut buffer = Vec::new();
        entry.write_to(&mut buffer).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&20u64.to_le_bytes());
        expected.extend_from_slice(b"general.architecture");
        expected.extend_from_slice(&8u32.to_le_bytes());
        expected.extend_from_slice(&5u64.to_le_bytes());
        expected.extend_from_slice(b"llama");

        assert_eq!(buffer, expected);
        assert_eq!(entry.serialized_size(), buffer.len());
    }

    #[test]
    fn test_u32_entry_layout() {
        let entry = MetadataEntry::new("general.alignment", 32u32);
        let mut buffer = Vec::new();
        entry.write_to(&mut buffer).unwrap();

        let tag_at = 8 + "general.alignment".len();
        assert_eq!(&buffer[tag_at..tag_at + 4], &4u32.to_le_bytes());
        assert_eq!(&buffer[tag_at + 4..], &32u32.to_le_bytes());
    }

    #[test]
    fn test_bool_is_one_byte() {
        let mut buffer = Vec::new();
        MetadataValue::Bool(true).write_to(&mut buffer).unwrap();
        MetadataValue::Bool(false).write_to(&mut buffer).unwrap();
        assert_eq!(buffer, vec![1, 0]);
    }

    #[test]
    fn test_serialized_size_matches_output() {
        let values = vec![
            MetadataValue::U8(1),
            MetadataValue::I16(-3),
            MetadataValue::F32(0.5),
            MetadataValue::U64(u64::MAX),
            MetadataValue::F64(std::f64::consts::E),
            MetadataValue::String("tokenizer".into()),
        ];
        for value in values {
            let mut buffer = Vec::new();
            value.write_to(&mut buffer).unwrap();
            assert_eq!(buffer.len(), value.serialized_size(), "{:?}", value);
        }
    }

    #[test]
    fn test_metadata_keeps_declaration_order() {
        let mut metadata = Metadata::new();
        metadata.insert("z.last", 1u32);
        metadata.insert("a.first", 2u32);

        let keys: Vec<_> = metadata.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["z.last", "a.first"]);
    }

    #[test]
    fn test_duplicate_keys_shadow() {
        let mut metadata = Metadata::new();
        metadata.insert("general.name", "first");
        metadata.insert("general.name", "second");

        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata.get("general.name"), Some(&MetadataValue::String("second".into())));
        assert_eq!(metadata.get("general.missing"), None);
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut metadata = Metadata::new();
        metadata.insert("", 1u8);
        assert!(matches!(metadata.validate(), Err(FixtureError::InvalidMetadata(_))));
    }

    #[test]
    fn test_value_serde_shape() {
        let json = serde_json::to_string(&MetadataValue::from("llama")).unwrap();
        assert_eq!(json, r#"{"type":"string","value":"llama"}"#);

        let parsed: MetadataValue = serde_json::from_str(r#"{"type":"u32","value":7}"#).unwrap();
        assert_eq!(parsed, MetadataValue::U32(7));
    }
}
