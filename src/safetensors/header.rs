//! Safetensors tensor entries and the JSON header

use crate::error::{FixtureError, Result};
use crate::format::constants::SAFETENSORS_METADATA_KEY;
use crate::safetensors::dtype::Dtype;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One tensor of a safetensors file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetensorsTensorEntry {
    pub name: String,
    pub dtype: Dtype,
    pub shape: Vec<u64>,
    /// `[start, end)` into the data block
    pub data_offsets: (u64, u64),
}

/// The value written under a tensor's name; field order is the header's key order
#[derive(Serialize)]
struct EntryJson<'a> {
    dtype: Dtype,
    shape: &'a [u64],
    data_offsets: [u64; 2],
}

impl SafetensorsTensorEntry {
    pub fn new(
        name: impl Into<String>,
        dtype: Dtype,
        shape: Vec<u64>,
        data_offsets: (u64, u64),
    ) -> Self {
        Self { name: name.into(), dtype, shape, data_offsets }
    }

    /// Entry starting at `start` and spanning exactly shape x dtype bytes
    pub fn packed(
        name: impl Into<String>,
        dtype: Dtype,
        shape: Vec<u64>,
        start: u64,
    ) -> Result<Self> {
        let name = name.into();
        let len = shape
            .iter()
            .try_fold(dtype.size(), |acc, &dim| acc.checked_mul(dim))
            .and_then(|len| start.checked_add(len))
            .ok_or_else(|| {
                let message = format!("Tensor '{}' byte size overflows u64", name);
                FixtureError::InvalidTensorData(message)
            })?;
        Ok(Self { name, dtype, shape, data_offsets: (start, len) })
    }

    pub fn byte_len(&self) -> u64 {
        self.data_offsets.1.saturating_sub(self.data_offsets.0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(FixtureError::InvalidTensorData("Tensor name cannot be empty".to_string()));
        }
        if self.name == SAFETENSORS_METADATA_KEY {
            return Err(FixtureError::InvalidTensorData(format!(
                "'{}' is reserved for header metadata",
                SAFETENSORS_METADATA_KEY
            )));
        }
        let (start, end) = self.data_offsets;
        if start > end {
            return Err(FixtureError::InvalidTensorData(format!(
                "Tensor '{}' has data_offsets [{}, {}] with start after end",
                self.name, start, end
            )));
        }
        Ok(())
    }
}

/// JSON header: optional `__metadata__` then the tensors, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetensorsHeader {
    pub metadata: Vec<(String, String)>,
    pub tensors: Vec<SafetensorsTensorEntry>,
}

struct MetadataJson<'a>(&'a [(String, String)]);

impl Serialize for MetadataJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for SafetensorsHeader {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let has_metadata = !self.metadata.is_empty();
        let len = self.tensors.len() + usize::from(has_metadata);
        let mut map = serializer.serialize_map(Some(len))?;
        if has_metadata {
            map.serialize_entry(SAFETENSORS_METADATA_KEY, &MetadataJson(&self.metadata))?;
        }
        for tensor in &self.tensors {
            let entry = EntryJson {
                dtype: tensor.dtype,
                shape: &tensor.shape,
                data_offsets: [tensor.data_offsets.0, tensor.data_offsets.1],
            };
            map.serialize_entry(&tensor.name, &entry)?;
        }
        map.end()
    }
}

impl SafetensorsHeader {
    /// Reject headers that would not be a valid JSON object of tensors
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::with_capacity(self.tensors.len());
        for tensor in &self.tensors {
            tensor.validate()?;
            if !names.insert(tensor.name.as_str()) {
                return Err(FixtureError::InvalidTensorData(format!(
                    "Duplicate tensor name '{}'",
                    tensor.name
                )));
            }
        }

        let mut keys = HashSet::with_capacity(self.metadata.len());
        for (key, _) in &self.metadata {
            if !keys.insert(key.as_str()) {
                return Err(FixtureError::InvalidMetadata(format!(
                    "Duplicate metadata key '{}'",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Compact JSON bytes, no whitespace
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Length of the data block: the largest end offset
    pub fn data_len(&self) -> u64 {
        self.tensors.iter().map(|t| t.data_offsets.1).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_entry() -> SafetensorsTensorEntry {
        SafetensorsTensorEntry::new("test.weight.0", Dtype::F32, vec![64, 128], (0, 32_768))
    }

    #[test]
    fn test_compact_json() {
        let header = SafetensorsHeader { metadata: vec![], tensors: vec![tiny_entry()] };
        let json = String::from_utf8(header.to_json_bytes().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"test.weight.0":{"dtype":"F32","shape":[64,128],"data_offsets":[0,32768]}}"#
        );
        assert_eq!(json.len(), 75);
    }

    #[test]
    fn test_metadata_first_and_order_preserved() {
        let header = SafetensorsHeader {
            metadata: vec![("format".into(), "pt".into()), ("author".into(), "tests".into())],
            tensors: vec![
                SafetensorsTensorEntry::new("z", Dtype::U8, vec![1], (0, 1)),
                SafetensorsTensorEntry::new("a", Dtype::U8, vec![1], (1, 2)),
            ],
        };
        let json = String::from_utf8(header.to_json_bytes().unwrap()).unwrap();
        assert!(json.starts_with(r#"{"__metadata__":{"format":"pt","author":"tests"},"z":"#));
        assert!(json.find("\"z\"").unwrap() < json.find("\"a\"").unwrap());
    }

    #[test]
    fn test_packed_offsets() {
        let entry = SafetensorsTensorEntry::packed("w", Dtype::F16, vec![3, 5], 64).unwrap();
        assert_eq!(entry.data_offsets, (64, 94));
        assert_eq!(entry.byte_len(), 30);

        assert!(SafetensorsTensorEntry::packed("w", Dtype::F64, vec![u64::MAX], 0).is_err());
    }

    #[test]
    fn test_validation() {
        let reversed = SafetensorsTensorEntry::new("w", Dtype::F32, vec![1], (8, 4));
        assert!(reversed.validate().is_err());

        let reserved = SafetensorsTensorEntry::new("__metadata__", Dtype::F32, vec![1], (0, 4));
        assert!(reserved.validate().is_err());

        let duplicated =
            SafetensorsHeader { metadata: vec![], tensors: vec![tiny_entry(), tiny_entry()] };
        assert!(duplicated.validate().is_err());
    }

    #[test]
    fn test_data_len_is_max_end() {
        let header = SafetensorsHeader {
            metadata: vec![],
            tensors: vec![
                SafetensorsTensorEntry::new("b", Dtype::U8, vec![4], (16, 20)),
                SafetensorsTensorEntry::new("a", Dtype::U8, vec![16], (0, 16)),
            ],
        };
        assert_eq!(header.data_len(), 20);
        assert_eq!(SafetensorsHeader::default().data_len(), 0);
    }
}
