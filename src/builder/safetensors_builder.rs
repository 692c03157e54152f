//! Safetensors file builder

use crate::error::Result;
use crate::safetensors::{encode, Dtype, SafetensorsFile, SafetensorsTensorEntry};

/// Builder that packs tensors back to back in the data block
#[derive(Debug, Default, Clone)]
pub struct SafetensorsBuilder {
    metadata: Vec<(String, String)>,
    tensors: Vec<SafetensorsTensorEntry>,
    cursor: u64,
}

impl SafetensorsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `__metadata__` string pair
    pub fn add_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Add a tensor at the end of the data block
    pub fn add_tensor<N: Into<String>>(
        mut self,
        name: N,
        dtype: Dtype,
        shape: Vec<u64>,
    ) -> Result<Self> {
        let entry = SafetensorsTensorEntry::packed(name, dtype, shape, self.cursor)?;
        self.cursor = entry.data_offsets.1;
        self.tensors.push(entry);
        Ok(self)
    }

    /// Add an entry with its offsets exactly as given
    pub fn add_entry(mut self, entry: SafetensorsTensorEntry) -> Self {
        self.cursor = self.cursor.max(entry.data_offsets.1);
        self.tensors.push(entry);
        self
    }

    pub fn tensor_count(&self) -> usize {
        self.tensors.len()
    }

    pub fn build(self) -> Result<SafetensorsFile> {
        SafetensorsFile::with_metadata(self.metadata, self.tensors)
    }

    pub fn build_to_bytes(self) -> Result<Vec<u8>> {
        encode(&self.build()?)
    }
}
