//! High-level GGUF file builder

use crate::error::Result;
use crate::format::alignment::align_to;
use crate::format::constants::{GGUF_DEFAULT_ALIGNMENT, GGUF_VERSION};
use crate::format::types::GGUFTensorType;
use crate::gguf::{encode, GGUFFile, Metadata, MetadataValue, TensorDescriptor, TensorPayload};

#[derive(Debug, Clone)]
enum PendingTensor {
    /// Offset assigned at build time, after the previous tensor
    Packed { name: String, tensor_type: GGUFTensorType, shape: Vec<u64> },
    /// Descriptor written exactly as given
    Explicit(TensorDescriptor),
}

/// High-level builder for GGUF file descriptions
#[derive(Debug, Clone)]
pub struct GGUFBuilder {
    version: u32,
    metadata: Metadata,
    tensors: Vec<PendingTensor>,
    payload: TensorPayload,
}

impl Default for GGUFBuilder {
    fn default() -> Self {
        Self {
            version: GGUF_VERSION,
            metadata: Metadata::new(),
            tensors: Vec::new(),
            payload: TensorPayload::HeaderOnly,
        }
    }
}

impl GGUFBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the header version; anything but 3 fails at build time
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Add metadata key-value pair
    pub fn add_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<MetadataValue>,
    {
        self.metadata.insert(key, value);
        self
    }

    /// Add a string value
    pub fn add_string<K: Into<String>, V: Into<String>>(self, key: K, value: V) -> Self {
        self.add_metadata(key, MetadataValue::String(value.into()))
    }

    /// Add a u32 value
    pub fn add_u32<K: Into<String>>(self, key: K, value: u32) -> Self {
        self.add_metadata(key, MetadataValue::U32(value))
    }

    /// Set what follows the descriptors
    pub fn payload(mut self, payload: TensorPayload) -> Self {
        self.payload = payload;
        self
    }

    /// Add a tensor whose offset is placed after the previous tensor
    pub fn add_tensor<N: Into<String>>(
        mut self,
        name: N,
        tensor_type: GGUFTensorType,
        shape: Vec<u64>,
    ) -> Result<Self> {
        let name = name.into();
        tensor_type.calculate_size(&shape)?;
        self.tensors.push(PendingTensor::Packed { name, tensor_type, shape });
        Ok(self)
    }

    /// Add a descriptor verbatim, including its offset and raw dtype code
    pub fn add_descriptor(mut self, descriptor: TensorDescriptor) -> Self {
        self.tensors.push(PendingTensor::Explicit(descriptor));
        self
    }

    pub fn tensor_count(&self) -> usize {
        self.tensors.len()
    }

    pub fn metadata_count(&self) -> usize {
        self.metadata.len()
    }

    /// Alignment used when placing packed tensors
    fn placement_alignment(&self) -> u64 {
        match self.payload {
            TensorPayload::Aligned(alignment) => alignment,
            TensorPayload::Contiguous => 1,
            TensorPayload::HeaderOnly => GGUF_DEFAULT_ALIGNMENT as u64,
        }
    }

    /// Resolve offsets and validate the result
    pub fn build(self) -> Result<GGUFFile> {
        let alignment = self.placement_alignment();
        let mut cursor = 0u64;
        let mut descriptors = Vec::with_capacity(self.tensors.len());

        for pending in self.tensors {
            let descriptor = match pending {
                PendingTensor::Packed { name, tensor_type, shape } => {
                    TensorDescriptor::typed(name, tensor_type, shape, align_to(cursor, alignment))
                }
                PendingTensor::Explicit(descriptor) => descriptor,
            };
            // unsizeable explicit descriptors are left to the file's own validation
            let size = descriptor.data_size().and_then(|size| size.ok()).unwrap_or(0);
            cursor = descriptor.offset.saturating_add(size);
            descriptors.push(descriptor);
        }

        GGUFFile::with_options(self.version, self.metadata, descriptors, self.payload)
    }

    /// Build and encode in one step
    pub fn build_to_bytes(self) -> Result<Vec<u8>> {
        encode(&self.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FixtureError;

    #[test]
    fn test_builder_creation() {
        let builder = GGUFBuilder::new();
        assert_eq!(builder.tensor_count(), 0);
        assert_eq!(builder.metadata_count(), 0);
        assert_eq!(builder.build_to_bytes().unwrap().len(), 24);
    }

    #[test]
    fn test_add_metadata_keeps_order() {
        let file = GGUFBuilder::new()
            .add_string("general.architecture", "llama")
            .add_u32("llama.context_length", 2048)
            .add_metadata("general.file_type", 1u32)
            .build()
            .unwrap();

        let keys: Vec<&str> = file.metadata().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["general.architecture", "llama.context_length", "general.file_type"]);
    }

    #[test]
    fn test_packed_offsets_follow_alignment() {
        let file = GGUFBuilder::new()
            .payload(TensorPayload::aligned_default())
            .add_tensor("a", GGUFTensorType::F32, vec![3])
            .unwrap()
            .add_tensor("b", GGUFTensorType::F16, vec![5])
            .unwrap()
            .add_tensor("c", GGUFTensorType::Q4_0, vec![32])
            .unwrap()
            .build()
            .unwrap();

        let offsets: Vec<u64> = file.tensors().iter().map(|t| t.offset).collect();
        assert_eq!(offsets, [0, 32, 64]);
        assert_eq!(file.data_section_len().unwrap(), 64 + 18);
    }

    #[test]
    fn test_contiguous_offsets_are_packed() {
        let file = GGUFBuilder::new()
            .payload(TensorPayload::Contiguous)
            .add_tensor("a", GGUFTensorType::F32, vec![3])
            .unwrap()
            .add_tensor("b", GGUFTensorType::I8, vec![5])
            .unwrap()
            .build()
            .unwrap();

        let offsets: Vec<u64> = file.tensors().iter().map(|t| t.offset).collect();
        assert_eq!(offsets, [0, 12]);
    }

    #[test]
    fn test_block_mismatch_rejected() {
        let result = GGUFBuilder::new().add_tensor("w", GGUFTensorType::Q4_0, vec![33]);
        assert!(matches!(result, Err(FixtureError::InvalidTensorData(_))));
    }

    #[test]
    fn test_explicit_descriptor_is_verbatim() {
        let file = GGUFBuilder::new()
            .add_descriptor(TensorDescriptor::new("test.weight.0", 2, vec![64, 128], 0))
            .build()
            .unwrap();
        assert_eq!(file.tensors()[0].dtype, 2);
        assert_eq!(file.tensors()[0].offset, 0);
    }

    #[test]
    fn test_explicit_descriptor_keeps_dtype_opaque() {
        let file = GGUFBuilder::new()
            .add_descriptor(TensorDescriptor::new("w", 2, vec![10], 0))
            .build()
            .unwrap();
        assert_eq!(file.tensors()[0].shape, [10]);

        let with_data = GGUFBuilder::new()
            .payload(TensorPayload::Contiguous)
            .add_descriptor(TensorDescriptor::new("w", 2, vec![10], 0))
            .build();
        assert!(matches!(with_data, Err(FixtureError::InvalidTensorData(_))));
    }

    #[test]
    fn test_duplicate_tensor_rejected_at_build() {
        let result = GGUFBuilder::new()
            .add_tensor("dup", GGUFTensorType::F32, vec![1])
            .unwrap()
            .add_tensor("dup", GGUFTensorType::F32, vec![1])
            .unwrap()
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_version_rejected_at_build() {
        let result = GGUFBuilder::new().version(4).build();
        assert!(matches!(result, Err(FixtureError::UnsupportedVersion(4))));
    }
}
