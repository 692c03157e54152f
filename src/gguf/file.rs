//! Complete in-memory description of a GGUF file

use crate::error::{FixtureError, Result};
use crate::format::alignment::{align_to, is_valid_alignment};
use crate::format::constants::{GGUF_ALIGNMENT_KEY, GGUF_DEFAULT_ALIGNMENT, GGUF_VERSION};
use crate::gguf::header::GGUFHeader;
use crate::gguf::metadata::{Metadata, MetadataValue};
use crate::gguf::tensor::TensorDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What follows the tensor descriptors
///
/// In manifests: `"header_only"`, `"contiguous"` or `{ aligned = 32 }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorPayload {
    /// Nothing; the file ends after the last descriptor
    #[default]
    HeaderOnly,
    /// Zero-filled data section directly after the descriptors
    Contiguous,
    /// Zero padding to the given boundary, then the zero-filled data section
    Aligned(u64),
}

impl TensorPayload {
    /// Aligned to the GGUF default of 32 bytes
    pub fn aligned_default() -> Self {
        TensorPayload::Aligned(GGUF_DEFAULT_ALIGNMENT as u64)
    }

    /// Whether a data section is written at all
    pub fn writes_data(self) -> bool {
        !matches!(self, TensorPayload::HeaderOnly)
    }

    /// Alignment of the data section start and of every tensor offset
    pub fn alignment(self) -> u64 {
        match self {
            TensorPayload::Aligned(alignment) => alignment,
            _ => 1,
        }
    }
}

/// A GGUF file ready to be encoded
///
/// Construction validates the whole description, so an encoder never
/// discovers a contract violation halfway through writing.
#[derive(Debug, Clone, PartialEq)]
pub struct GGUFFile {
    version: u32,
    metadata: Metadata,
    tensors: Vec<TensorDescriptor>,
    payload: TensorPayload,
}

impl GGUFFile {
    /// Version 3 file without a data section
    pub fn new(metadata: Metadata, tensors: Vec<TensorDescriptor>) -> Result<Self> {
        Self::with_options(GGUF_VERSION, metadata, tensors, TensorPayload::HeaderOnly)
    }

    /// Fully specified file
    pub fn with_options(
        version: u32,
        metadata: Metadata,
        tensors: Vec<TensorDescriptor>,
        payload: TensorPayload,
    ) -> Result<Self> {
        let file = Self { version, metadata, tensors, payload };
        file.validate()?;
        Ok(file)
    }

    /// Replace the payload policy, revalidating offsets against it
    pub fn with_payload(mut self, payload: TensorPayload) -> Result<Self> {
        self.payload = payload;
        self.validate()?;
        Ok(self)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn tensors(&self) -> &[TensorDescriptor] {
        &self.tensors
    }

    pub fn payload(&self) -> TensorPayload {
        self.payload
    }

    /// Header with counts derived from the sequences
    pub fn header(&self) -> GGUFHeader {
        GGUFHeader {
            version: self.version,
            ..GGUFHeader::new(self.tensors.len() as u64, self.metadata.len() as u64)
        }
    }

    /// Validate the description
    pub fn validate(&self) -> Result<()> {
        self.header().validate()?;
        self.metadata.validate()?;

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

        self.validate_alignment()?;
        self.validate_offsets()
    }

    fn validate_alignment(&self) -> Result<()> {
        let TensorPayload::Aligned(alignment) = self.payload else {
            return Ok(());
        };

        if !is_valid_alignment(alignment) {
            return Err(FixtureError::Format(format!(
                "Data alignment must be a power of two, got {}",
                alignment
            )));
        }

        match self.metadata.get(GGUF_ALIGNMENT_KEY) {
            Some(MetadataValue::U32(declared)) if u64::from(*declared) == alignment => Ok(()),
            Some(other) => Err(FixtureError::InvalidMetadata(format!(
                "{} is {} but the data section is aligned to {}",
                GGUF_ALIGNMENT_KEY, other, alignment
            ))),
            None if alignment == GGUF_DEFAULT_ALIGNMENT as u64 => Ok(()),
            None => Err(FixtureError::InvalidMetadata(format!(
                "Alignment {} requires a u32 '{}' metadata entry",
                alignment, GGUF_ALIGNMENT_KEY
            ))),
        }
    }

    /// Offsets must not run backwards into the previous tensor's bytes
    ///
    /// Only checked when a data section is written; without one the dtype
    /// codes and offsets are opaque.
    fn validate_offsets(&self) -> Result<()> {
        if !self.payload.writes_data() {
            return Ok(());
        }

        let alignment = self.payload.alignment();
        let mut previous_end = 0u64;

        for tensor in &self.tensors {
            if tensor.offset < previous_end {
                return Err(FixtureError::InvalidTensorData(format!(
                    "Tensor '{}' at offset {} overlaps the previous tensor ending at {}",
                    tensor.name, tensor.offset, previous_end
                )));
            }

            if tensor.offset % alignment != 0 {
                return Err(FixtureError::InvalidTensorData(format!(
                    "Tensor '{}' offset {} is not aligned to {}",
                    tensor.name, tensor.offset, alignment
                )));
            }

            let size = tensor.require_data_size()?;
            previous_end = tensor.offset.checked_add(size).ok_or_else(|| {
                FixtureError::InvalidTensorData(format!("Tensor '{}' ends past u64", tensor.name))
            })?;
        }

        Ok(())
    }

    /// Bytes of header, metadata and descriptors
    pub fn descriptors_len(&self) -> u64 {
        let descriptors: usize = self.tensors.iter().map(TensorDescriptor::serialized_size).sum();
        (GGUFHeader::size() + self.metadata.serialized_size() + descriptors) as u64
    }

    /// Length of the zero-filled data section (0 without a payload)
    pub fn data_section_len(&self) -> Result<u64> {
        if !self.payload.writes_data() {
            return Ok(0);
        }

        let mut len = 0u64;
        for tensor in &self.tensors {
            len = len.max(tensor.offset + tensor.require_data_size()?);
        }
        Ok(len)
    }

    /// Absolute position of the data section, if one is written
    pub fn data_section_start(&self) -> Option<u64> {
        self.payload
            .writes_data()
            .then(|| align_to(self.descriptors_len(), self.payload.alignment()))
    }

    /// Total number of bytes the encoder will produce
    pub fn encoded_len(&self) -> Result<u64> {
        match self.data_section_start() {
            Some(start) => Ok(start + self.data_section_len()?),
            None => Ok(self.descriptors_len()),
        }
    }
}
