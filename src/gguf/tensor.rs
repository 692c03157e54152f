//! GGUF tensor descriptors

use crate::error::{FixtureError, Result};
use crate::format::constants::GGUF_MAX_DIMENSIONS;
use crate::format::endian::{write_string, write_u32, write_u64};
use crate::format::types::GGUFTensorType;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Information about one tensor in the GGUF descriptor section
///
/// `dtype` is written verbatim; it is only interpreted when the data section
/// of the file has to be sized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorDescriptor {
    /// Name of the tensor
    pub name: String,
    /// ggml type code
    pub dtype: u32,
    /// Dimensions, innermost first
    pub shape: Vec<u64>,
    /// Offset of the tensor data from the start of the data section
    #[serde(default)]
    pub offset: u64,
}

impl TensorDescriptor {
    pub fn new(name: impl Into<String>, dtype: u32, shape: Vec<u64>, offset: u64) -> Self {
        Self { name: name.into(), dtype, shape, offset }
    }

    /// Descriptor for a known tensor type
    pub fn typed(
        name: impl Into<String>,
        tensor_type: GGUFTensorType,
        shape: Vec<u64>,
        offset: u64,
    ) -> Self {
        Self::new(name, tensor_type.as_u32(), shape, offset)
    }

    /// Calculate the number of elements in the tensor
    pub fn element_count(&self) -> u64 {
        self.shape.iter().product()
    }

    /// The tensor type, if the dtype code is one this crate knows
    pub fn tensor_type(&self) -> Option<GGUFTensorType> {
        GGUFTensorType::from_u32(self.dtype)
    }

    /// Byte size of the tensor data, or `None` for an unknown dtype code
    pub fn data_size(&self) -> Option<Result<u64>> {
        self.tensor_type().map(|ty| ty.calculate_size(&self.shape))
    }

    /// Byte size of the tensor data; unknown dtype codes are an error
    pub fn require_data_size(&self) -> Result<u64> {
        self.data_size().unwrap_or_else(|| {
            Err(FixtureError::InvalidTensorData(format!(
                "Tensor '{}' has dtype code {} which cannot be sized",
                self.name, self.dtype
            )))
        })
    }

    /// Validate the descriptor on its own; the dtype code is not interpreted
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(FixtureError::InvalidTensorData("Tensor name cannot be empty".to_string()));
        }

        if self.shape.is_empty() || self.shape.len() > GGUF_MAX_DIMENSIONS {
            return Err(FixtureError::InvalidTensorData(format!(
                "Tensor '{}' has {} dimensions, expected 1 to {}",
                self.name,
                self.shape.len(),
                GGUF_MAX_DIMENSIONS
            )));
        }

        if self.shape.contains(&0) {
            return Err(FixtureError::InvalidTensorData(format!(
                "Tensor '{}': all dimensions must be greater than zero",
                self.name
            )));
        }

        Ok(())
    }

    /// Calculate the serialized size of this descriptor
    pub fn serialized_size(&self) -> usize {
        // name length (8) + name + n_dims (4) + dims + dtype (4) + offset (8)
        8 + self.name.len() + 4 + (self.shape.len() * 8) + 4 + 8
    }

    /// Write `name, n_dims:u32, dims:[u64], dtype:u32, offset:u64`
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_string(writer, &self.name)?;

        write_u32(writer, self.shape.len() as u32)?;
        for &dimension in &self.shape {
            write_u64(writer, dimension)?;
        }

        write_u32(writer, self.dtype)?;
        write_u64(writer, self.offset)?;

        Ok(())
    }
}

impl std::fmt::Display for TensorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.tensor_type() {
            Some(ty) => write!(
                f,
                "TensorDescriptor {{ name: '{}', shape: {:?}, type: {}, offset: {} }}",
                self.name, self.shape, ty, self.offset
            ),
            None => write!(
                f,
                "TensorDescriptor {{ name: '{}', shape: {:?}, type: #{}, offset: {} }}",
                self.name, self.shape, self.dtype, self.offset
            ),
        }
    }
}
