//! Type tags of the GGUF format

use crate::error::{FixtureError, Result};
use serde::{Deserialize, Serialize};

/// Type identifiers used in the GGUF format for metadata values
///
/// Tag 9 is the GGUF array kind, which the encoder does not emit.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GGUFValueType {
    /// 8-bit unsigned integer
    U8 = 0,
    /// 8-bit signed integer
    I8 = 1,
    /// 16-bit unsigned integer
    U16 = 2,
    /// 16-bit signed integer
    I16 = 3,
    /// 32-bit unsigned integer
    U32 = 4,
    /// 32-bit signed integer
    I32 = 5,
    /// 32-bit floating point
    F32 = 6,
    /// Boolean value, one byte
    Bool = 7,
    /// Length-prefixed UTF-8 string
    String = 8,
    /// 64-bit unsigned integer
    U64 = 10,
    /// 64-bit signed integer
    I64 = 11,
    /// 64-bit floating point
    F64 = 12,
}

/// Tensor data type codes as stored in a GGUF tensor descriptor
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(non_camel_case_types)] // ggml uses these exact names
pub enum GGUFTensorType {
    F32 = 0,
    F16 = 1,
    Q4_0 = 2,
    Q4_1 = 3,
    Q5_0 = 6,
    Q5_1 = 7,
    Q8_0 = 8,
    Q8_1 = 9,
    Q2_K = 10,
    Q3_K = 11,
    Q4_K = 12,
    Q5_K = 13,
    Q6_K = 14,
    Q8_K = 15,
    IQ2_XXS = 16,
    IQ2_XS = 17,
    IQ3_XXS = 18,
    IQ1_S = 19,
    IQ4_NL = 20,
    IQ3_S = 21,
    IQ2_S = 22,
    IQ4_XS = 23,
    I8 = 24,
    I16 = 25,
    I32 = 26,
    I64 = 27,
    F64 = 28,
    IQ1_M = 29,
    BF16 = 30,
    TQ1_0 = 34,
    TQ2_0 = 35,
}

impl GGUFValueType {
    /// The on-disk tag
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Get the size in bytes for fixed-size types
    pub fn size_in_bytes(self) -> Option<usize> {
        match self {
            GGUFValueType::U8 | GGUFValueType::I8 | GGUFValueType::Bool => Some(1),
            GGUFValueType::U16 | GGUFValueType::I16 => Some(2),
            GGUFValueType::U32 | GGUFValueType::I32 | GGUFValueType::F32 => Some(4),
            GGUFValueType::U64 | GGUFValueType::I64 | GGUFValueType::F64 => Some(8),
            GGUFValueType::String => None,
        }
    }

    /// Get a human-readable name for the type
    pub fn name(self) -> &'static str {
        match self {
            GGUFValueType::U8 => "u8",
            GGUFValueType::I8 => "i8",
            GGUFValueType::U16 => "u16",
            GGUFValueType::I16 => "i16",
            GGUFValueType::U32 => "u32",
            GGUFValueType::I32 => "i32",
            GGUFValueType::F32 => "f32",
            GGUFValueType::Bool => "bool",
            GGUFValueType::String => "string",
            GGUFValueType::U64 => "u64",
            GGUFValueType::I64 => "i64",
            GGUFValueType::F64 => "f64",
        }
    }
}

impl GGUFTensorType {
    /// Every known tensor type, in code order
    pub const ALL: [GGUFTensorType; 31] = [
        GGUFTensorType::F32,
        GGUFTensorType::F16,
        GGUFTensorType::Q4_0,
        GGUFTensorType::Q4_1,
        GGUFTensorType::Q5_0,
        GGUFTensorType::Q5_1,
        GGUFTensorType::Q8_0,
        GGUFTensorType::Q8_1,
        GGUFTensorType::Q2_K,
        GGUFTensorType::Q3_K,
        GGUFTensorType::Q4_K,
        GGUFTensorType::Q5_K,
        GGUFTensorType::Q6_K,
        GGUFTensorType::Q8_K,
        GGUFTensorType::IQ2_XXS,
        GGUFTensorType::IQ2_XS,
        GGUFTensorType::IQ3_XXS,
        GGUFTensorType::IQ1_S,
        GGUFTensorType::IQ4_NL,
        GGUFTensorType::IQ3_S,
        GGUFTensorType::IQ2_S,
        GGUFTensorType::IQ4_XS,
        GGUFTensorType::I8,
        GGUFTensorType::I16,
        GGUFTensorType::I32,
        GGUFTensorType::I64,
        GGUFTensorType::F64,
        GGUFTensorType::IQ1_M,
        GGUFTensorType::BF16,
        GGUFTensorType::TQ1_0,
        GGUFTensorType::TQ2_0,
    ];

    /// Convert from a descriptor dtype code; `None` for codes this crate cannot size
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_u32() == value)
    }

    /// The descriptor dtype code
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// `(elements per block, bytes per block)` from the ggml type traits
    pub fn block_layout(self) -> (u64, u64) {
        match self {
            GGUFTensorType::F32 => (1, 4),
            GGUFTensorType::F16 => (1, 2),
            GGUFTensorType::Q4_0 => (32, 18),
            GGUFTensorType::Q4_1 => (32, 20),
            GGUFTensorType::Q5_0 => (32, 22),
            GGUFTensorType::Q5_1 => (32, 24),
            GGUFTensorType::Q8_0 => (32, 34),
            GGUFTensorType::Q8_1 => (32, 36),
            GGUFTensorType::Q2_K => (256, 84),
            GGUFTensorType::Q3_K => (256, 110),
            GGUFTensorType::Q4_K => (256, 144),
            GGUFTensorType::Q5_K => (256, 176),
            GGUFTensorType::Q6_K => (256, 210),
            GGUFTensorType::Q8_K => (256, 292),
            GGUFTensorType::IQ2_XXS => (256, 66),
            GGUFTensorType::IQ2_XS => (256, 74),
            GGUFTensorType::IQ3_XXS => (256, 98),
            GGUFTensorType::IQ1_S => (256, 50),
            GGUFTensorType::IQ4_NL => (32, 18),
            GGUFTensorType::IQ3_S => (256, 110),
            GGUFTensorType::IQ2_S => (256, 82),
            GGUFTensorType::IQ4_XS => (256, 136),
            GGUFTensorType::I8 => (1, 1),
            GGUFTensorType::I16 => (1, 2),
            GGUFTensorType::I32 => (1, 4),
            GGUFTensorType::I64 => (1, 8),
            GGUFTensorType::F64 => (1, 8),
            GGUFTensorType::IQ1_M => (256, 56),
            GGUFTensorType::BF16 => (1, 2),
            GGUFTensorType::TQ1_0 => (256, 54),
            GGUFTensorType::TQ2_0 => (256, 66),
        }
    }

    /// Byte size of a tensor of this type with the given shape.
    ///
    /// The first dimension is the innermost one and must be a whole number of blocks.
    pub fn calculate_size(self, shape: &[u64]) -> Result<u64> {
        let (block_size, type_size) = self.block_layout();
        let Some((&inner, outer)) = shape.split_first() else {
            return Ok(type_size);
        };

        if inner % block_size != 0 {
            return Err(FixtureError::InvalidTensorData(format!(
                "First dimension {} of a {} tensor is not a multiple of the block size {}",
                inner, self, block_size
            )));
        }

        let overflow = || FixtureError::InvalidTensorData("Tensor byte size overflows u64".into());
        let row_bytes = (inner / block_size).checked_mul(type_size).ok_or_else(overflow)?;
        outer.iter().try_fold(row_bytes, |acc, &dim| acc.checked_mul(dim).ok_or_else(overflow))
    }

    /// Get the ggml name of the tensor type
    pub fn name(self) -> &'static str {
        match self {
            GGUFTensorType::F32 => "F32",
            GGUFTensorType::F16 => "F16",
            GGUFTensorType::Q4_0 => "Q4_0",
            GGUFTensorType::Q4_1 => "Q4_1",
            GGUFTensorType::Q5_0 => "Q5_0",
            GGUFTensorType::Q5_1 => "Q5_1",
            GGUFTensorType::Q8_0 => "Q8_0",
            GGUFTensorType::Q8_1 => "Q8_1",
            GGUFTensorType::Q2_K => "Q2_K",
            GGUFTensorType::Q3_K => "Q3_K",
            GGUFTensorType::Q4_K => "Q4_K",
            GGUFTensorType::Q5_K => "Q5_K",
            GGUFTensorType::Q6_K => "Q6_K",
            GGUFTensorType::Q8_K => "Q8_K",
            GGUFTensorType::IQ2_XXS => "IQ2_XXS",
            GGUFTensorType::IQ2_XS => "IQ2_XS",
            GGUFTensorType::IQ3_XXS => "IQ3_XXS",
            GGUFTensorType::IQ1_S => "IQ1_S",
            GGUFTensorType::IQ4_NL => "IQ4_NL",
            GGUFTensorType::IQ3_S => "IQ3_S",
            GGUFTensorType::IQ2_S => "IQ2_S",
            GGUFTensorType::IQ4_XS => "IQ4_XS",
            GGUFTensorType::I8 => "I8",
            GGUFTensorType::I16 => "I16",
            GGUFTensorType::I32 => "I32",
            GGUFTensorType::I64 => "I64",
            GGUFTensorType::F64 => "F64",
            GGUFTensorType::IQ1_M => "IQ1_M",
            GGUFTensorType::BF16 => "BF16",
            GGUFTensorType::TQ1_0 => "TQ1_0",
            GGUFTensorType::TQ2_0 => "TQ2_0",
        }
    }
}

impl std::fmt::Display for GGUFValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::fmt::Display for GGUFTensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
