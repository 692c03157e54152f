//! GGUF file header

use crate::error::{FixtureError, Result};
use crate::format::constants::{GGUF_HEADER_SIZE, GGUF_MAGIC, GGUF_MAGIC_BYTES, GGUF_VERSION};
use crate::format::endian::{write_u32, write_u64};
use std::io::Write;

/// GGUF file header structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GGUFHeader {
    /// Magic number ("GGUF" in little-endian)
    pub magic: u32,
    /// Version number (currently 3)
    pub version: u32,
    /// Number of tensor descriptors in the file
    pub tensor_count: u64,
    /// Number of metadata key-value pairs
    pub metadata_kv_count: u64,
}

impl Default for GGUFHeader {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl GGUFHeader {
    /// Create a version 3 header
    pub fn new(tensor_count: u64, metadata_kv_count: u64) -> Self {
        Self { magic: GGUF_MAGIC, version: GGUF_VERSION, tensor_count, metadata_kv_count }
    }

    /// Validate the header and return an error if invalid
    pub fn validate(&self) -> Result<()> {
        if self.magic != GGUF_MAGIC {
            return Err(FixtureError::Format(format!(
                "Invalid GGUF magic number: expected 0x{:08X}, found 0x{:08X}",
                GGUF_MAGIC, self.magic
            )));
        }

        if self.version != GGUF_VERSION {
            return Err(FixtureError::UnsupportedVersion(self.version));
        }

        Ok(())
    }

    /// Get the size of the header in bytes
    pub const fn size() -> usize {
        GGUF_HEADER_SIZE
    }

    /// Write the header to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.validate()?;

        writer.write_all(&GGUF_MAGIC_BYTES)?;
        write_u32(writer, self.version)?;
        write_u64(writer, self.tensor_count)?;
        write_u64(writer, self.metadata_kv_count)?;

        Ok(())
    }
}

impl std::fmt::Display for GGUFHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GGUF Header {{ magic: 0x{:08X}, version: {}, tensors: {}, metadata: {} }}",
            self.magic, self.version, self.tensor_count, self.metadata_kv_count
        )
    }
}
