//! Complete in-memory description of a safetensors file

use crate::error::Result;
use crate::format::alignment::calculate_padding;
use crate::format::constants::{SAFETENSORS_ALIGNMENT, SAFETENSORS_LENGTH_PREFIX_SIZE};
use crate::safetensors::header::{SafetensorsHeader, SafetensorsTensorEntry};

/// A safetensors file ready to be encoded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetensorsFile {
    header: SafetensorsHeader,
}

impl SafetensorsFile {
    pub fn new(tensors: Vec<SafetensorsTensorEntry>) -> Result<Self> {
        Self::with_metadata(Vec::new(), tensors)
    }

    /// File whose header carries a `__metadata__` string map
    pub fn with_metadata(
        metadata: Vec<(String, String)>,
        tensors: Vec<SafetensorsTensorEntry>,
    ) -> Result<Self> {
        let header = SafetensorsHeader { metadata, tensors };
        header.validate()?;
        Ok(Self { header })
    }

    pub fn header(&self) -> &SafetensorsHeader {
        &self.header
    }

    pub fn tensors(&self) -> &[SafetensorsTensorEntry] {
        &self.header.tensors
    }

    pub fn metadata(&self) -> &[(String, String)] {
        &self.header.metadata
    }

    pub fn header_json(&self) -> Result<Vec<u8>> {
        self.header.to_json_bytes()
    }

    /// Unpadded header length, the value of the length prefix
    pub fn header_len(&self) -> Result<u64> {
        Ok(self.header_json()?.len() as u64)
    }

    pub fn padding(&self) -> Result<u64> {
        Ok(calculate_padding(self.header_len()?, SAFETENSORS_ALIGNMENT))
    }

    pub fn data_len(&self) -> u64 {
        self.header.data_len()
    }

    /// 8 + header_len + padding + data_len
    pub fn encoded_len(&self) -> Result<u64> {
        let header_len = self.header_len()?;
        Ok(SAFETENSORS_LENGTH_PREFIX_SIZE
            + header_len
            + calculate_padding(header_len, SAFETENSORS_ALIGNMENT)
            + self.data_len())
    }
}
