//! Safetensors encoder

use crate::error::{FixtureError, Result};
use crate::format::alignment::calculate_padding;
use crate::format::constants::{SAFETENSORS_ALIGNMENT, SAFETENSORS_LENGTH_PREFIX_SIZE};
use crate::format::endian::{write_u64, write_zeros};
use crate::safetensors::file::SafetensorsFile;
use std::io::Write;
use tracing::debug;

/// Writes `header_len:u64`, the JSON header, zero padding to 8 and the zero data block
#[derive(Debug)]
pub struct SafetensorsWriter<W> {
    writer: W,
    position: u64,
}

impl<W: Write> SafetensorsWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, position: 0 }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Write a complete file, returning the bytes written by this call
    pub fn write_file(&mut self, file: &SafetensorsFile) -> Result<u64> {
        if self.position != 0 {
            return Err(FixtureError::Format(
                "Safetensors files must start at the beginning of the stream".to_string(),
            ));
        }

        let json = file.header_json()?;
        let header_len = json.len() as u64;
        let padding = calculate_padding(header_len, SAFETENSORS_ALIGNMENT);

        write_u64(&mut self.writer, header_len)?;
        self.writer.write_all(&json)?;
        write_zeros(&mut self.writer, padding)?;
        debug!(header_len, padding, tensors = file.tensors().len(), "wrote safetensors header");

        let data_len = write_zeros(&mut self.writer, file.data_len())?;
        debug!(data_len, "wrote safetensors data block");

        self.position = SAFETENSORS_LENGTH_PREFIX_SIZE + header_len + padding + data_len;
        Ok(self.position)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying sink
    pub fn finalize(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.writer)
    }
}

/// Encode a safetensors file into `writer`, returning the number of bytes written
pub fn encode_to<W: Write>(file: &SafetensorsFile, writer: W) -> Result<u64> {
    let mut writer = SafetensorsWriter::new(writer);
    let written = writer.write_file(file)?;
    writer.flush()?;
    Ok(written)
}

/// Encode a safetensors file into a byte vector
pub fn encode(file: &SafetensorsFile) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(file.encoded_len()? as usize);
    encode_to(file, &mut buffer)?;
    Ok(buffer)
}
