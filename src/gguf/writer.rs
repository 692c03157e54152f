//! Streaming GGUF encoder
//!
//! ```rust
//! # use tensor_fixtures::prelude::*;
//! # fn main() -> Result<()> {
//! let mut metadata = Metadata::new();
//! metadata.insert("general.architecture", "llama");
//! let file = GGUFFile::new(metadata, vec![])?;
//!
//! let bytes = tensor_fixtures::gguf::encode(&file)?;
//! assert_eq!(&bytes[..4], b"GGUF");
//! assert_eq!(bytes.len(), 69);
//! # Ok(())
//! # }
//! ```

use crate::error::{FixtureError, Result};
use crate::format::alignment::AlignmentInfo;
use crate::format::endian::write_zeros;
use crate::gguf::file::GGUFFile;
use crate::gguf::header::GGUFHeader;
use crate::gguf::metadata::Metadata;
use crate::gguf::tensor::TensorDescriptor;
use std::io::Write;
use tracing::{debug, trace};

/// Information about what was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    /// Number of bytes written by the call
    pub bytes_written: u64,
    /// Position in the stream after the call
    pub final_position: u64,
}

/// Section-by-section writer for GGUF files
#[derive(Debug)]
pub struct GGUFWriter<W> {
    writer: W,
    position: u64,
    header_written: bool,
    in_data_section: bool,
}

impl<W: Write> GGUFWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, position: 0, header_written: false, in_data_section: false }
    }

    fn advance(&mut self, bytes: u64) -> WriteResult {
        self.position += bytes;
        WriteResult { bytes_written: bytes, final_position: self.position }
    }

    /// Write the fixed 24-byte header
    pub fn write_header(&mut self, header: &GGUFHeader) -> Result<WriteResult> {
        if self.header_written {
            return Err(FixtureError::Format("Header already written".to_string()));
        }

        header.write_to(&mut self.writer)?;
        self.header_written = true;
        Ok(self.advance(GGUFHeader::size() as u64))
    }

    /// Write every metadata entry in order
    pub fn write_metadata(&mut self, metadata: &Metadata) -> Result<WriteResult> {
        if !self.header_written {
            return Err(FixtureError::Format("Header must be written before metadata".to_string()));
        }

        for entry in metadata.iter() {
            trace!(
                key = %entry.key,
                ty = %entry.value.value_type(),
                value = %entry.value,
                "writing metadata entry"
            );
        }
        metadata.write_to(&mut self.writer)?;
        Ok(self.advance(metadata.serialized_size() as u64))
    }

    /// Write the tensor descriptor section
    pub fn write_tensor_descriptors(
        &mut self,
        descriptors: &[TensorDescriptor],
    ) -> Result<WriteResult> {
        if !self.header_written {
            return Err(FixtureError::Format(
                "Header must be written before tensor descriptors".to_string(),
            ));
        }

        let mut total = 0u64;
        for descriptor in descriptors {
            descriptor.write_to(&mut self.writer)?;
            total += descriptor.serialized_size() as u64;
        }
        Ok(self.advance(total))
    }

    /// Pad with zeros up to `alignment` and enter the data section
    pub fn align_for_tensor_data(&mut self, alignment: u64) -> Result<WriteResult> {
        if self.in_data_section {
            return Err(FixtureError::Format("Already in tensor data section".to_string()));
        }

        let info = AlignmentInfo::new(self.position, alignment);
        if info.needs_padding() {
            write_zeros(&mut self.writer, info.padding)?;
        }
        self.in_data_section = true;
        Ok(self.advance(info.padding))
    }

    /// Write `len` zero bytes of placeholder tensor data
    pub fn write_zeroed_data(&mut self, len: u64) -> Result<WriteResult> {
        if !self.in_data_section {
            return Err(FixtureError::Format("Must align for tensor data first".to_string()));
        }

        let written = write_zeros(&mut self.writer, len)?;
        Ok(self.advance(written))
    }

    /// Write a complete file description
    pub fn write_file(&mut self, file: &GGUFFile) -> Result<WriteResult> {
        let start = self.position;
        // Sized up front so a bad description fails before the first byte
        let data_len = file.data_section_len()?;

        self.write_header(&file.header())?;
        let metadata = self.write_metadata(file.metadata())?;
        debug!(
            entries = file.metadata().len(),
            bytes = metadata.bytes_written,
            "wrote GGUF metadata"
        );

        let descriptors = self.write_tensor_descriptors(file.tensors())?;
        debug!(
            tensors = file.tensors().len(),
            bytes = descriptors.bytes_written,
            "wrote GGUF tensor descriptors"
        );

        if file.payload().writes_data() {
            let padding = self.align_for_tensor_data(file.payload().alignment())?;
            self.write_zeroed_data(data_len)?;
            debug!(padding = padding.bytes_written, data_len, "wrote GGUF data section");
        }

        Ok(WriteResult { bytes_written: self.position - start, final_position: self.position })
    }

    /// Get current position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Flush the writer
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

/// Encode a GGUF file into `writer`, returning the number of bytes written
pub fn encode_to<W: Write>(file: &GGUFFile, writer: W) -> Result<u64> {
    let mut writer = GGUFWriter::new(writer);
    let result = writer.write_file(file)?;
    writer.flush()?;
    Ok(result.bytes_written)
}

/// Encode a GGUF file into a byte vector
pub fn encode(file: &GGUFFile) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(file.encoded_len()? as usize);
    encode_to(file, &mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gguf::file::TensorPayload;

    fn tiny() -> GGUFFile {
        let mut metadata = Metadata::new();
        metadata.insert("general.architecture", "llama");
        GGUFFile::new(metadata, vec![TensorDescriptor::new("test.weight.0", 2, vec![64, 128], 0)])
            .unwrap()
    }

    #[test]
    fn test_section_order_enforced() {
        let mut writer = GGUFWriter::new(Vec::new());
        assert!(writer.write_metadata(&Metadata::new()).is_err());
        assert!(writer.write_tensor_descriptors(&[]).is_err());
        assert!(writer.write_zeroed_data(4).is_err());

        writer.write_header(&GGUFHeader::new(0, 0)).unwrap();
        assert!(writer.write_header(&GGUFHeader::new(0, 0)).is_err());

        writer.align_for_tensor_data(32).unwrap();
        assert!(writer.align_for_tensor_data(32).is_err());
    }

    #[test]
    fn test_position_tracks_output() {
        let file = tiny();
        let mut writer = GGUFWriter::new(Vec::new());
        let result = writer.write_file(&file).unwrap();
        let bytes = writer.finalize().unwrap();

        assert_eq!(result.bytes_written, bytes.len() as u64);
        assert_eq!(result.final_position, 122);
        assert_eq!(file.encoded_len().unwrap(), 122);
    }

    #[test]
    fn test_alignment_padding_is_zero() {
        let file = tiny().with_payload(TensorPayload::aligned_default()).unwrap();
        let bytes = encode(&file).unwrap();

        // 122 bytes of descriptors padded to 128, then 4608 bytes of Q4_0 data
        assert_eq!(bytes.len(), 128 + 4_608);
        assert!(bytes[122..].iter().all(|&b| b == 0));
        assert_eq!(bytes.len() as u64, file.encoded_len().unwrap());
    }

    #[test]
    fn test_contiguous_payload_follows_descriptors() {
        let file = tiny().with_payload(TensorPayload::Contiguous).unwrap();
        let bytes = encode(&file).unwrap();
        assert_eq!(bytes.len(), 122 + 4_608);
    }

    /// Sink that rejects every write
    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_io_error() {
        let result = encode_to(&tiny(), BrokenSink);
        assert!(matches!(result, Err(FixtureError::Io(_))));

        let aligned = tiny().with_payload(TensorPayload::aligned_default()).unwrap();
        assert!(matches!(encode_to(&aligned, BrokenSink), Err(FixtureError::Io(_))));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let file = tiny();
        assert_eq!(encode(&file).unwrap(), encode(&file).unwrap());
    }
}
