//! Format constants and magic numbers

/// Magic number for GGUF files ("GGUF" in little-endian byte order)
pub const GGUF_MAGIC: u32 = 0x4655_4747;

/// The magic as it appears on disk
pub const GGUF_MAGIC_BYTES: [u8; 4] = *b"GGUF";

/// GGUF format version written by the encoder
pub const GGUF_VERSION: u32 = 3;

/// Default alignment of the GGUF tensor data section (32 bytes)
pub const GGUF_DEFAULT_ALIGNMENT: usize = 32;

/// Metadata key a GGUF file uses to override the data alignment
pub const GGUF_ALIGNMENT_KEY: &str = "general.alignment";

/// Maximum number of dimensions accepted for a tensor descriptor
pub const GGUF_MAX_DIMENSIONS: usize = 8;

/// Size of the GGUF header in bytes (magic + version + tensor_count + metadata_kv_count)
pub const GGUF_HEADER_SIZE: usize = 4 + 4 + 8 + 8;

/// Size of the little-endian header length prefix of a safetensors file
pub const SAFETENSORS_LENGTH_PREFIX_SIZE: u64 = 8;

/// Alignment of the safetensors data block
pub const SAFETENSORS_ALIGNMENT: u64 = 8;

/// Reserved header key holding safetensors free-form metadata
pub const SAFETENSORS_METADATA_KEY: &str = "__metadata__";
