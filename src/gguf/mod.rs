//! GGUF v3 encoder
//!
//! Layout (all integers little-endian):
//!
//! | field | type |
//! |---|---|
//! | magic | `"GGUF"` |
//! | version | u32 |
//! | tensor_count | u64 |
//! | metadata_count | u64 |
//! | metadata | `key_len:u64, key, tag:u32, value` per entry |
//! | descriptors | `name_len:u64, name, n_dims:u32, dims:u64*, dtype:u32, offset:u64` |
//! | data | optional, see [`TensorPayload`] |

pub mod file;
pub mod header;
pub mod metadata;
pub mod tensor;
pub mod writer;

pub use file::{GGUFFile, TensorPayload};
pub use header::GGUFHeader;
pub use metadata::{Metadata, MetadataEntry, MetadataValue};
pub use tensor::TensorDescriptor;
pub use writer::{encode, encode_to, GGUFWriter, WriteResult};
