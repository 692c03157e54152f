//! Safetensors encoder
//!
//! `header_len:u64 LE`, compact JSON header of `header_len` bytes, zero
//! padding to the next multiple of 8, then the zero-filled data block.

pub mod dtype;
pub mod file;
pub mod header;
pub mod writer;

pub use dtype::Dtype;
pub use file::SafetensorsFile;
pub use header::{SafetensorsHeader, SafetensorsTensorEntry};
pub use writer::{encode, encode_to, SafetensorsWriter};
