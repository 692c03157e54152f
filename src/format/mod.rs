//! On-disk contract shared by the encoders
//!
//! Magic numbers, type tags, little-endian primitive writers and alignment
//! arithmetic for the GGUF and safetensors layouts.

pub mod alignment;
pub mod constants;
pub mod endian;
pub mod types;

pub use alignment::*;
pub use constants::*;
pub use types::*;
