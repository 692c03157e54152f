//! Builder APIs for fixture descriptions
//!
//! Builders assign tensor offsets so callers only state names, types and shapes.

pub mod gguf_builder;
pub mod safetensors_builder;

pub use gguf_builder::GGUFBuilder;
pub use safetensors_builder::SafetensorsBuilder;
