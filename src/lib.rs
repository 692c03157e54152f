//! # tensor-fixtures
//!
//! Deterministic encoders for the GGUF v3 and safetensors model file formats,
//! plus a small set of named fixture files used by model-loading tests.
//!
//! Every encoder is a pure function of a validated in-memory description:
//! the same description always produces the same bytes.
//!
//! ```rust
//! use tensor_fixtures::fixtures::{generate, standard_fixtures};
//! # fn main() -> tensor_fixtures::Result<()> {
//! let dir = std::env::temp_dir().join("tensor-fixtures-doc");
//! let generated = generate(&dir, &standard_fixtures()?)?;
//! assert_eq!(generated[0].size, 69);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod fixtures;
pub mod format;
pub mod gguf;
pub mod safetensors;

pub use error::{FixtureError, Result};

/// Commonly used items
pub mod prelude {
    pub use crate::builder::{GGUFBuilder, SafetensorsBuilder};
    pub use crate::error::{FixtureError, Result};
    pub use crate::fixtures::{generate, standard_fixtures, Fixture, GeneratedFixture};
    pub use crate::format::constants::{GGUF_DEFAULT_ALIGNMENT, GGUF_MAGIC, GGUF_VERSION};
    pub use crate::format::types::GGUFTensorType;
    pub use crate::gguf::{GGUFFile, Metadata, MetadataValue, TensorDescriptor, TensorPayload};
    pub use crate::safetensors::{Dtype, SafetensorsFile, SafetensorsTensorEntry};
}
