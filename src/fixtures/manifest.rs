//! TOML fixture manifests
//!
//! ```toml
//! [[gguf]]
//! name = "tiny"
//! file = "tiny.gguf"
//! payload = "header_only"          # or "contiguous", or { aligned = 64 }
//! metadata = [
//!     { key = "general.architecture", value = { type = "string", value = "llama" } },
//! ]
//!
//! [[gguf.tensors]]
//! name = "test.weight.0"
//! dtype = 2                        # ggml type code
//! shape = [64, 128]
//! offset = 0                       # omit to place after the previous tensor
//!
//! [[safetensors]]
//! name = "tiny-safetensors"
//! file = "tiny.safetensors"
//!
//! [[safetensors.tensors]]
//! name = "test.weight.0"
//! dtype = "F32"
//! shape = [64, 128]
//! data_offsets = [0, 32768]        # omit to pack after the previous tensor
//! ```
//!
//! GGUF fixtures are generated before safetensors fixtures, each group in
//! declaration order.

use crate::builder::{GGUFBuilder, SafetensorsBuilder};
use crate::error::{FixtureError, Result};
use crate::fixtures::{check_file_name, Fixture};
use crate::format::constants::GGUF_VERSION;
use crate::format::types::GGUFTensorType;
use crate::gguf::{MetadataEntry, TensorDescriptor, TensorPayload};
use crate::safetensors::{Dtype, SafetensorsTensorEntry};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureManifest {
    #[serde(default)]
    pub gguf: Vec<GgufFixtureEntry>,
    #[serde(default)]
    pub safetensors: Vec<SafetensorsFixtureEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GgufFixtureEntry {
    pub name: String,
    pub file: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub payload: TensorPayload,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
    #[serde(default)]
    pub tensors: Vec<GgufManifestTensor>,
}

fn default_version() -> u32 {
    GGUF_VERSION
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GgufManifestTensor {
    pub name: String,
    pub dtype: u32,
    pub shape: Vec<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SafetensorsFixtureEntry {
    pub name: String,
    pub file: String,
    /// Written under `__metadata__` in key order
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub tensors: Vec<SafetensorsManifestTensor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SafetensorsManifestTensor {
    pub name: String,
    pub dtype: Dtype,
    pub shape: Vec<u64>,
    pub data_offsets: Option<[u64; 2]>,
}

impl GgufFixtureEntry {
    fn into_fixture(self) -> Result<Fixture> {
        let mut builder = GGUFBuilder::new().version(self.version).payload(self.payload);
        for entry in self.metadata {
            builder = builder.add_metadata(entry.key, entry.value);
        }

        for tensor in self.tensors {
            builder = match tensor.offset {
                Some(offset) => builder.add_descriptor(TensorDescriptor::new(
                    tensor.name,
                    tensor.dtype,
                    tensor.shape,
                    offset,
                )),
                None => {
                    let tensor_type = GGUFTensorType::from_u32(tensor.dtype).ok_or_else(|| {
                        FixtureError::InvalidTensorData(format!(
                            "Tensor '{}' has unknown dtype code {} and no explicit offset",
                            tensor.name, tensor.dtype
                        ))
                    })?;
                    builder.add_tensor(tensor.name, tensor_type, tensor.shape)?
                }
            };
        }

        Ok(Fixture::gguf(self.name, self.file, builder.build()?))
    }
}

impl SafetensorsFixtureEntry {
    fn into_fixture(self) -> Result<Fixture> {
        let mut builder = SafetensorsBuilder::new();
        for (key, value) in self.metadata {
            builder = builder.add_metadata(key, value);
        }

        for tensor in self.tensors {
            builder = match tensor.data_offsets {
                Some([start, end]) => builder.add_entry(SafetensorsTensorEntry::new(
                    tensor.name,
                    tensor.dtype,
                    tensor.shape,
                    (start, end),
                )),
                None => builder.add_tensor(tensor.name, tensor.dtype, tensor.shape)?,
            };
        }

        Ok(Fixture::safetensors(self.name, self.file, builder.build()?))
    }
}

impl FixtureManifest {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let manifest = Self::from_toml_str(&source)?;
        debug!(
            path = %path.display(),
            gguf = manifest.gguf.len(),
            safetensors = manifest.safetensors.len(),
            "loaded fixture manifest"
        );
        Ok(manifest)
    }

    pub fn len(&self) -> usize {
        self.gguf.len() + self.safetensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate every entry and turn it into a fixture
    pub fn into_fixtures(self) -> Result<Vec<Fixture>> {
        let mut fixtures = Vec::with_capacity(self.len());
        for entry in self.gguf {
            fixtures.push(entry.into_fixture()?);
        }
        for entry in self.safetensors {
            fixtures.push(entry.into_fixture()?);
        }

        let mut files = HashSet::with_capacity(fixtures.len());
        for fixture in &fixtures {
            check_file_name(&fixture.file_name)?;
            if !files.insert(fixture.file_name.as_str()) {
                return Err(FixtureError::Format(format!(
                    "Fixture file '{}' is declared more than once",
                    fixture.file_name
                )));
            }
        }

        Ok(fixtures)
    }
}
