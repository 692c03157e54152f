//! Fixture variants and the generator that writes them to disk
//!
//! A [`Fixture`] pairs an output file name with a validated file description.
//! [`standard_fixtures`] returns the built-in set, [`manifest`] reads further
//! sets from TOML, and [`generate`] writes any set into a directory.

pub mod manifest;

use crate::builder::{GGUFBuilder, SafetensorsBuilder};
use crate::error::{FixtureError, Result};
use crate::format::types::GGUFTensorType;
use crate::gguf::{self, GGUFFile, TensorDescriptor};
use crate::safetensors::{self, Dtype, SafetensorsFile};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use manifest::FixtureManifest;

/// Name of the tensor every built-in fixture carries
pub const TEST_TENSOR_NAME: &str = "test.weight.0";

/// Encoded contents of a fixture
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureContent {
    Gguf(GGUFFile),
    Safetensors(SafetensorsFile),
}

/// One named fixture file
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub name: String,
    pub file_name: String,
    pub content: FixtureContent,
}

/// Result of writing one fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFixture {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

impl Fixture {
    pub fn gguf(name: impl Into<String>, file_name: impl Into<String>, file: GGUFFile) -> Self {
        Self { name: name.into(), file_name: file_name.into(), content: FixtureContent::Gguf(file) }
    }

    pub fn safetensors(
        name: impl Into<String>,
        file_name: impl Into<String>,
        file: SafetensorsFile,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            content: FixtureContent::Safetensors(file),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        match &self.content {
            FixtureContent::Gguf(file) => gguf::encode(file),
            FixtureContent::Safetensors(file) => safetensors::encode(file),
        }
    }

    pub fn encode_to<W: Write>(&self, writer: W) -> Result<u64> {
        match &self.content {
            FixtureContent::Gguf(file) => gguf::encode_to(file, writer),
            FixtureContent::Safetensors(file) => safetensors::encode_to(file, writer),
        }
    }

    pub fn encoded_len(&self) -> Result<u64> {
        match &self.content {
            FixtureContent::Gguf(file) => file.encoded_len(),
            FixtureContent::Safetensors(file) => file.encoded_len(),
        }
    }

    /// Write the fixture to `dir/<file_name>`, replacing any existing file
    pub fn write_to_dir(&self, dir: &Path) -> Result<GeneratedFixture> {
        check_file_name(&self.file_name)?;
        let path = dir.join(&self.file_name);

        {
            let file = File::create(&path)?;
            let mut writer = BufWriter::new(file);
            let written = self.encode_to(&mut writer)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            debug!(fixture = %self.name, bytes = written, "encoded fixture");
        }

        let size = fs::metadata(&path)?.len();
        info!(fixture = %self.name, path = %path.display(), size, "created fixture");
        Ok(GeneratedFixture { name: self.name.clone(), path, size })
    }
}

/// Fixture file names must stay inside the output directory
pub(crate) fn check_file_name(file_name: &str) -> Result<()> {
    let plain = Path::new(file_name)
        .file_name()
        .map(|name| name == file_name)
        .unwrap_or(false);
    if file_name.is_empty() || !plain {
        return Err(FixtureError::Format(format!(
            "Fixture file name '{}' must be a plain file name",
            file_name
        )));
    }
    Ok(())
}

/// `empty.gguf`: architecture metadata and no tensors
pub fn empty_gguf() -> Result<Fixture> {
    let file = GGUFBuilder::new().add_string("general.architecture", "llama").build()?;
    Ok(Fixture::gguf("empty", "empty.gguf", file))
}

/// `tiny.gguf`: one Q4_0 descriptor without tensor data.
///
/// The reference fixture script writes dtype code 0 here. A manifest entry
/// with `dtype = 0` reproduces its bytes exactly.
pub fn tiny_gguf() -> Result<Fixture> {
    let file = GGUFBuilder::new()
        .add_string("general.architecture", "llama")
        .add_descriptor(TensorDescriptor::typed(
            TEST_TENSOR_NAME,
            GGUFTensorType::Q4_0,
            vec![64, 128],
            0,
        ))
        .build()?;
    Ok(Fixture::gguf("tiny", "tiny.gguf", file))
}

/// `tiny.safetensors`: one zero-filled F32 tensor
pub fn tiny_safetensors() -> Result<Fixture> {
    let file =
        SafetensorsBuilder::new().add_tensor(TEST_TENSOR_NAME, Dtype::F32, vec![64, 128])?.build()?;
    Ok(Fixture::safetensors("tiny-safetensors", "tiny.safetensors", file))
}

/// The built-in fixtures, in generation order
pub fn standard_fixtures() -> Result<Vec<Fixture>> {
    Ok(vec![empty_gguf()?, tiny_gguf()?, tiny_safetensors()?])
}

/// Write every fixture into `dir`, creating it if needed; stops at the first failure
pub fn generate(dir: &Path, fixtures: &[Fixture]) -> Result<Vec<GeneratedFixture>> {
    fs::create_dir_all(dir)?;
    info!(dir = %dir.display(), count = fixtures.len(), "generating fixtures");

    fixtures.iter().map(|fixture| fixture.write_to_dir(dir)).collect()
}
