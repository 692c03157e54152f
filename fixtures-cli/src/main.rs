//! # fixtures-cli
//!
//! Writes the GGUF and safetensors test fixtures to disk and reports their sizes.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tensor_fixtures::fixtures::{generate, standard_fixtures, FixtureManifest};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fixtures-cli",
    version,
    about = "Generate GGUF and safetensors test fixtures"
)]
struct Cli {
    /// Directory the fixtures are written to
    #[arg(short, long, default_value = "tests/fixtures")]
    out_dir: PathBuf,

    /// TOML manifest to generate instead of the built-in fixtures
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let fixtures = match &cli.manifest {
        Some(path) => FixtureManifest::load(path)
            .and_then(|manifest| manifest.into_fixtures())
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?,
        None => standard_fixtures().context("Failed to build the built-in fixtures")?,
    };

    let generated = generate(&cli.out_dir, &fixtures)
        .with_context(|| format!("Failed to write fixtures to {}", cli.out_dir.display()))?;

    println!("Created test fixtures");
    for fixture in &generated {
        let file_name = fixture.path.file_name().unwrap_or(fixture.path.as_os_str());
        println!("{}: {} bytes", file_name.to_string_lossy(), fixture.size);
    }

    Ok(())
}
