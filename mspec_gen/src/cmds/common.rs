/* Common utilities shared between analyze and codegen commands */

use anyhow::Context;
use mspec_gen::spec::{SpecFile, TypeRegistry};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/* RUST_LOG wins over the verbose flag */
pub fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  /* a subscriber installed by an embedding process stays in place */
  let _ = tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(filter)
    .try_init();
}

/* Load every specification file and build the type registry */
pub fn load_registry(files: &[PathBuf], verbose: bool) -> anyhow::Result<TypeRegistry> {
  let mut specs = Vec::with_capacity(files.len());
  for file in files {
    if verbose {
      println!("[~] Loading {}", file.display());
    }
    let spec = SpecFile::load(file).with_context(|| format!("loading {}", file.display()))?;
    specs.push(spec);
  }

  let registry = TypeRegistry::from_spec_files(&specs).context("building type registry")?;

  if verbose {
    println!("[~] Loaded {} type definitions", registry.len());
    for def in registry.iter() {
      println!("  - {}", def.name());
    }
    println!();
  }

  Ok(registry)
}
