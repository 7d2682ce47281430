/* Codegen command - compile specification files into generation plans */

use super::common::load_registry;
use mspec_gen::codegen::{generate_all, write_plans, Backend, GeneratorOptions};
use std::path::PathBuf;

/* Execute the codegen command */
pub fn run(
  files: Vec<PathBuf>,
  backend: Backend,
  output_dir: PathBuf,
  protocol: Option<String>,
  flavor: Option<String>,
  verbose: bool,
) -> anyhow::Result<()> {
  if verbose {
    println!("mspec-gen - Protocol Message Compiler");
    println!("=====================================\n");
    println!("[~] Configuration:");
    println!("  Backend: {}", backend.name());
    println!("  Output directory: {}", output_dir.display());
    println!("  Input files: {}", files.len());
    for file in &files {
      println!("    - {}", file.display());
    }
    println!();
  }

  let registry = load_registry(&files, verbose)?;

  let options = GeneratorOptions {
    backend,
    protocol,
    flavor,
    output_dir,
    ..GeneratorOptions::default()
  };
  let report = generate_all(&registry, &options);

  /* Types that compiled are written even when others failed */
  let written = write_plans(&report, &options.output_dir)?;
  if verbose {
    println!("[~] Wrote {} plan file(s):", written.len());
    for path in &written {
      println!("    - {}", path.display());
    }
    println!();
  }

  if !report.is_success() {
    eprintln!("[!] {} type(s) failed to generate:", report.failures.len());
    for failure in &report.failures {
      eprintln!("    - {}", failure);
    }
    anyhow::bail!(
      "generation failed for {} of {} type(s)",
      report.failures.len(),
      registry.len()
    );
  }

  println!(
    "[✓] Generated {} plan(s) for {} ({}) into {}",
    report.artifacts.len(),
    report.protocol,
    backend.name(),
    options.output_dir.join(backend.name()).display()
  );
  Ok(())
}
