pub mod c;
pub mod c_gen;
pub mod go;
pub mod go_gen;
pub mod shared;

use crate::spec::TypeRegistry;
use clap::ValueEnum;
use mspec_types::{TypeDefinition, TypeReference};
use rayon::prelude::*;
use shared::plan::{PlanSet, TypeArtifact};
use shared::{GenerationError, TargetType, TypeContext, TypeMapper};
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const OUTPUT_DIR: &str = "generated";

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Default)]
pub enum Backend {
    /* plc4c flavoured C */
    C,
    /* plc4go flavoured Go */
    #[default]
    Go,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::C => "c",
            Backend::Go => "go",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub backend: Backend,
    /* overrides the protocol named by the specification files */
    pub protocol: Option<String>,
    pub flavor: Option<String>,
    pub output_dir: PathBuf,
    /* constant tables of enum types are part of their plans */
    pub emit_enum_constants: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            protocol: None,
            flavor: None,
            output_dir: PathBuf::from(OUTPUT_DIR),
            emit_enum_constants: true,
        }
    }
}

/// Maps a declared type reference to the backend's type name.
pub fn type_name_for(
    backend: Backend,
    ctx: &TypeContext<'_>,
    type_ref: &TypeReference,
) -> Result<TargetType, GenerationError> {
    match backend {
        Backend::C => c_gen::CBackend.type_name_for(ctx, type_ref),
        Backend::Go => go_gen::GoBackend.type_name_for(ctx, type_ref),
    }
}

/// Outcome of a batch run. A failing type never stops the others.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub backend: Backend,
    pub protocol: String,
    pub flavor: String,
    /// Artifacts of the types that compiled, in registry order.
    pub artifacts: Vec<TypeArtifact>,
    pub failures: Vec<GenerationError>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn artifact(&self, type_name: &str) -> Option<&TypeArtifact> {
        self.artifacts
            .iter()
            .find(|artifact| artifact.type_name == type_name)
    }

    pub fn failure(&self, type_name: &str) -> Option<&GenerationError> {
        self.failures
            .iter()
            .find(|failure| failure.type_name == type_name)
    }

    pub fn plan_set(&self, artifacts: Vec<TypeArtifact>) -> PlanSet {
        PlanSet::new(self.backend.name(), &self.protocol, &self.flavor, artifacts)
    }
}

/// Compiles every type of the registry for one backend. Types compile in
/// parallel; results keep registry order.
pub fn generate_all(registry: &TypeRegistry, options: &GeneratorOptions) -> GenerationReport {
    let registry = if options.protocol.is_some() || options.flavor.is_some() {
        Cow::Owned(
            registry
                .clone()
                .with_naming(options.protocol.clone(), options.flavor.clone()),
        )
    } else {
        Cow::Borrowed(registry)
    };
    let registry: &TypeRegistry = &registry;

    tracing::info!(
        backend = options.backend.name(),
        protocol = registry.protocol(),
        flavor = registry.flavor(),
        types = registry.len(),
        "generating plans"
    );

    let types: Vec<&TypeDefinition> = registry.iter().collect();
    let results: Vec<Result<TypeArtifact, GenerationError>> = match options.backend {
        Backend::C => {
            let generator = c::CCodeGenerator::new(
                registry,
                c::CCodeGeneratorOptions {
                    emit_enum_constants: options.emit_enum_constants,
                },
            );
            types.par_iter().map(|&def| generator.generate_type(def)).collect()
        }
        Backend::Go => {
            let generator = go::GoCodeGenerator::new(
                registry,
                go::GoCodeGeneratorOptions {
                    emit_enum_constants: options.emit_enum_constants,
                },
            );
            types.par_iter().map(|&def| generator.generate_type(def)).collect()
        }
    };

    let mut report = GenerationReport {
        backend: options.backend,
        protocol: registry.protocol().to_string(),
        flavor: registry.flavor().to_string(),
        ..GenerationReport::default()
    };
    for result in results {
        match result {
            Ok(artifact) => report.artifacts.push(artifact),
            Err(err) => {
                tracing::warn!(type_name = %err.type_name, error = %err, "type generation failed");
                report.failures.push(err);
            }
        }
    }
    tracing::info!(
        artifacts = report.artifacts.len(),
        failures = report.failures.len(),
        "generation finished"
    );
    report
}

/// Writes `<dir>/<backend>/<Type>.plan.json` for every artifact of the report.
pub fn write_plans(report: &GenerationReport, output_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let dir = output_dir.join(report.backend.name());
    fs::create_dir_all(&dir)?;
    let mut written = Vec::with_capacity(report.artifacts.len());
    for artifact in &report.artifacts {
        let path = dir.join(format!("{}.plan.json", artifact.type_name));
        let json = serde_json::to_string_pretty(artifact).map_err(io::Error::other)?;
        fs::write(&path, json)?;
        tracing::debug!(path = %path.display(), "wrote plan");
        written.push(path);
    }
    tracing::info!(dir = %dir.display(), files = written.len(), "plans written");
    Ok(written)
}
