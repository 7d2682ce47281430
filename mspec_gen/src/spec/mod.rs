pub mod file;
pub mod registry;

pub use file::SpecFile;
pub use registry::TypeRegistry;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yml::Error,
    },

    #[error("duplicate type definition: {0}")]
    DuplicateType(String),

    #[error("type '{child}' names unknown parent '{parent}'")]
    UnknownParent { child: String, parent: String },

    #[error("specification for protocol '{found}' mixed into a '{expected}' run")]
    ProtocolMismatch { found: String, expected: String },

    #[error("no specification files given")]
    Empty,
}
