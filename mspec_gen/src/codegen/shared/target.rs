/* Type mapping seam shared by the backends */

use super::context::TypeContext;
use super::errors::{GenerationError, GenerationErrorKind};
use super::imports::Imports;
use mspec_types::{SimpleTypeReference, TypeReference};
use serde_derive::{Deserialize, Serialize};

/// A backend type name and the imports it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Imports::is_empty")]
    pub imports: Imports,
}

impl TargetType {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            imports: Imports::new(),
        }
    }

    pub fn with_import(name: impl Into<String>, import: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            imports: Imports::single(import),
        }
    }
}

pub trait TypeMapper {
    fn backend(&self) -> &'static str;

    fn type_name_for(
        &self,
        ctx: &TypeContext<'_>,
        type_ref: &TypeReference,
    ) -> Result<TargetType, GenerationError>;
}

/// Smallest native width covering `bits`: 8, 16, 32 or 64.
pub fn covering_width(bits: u32) -> Option<u32> {
    match bits {
        1..=8 => Some(8),
        9..=16 => Some(16),
        17..=32 => Some(32),
        33..=64 => Some(64),
        _ => None,
    }
}

pub fn unmappable(
    ctx: &TypeContext<'_>,
    backend: &'static str,
    simple: &SimpleTypeReference,
) -> GenerationError {
    ctx.fail(
        format!("{} {}", simple.base_type.keyword(), simple.bits()),
        GenerationErrorKind::UnmappableWidth {
            backend,
            kind: simple.base_type.keyword().to_string(),
            bits: simple.bits(),
        },
    )
}

pub fn unsupported_primitive(ctx: &TypeContext<'_>, simple: &SimpleTypeReference) -> GenerationError {
    ctx.fail(
        simple.base_type.keyword(),
        GenerationErrorKind::UnsupportedPrimitive(simple.base_type.keyword().to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covering_width() {
        assert_eq!(covering_width(1), Some(8));
        assert_eq!(covering_width(12), Some(16));
        assert_eq!(covering_width(16), Some(16));
        assert_eq!(covering_width(24), Some(32));
        assert_eq!(covering_width(64), Some(64));
        assert_eq!(covering_width(65), None);
        assert_eq!(covering_width(0), None);
    }
}
