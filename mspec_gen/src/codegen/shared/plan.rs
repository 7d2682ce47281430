//! Per-type generation plans shared by every backend.
//!
//! A plan is the compiler's complete output for one type: the backend type
//! name, a read and a write statement block per field, the imports those
//! blocks need and, for switch fields, the ordered dispatch table. Template
//! renderers consume plans directly or after JSON serialization.
//!
//! # Example
//! ```
//! use mspec_gen::codegen::shared::plan::*;
//!
//! let artifact = TypeArtifact::new("TPKTPacket", "TPKTPacket");
//! let plans = PlanSet::new("go", "s7", "read-write", vec![artifact]);
//!
//! assert_eq!(plans.version, PLAN_SCHEMA_VERSION);
//! assert_eq!(plans.types[0].type_name, "TPKTPacket");
//! assert!(plans.types[0].dispatch().is_none());
//! ```

use super::imports::Imports;
use super::target::TargetType;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema version used for every serialized plan export.
pub const PLAN_SCHEMA_VERSION: u32 = 1;

/// Container for the plans of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSet {
    /// Plan schema version (mirrors `PLAN_SCHEMA_VERSION`).
    pub version: u32,
    pub backend: String,
    pub protocol: String,
    pub flavor: String,
    /// Per-type plans in registry order.
    pub types: Vec<TypeArtifact>,
}

impl PlanSet {
    /// Creates a new plan container, automatically wiring the schema version.
    pub fn new(
        backend: impl Into<String>,
        protocol: impl Into<String>,
        flavor: impl Into<String>,
        types: Vec<TypeArtifact>,
    ) -> Self {
        Self {
            version: PLAN_SCHEMA_VERSION,
            backend: backend.into(),
            protocol: protocol.into(),
            flavor: flavor.into(),
            types,
        }
    }
}

/// Everything generated for a single type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeArtifact {
    /// Name as declared in the specification.
    pub type_name: String,
    /// Backend type name.
    pub target_type: String,
    /// Parent in the discriminated hierarchy, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Parser arguments with their backend types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentPlan>,
    #[serde(default)]
    pub fields: Vec<FieldPlan>,
    /// Union of every import the type's code needs.
    #[serde(default)]
    pub imports: Imports,
    /// Set when a checksum or `curPos` needs the start position recorded.
    #[serde(default)]
    pub requires_start_pos: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_constants: Vec<EnumConstantPlan>,
}

impl TypeArtifact {
    pub fn new(type_name: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            target_type: target_type.into(),
            parent: None,
            arguments: Vec::new(),
            fields: Vec::new(),
            imports: Imports::new(),
            requires_start_pos: false,
            enum_constants: Vec::new(),
        }
    }

    /// Appends field plans, folding their imports and start-position needs into the type.
    pub fn push_fields(&mut self, fields: Vec<FieldPlan>) {
        for field in fields {
            self.imports.merge(&field.imports);
            self.requires_start_pos |= field.requires_start_pos;
            self.fields.push(field);
        }
    }

    /// Dispatch table of the type's switch field.
    pub fn dispatch(&self) -> Option<&DispatchTable> {
        self.fields.iter().find_map(|field| field.dispatch.as_ref())
    }

    pub fn field(&self, name: &str) -> Option<&FieldPlan> {
        self.fields
            .iter()
            .find(|field| field.name.as_deref() == Some(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentPlan {
    pub name: String,
    pub target_type: TargetType,
}

/// Read and write statements for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPlan {
    /// `None` for reserved and switch fields.
    pub name: Option<String>,
    /// Field kind label (`simple`, `array`, ...).
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    /// Parse-side statement block.
    pub read: String,
    /// Serialize-side statement block.
    pub write: String,
    /// Contribution to the type's `length_in_bits`, as a statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_in_bits: Option<String>,
    /// Body of the derived accessor of a virtual field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchTable>,
    #[serde(default)]
    pub imports: Imports,
    #[serde(default)]
    pub requires_start_pos: bool,
}

impl FieldPlan {
    pub fn new(name: Option<&str>, kind: &str) -> Self {
        Self {
            name: name.map(str::to_string),
            kind: kind.to_string(),
            target_type: None,
            read: String::new(),
            write: String::new(),
            length_in_bits: None,
            accessor: None,
            dispatch: None,
            imports: Imports::new(),
            requires_start_pos: false,
        }
    }
}

/// Ordered case selection for a switch field. Cases are tried in
/// declaration order and the first full match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchTable {
    /// Parse-side expressions of the discriminators.
    pub discriminators: Vec<String>,
    pub cases: Vec<DispatchCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchCase {
    pub type_name: String,
    pub target_type: String,
    /// Rendered value per discriminator, `None` for a wildcard.
    pub values: Vec<Option<String>>,
    /// Full match condition, `None` when the case matches anything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Names passed to the case's parse function: parser arguments of the
    /// switching type followed by the case's own.
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Already-read parent fields handed to the case's continuation.
    #[serde(default)]
    pub forwarded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumConstantPlan {
    pub name: String,
    /// Backend constant identifier.
    pub target_name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constants: BTreeMap<String, String>,
}
