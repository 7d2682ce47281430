/* Compilation context for one type */

use super::errors::{GenerationError, GenerationErrorKind};
use crate::spec::TypeRegistry;
use mspec_types::{Argument, ComplexTypeDefinition, Field};

pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Which side of the codec an expression is compiled for. Parse reads into
/// locals, serialize reads from an already-built instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Parse,
    Serialize,
}

#[derive(Debug, Clone, Copy)]
pub struct TypeContext<'a> {
    pub registry: &'a TypeRegistry,
    /// Name of the type being compiled, used in diagnostics.
    pub type_name: &'a str,
    pub this_type: Option<&'a ComplexTypeDefinition>,
    /// Discriminated case whose fields are compiled inline.
    pub case: Option<&'a ComplexTypeDefinition>,
    pub field: Option<&'a Field>,
}

impl<'a> TypeContext<'a> {
    pub fn for_type(registry: &'a TypeRegistry, def: &'a ComplexTypeDefinition) -> Self {
        Self {
            registry,
            type_name: &def.name,
            this_type: Some(def),
            case: None,
            field: None,
        }
    }

    /* Context for enum and any-data types, which have no fields to resolve */
    pub fn for_name(registry: &'a TypeRegistry, type_name: &'a str) -> Self {
        Self {
            registry,
            type_name,
            this_type: None,
            case: None,
            field: None,
        }
    }

    pub fn with_field(self, field: &'a Field) -> Self {
        Self {
            field: Some(field),
            ..self
        }
    }

    pub fn in_case(self, case: &'a ComplexTypeDefinition) -> Self {
        Self {
            case: Some(case),
            ..self
        }
    }

    pub fn field_name(&self) -> Option<&'a str> {
        self.field.and_then(Field::name)
    }

    pub fn encoding(&self) -> &'a str {
        self.field
            .and_then(Field::encoding)
            .unwrap_or(DEFAULT_ENCODING)
    }

    pub fn fail(&self, construct: impl Into<String>, kind: GenerationErrorKind) -> GenerationError {
        GenerationError {
            type_name: self.case.map(|case| case.name.as_str()).unwrap_or(self.type_name).to_string(),
            field: self.field_name().map(str::to_string),
            construct: construct.into(),
            kind,
        }
    }

    /// Types searched for names, innermost first: the active case, the type
    /// itself, then its ancestors.
    pub fn scopes(&self) -> Vec<&'a ComplexTypeDefinition> {
        let mut scopes: Vec<&'a ComplexTypeDefinition> = Vec::new();
        let mut push = |def: &'a ComplexTypeDefinition| {
            if !scopes.iter().any(|seen| seen.name == def.name) {
                scopes.push(def);
            }
        };
        if let Some(case) = self.case {
            push(case);
            /* enclosing cases of a nested switch */
            for parent in self.registry.parent_chain(&case.name) {
                push(parent);
            }
        }
        if let Some(this_type) = self.this_type {
            push(this_type);
            for parent in self.registry.parent_chain(&this_type.name) {
                push(parent);
            }
        }
        scopes
    }

    pub fn lookup_field(&self, name: &str) -> Option<(&'a ComplexTypeDefinition, &'a Field)> {
        self.scopes()
            .into_iter()
            .find_map(|scope| scope.field(name).map(|field| (scope, field)))
    }

    pub fn lookup_argument(&self, name: &str) -> Option<(&'a ComplexTypeDefinition, &'a Argument)> {
        self.scopes()
            .into_iter()
            .find_map(|scope| scope.argument(name).map(|arg| (scope, arg)))
    }

    /// Root of the discriminated hierarchy the current type belongs to.
    pub fn root_type(&self) -> Option<&'a ComplexTypeDefinition> {
        self.this_type.map(|def| self.registry.root_of(def))
    }
}
