/* Type registry - immutable name to definition mapping for one protocol */

use super::{SpecError, SpecFile};
use indexmap::IndexMap;
use mspec_types::{
    ComplexTypeDefinition, EnumTypeDefinition, Field, SwitchCase, TypeDefinition,
};

#[derive(Debug, Clone)]
pub struct TypeRegistry {
    protocol: String,
    flavor: String,
    types: IndexMap<String, TypeDefinition>,
}

impl TypeRegistry {
    pub fn new(protocol: impl Into<String>, flavor: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            flavor: flavor.into(),
            types: IndexMap::new(),
        }
    }

    /* Build a registry from one or more files of the same protocol */
    pub fn from_spec_files(files: &[SpecFile]) -> Result<Self, SpecError> {
        let first = files.first().ok_or(SpecError::Empty)?;
        let mut registry = TypeRegistry::new(first.protocol.clone(), first.flavor.clone());
        for file in files {
            if file.protocol != registry.protocol {
                return Err(SpecError::ProtocolMismatch {
                    found: file.protocol.clone(),
                    expected: registry.protocol.clone(),
                });
            }
            for def in &file.types {
                registry.add(def.clone())?;
            }
        }
        registry.validate()?;
        tracing::info!(
            protocol = %registry.protocol,
            flavor = %registry.flavor,
            types = registry.len(),
            "type registry populated"
        );
        Ok(registry)
    }

    pub fn with_naming(mut self, protocol: Option<String>, flavor: Option<String>) -> Self {
        if let Some(protocol) = protocol {
            self.protocol = protocol;
        }
        if let Some(flavor) = flavor {
            self.flavor = flavor;
        }
        self
    }

    /// Adds a definition. Switch cases of a complex type are registered as
    /// child types whose `parent` is the enclosing type, recursively.
    pub fn add(&mut self, def: TypeDefinition) -> Result<(), SpecError> {
        let children = match &def {
            TypeDefinition::ComplexType(complex) => collect_cases(complex),
            _ => Vec::new(),
        };
        self.insert(def)?;
        for child in children {
            self.add(TypeDefinition::ComplexType(child))?;
        }
        Ok(())
    }

    fn insert(&mut self, def: TypeDefinition) -> Result<(), SpecError> {
        let name = def.name().to_string();
        if self.types.contains_key(&name) {
            return Err(SpecError::DuplicateType(name));
        }
        tracing::trace!(type_name = %name, "registered type");
        self.types.insert(name, def);
        Ok(())
    }

    /* Every parent reference must name a complex type */
    pub fn validate(&self) -> Result<(), SpecError> {
        for def in self.types.values() {
            if let TypeDefinition::ComplexType(complex) = def {
                if let Some(parent) = &complex.parent {
                    if self.complex(parent).is_none() {
                        return Err(SpecError::UnknownParent {
                            child: complex.name.clone(),
                            parent: parent.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn flavor(&self) -> &str {
        &self.flavor
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn complex(&self, name: &str) -> Option<&ComplexTypeDefinition> {
        match self.types.get(name) {
            Some(TypeDefinition::ComplexType(def)) => Some(def),
            _ => None,
        }
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumTypeDefinition> {
        match self.types.get(name) {
            Some(TypeDefinition::EnumType(def)) => Some(def),
            _ => None,
        }
    }

    pub fn is_any_data(&self, name: &str) -> bool {
        matches!(self.types.get(name), Some(TypeDefinition::AnyDataType(_)))
    }

    /* Definitions in declaration order, switch cases right after their parent */
    pub fn iter(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    /// Ancestors of `name`, nearest first.
    pub fn parent_chain(&self, name: &str) -> Vec<&ComplexTypeDefinition> {
        let mut chain = Vec::new();
        let mut current = self.complex(name).and_then(|def| def.parent.as_deref());
        while let Some(parent_name) = current {
            let Some(parent) = self.complex(parent_name) else {
                break;
            };
            if chain.iter().any(|seen: &&ComplexTypeDefinition| seen.name == parent.name) {
                break;
            }
            chain.push(parent);
            current = parent.parent.as_deref();
        }
        chain
    }

    /// The topmost ancestor, or the type itself when it has no parent.
    pub fn root_of<'a>(&'a self, def: &'a ComplexTypeDefinition) -> &'a ComplexTypeDefinition {
        self.parent_chain(&def.name).last().copied().unwrap_or(def)
    }

    pub fn children_of(&self, name: &str) -> Vec<&ComplexTypeDefinition> {
        self.types
            .values()
            .filter_map(|def| match def {
                TypeDefinition::ComplexType(complex)
                    if complex.parent.as_deref() == Some(name) =>
                {
                    Some(complex)
                }
                _ => None,
            })
            .collect()
    }
}

fn collect_cases(parent: &ComplexTypeDefinition) -> Vec<ComplexTypeDefinition> {
    parent
        .fields
        .iter()
        .filter_map(|field| match field {
            Field::Switch(switch) => Some(switch),
            _ => None,
        })
        .flat_map(|switch| switch.cases.iter())
        .map(|case| case_to_type(&parent.name, case))
        .collect()
}

fn case_to_type(parent: &str, case: &SwitchCase) -> ComplexTypeDefinition {
    ComplexTypeDefinition {
        name: case.name.clone(),
        parser_arguments: case.parser_arguments.clone(),
        fields: case.fields.clone(),
        parent: Some(parent.to_string()),
        discriminator_values: case.values.clone(),
        condition: case.condition.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mspec_types::{CaseValue, Literal, SimpleField, SimpleTypeReference, SwitchField, VariableLiteral};

    fn message_with_cases() -> TypeDefinition {
        let case = |name: &str, value: &str| SwitchCase {
            name: name.to_string(),
            values: vec![CaseValue::Value(Literal::Hex(value.to_string()))],
            condition: None,
            parser_arguments: Vec::new(),
            fields: vec![Field::Simple(SimpleField {
                name: "payload".into(),
                type_ref: SimpleTypeReference::uint(8).into(),
                encoding: None,
            })],
        };
        TypeDefinition::ComplexType(ComplexTypeDefinition::new(
            "Message",
            vec![Field::Switch(SwitchField {
                discriminators: vec![VariableLiteral::new("kind")],
                cases: vec![case("Request", "0x01"), case("Response", "0x02")],
            })],
        ))
    }

    #[test]
    fn test_cases_become_children() {
        let mut registry = TypeRegistry::new("demo", "read-write");
        registry.add(message_with_cases()).expect("add should succeed");

        assert_eq!(registry.len(), 3);
        let names: Vec<&str> = registry.iter().map(|def| def.name()).collect();
        assert_eq!(names, vec!["Message", "Request", "Response"]);

        let request = registry.complex("Request").expect("child registered");
        assert_eq!(request.parent.as_deref(), Some("Message"));
        assert_eq!(registry.parent_chain("Request")[0].name, "Message");
        assert_eq!(registry.children_of("Message").len(), 2);
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut registry = TypeRegistry::new("demo", "read-write");
        registry.add(message_with_cases()).expect("first add should succeed");
        let err = registry.add(message_with_cases()).unwrap_err();
        assert!(matches!(err, SpecError::DuplicateType(name) if name == "Message"));
    }
}
