use crate::expr::{Literal, Term, VariableLiteral};
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SimpleBaseType {
    Bit,
    Byte,
    Uint,
    Int,
    Float,
    Ufloat,
    String,
    Vstring,
    Time,
    Date,
    Datetime,
}

impl SimpleBaseType {
    pub fn keyword(&self) -> &'static str {
        match self {
            SimpleBaseType::Bit => "bit",
            SimpleBaseType::Byte => "byte",
            SimpleBaseType::Uint => "uint",
            SimpleBaseType::Int => "int",
            SimpleBaseType::Float => "float",
            SimpleBaseType::Ufloat => "ufloat",
            SimpleBaseType::String => "string",
            SimpleBaseType::Vstring => "vstring",
            SimpleBaseType::Time => "time",
            SimpleBaseType::Date => "date",
            SimpleBaseType::Datetime => "datetime",
        }
    }

    /* Width implied by the kind when none is declared */
    fn implied_bits(&self) -> u32 {
        match self {
            SimpleBaseType::Bit => 1,
            SimpleBaseType::Byte => 8,
            _ => 0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct SimpleTypeReference {
    pub base_type: SimpleBaseType,
    #[serde(default)]
    pub size_in_bits: u32,
    /// Length in bits of a variable-length string.
    #[serde(default)]
    pub length: Option<Term>,
}

impl SimpleTypeReference {
    pub fn new(base_type: SimpleBaseType, size_in_bits: u32) -> Self {
        Self {
            base_type,
            size_in_bits,
            length: None,
        }
    }

    pub fn bit() -> Self {
        Self::new(SimpleBaseType::Bit, 1)
    }

    pub fn byte() -> Self {
        Self::new(SimpleBaseType::Byte, 8)
    }

    pub fn uint(bits: u32) -> Self {
        Self::new(SimpleBaseType::Uint, bits)
    }

    pub fn int(bits: u32) -> Self {
        Self::new(SimpleBaseType::Int, bits)
    }

    pub fn float(bits: u32) -> Self {
        Self::new(SimpleBaseType::Float, bits)
    }

    pub fn string(bits: u32) -> Self {
        Self::new(SimpleBaseType::String, bits)
    }

    pub fn vstring(length: Term) -> Self {
        Self {
            base_type: SimpleBaseType::Vstring,
            size_in_bits: 0,
            length: Some(length),
        }
    }

    /// Declared width, falling back to the width implied by `bit` and `byte`.
    pub fn bits(&self) -> u32 {
        if self.size_in_bits == 0 {
            self.base_type.implied_bits()
        } else {
            self.size_in_bits
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self.base_type,
            SimpleBaseType::String | SimpleBaseType::Vstring
        )
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ComplexTypeReference {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Term>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ArrayTypeReference {
    pub element_type: Box<TypeReference>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum TypeReference {
    Simple(SimpleTypeReference),
    Complex(ComplexTypeReference),
    Array(ArrayTypeReference),
}

impl TypeReference {
    pub fn complex(name: impl Into<String>) -> Self {
        TypeReference::Complex(ComplexTypeReference {
            name: name.into(),
            params: Vec::new(),
        })
    }

    pub fn complex_with(name: impl Into<String>, params: Vec<Term>) -> Self {
        TypeReference::Complex(ComplexTypeReference {
            name: name.into(),
            params,
        })
    }

    pub fn array_of(element: TypeReference) -> Self {
        TypeReference::Array(ArrayTypeReference {
            element_type: Box::new(element),
        })
    }

    pub fn as_simple(&self) -> Option<&SimpleTypeReference> {
        match self {
            TypeReference::Simple(simple) => Some(simple),
            _ => None,
        }
    }

    pub fn complex_name(&self) -> Option<&str> {
        match self {
            TypeReference::Complex(complex) => Some(&complex.name),
            _ => None,
        }
    }

    /// Short human-readable description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TypeReference::Simple(simple) => {
                format!("{} {}", simple.base_type.keyword(), simple.bits())
            }
            TypeReference::Complex(complex) => complex.name.clone(),
            TypeReference::Array(array) => format!("{}[]", array.element_type.describe()),
        }
    }
}

impl From<SimpleTypeReference> for TypeReference {
    fn from(simple: SimpleTypeReference) -> Self {
        TypeReference::Simple(simple)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Argument {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeReference,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum ArrayLoop {
    /// Loop term is the number of elements.
    Count,
    /// Loop term is the number of bytes the elements occupy.
    Length,
    /// Loop term is a predicate that ends the array once it holds.
    Terminated,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ConstField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeReference,
    pub value: Literal,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ReservedField {
    #[serde(rename = "type")]
    pub type_ref: TypeReference,
    pub reference_value: Literal,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct SimpleField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeReference,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ArrayField {
    pub name: String,
    /// Element type.
    #[serde(rename = "type")]
    pub type_ref: TypeReference,
    pub loop_type: ArrayLoop,
    pub loop_expression: Term,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct OptionalField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeReference,
    #[serde(default)]
    pub condition: Option<Term>,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ImplicitField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeReference,
    pub serialize_expression: Term,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ChecksumField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeReference,
    pub checksum_expression: Term,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct DiscriminatorField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeReference,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum CaseValue {
    Wildcard,
    Value(Literal),
    /// Name of a constant of the discriminator's enum type.
    Constant(String),
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct SwitchCase {
    pub name: String,
    #[serde(default)]
    pub values: Vec<CaseValue>,
    /// Extra data-dependent condition that disambiguates otherwise equal tuples.
    #[serde(default)]
    pub condition: Option<Term>,
    #[serde(default)]
    pub parser_arguments: Vec<Argument>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct SwitchField {
    pub discriminators: Vec<VariableLiteral>,
    pub cases: Vec<SwitchCase>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ManualField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeReference,
    pub parse_expression: Term,
    pub serialize_expression: Term,
    pub length_expression: Term,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct VirtualField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeReference,
    pub value_expression: Term,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum Field {
    Const(ConstField),
    Reserved(ReservedField),
    Simple(SimpleField),
    Array(ArrayField),
    Optional(OptionalField),
    Implicit(ImplicitField),
    Checksum(ChecksumField),
    Discriminator(DiscriminatorField),
    Switch(SwitchField),
    Manual(ManualField),
    Virtual(VirtualField),
}

impl Field {
    pub fn name(&self) -> Option<&str> {
        match self {
            Field::Const(f) => Some(&f.name),
            Field::Simple(f) => Some(&f.name),
            Field::Array(f) => Some(&f.name),
            Field::Optional(f) => Some(&f.name),
            Field::Implicit(f) => Some(&f.name),
            Field::Checksum(f) => Some(&f.name),
            Field::Discriminator(f) => Some(&f.name),
            Field::Manual(f) => Some(&f.name),
            Field::Virtual(f) => Some(&f.name),
            Field::Reserved(_) | Field::Switch(_) => None,
        }
    }

    pub fn type_ref(&self) -> Option<&TypeReference> {
        match self {
            Field::Const(f) => Some(&f.type_ref),
            Field::Reserved(f) => Some(&f.type_ref),
            Field::Simple(f) => Some(&f.type_ref),
            Field::Array(f) => Some(&f.type_ref),
            Field::Optional(f) => Some(&f.type_ref),
            Field::Implicit(f) => Some(&f.type_ref),
            Field::Checksum(f) => Some(&f.type_ref),
            Field::Discriminator(f) => Some(&f.type_ref),
            Field::Manual(f) => Some(&f.type_ref),
            Field::Virtual(f) => Some(&f.type_ref),
            Field::Switch(_) => None,
        }
    }

    pub fn encoding(&self) -> Option<&str> {
        match self {
            Field::Simple(f) => f.encoding.as_deref(),
            Field::Array(f) => f.encoding.as_deref(),
            Field::Optional(f) => f.encoding.as_deref(),
            Field::Manual(f) => f.encoding.as_deref(),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Const(_) => "const",
            Field::Reserved(_) => "reserved",
            Field::Simple(_) => "simple",
            Field::Array(_) => "array",
            Field::Optional(_) => "optional",
            Field::Implicit(_) => "implicit",
            Field::Checksum(_) => "checksum",
            Field::Discriminator(_) => "discriminator",
            Field::Switch(_) => "switch",
            Field::Manual(_) => "manual",
            Field::Virtual(_) => "virtual",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ComplexTypeDefinition {
    pub name: String,
    #[serde(default)]
    pub parser_arguments: Vec<Argument>,
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Set on discriminated children.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub discriminator_values: Vec<CaseValue>,
    #[serde(default)]
    pub condition: Option<Term>,
}

impl ComplexTypeDefinition {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            parser_arguments: Vec::new(),
            fields,
            parent: None,
            discriminator_values: Vec::new(),
            condition: None,
        }
    }

    pub fn with_arguments(mut self, arguments: Vec<Argument>) -> Self {
        self.parser_arguments = arguments;
        self
    }

    pub fn switch_field(&self) -> Option<&SwitchField> {
        self.fields.iter().find_map(|field| match field {
            Field::Switch(switch) => Some(switch),
            _ => None,
        })
    }

    /// Types with a switch are abstract: a concrete instance is always one of the cases.
    pub fn is_abstract(&self) -> bool {
        self.switch_field().is_some()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name() == Some(name))
    }

    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.parser_arguments.iter().find(|arg| arg.name == name)
    }

    pub fn discriminator_fields(&self) -> impl Iterator<Item = &DiscriminatorField> {
        self.fields.iter().filter_map(|field| match field {
            Field::Discriminator(discriminator) => Some(discriminator),
            _ => None,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct EnumValue {
    pub name: String,
    /// Backing value in source spelling (`0x01`, `7`).
    pub value: String,
    #[serde(default)]
    pub constants: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct EnumTypeDefinition {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_ref: Option<TypeReference>,
    pub values: Vec<EnumValue>,
    /// Names and types of the extra per-constant fields.
    #[serde(default)]
    pub constant_types: Vec<Argument>,
}

impl EnumTypeDefinition {
    pub fn value(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|value| value.name == name)
    }

    pub fn constant_type(&self, name: &str) -> Option<&Argument> {
        self.constant_types.iter().find(|arg| arg.name == name)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct AnyDataTypeDefinition {
    pub name: String,
    #[serde(default)]
    pub parser_arguments: Vec<Argument>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum TypeDefinition {
    ComplexType(ComplexTypeDefinition),
    EnumType(EnumTypeDefinition),
    AnyDataType(AnyDataTypeDefinition),
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::ComplexType(def) => &def.name,
            TypeDefinition::EnumType(def) => &def.name,
            TypeDefinition::AnyDataType(def) => &def.name,
        }
    }

    pub fn parser_arguments(&self) -> &[Argument] {
        match self {
            TypeDefinition::ComplexType(def) => &def.parser_arguments,
            TypeDefinition::AnyDataType(def) => &def.parser_arguments,
            TypeDefinition::EnumType(_) => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implied_bits() {
        assert_eq!(SimpleTypeReference::new(SimpleBaseType::Bit, 0).bits(), 1);
        assert_eq!(SimpleTypeReference::new(SimpleBaseType::Byte, 0).bits(), 8);
        assert_eq!(SimpleTypeReference::uint(12).bits(), 12);
    }

    #[test]
    fn test_complex_type_from_yaml() {
        let yaml = r#"
complex-type:
  name: TPKTPacket
  fields:
    - const:
        name: protocolId
        type:
          simple:
            base-type: uint
            size-in-bits: 8
        value:
          hex: "0x03"
    - reserved:
        type:
          simple:
            base-type: uint
            size-in-bits: 8
        reference-value:
          hex: "0x00"
    - implicit:
        name: len
        type:
          simple:
            base-type: uint
            size-in-bits: 16
        serialize-expression:
          binary:
            op: "+"
            a:
              variable:
                name: lengthInBytes
            b:
              literal:
                numeric: 4
"#;
        let def: TypeDefinition = serde_yml::with::singleton_map_recursive::deserialize(
            serde_yml::Deserializer::from_str(yaml),
        )
        .expect("type should parse");

        let TypeDefinition::ComplexType(complex) = def else {
            panic!("expected complex type");
        };
        assert_eq!(complex.name, "TPKTPacket");
        assert_eq!(complex.fields.len(), 3);
        assert_eq!(complex.fields[0].label(), "const");
        assert_eq!(complex.fields[1].name(), None);
        assert!(!complex.is_abstract());
        assert!(complex.field("len").is_some());
    }

    #[test]
    fn test_abstract_detection() {
        let def = ComplexTypeDefinition::new(
            "S7Message",
            vec![Field::Switch(SwitchField {
                discriminators: vec![VariableLiteral::new("messageType")],
                cases: Vec::new(),
            })],
        );
        assert!(def.is_abstract());
    }
}
