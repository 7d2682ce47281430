/* Name resolution
 *
 * Classifies the root of a variable reference against the type being
 * compiled. First match wins:
 *   1. pseudo-names (buffers, curPos, _type, _value, lastItem, lengthIn*)
 *   2. declared fields and parser arguments of the case, type and ancestors,
 *      refined to a discriminator lookup when the child names a discriminator
 *      of the referenced complex type
 *   3. enum type names (constant references)
 *   4. the fixed built-in table
 *   5. implicit fields
 */

use super::context::TypeContext;
use super::errors::{GenerationError, GenerationErrorKind};
use mspec_types::{
    ComplexTypeDefinition, EnumTypeDefinition, Field, ImplicitField, TypeReference,
    VariableLiteral,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoName {
    ReadBuffer,
    WriteBuffer,
    CurPos,
    TypeMeta,
    SelfValue,
    LastItem,
    LengthInBits,
    LengthInBytes,
}

impl PseudoName {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "readBuffer" => Some(PseudoName::ReadBuffer),
            "writeBuffer" => Some(PseudoName::WriteBuffer),
            "curPos" => Some(PseudoName::CurPos),
            "_type" => Some(PseudoName::TypeMeta),
            "_value" => Some(PseudoName::SelfValue),
            "lastItem" => Some(PseudoName::LastItem),
            "lengthInBits" => Some(PseudoName::LengthInBits),
            "lengthInBytes" => Some(PseudoName::LengthInBytes),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltIn {
    Cast,
    StaticCall,
    Count,
    ArraySizeInBytes,
    Ceil,
    StrLen,
}

/* Closed keyword table; other upper-case names are ordinary identifiers */
const BUILT_INS: &[(&str, BuiltIn)] = &[
    ("CAST", BuiltIn::Cast),
    ("STATIC_CALL", BuiltIn::StaticCall),
    ("COUNT", BuiltIn::Count),
    ("ARRAY_SIZE_IN_BYTES", BuiltIn::ArraySizeInBytes),
    ("CEIL", BuiltIn::Ceil),
    ("STR_LEN", BuiltIn::StrLen),
];

impl BuiltIn {
    pub fn lookup(name: &str) -> Option<Self> {
        BUILT_INS
            .iter()
            .find(|(keyword, _)| *keyword == name)
            .map(|(_, built_in)| *built_in)
    }

    pub fn keyword(&self) -> &'static str {
        BUILT_INS
            .iter()
            .find(|(_, built_in)| built_in == self)
            .map(|(keyword, _)| *keyword)
            .unwrap_or("?")
    }

    /// Checks the argument count, returning the expected count on mismatch.
    pub fn check_arity(&self, found: usize) -> Result<(), &'static str> {
        match self {
            BuiltIn::Cast if found != 2 => Err("2"),
            BuiltIn::StaticCall if found == 0 => Err("at least 1"),
            BuiltIn::Count | BuiltIn::ArraySizeInBytes | BuiltIn::Ceil | BuiltIn::StrLen
                if found != 1 =>
            {
                Err("1")
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Scalar,
    Enum,
    Complex,
    AnyData,
    Array,
}

impl PropertyKind {
    pub fn of(ctx: &TypeContext<'_>, type_ref: &TypeReference) -> Result<Self, GenerationError> {
        match type_ref {
            TypeReference::Simple(_) => Ok(PropertyKind::Scalar),
            TypeReference::Array(_) => Ok(PropertyKind::Array),
            TypeReference::Complex(complex) => {
                if ctx.registry.enumeration(&complex.name).is_some() {
                    Ok(PropertyKind::Enum)
                } else if ctx.registry.complex(&complex.name).is_some() {
                    Ok(PropertyKind::Complex)
                } else if ctx.registry.is_any_data(&complex.name) {
                    Ok(PropertyKind::AnyData)
                } else {
                    Err(ctx.fail(
                        complex.name.clone(),
                        GenerationErrorKind::UnknownType(complex.name.clone()),
                    ))
                }
            }
        }
    }
}

/// A declared field or parser argument a name resolved to.
#[derive(Debug, Clone, Copy)]
pub struct Property<'a> {
    pub owner: &'a ComplexTypeDefinition,
    pub name: &'a str,
    /// `None` for parser arguments.
    pub field: Option<&'a Field>,
    pub type_ref: &'a TypeReference,
    pub kind: PropertyKind,
    pub optional: bool,
    /// Declared by a discriminated case rather than the root of the hierarchy.
    pub in_case: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum Classification<'a> {
    Pseudo(PseudoName),
    Field(Property<'a>),
    Argument(Property<'a>),
    /// `property.child` where child is a discriminator of the property's complex type.
    DiscriminatorAccess {
        property: Property<'a>,
        target: &'a ComplexTypeDefinition,
    },
    EnumConstant(&'a EnumTypeDefinition),
    BuiltIn(BuiltIn),
    Implicit {
        owner: &'a ComplexTypeDefinition,
        field: &'a ImplicitField,
    },
}

impl Classification<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Pseudo(_) => "pseudo",
            Classification::Field(_) => "field",
            Classification::Argument(_) => "argument",
            Classification::DiscriminatorAccess { .. } => "discriminator-access",
            Classification::EnumConstant(_) => "enum-constant",
            Classification::BuiltIn(_) => "built-in",
            Classification::Implicit { .. } => "implicit",
        }
    }
}

pub fn resolve<'a>(
    ctx: &TypeContext<'a>,
    literal: &VariableLiteral,
) -> Result<Classification<'a>, GenerationError> {
    let classification = classify(ctx, literal)?;
    tracing::trace!(
        type_name = ctx.type_name,
        name = %literal.dotted(),
        classification = classification.label(),
        "resolved name"
    );
    Ok(classification)
}

fn classify<'a>(
    ctx: &TypeContext<'a>,
    literal: &VariableLiteral,
) -> Result<Classification<'a>, GenerationError> {
    let name = literal.name.as_str();

    if let Some(pseudo) = PseudoName::lookup(name) {
        return Ok(Classification::Pseudo(pseudo));
    }

    let declared = ctx.lookup_field(name);
    if let Some((owner, field)) = declared {
        if !matches!(field, Field::Implicit(_)) {
            let property = field_property(ctx, owner, field, literal)?;
            return Ok(refine_discriminator(ctx, property, literal)
                .unwrap_or(Classification::Field(property)));
        }
    }

    if let Some((owner, argument)) = ctx.lookup_argument(name) {
        let property = Property {
            owner,
            name: &argument.name,
            field: None,
            type_ref: &argument.type_ref,
            kind: PropertyKind::of(ctx, &argument.type_ref)?,
            optional: false,
            in_case: owner.parent.is_some(),
        };
        return Ok(refine_discriminator(ctx, property, literal)
            .unwrap_or(Classification::Argument(property)));
    }

    if let Some(enumeration) = ctx.registry.enumeration(name) {
        return Ok(Classification::EnumConstant(enumeration));
    }

    if let Some(built_in) = BuiltIn::lookup(name) {
        return Ok(Classification::BuiltIn(built_in));
    }

    if let Some((owner, Field::Implicit(field))) = declared {
        return Ok(Classification::Implicit { owner, field });
    }

    Err(ctx.fail(
        literal.dotted(),
        GenerationErrorKind::UnresolvedName(name.to_string()),
    ))
}

fn field_property<'a>(
    ctx: &TypeContext<'a>,
    owner: &'a ComplexTypeDefinition,
    field: &'a Field,
    literal: &VariableLiteral,
) -> Result<Property<'a>, GenerationError> {
    let (Some(name), Some(type_ref)) = (field.name(), field.type_ref()) else {
        return Err(ctx.fail(
            literal.dotted(),
            GenerationErrorKind::UnsupportedConstruct(format!(
                "reference to {} field",
                field.label()
            )),
        ));
    };
    let kind = match field {
        Field::Array(_) => PropertyKind::Array,
        _ => PropertyKind::of(ctx, type_ref)?,
    };
    Ok(Property {
        owner,
        name,
        field: Some(field),
        type_ref,
        kind,
        optional: matches!(field, Field::Optional(_)),
        in_case: owner.parent.is_some(),
    })
}

/* Rule 2 refinement: `param.messageType` where messageType is a discriminator of param's type */
fn refine_discriminator<'a>(
    ctx: &TypeContext<'a>,
    property: Property<'a>,
    literal: &VariableLiteral,
) -> Option<Classification<'a>> {
    if property.kind != PropertyKind::Complex {
        return None;
    }
    let child = literal.child.as_ref()?;
    let target = ctx.registry.complex(property.type_ref.complex_name()?)?;
    let declares = |def: &ComplexTypeDefinition| {
        def.discriminator_fields()
            .any(|discriminator| discriminator.name == child.name)
    };
    let found = declares(target)
        || ctx
            .registry
            .parent_chain(&target.name)
            .into_iter()
            .any(|parent| declares(parent));
    found.then_some(Classification::DiscriminatorAccess { property, target })
}
