/* Go expression dialect (plc4go conventions)
 *
 * Parse-side code reads locals, serialize-side code reads the message `m`.
 * Numeric literals stay untyped constants; typed slots get explicit
 * conversions only where Go would otherwise mix operand types.
 */

use super::types::{GoPrimitive, IMPORT_MATH, IMPORT_UTILS};
use super::GoBackend;
use crate::codegen::shared::errors::{GenerationError, GenerationErrorKind};
use crate::codegen::shared::expression::{Access, BuiltInCall, CastTarget, Dialect, Slot};
use crate::codegen::shared::naming::{capitalize, quote};
use crate::codegen::shared::resolver::{Classification, Property, PropertyKind, PseudoName};
use crate::codegen::shared::{Compiled, Mode, TypeContext};
use mspec_types::{BinaryOp, Field, Literal, TypeReference, UnaryOp, VariableLiteral};

/// Go view of an expression slot.
#[derive(Debug, Clone, PartialEq)]
pub enum GoSlot {
    Plain,
    Bool,
    Primitive(GoPrimitive),
    Enum(String),
    Complex(String),
}

impl GoSlot {
    pub fn of(ctx: &TypeContext<'_>, slot: Slot<'_>) -> Result<Self, GenerationError> {
        Ok(match slot {
            Slot::Untyped => GoSlot::Plain,
            Slot::Bool => GoSlot::Bool,
            Slot::Typed(TypeReference::Simple(simple)) => GoSlot::Primitive(GoPrimitive::of(ctx, simple)?),
            Slot::Typed(TypeReference::Complex(complex)) => {
                if ctx.registry.enumeration(&complex.name).is_some() {
                    GoSlot::Enum(complex.name.clone())
                } else if ctx.registry.complex(&complex.name).is_some() {
                    GoSlot::Complex(complex.name.clone())
                } else {
                    GoSlot::Plain
                }
            }
            Slot::Typed(TypeReference::Array(_)) => GoSlot::Plain,
        })
    }

    fn numeric(&self) -> Option<GoPrimitive> {
        match self {
            GoSlot::Primitive(primitive) if primitive.is_numeric() => Some(*primitive),
            _ => None,
        }
    }
}

impl Dialect for GoBackend {
    fn literal(
        &self,
        ctx: &TypeContext<'_>,
        literal: &Literal,
        slot: Slot<'_>,
    ) -> Result<Compiled, GenerationError> {
        Ok(Compiled::new(match literal {
            /* generated enums are value types, their zero value stands in for null */
            Literal::Null => match GoSlot::of(ctx, slot)? {
                GoSlot::Enum(_) => "0".to_string(),
                _ => "nil".to_string(),
            },
            Literal::Bool(value) => value.to_string(),
            Literal::Numeric(number) => number.to_string(),
            Literal::Hex(text) => text.clone(),
            Literal::String(value) => quote(value),
        }))
    }

    fn unary(&self, op: UnaryOp, operand: Compiled) -> Compiled {
        operand.map(|code| match op {
            UnaryOp::Not => format!("!({})", code),
            UnaryOp::Neg => format!("-({})", code),
            UnaryOp::Parens => format!("({})", code),
        })
    }

    fn power(
        &self,
        ctx: &TypeContext<'_>,
        base: Compiled,
        exponent: Compiled,
        slot: Slot<'_>,
    ) -> Result<Compiled, GenerationError> {
        let numeric = GoSlot::of(ctx, slot)?.numeric();
        let pow = Compiled::combine(vec![base, exponent], |codes| {
            let call = format!("math.Pow(float64({}), float64({}))", codes[0], codes[1]);
            match numeric {
                Some(primitive) => primitive.convert(&call),
                None => call,
            }
        });
        Ok(pow.with_import(IMPORT_MATH))
    }

    fn comparison(&self, op: BinaryOp, a: Compiled, b: Compiled) -> Compiled {
        Compiled::combine(vec![a, b], |codes| {
            format!("bool(({}) {} ({}))", codes[0], op.symbol(), codes[1])
        })
    }

    fn bitwise(&self, op: BinaryOp, a: Compiled, b: Compiled) -> Compiled {
        Compiled::combine(vec![a, b], |codes| {
            format!("({}) {} ({})", codes[0], op.symbol(), codes[1])
        })
    }

    fn logical(&self, op: BinaryOp, a: Compiled, b: Compiled) -> Compiled {
        Compiled::combine(vec![a, b], |codes| {
            format!("({}) {} ({})", codes[0], op.symbol(), codes[1])
        })
    }

    fn arithmetic(
        &self,
        ctx: &TypeContext<'_>,
        op: BinaryOp,
        a: Compiled,
        b: Compiled,
        slot: Slot<'_>,
    ) -> Result<Compiled, GenerationError> {
        let numeric = GoSlot::of(ctx, slot)?.numeric();
        Ok(Compiled::combine(vec![a, b], |codes| match numeric {
            Some(primitive) => format!(
                "{} {} {}",
                primitive.convert(&codes[0]),
                op.symbol(),
                primitive.convert(&codes[1])
            ),
            None => format!("({}) {} ({})", codes[0], op.symbol(), codes[1]),
        }))
    }

    fn ternary(
        &self,
        ctx: &TypeContext<'_>,
        condition: Compiled,
        then: Compiled,
        otherwise: Compiled,
        slot: Slot<'_>,
    ) -> Result<Compiled, GenerationError> {
        let go_slot = GoSlot::of(ctx, slot)?;
        let inline_if = Compiled::combine(vec![condition, then, otherwise], |codes| {
            let (c, b, e) = (&codes[0], &codes[1], &codes[2]);
            match &go_slot {
                GoSlot::Primitive(primitive) => {
                    let target = primitive.target().name;
                    format!(
                        "utils.InlineIf({}, func() any {{return {}}}, func() any {{return {}}}).({})",
                        c,
                        primitive.convert(b),
                        primitive.convert(e),
                        target
                    )
                }
                /* named result types unify both branches through their cast */
                GoSlot::Enum(name) | GoSlot::Complex(name) => format!(
                    "Cast{}(utils.InlineIf({}, func() any {{return {}}}, func() any {{return {}}}))",
                    name, c, b, e
                ),
                GoSlot::Bool => format!(
                    "utils.InlineIf({}, func() any {{return {}}}, func() any {{return {}}}).(bool)",
                    c, b, e
                ),
                GoSlot::Plain => format!(
                    "utils.InlineIf({}, func() any {{return {}}}, func() any {{return {}}})",
                    c, b, e
                ),
            }
        });
        let mut compiled = inline_if.with_import(IMPORT_UTILS);
        if let GoSlot::Primitive(primitive) = go_slot {
            compiled.imports.merge(&primitive.target().imports);
        }
        Ok(compiled)
    }

    fn access(
        &self,
        ctx: &TypeContext<'_>,
        access: &Access<'_, '_>,
    ) -> Result<Compiled, GenerationError> {
        let literal = access.literal;
        match access.classification {
            Classification::Pseudo(pseudo) => pseudo_name(ctx, pseudo, access),
            Classification::Field(property) | Classification::Argument(property) => {
                Ok(Compiled::new(property_access(&property, access)))
            }
            Classification::DiscriminatorAccess { property, target } => {
                let base = indexed(property_base(&property, access.mode), literal);
                let child = literal
                    .child
                    .as_deref()
                    .map(|child| capitalize(&child.name))
                    .unwrap_or_default();
                Ok(Compiled::new(format!(
                    "Cast{}({}).Get{}()",
                    target.name, base, child
                )))
            }
            Classification::EnumConstant(enumeration) => {
                let Some(constant) = literal.child.as_deref() else {
                    return Err(ctx.fail(
                        literal.dotted(),
                        GenerationErrorKind::UnsupportedConstruct(format!(
                            "enum type '{}' used as a value",
                            enumeration.name
                        )),
                    ));
                };
                let code = format!("{}_{}", enumeration.name, constant.name);
                Ok(Compiled::new(match constant.child.as_deref() {
                    Some(property) => format!("{}.{}()", code, capitalize(&property.name)),
                    None => code,
                }))
            }
            Classification::Implicit { field, .. } => Ok(Compiled::new(field.name.clone())),
            Classification::BuiltIn(_) => Err(ctx.fail(
                literal.dotted(),
                GenerationErrorKind::UnsupportedConstruct("built-in used as a value".to_string()),
            )),
        }
    }

    fn built_in(
        &self,
        ctx: &TypeContext<'_>,
        call: BuiltInCall<'_, '_>,
        _mode: Mode,
        slot: Slot<'_>,
    ) -> Result<Compiled, GenerationError> {
        let numeric = GoSlot::of(ctx, slot)?.numeric();
        let sized = |code: String| match numeric {
            Some(primitive) => primitive.convert(&code),
            None => code,
        };
        Ok(match call {
            BuiltInCall::Cast { value, target, child } => value.map(|code| {
                let cast = format!("Cast{}({})", target.name(), code);
                match (child, target) {
                    (None, _) => cast,
                    (Some(child), CastTarget::Enum(_)) => {
                        format!("{}.{}()", cast, capitalize(&child.name))
                    }
                    (Some(child), CastTarget::Complex(_)) => {
                        format!("{}.Get{}()", cast, capitalize(&child.name))
                    }
                }
            }),
            BuiltInCall::StaticCall { function, args } => {
                let name = capitalize(function.rsplit('.').next().unwrap_or(function));
                Compiled::combine(args, |codes| format!("{}({})", name, codes.join(", ")))
            }
            BuiltInCall::Count(value) | BuiltInCall::StrLen(value) => {
                value.map(|code| sized(format!("len({})", code)))
            }
            BuiltInCall::ArraySizeInBytes { array, value } => {
                value.map(|code| sized(format!("{}ArraySizeInBytes({})", array, code)))
            }
            BuiltInCall::Ceil(value) => value
                .map(|code| sized(format!("math.Ceil(float64({}))", code)))
                .with_import(IMPORT_MATH),
        })
    }
}

fn pseudo_name(
    ctx: &TypeContext<'_>,
    pseudo: PseudoName,
    access: &Access<'_, '_>,
) -> Result<Compiled, GenerationError> {
    Ok(match pseudo {
        PseudoName::ReadBuffer => Compiled::new("readBuffer"),
        PseudoName::WriteBuffer => Compiled::new("writeBuffer"),
        PseudoName::CurPos => Compiled::new("(readBuffer.GetPos() - startPos)").with_start_pos(),
        PseudoName::SelfValue => match access.mode {
            Mode::Serialize => Compiled::new("m"),
            Mode::Parse => Compiled::new("_value"),
        },
        PseudoName::LastItem => Compiled::new("lastItem"),
        PseudoName::LengthInBits => Compiled::new("m.LengthInBits()"),
        PseudoName::LengthInBytes => Compiled::new("m.LengthInBytes()"),
        PseudoName::TypeMeta => {
            return Err(ctx.fail(
                access.literal.dotted(),
                GenerationErrorKind::UnsupportedConstruct("bare '_type' reference".to_string()),
            ))
        }
    })
}

/* Root of a field or argument access, before index and child path */
pub(super) fn property_base(property: &Property<'_>, mode: Mode) -> String {
    match (property.field, mode) {
        (Some(Field::Const(_)), _) => {
            format!("{}_{}", property.owner.name, property.name.to_uppercase())
        }
        (Some(Field::Discriminator(_) | Field::Virtual(_)), Mode::Serialize) => {
            format!("m.Get{}()", capitalize(property.name))
        }
        (_, Mode::Serialize) => format!("m.{}", capitalize(property.name)),
        (_, Mode::Parse) => property.name.to_string(),
    }
}

fn indexed(code: String, literal: &VariableLiteral) -> String {
    match literal.index {
        Some(index) => format!("{}[{}]", code, index),
        None => code,
    }
}

fn property_access(property: &Property<'_>, access: &Access<'_, '_>) -> String {
    let literal = access.literal;
    let mut code = indexed(property_base(property, access.mode), literal);

    let Some(child) = literal.child.as_deref() else {
        let pointer = property.optional
            && matches!(property.kind, PropertyKind::Scalar | PropertyKind::Enum);
        return if pointer && !access.suppress_deref {
            format!("(*{})", code)
        } else {
            code
        };
    };

    let sized = property.kind == PropertyKind::Array
        || property
            .type_ref
            .as_simple()
            .is_some_and(|simple| simple.is_string());
    let mut step = Some(child);
    let mut first = true;
    while let Some(current) = step {
        code = if first && sized && current.name == "length" {
            format!("len({})", code)
        } else if first && property.kind == PropertyKind::Enum {
            format!("{}.{}()", code, capitalize(&current.name))
        } else {
            format!("{}.Get{}()", code, capitalize(&current.name))
        };
        code = indexed(code, current);
        first = false;
        step = current.child.as_deref();
    }
    code
}
