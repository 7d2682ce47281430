/* C expression dialect (plc4c conventions)
 *
 * Parse-side code reads locals, serialize-side code reads through the
 * `_message` pointer. Fields of discriminated cases live in the root struct
 * under a `<case>_` prefix. Arithmetic is left uncast.
 */

use super::types::{
  c_constant_name, c_type_name, CPrimitive, INCLUDE_EVALUATION_HELPER, INCLUDE_LIST, INCLUDE_MATH,
  INCLUDE_STDBOOL, INCLUDE_STRING,
};
use super::CBackend;
use crate::codegen::shared::errors::{GenerationError, GenerationErrorKind};
use crate::codegen::shared::expression::{Access, BuiltInCall, CastTarget, Dialect, Slot};
use crate::codegen::shared::naming::{camel_to_snake, quote};
use crate::codegen::shared::resolver::{Classification, Property, PropertyKind, PseudoName};
use crate::codegen::shared::{Compiled, Mode, TypeContext, TypeMapper};
use crate::spec::TypeRegistry;
use mspec_types::{BinaryOp, Field, Literal, TypeReference, UnaryOp, VariableLiteral};

/// C view of an expression slot. Named slots carry the C type name.
#[derive(Debug, Clone, PartialEq)]
pub enum CSlot {
  Plain,
  Bool,
  Primitive(CPrimitive),
  Enum(String),
  Complex(String),
}

impl CSlot {
  pub fn of(ctx: &TypeContext<'_>, slot: Slot<'_>) -> Result<Self, GenerationError> {
    Ok(match slot {
      Slot::Untyped => CSlot::Plain,
      Slot::Bool => CSlot::Bool,
      Slot::Typed(TypeReference::Simple(simple)) => CSlot::Primitive(CPrimitive::of(ctx, simple)?),
      Slot::Typed(type_ref @ TypeReference::Complex(complex)) => {
        let registry = ctx.registry;
        if registry.enumeration(&complex.name).is_some() {
          CSlot::Enum(CBackend.type_name_for(ctx, type_ref)?.name)
        } else if registry.complex(&complex.name).is_some() {
          CSlot::Complex(CBackend.type_name_for(ctx, type_ref)?.name)
        } else {
          CSlot::Plain
        }
      }
      Slot::Typed(TypeReference::Array(_)) => CSlot::Plain,
    })
  }
}

impl Dialect for CBackend {
  fn literal(
    &self,
    ctx: &TypeContext<'_>,
    literal: &Literal,
    slot: Slot<'_>,
  ) -> Result<Compiled, GenerationError> {
    Ok(match literal {
      Literal::Null => Compiled::new(match CSlot::of(ctx, slot)? {
        CSlot::Enum(_) => "-1".to_string(),
        CSlot::Complex(ctype) => format!("{}_null()", ctype),
        _ => "NULL".to_string(),
      }),
      Literal::Bool(value) => Compiled::new(value.to_string()).with_import(INCLUDE_STDBOOL),
      Literal::Numeric(number) => Compiled::new(number.to_string()),
      Literal::Hex(text) => Compiled::new(text.clone()),
      Literal::String(value) => Compiled::new(quote(value)),
    })
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
    let c_slot = CSlot::of(ctx, slot)?;
    let pow = Compiled::combine(vec![base, exponent], |codes| {
      let call = format!("pow(({}), ({}))", codes[0], codes[1]);
      match &c_slot {
        CSlot::Primitive(primitive) if primitive.is_numeric() => {
          format!("(({}) {})", primitive.target().name, call)
        }
        _ => call,
      }
    });
    Ok(pow.with_import(INCLUDE_MATH))
  }

  fn comparison(&self, op: BinaryOp, a: Compiled, b: Compiled) -> Compiled {
    binary(op, a, b)
  }

  fn bitwise(&self, op: BinaryOp, a: Compiled, b: Compiled) -> Compiled {
    binary(op, a, b)
  }

  fn logical(&self, op: BinaryOp, a: Compiled, b: Compiled) -> Compiled {
    binary(op, a, b)
  }

  fn arithmetic(
    &self,
    _ctx: &TypeContext<'_>,
    op: BinaryOp,
    a: Compiled,
    b: Compiled,
    _slot: Slot<'_>,
  ) -> Result<Compiled, GenerationError> {
    Ok(binary(op, a, b))
  }

  fn ternary(
    &self,
    ctx: &TypeContext<'_>,
    condition: Compiled,
    then: Compiled,
    otherwise: Compiled,
    slot: Slot<'_>,
  ) -> Result<Compiled, GenerationError> {
    let c_slot = CSlot::of(ctx, slot)?;
    Ok(Compiled::combine(vec![condition, then, otherwise], |codes| {
      let inline_if = format!("(({}) ? {} : {})", codes[0], codes[1], codes[2]);
      match &c_slot {
        CSlot::Enum(ctype) | CSlot::Complex(ctype) => format!("(({}) ({}))", ctype, inline_if),
        _ => inline_if,
      }
    }))
  }

  fn access(
    &self,
    ctx: &TypeContext<'_>,
    access: &Access<'_, '_>,
  ) -> Result<Compiled, GenerationError> {
    let registry = ctx.registry;
    let literal = access.literal;
    match access.classification {
      Classification::Pseudo(pseudo) => pseudo_name(ctx, pseudo, access),
      Classification::Field(property) | Classification::Argument(property) => {
        property_access(registry, &property, access)
      }
      Classification::DiscriminatorAccess { property, target } => {
        let base = indexed(property_base(registry, &property, access.mode), literal);
        let root = registry.root_of(target);
        let child = literal
          .child
          .as_deref()
          .map(|child| camel_to_snake(&child.name))
          .unwrap_or_default();
        Ok(Compiled::new(format!(
          "{}_get_discriminator({}->_type).{}",
          c_type_name(registry, &root.name),
          base,
          child
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
        let ctype = c_type_name(registry, &enumeration.name);
        let code = format!("{}_{}", ctype, constant.name);
        Ok(Compiled::new(match constant.child.as_deref() {
          Some(property) => format!("{}_get_{}({})", ctype, camel_to_snake(&property.name), code),
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
    _slot: Slot<'_>,
  ) -> Result<Compiled, GenerationError> {
    let registry = ctx.registry;
    let helper = |name: &str, value: Compiled| {
      value
        .map(|code| format!("plc4c_spi_evaluation_helper_{}({})", name, code))
        .with_import(INCLUDE_EVALUATION_HELPER)
    };
    Ok(match call {
      BuiltInCall::Cast { value, target, child } => value.map(|code| match target {
        CastTarget::Complex(def) => {
          /* a case has no struct of its own, its fields are prefixed members of the root */
          let root = registry.root_of(def);
          let cast = format!("(({}*) ({}))", c_type_name(registry, &root.name), code);
          match (child, def.parent.is_some()) {
            (None, _) => cast,
            (Some(child), true) => format!(
              "{}->{}_{}",
              cast,
              camel_to_snake(&def.name),
              camel_to_snake(&child.name)
            ),
            (Some(child), false) => format!("{}->{}", cast, camel_to_snake(&child.name)),
          }
        }
        CastTarget::Enum(def) => {
          let ctype = c_type_name(registry, &def.name);
          let cast = format!("(({}) ({}))", ctype, code);
          match child {
            Some(child) => format!("{}_get_{}({})", ctype, camel_to_snake(&child.name), cast),
            None => cast,
          }
        }
      }),
      BuiltInCall::StaticCall { function, args } => {
        let name = c_type_name(registry, function.rsplit('.').next().unwrap_or(function));
        Compiled::combine(args, |codes| format!("{}({})", name, codes.join(", ")))
      }
      BuiltInCall::Count(value) => helper("count", value),
      BuiltInCall::ArraySizeInBytes { value, .. } => helper("array_size_in_bytes", value),
      BuiltInCall::Ceil(value) => helper("ceil", value),
      BuiltInCall::StrLen(value) => helper("str_len", value),
    })
  }
}

fn binary(op: BinaryOp, a: Compiled, b: Compiled) -> Compiled {
  Compiled::combine(vec![a, b], |codes| {
    format!("({}) {} ({})", codes[0], op.symbol(), codes[1])
  })
}

fn pseudo_name(
  ctx: &TypeContext<'_>,
  pseudo: PseudoName,
  access: &Access<'_, '_>,
) -> Result<Compiled, GenerationError> {
  let root = ctx
    .root_type()
    .map(|root| c_type_name(ctx.registry, &root.name))
    .unwrap_or_else(|| c_type_name(ctx.registry, ctx.type_name));
  Ok(match pseudo {
    PseudoName::ReadBuffer => Compiled::new("readBuffer"),
    PseudoName::WriteBuffer => Compiled::new("writeBuffer"),
    PseudoName::CurPos => {
      Compiled::new("(plc4c_spi_read_get_pos(readBuffer) - startPos)").with_start_pos()
    }
    PseudoName::SelfValue => Compiled::new("_message"),
    PseudoName::LastItem => Compiled::new("lastItem"),
    PseudoName::LengthInBits => Compiled::new(format!("{}_length_in_bits(_message)", root)),
    PseudoName::LengthInBytes => Compiled::new(format!("{}_length_in_bytes(_message)", root)),
    PseudoName::TypeMeta => {
      return Err(ctx.fail(
        access.literal.dotted(),
        GenerationErrorKind::UnsupportedConstruct("bare '_type' reference".to_string()),
      ))
    }
  })
}

/// Struct member holding a field: `<case>_<field>` for fields of a
/// discriminated case, `<field>` otherwise.
pub fn member_name(owner: &str, in_case: bool, name: &str) -> String {
  if in_case {
    format!("{}_{}", camel_to_snake(owner), camel_to_snake(name))
  } else {
    camel_to_snake(name)
  }
}

/* Root of a field or argument access, before index and child path */
fn property_base(registry: &TypeRegistry, property: &Property<'_>, mode: Mode) -> String {
  let owner = &property.owner.name;
  match (property.field, mode) {
    (Some(Field::Const(_)), _) => c_constant_name(registry, owner, property.name),
    (Some(Field::Discriminator(_)), Mode::Serialize) => format!(
      "{}_get_discriminator(_message->_type).{}",
      c_type_name(registry, &registry.root_of(property.owner).name),
      camel_to_snake(property.name)
    ),
    (Some(Field::Virtual(_)), Mode::Serialize) => format!(
      "{}_get_{}(_message)",
      c_type_name(registry, owner),
      camel_to_snake(property.name)
    ),
    (Some(_), Mode::Serialize) => format!(
      "_message->{}",
      member_name(owner, property.in_case, property.name)
    ),
    /* arguments are function parameters on both sides */
    (None, _) | (Some(_), Mode::Parse) => property.name.to_string(),
  }
}

fn indexed(code: String, literal: &VariableLiteral) -> String {
  match literal.index {
    Some(index) => format!("plc4c_utils_list_get_value({}, {})", code, index),
    None => code,
  }
}

fn property_access(
  registry: &TypeRegistry,
  property: &Property<'_>,
  access: &Access<'_, '_>,
) -> Result<Compiled, GenerationError> {
  let literal = access.literal;
  let mut compiled = Compiled::new(indexed(property_base(registry, property, access.mode), literal));
  if literal.index.is_some() {
    compiled.imports.insert(INCLUDE_LIST);
  }

  let Some(child) = literal.child.as_deref() else {
    let pointer = property.optional && matches!(property.kind, PropertyKind::Scalar | PropertyKind::Enum);
    return Ok(if pointer && !access.suppress_deref {
      compiled.map(|code| format!("(*{})", code))
    } else {
      compiled
    });
  };

  let string = property
    .type_ref
    .as_simple()
    .is_some_and(|simple| simple.is_string());
  let enum_name = match property.kind {
    PropertyKind::Enum => property.type_ref.complex_name(),
    _ => None,
  };
  let mut step = Some(child);
  let mut first = true;
  while let Some(current) = step {
    let member = camel_to_snake(&current.name);
    compiled = if first && current.name == "length" && property.kind == PropertyKind::Array {
      compiled
        .map(|code| format!("plc4c_utils_list_size({})", code))
        .with_import(INCLUDE_LIST)
    } else if first && current.name == "length" && string {
      compiled
        .map(|code| format!("strlen({})", code))
        .with_import(INCLUDE_STRING)
    } else if let (true, Some(enum_name)) = (first, enum_name) {
      let ctype = c_type_name(registry, enum_name);
      compiled.map(|code| format!("{}_get_{}({})", ctype, member, code))
    } else {
      compiled.map(|code| format!("{}->{}", code, member))
    };
    compiled = compiled.map(|code| indexed(code, current));
    first = false;
    step = current.child.as_deref();
  }
  Ok(compiled)
}
