use super::CBackend;
use crate::codegen::shared::errors::{GenerationError, GenerationErrorKind};
use crate::codegen::shared::naming::camel_to_snake;
use crate::codegen::shared::target::{
  covering_width, unmappable, unsupported_primitive, TargetType, TypeMapper,
};
use crate::codegen::shared::TypeContext;
use crate::spec::TypeRegistry;
use mspec_types::{SimpleBaseType, SimpleTypeReference, TypeReference};

pub const INCLUDE_STDBOOL: &str = "<stdbool.h>";
pub const INCLUDE_STDINT: &str = "<stdint.h>";
pub const INCLUDE_STDIO: &str = "<stdio.h>";
pub const INCLUDE_STDLIB: &str = "<stdlib.h>";
pub const INCLUDE_STRING: &str = "<string.h>";
pub const INCLUDE_MATH: &str = "<math.h>";
pub const INCLUDE_TIME: &str = "<time.h>";
pub const INCLUDE_DATA: &str = "<plc4c/data.h>";
pub const INCLUDE_LIST: &str = "<plc4c/utils/list.h>";
pub const INCLUDE_EVALUATION_HELPER: &str = "<plc4c/spi/evaluation_helper.h>";

/// C rendering of a primitive kind at a given width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CPrimitive {
  Bool,
  Char,
  Uint(u32),
  Int(u32),
  Float,
  Double,
  String,
  Time,
}

impl CPrimitive {
  pub fn of(ctx: &TypeContext<'_>, simple: &SimpleTypeReference) -> Result<Self, GenerationError> {
    let bits = simple.bits();
    match simple.base_type {
      SimpleBaseType::Bit => Ok(CPrimitive::Bool),
      SimpleBaseType::Byte => Ok(CPrimitive::Char),
      /* no arbitrary-precision fallback in plc4c */
      SimpleBaseType::Uint => covering_width(bits)
        .map(CPrimitive::Uint)
        .ok_or_else(|| unmappable(ctx, "c", simple)),
      SimpleBaseType::Int => covering_width(bits)
        .map(CPrimitive::Int)
        .ok_or_else(|| unmappable(ctx, "c", simple)),
      SimpleBaseType::Float => match bits {
        1..=32 => Ok(CPrimitive::Float),
        33..=64 => Ok(CPrimitive::Double),
        _ => Err(unmappable(ctx, "c", simple)),
      },
      SimpleBaseType::Ufloat => Err(unsupported_primitive(ctx, simple)),
      SimpleBaseType::String | SimpleBaseType::Vstring => Ok(CPrimitive::String),
      SimpleBaseType::Time | SimpleBaseType::Date | SimpleBaseType::Datetime => Ok(CPrimitive::Time),
    }
  }

  pub fn target(&self) -> TargetType {
    match self {
      CPrimitive::Bool => TargetType::with_import("bool", INCLUDE_STDBOOL),
      CPrimitive::Char => TargetType::plain("char"),
      CPrimitive::Uint(width) => TargetType::with_import(format!("uint{}_t", width), INCLUDE_STDINT),
      CPrimitive::Int(width) => TargetType::with_import(format!("int{}_t", width), INCLUDE_STDINT),
      CPrimitive::Float => TargetType::plain("float"),
      CPrimitive::Double => TargetType::plain("double"),
      CPrimitive::String => TargetType::plain("char*"),
      CPrimitive::Time => TargetType::with_import("time_t", INCLUDE_TIME),
    }
  }

  pub fn is_numeric(&self) -> bool {
    matches!(
      self,
      CPrimitive::Char | CPrimitive::Uint(_) | CPrimitive::Int(_) | CPrimitive::Float | CPrimitive::Double
    )
  }

  /// Zero value used to initialize locals.
  pub fn zero(&self) -> &'static str {
    match self {
      CPrimitive::Bool => "false",
      CPrimitive::String => "NULL",
      _ => "0",
    }
  }

  /// `printf` conversion for a value of this type.
  pub fn format_spec(&self) -> &'static str {
    match self {
      CPrimitive::Bool | CPrimitive::Char | CPrimitive::Int(8 | 16 | 32) => "%d",
      CPrimitive::Uint(8 | 16 | 32) => "%u",
      CPrimitive::Uint(_) => "%llu",
      CPrimitive::Int(_) => "%lld",
      CPrimitive::Float | CPrimitive::Double => "%f",
      CPrimitive::String => "%s",
      CPrimitive::Time => "%ld",
    }
  }

  /* `unsigned_short`, `signed_long`, `float`, ... ; none for time kinds */
  fn function_suffix(&self) -> Option<String> {
    let size_word = |width: u32| match width {
      8 => "byte",
      16 => "short",
      32 => "int",
      _ => "long",
    };
    match self {
      CPrimitive::Bool => Some("bit".to_string()),
      CPrimitive::Char => Some("char".to_string()),
      CPrimitive::Uint(width) => Some(format!("unsigned_{}", size_word(*width))),
      CPrimitive::Int(width) => Some(format!("signed_{}", size_word(*width))),
      CPrimitive::Float => Some("float".to_string()),
      CPrimitive::Double => Some("double".to_string()),
      CPrimitive::String => Some("string".to_string()),
      CPrimitive::Time => None,
    }
  }

  fn width_args(&self, bits: &str, encoding: &str) -> Vec<String> {
    match self {
      CPrimitive::Bool | CPrimitive::Char => Vec::new(),
      CPrimitive::String => vec![bits.to_string(), format!("\"{}\"", encoding)],
      _ => vec![bits.to_string()],
    }
  }

  /// `plc4c_spi_read_unsigned_short(readBuffer, 12, (uint16_t*) &v)`. `target`
  /// is a pointer expression to the destination.
  pub fn read_call(&self, bits: &str, encoding: &str, target: &str) -> Option<String> {
    let suffix = self.function_suffix()?;
    let mut args = vec!["readBuffer".to_string()];
    args.extend(self.width_args(bits, encoding));
    let pointer = match self {
      CPrimitive::String => "char**".to_string(),
      other => format!("{}*", other.target().name),
    };
    args.push(format!("({}) {}", pointer, target));
    Some(format!("plc4c_spi_read_{}({})", suffix, args.join(", ")))
  }

  pub fn write_call(&self, bits: &str, encoding: &str, value: &str) -> Option<String> {
    let suffix = self.function_suffix()?;
    let mut args = vec!["writeBuffer".to_string()];
    args.extend(self.width_args(bits, encoding));
    args.push(value.to_string());
    Some(format!("plc4c_spi_write_{}({})", suffix, args.join(", ")))
  }
}

/* plc4c_<protocol>_<flavor>_<name>, all snake case */
pub fn c_type_name(registry: &TypeRegistry, name: &str) -> String {
  format!(
    "plc4c_{}_{}_{}",
    camel_to_snake(registry.protocol()),
    camel_to_snake(registry.flavor()),
    camel_to_snake(name)
  )
}

pub fn c_header(registry: &TypeRegistry, name: &str) -> String {
  format!(
    "\"{}_{}_{}.h\"",
    camel_to_snake(registry.protocol()),
    camel_to_snake(registry.flavor()),
    camel_to_snake(name)
  )
}

/// `PLC4C_S7_READ_WRITE_TPKT_PACKET_PROTOCOL_ID`
pub fn c_constant_name(registry: &TypeRegistry, type_name: &str, field: &str) -> String {
  format!("{}_{}", c_type_name(registry, type_name), camel_to_snake(field)).to_uppercase()
}

impl TypeMapper for CBackend {
  fn backend(&self) -> &'static str {
    "c"
  }

  fn type_name_for(
    &self,
    ctx: &TypeContext<'_>,
    type_ref: &TypeReference,
  ) -> Result<TargetType, GenerationError> {
    match type_ref {
      TypeReference::Simple(simple) => Ok(CPrimitive::of(ctx, simple)?.target()),
      TypeReference::Complex(complex) => {
        let registry = ctx.registry;
        if registry.is_any_data(&complex.name) {
          Ok(TargetType::with_import("plc4c_data*", INCLUDE_DATA))
        } else if let Some(def) = registry.complex(&complex.name) {
          /* cases live inside the struct of their root type */
          let root = registry.root_of(def);
          Ok(TargetType::with_import(
            c_type_name(registry, &root.name),
            c_header(registry, &root.name),
          ))
        } else if registry.enumeration(&complex.name).is_some() {
          Ok(TargetType::with_import(
            c_type_name(registry, &complex.name),
            c_header(registry, &complex.name),
          ))
        } else {
          Err(ctx.fail(
            complex.name.clone(),
            GenerationErrorKind::UnknownType(complex.name.clone()),
          ))
        }
      }
      TypeReference::Array(array) => {
        /* element type still has to be mappable */
        self.type_name_for(ctx, &array.element_type)?;
        Ok(TargetType::with_import("plc4c_list*", INCLUDE_LIST))
      }
    }
  }
}
