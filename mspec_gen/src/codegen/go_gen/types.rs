use super::GoBackend;
use crate::codegen::shared::errors::{GenerationError, GenerationErrorKind};
use crate::codegen::shared::target::{covering_width, unmappable, TargetType, TypeMapper};
use crate::codegen::shared::TypeContext;
use mspec_types::{SimpleBaseType, SimpleTypeReference, TypeReference};

pub const IMPORT_BIG: &str = "math/big";
pub const IMPORT_MATH: &str = "math";
pub const IMPORT_TIME: &str = "time";
pub const IMPORT_ERRORS: &str = "github.com/pkg/errors";
pub const IMPORT_LOG: &str = "github.com/rs/zerolog/log";
pub const IMPORT_UTILS: &str = "github.com/apache/plc4x/plc4go/spi/utils";
pub const IMPORT_API_VALUES: &str = "apiValues \"github.com/apache/plc4x/plc4go/pkg/api/values\"";

/// Go rendering of a primitive kind at a given width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoPrimitive {
    Bool,
    Byte,
    Uint(u32),
    Int(u32),
    BigInt,
    Float32,
    Float64,
    BigFloat,
    String,
    Duration,
    Time,
}

impl GoPrimitive {
    pub fn of(ctx: &TypeContext<'_>, simple: &SimpleTypeReference) -> Result<Self, GenerationError> {
        let bits = simple.bits();
        match simple.base_type {
            SimpleBaseType::Bit => Ok(GoPrimitive::Bool),
            SimpleBaseType::Byte => Ok(GoPrimitive::Byte),
            SimpleBaseType::Uint | SimpleBaseType::Int if bits == 0 => {
                Err(unmappable(ctx, "go", simple))
            }
            SimpleBaseType::Uint => Ok(covering_width(bits)
                .map(GoPrimitive::Uint)
                .unwrap_or(GoPrimitive::BigInt)),
            SimpleBaseType::Int => Ok(covering_width(bits)
                .map(GoPrimitive::Int)
                .unwrap_or(GoPrimitive::BigInt)),
            SimpleBaseType::Float | SimpleBaseType::Ufloat => match bits {
                0 => Err(unmappable(ctx, "go", simple)),
                1..=32 => Ok(GoPrimitive::Float32),
                33..=64 => Ok(GoPrimitive::Float64),
                _ => Ok(GoPrimitive::BigFloat),
            },
            SimpleBaseType::String | SimpleBaseType::Vstring => Ok(GoPrimitive::String),
            SimpleBaseType::Time => Ok(GoPrimitive::Duration),
            SimpleBaseType::Date | SimpleBaseType::Datetime => Ok(GoPrimitive::Time),
        }
    }

    pub fn target(&self) -> TargetType {
        match self {
            GoPrimitive::Bool => TargetType::plain("bool"),
            GoPrimitive::Byte => TargetType::plain("byte"),
            GoPrimitive::Uint(width) => TargetType::plain(format!("uint{}", width)),
            GoPrimitive::Int(width) => TargetType::plain(format!("int{}", width)),
            GoPrimitive::BigInt => TargetType::with_import("*big.Int", IMPORT_BIG),
            GoPrimitive::Float32 => TargetType::plain("float32"),
            GoPrimitive::Float64 => TargetType::plain("float64"),
            GoPrimitive::BigFloat => TargetType::with_import("*big.Float", IMPORT_BIG),
            GoPrimitive::String => TargetType::plain("string"),
            GoPrimitive::Duration => TargetType::with_import("time.Duration", IMPORT_TIME),
            GoPrimitive::Time => TargetType::with_import("time.Time", IMPORT_TIME),
        }
    }

    /// Plain numeric types that accept a `T(x)` conversion.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            GoPrimitive::Byte
                | GoPrimitive::Uint(_)
                | GoPrimitive::Int(_)
                | GoPrimitive::Float32
                | GoPrimitive::Float64
        )
    }

    pub fn is_big(&self) -> bool {
        matches!(self, GoPrimitive::BigInt | GoPrimitive::BigFloat)
    }

    /// Converts `code` to this type where Go allows a plain conversion.
    pub fn convert(&self, code: &str) -> String {
        match self {
            GoPrimitive::BigInt
            | GoPrimitive::BigFloat
            | GoPrimitive::Duration
            | GoPrimitive::Time => code.to_string(),
            other => format!("{}({})", other.target().name, code),
        }
    }

    /* Suffix of the ReadXxx/WriteXxx buffer method; none for time kinds */
    fn method_suffix(&self) -> Option<String> {
        match self {
            GoPrimitive::Bool => Some("Bit".to_string()),
            GoPrimitive::Byte => Some("Byte".to_string()),
            GoPrimitive::Uint(width) => Some(format!("Uint{}", width)),
            GoPrimitive::Int(width) => Some(format!("Int{}", width)),
            GoPrimitive::BigInt => Some("BigInt".to_string()),
            GoPrimitive::Float32 => Some("Float32".to_string()),
            GoPrimitive::Float64 => Some("Float64".to_string()),
            GoPrimitive::BigFloat => Some("BigFloat".to_string()),
            GoPrimitive::String => Some("String".to_string()),
            GoPrimitive::Duration | GoPrimitive::Time => None,
        }
    }

    /* Width argument as passed to the buffer call */
    fn width_args(&self, bits: &str, encoding: &str) -> Vec<String> {
        match self {
            GoPrimitive::Bool | GoPrimitive::Byte => Vec::new(),
            GoPrimitive::BigInt => vec![format!("uint64({})", bits)],
            GoPrimitive::BigFloat => vec![format!("uint8({})", bits)],
            GoPrimitive::String => vec![format!("uint32({})", bits), format!("\"{}\"", encoding)],
            _ => vec![bits.to_string()],
        }
    }

    /// `readBuffer.ReadUint16("name", 12)`. `bits` is the declared width,
    /// or the compiled length of a variable-length string.
    pub fn read_call(&self, logical: &str, bits: &str, encoding: &str) -> Option<String> {
        let suffix = self.method_suffix()?;
        let mut args = vec![format!("\"{}\"", logical)];
        args.extend(self.width_args(bits, encoding));
        Some(format!("readBuffer.Read{}({})", suffix, args.join(", ")))
    }

    pub fn write_call(&self, logical: &str, bits: &str, encoding: &str, value: &str) -> Option<String> {
        let suffix = self.method_suffix()?;
        let mut args = vec![format!("\"{}\"", logical)];
        args.extend(self.width_args(bits, encoding));
        args.push(value.to_string());
        Some(format!("writeBuffer.Write{}({})", suffix, args.join(", ")))
    }
}

impl TypeMapper for GoBackend {
    fn backend(&self) -> &'static str {
        "go"
    }

    fn type_name_for(
        &self,
        ctx: &TypeContext<'_>,
        type_ref: &TypeReference,
    ) -> Result<TargetType, GenerationError> {
        match type_ref {
            TypeReference::Simple(simple) => Ok(GoPrimitive::of(ctx, simple)?.target()),
            TypeReference::Complex(complex) => {
                let registry = ctx.registry;
                if registry.is_any_data(&complex.name) {
                    Ok(TargetType::with_import("apiValues.PlcValue", IMPORT_API_VALUES))
                } else if registry.complex(&complex.name).is_some()
                    || registry.enumeration(&complex.name).is_some()
                {
                    /* one package per protocol and flavor, so the declared name is unique */
                    Ok(TargetType::plain(complex.name.clone()))
                } else {
                    Err(ctx.fail(
                        complex.name.clone(),
                        GenerationErrorKind::UnknownType(complex.name.clone()),
                    ))
                }
            }
            TypeReference::Array(array) => {
                let element = self.type_name_for(ctx, &array.element_type)?;
                Ok(TargetType {
                    name: format!("[]{}", element.name),
                    imports: element.imports,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_call_carries_declared_width() {
        let call = GoPrimitive::Uint(16).read_call("length", "12", "UTF-8");
        assert_eq!(call.as_deref(), Some("readBuffer.ReadUint16(\"length\", 12)"));
    }

    #[test]
    fn test_bit_and_string_calls() {
        assert_eq!(
            GoPrimitive::Bool.write_call("flag", "1", "UTF-8", "m.Flag").as_deref(),
            Some("writeBuffer.WriteBit(\"flag\", m.Flag)")
        );
        assert_eq!(
            GoPrimitive::String.read_call("name", "32", "UTF-16").as_deref(),
            Some("readBuffer.ReadString(\"name\", uint32(32), \"UTF-16\")")
        );
        assert!(GoPrimitive::Duration.read_call("t", "32", "UTF-8").is_none());
    }

    #[test]
    fn test_convert_skips_big_types() {
        assert_eq!(GoPrimitive::Uint(8).convert("x"), "uint8(x)");
        assert_eq!(GoPrimitive::BigInt.convert("x"), "x");
    }
}
