/* Expression compiler
 *
 * Walks a term tree and asks the backend dialect to render each node. The
 * driver owns the structural rules shared by every backend: which operand
 * slots get the field's type, null-check pointer suppression, implicit-field
 * substitution on serialize and built-in arity checking.
 */

use super::context::{Mode, TypeContext};
use super::errors::{GenerationError, GenerationErrorKind};
use super::imports::Compiled;
use super::naming::quote;
use super::resolver::{resolve, BuiltIn, Classification, PseudoName};
use super::target::TypeMapper;
use mspec_types::{
    BinaryOp, BinaryTerm, ComplexTypeDefinition, EnumTypeDefinition, ImplicitField, Literal,
    Term, TypeReference, UnaryOp, VariableLiteral,
};

/// Expected result type of the expression being compiled.
#[derive(Debug, Clone, Copy)]
pub enum Slot<'s> {
    /// No target type; operands are emitted as-is.
    Untyped,
    Bool,
    Typed(&'s TypeReference),
}

/// A classified variable reference handed to the dialect for rendering.
#[derive(Debug, Clone, Copy)]
pub struct Access<'a, 'v> {
    pub literal: &'v VariableLiteral,
    pub classification: Classification<'a>,
    pub mode: Mode,
    /// Set for operands of a comparison against `null`.
    pub suppress_deref: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum CastTarget<'a> {
    Complex(&'a ComplexTypeDefinition),
    Enum(&'a EnumTypeDefinition),
}

impl CastTarget<'_> {
    pub fn name(&self) -> &str {
        match self {
            CastTarget::Complex(def) => &def.name,
            CastTarget::Enum(def) => &def.name,
        }
    }
}

#[derive(Debug)]
pub enum BuiltInCall<'a, 'v> {
    Cast {
        value: Compiled,
        target: CastTarget<'a>,
        child: Option<&'v VariableLiteral>,
    },
    StaticCall {
        function: &'v str,
        args: Vec<Compiled>,
    },
    Count(Compiled),
    ArraySizeInBytes {
        array: &'v str,
        value: Compiled,
    },
    Ceil(Compiled),
    StrLen(Compiled),
}

/// Backend rendering hooks.
pub trait Dialect: TypeMapper + Sync {
    fn literal(
        &self,
        ctx: &TypeContext<'_>,
        literal: &Literal,
        slot: Slot<'_>,
    ) -> Result<Compiled, GenerationError>;

    fn unary(&self, op: UnaryOp, operand: Compiled) -> Compiled;

    /// `^`: a power call, never bitwise xor.
    fn power(
        &self,
        ctx: &TypeContext<'_>,
        base: Compiled,
        exponent: Compiled,
        slot: Slot<'_>,
    ) -> Result<Compiled, GenerationError>;

    fn comparison(&self, op: BinaryOp, a: Compiled, b: Compiled) -> Compiled;

    /// Shifts and bitwise operators; operands are never cast.
    fn bitwise(&self, op: BinaryOp, a: Compiled, b: Compiled) -> Compiled;

    fn logical(&self, op: BinaryOp, a: Compiled, b: Compiled) -> Compiled;

    fn arithmetic(
        &self,
        ctx: &TypeContext<'_>,
        op: BinaryOp,
        a: Compiled,
        b: Compiled,
        slot: Slot<'_>,
    ) -> Result<Compiled, GenerationError>;

    fn ternary(
        &self,
        ctx: &TypeContext<'_>,
        condition: Compiled,
        then: Compiled,
        otherwise: Compiled,
        slot: Slot<'_>,
    ) -> Result<Compiled, GenerationError>;

    fn access(
        &self,
        ctx: &TypeContext<'_>,
        access: &Access<'_, '_>,
    ) -> Result<Compiled, GenerationError>;

    fn built_in(
        &self,
        ctx: &TypeContext<'_>,
        call: BuiltInCall<'_, '_>,
        mode: Mode,
        slot: Slot<'_>,
    ) -> Result<Compiled, GenerationError>;
}

/// Compiles `term` for `mode` against the expected result `slot`.
pub fn compile<D: Dialect>(
    dialect: &D,
    ctx: &TypeContext<'_>,
    term: &Term,
    mode: Mode,
    slot: Slot<'_>,
) -> Result<Compiled, GenerationError> {
    ExprCompiler {
        dialect,
        ctx: *ctx,
        mode,
        implicit_stack: Vec::new(),
    }
    .term(term, slot, false)
}

/// Compiles a plain reference to a declared name, e.g. the stored value of a field.
pub fn compile_name<D: Dialect>(
    dialect: &D,
    ctx: &TypeContext<'_>,
    name: &str,
    mode: Mode,
) -> Result<Compiled, GenerationError> {
    compile(dialect, ctx, &Term::var(name), mode, Slot::Untyped)
}

struct ExprCompiler<'d, 'a, D> {
    dialect: &'d D,
    ctx: TypeContext<'a>,
    mode: Mode,
    implicit_stack: Vec<String>,
}

impl<'a, D: Dialect> ExprCompiler<'_, 'a, D> {
    fn term(&mut self, term: &Term, slot: Slot<'_>, suppress: bool) -> Result<Compiled, GenerationError> {
        match term {
            Term::Literal(literal) => self.dialect.literal(&self.ctx, literal, slot),
            Term::Variable(variable) => self.variable(variable, slot, suppress),
            Term::Unary(unary) => {
                let operand_slot = match unary.op {
                    UnaryOp::Not => Slot::Bool,
                    UnaryOp::Neg | UnaryOp::Parens => slot,
                };
                let operand = self.term(&unary.a, operand_slot, suppress)?;
                Ok(self.dialect.unary(unary.op, operand))
            }
            Term::Binary(binary) => self.binary(binary, slot),
            Term::Ternary(ternary) => {
                let condition = self.term(&ternary.a, Slot::Bool, false)?;
                let then = self.term(&ternary.b, slot, false)?;
                let otherwise = self.term(&ternary.c, slot, false)?;
                self.dialect
                    .ternary(&self.ctx, condition, then, otherwise, slot)
            }
        }
    }

    fn binary(&mut self, binary: &BinaryTerm, slot: Slot<'_>) -> Result<Compiled, GenerationError> {
        let op = binary.op;
        if op.is_comparison() {
            /* a null check must not dereference the value it checks */
            let suppress = binary.a.is_null() || binary.b.is_null();
            let a = self.term(&binary.a, Slot::Untyped, suppress)?;
            let b = self.term(&binary.b, Slot::Untyped, suppress)?;
            return Ok(self.dialect.comparison(op, a, b));
        }
        if op.is_logical() {
            let a = self.term(&binary.a, Slot::Bool, false)?;
            let b = self.term(&binary.b, Slot::Bool, false)?;
            return Ok(self.dialect.logical(op, a, b));
        }
        if op.is_bitwise() || op == BinaryOp::Pow {
            let a = self.term(&binary.a, Slot::Untyped, false)?;
            let b = self.term(&binary.b, Slot::Untyped, false)?;
            return if op == BinaryOp::Pow {
                self.dialect.power(&self.ctx, a, b, slot)
            } else {
                Ok(self.dialect.bitwise(op, a, b))
            };
        }
        /* arithmetic operands share the result slot */
        let a = self.term(&binary.a, slot, false)?;
        let b = self.term(&binary.b, slot, false)?;
        self.dialect.arithmetic(&self.ctx, op, a, b, slot)
    }

    fn variable(
        &mut self,
        variable: &VariableLiteral,
        slot: Slot<'_>,
        suppress: bool,
    ) -> Result<Compiled, GenerationError> {
        let classification = resolve(&self.ctx, variable)?;
        match classification {
            Classification::BuiltIn(built_in) => self.built_in(built_in, variable, slot),
            Classification::Implicit { field, .. } if self.mode == Mode::Serialize => {
                self.implicit(field)
            }
            Classification::Pseudo(PseudoName::TypeMeta) => self.type_meta(variable),
            Classification::Pseudo(PseudoName::LengthInBits | PseudoName::LengthInBytes)
                if self.mode == Mode::Parse =>
            {
                Err(self.ctx.fail(
                    variable.dotted(),
                    GenerationErrorKind::UnsupportedConstruct(format!(
                        "'{}' is only known while serializing",
                        variable.name
                    )),
                ))
            }
            classification => self.dialect.access(
                &self.ctx,
                &Access {
                    literal: variable,
                    classification,
                    mode: self.mode,
                    suppress_deref: suppress,
                },
            ),
        }
    }

    /* Implicit fields are never stored: serialize recomputes them from their term */
    fn implicit(&mut self, field: &'a ImplicitField) -> Result<Compiled, GenerationError> {
        if self.implicit_stack.iter().any(|name| *name == field.name) {
            return Err(self.ctx.fail(
                field.name.clone(),
                GenerationErrorKind::ImplicitCycle(field.name.clone()),
            ));
        }
        self.implicit_stack.push(field.name.clone());
        let compiled = self.term(
            &field.serialize_expression,
            Slot::Typed(&field.type_ref),
            false,
        );
        self.implicit_stack.pop();
        Ok(compiled?.map(|code| format!("({})", code)))
    }

    /* `_type.name`, `_type.length` and `_type.encoding` are known at generation time */
    fn type_meta(&self, variable: &VariableLiteral) -> Result<Compiled, GenerationError> {
        let field_type = self.ctx.field.and_then(|field| field.type_ref());
        let value = match variable.child.as_deref().map(|child| child.name.as_str()) {
            Some("name") => field_type.map(|type_ref| match type_ref {
                TypeReference::Simple(simple) => simple.base_type.keyword().to_string(),
                other => other.describe(),
            }),
            Some("length") => field_type
                .and_then(TypeReference::as_simple)
                .map(|simple| simple.bits().to_string()),
            Some("encoding") => Some(self.ctx.encoding().to_string()),
            _ => None,
        };
        value.map(|value| Compiled::new(quote(&value))).ok_or_else(|| {
            self.ctx.fail(
                variable.dotted(),
                GenerationErrorKind::UnsupportedConstruct(format!(
                    "type metadata '{}'",
                    variable.dotted()
                )),
            )
        })
    }

    fn built_in(
        &mut self,
        built_in: BuiltIn,
        variable: &VariableLiteral,
        slot: Slot<'_>,
    ) -> Result<Compiled, GenerationError> {
        let args: &[Term] = variable.args.as_deref().unwrap_or(&[]);
        built_in.check_arity(args.len()).map_err(|expected| {
            self.ctx.fail(
                variable.dotted(),
                GenerationErrorKind::BuiltInArity {
                    name: built_in.keyword().to_string(),
                    expected,
                    found: args.len(),
                },
            )
        })?;

        let call = match built_in {
            BuiltIn::Cast => {
                let value = self.term(&args[0], Slot::Untyped, false)?;
                let target = self.cast_target(&args[1])?;
                BuiltInCall::Cast {
                    value,
                    target,
                    child: variable.child.as_deref(),
                }
            }
            BuiltIn::StaticCall => {
                let Term::Literal(Literal::String(function)) = &args[0] else {
                    return Err(self.ctx.fail(
                        variable.dotted(),
                        GenerationErrorKind::UnsupportedConstruct(
                            "STATIC_CALL needs a string function name".to_string(),
                        ),
                    ));
                };
                let args = args[1..]
                    .iter()
                    .map(|arg| self.static_call_arg(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                BuiltInCall::StaticCall {
                    function: function.as_str(),
                    args,
                }
            }
            BuiltIn::Count => BuiltInCall::Count(self.term(&args[0], Slot::Untyped, false)?),
            BuiltIn::ArraySizeInBytes => {
                let array = match &args[0] {
                    Term::Variable(array) => array.name.as_str(),
                    _ => "array",
                };
                BuiltInCall::ArraySizeInBytes {
                    array,
                    value: self.term(&args[0], Slot::Untyped, false)?,
                }
            }
            BuiltIn::Ceil => BuiltInCall::Ceil(self.term(&args[0], Slot::Untyped, false)?),
            BuiltIn::StrLen => BuiltInCall::StrLen(self.term(&args[0], Slot::Untyped, false)?),
        };
        self.dialect.built_in(&self.ctx, call, self.mode, slot)
    }

    fn cast_target(&self, term: &Term) -> Result<CastTarget<'a>, GenerationError> {
        let registry = self.ctx.registry;
        let target = match term {
            Term::Variable(target) => registry
                .complex(&target.name)
                .map(CastTarget::Complex)
                .or_else(|| registry.enumeration(&target.name).map(CastTarget::Enum)),
            _ => None,
        };
        target.ok_or_else(|| {
            let label = match term {
                Term::Variable(target) => target.dotted(),
                _ => "<non-name>".to_string(),
            };
            self.ctx
                .fail(label.clone(), GenerationErrorKind::AmbiguousCast(label))
        })
    }

    /* Buffers and string literals pass through, `_type.*` is evaluated now */
    fn static_call_arg(&mut self, arg: &Term) -> Result<Compiled, GenerationError> {
        match arg {
            Term::Variable(variable) => match PseudoName::lookup(&variable.name) {
                Some(PseudoName::ReadBuffer | PseudoName::WriteBuffer) => {
                    Ok(Compiled::new(variable.name.clone()))
                }
                Some(PseudoName::TypeMeta) => self.type_meta(variable),
                _ => self.term(arg, Slot::Untyped, false),
            },
            Term::Literal(Literal::String(raw)) => Ok(Compiled::new(raw.clone())),
            other => self.term(other, Slot::Untyped, false),
        }
    }
}
