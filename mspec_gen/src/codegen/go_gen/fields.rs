/* Go field statements
 *
 * Parse functions return `(T, error)`, serializers return `error`, and the
 * length function accumulates into a `lengthInBits uint16` local.
 */

use super::types::{GoPrimitive, IMPORT_BIG, IMPORT_ERRORS, IMPORT_LOG};
use super::GoBackend;
use crate::codegen::shared::dispatch::SwitchSite;
use crate::codegen::shared::errors::{GenerationError, GenerationErrorKind};
use crate::codegen::shared::expression::{compile, compile_name, Dialect, Slot};
use crate::codegen::shared::fields::{FieldEmitter, Lines};
use crate::codegen::shared::naming::capitalize;
use crate::codegen::shared::plan::{DispatchTable, FieldPlan};
use crate::codegen::shared::resolver::PropertyKind;
use crate::codegen::shared::target::unsupported_primitive;
use crate::codegen::shared::{Compiled, Imports, Mode, TypeContext, TypeMapper};
use mspec_types::{
    ArrayField, ArrayLoop, BinaryOp, ChecksumField, ConstField, DiscriminatorField, ImplicitField,
    ManualField, OptionalField, ReservedField, SimpleBaseType, SimpleField, SimpleTypeReference,
    Term, TypeReference, VirtualField,
};

const TAB: &str = "\t";

impl GoBackend {
    /* Expression yielding `(value, error)` for one value of `type_ref` */
    fn read_expression(
        &self,
        ctx: &TypeContext<'_>,
        logical: &str,
        type_ref: &TypeReference,
    ) -> Result<Compiled, GenerationError> {
        match type_ref {
            TypeReference::Simple(simple) => {
                let primitive = GoPrimitive::of(ctx, simple)?;
                let mut width = self.width(ctx, simple, Mode::Parse)?;
                let call = primitive
                    .read_call(logical, &width.code, ctx.encoding())
                    .ok_or_else(|| unsupported_primitive(ctx, simple))?;
                width.imports.merge(&primitive.target().imports);
                Ok(width.map(|_| call))
            }
            TypeReference::Complex(complex) => {
                let params = complex
                    .params
                    .iter()
                    .map(|param| compile(self, ctx, param, Mode::Parse, Slot::Untyped))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Compiled::combine(params, |codes| {
                    let mut args = vec!["readBuffer".to_string()];
                    args.extend(codes);
                    format!("{}Parse({})", complex.name, args.join(", "))
                }))
            }
            TypeReference::Array(_) => Err(nested_array(ctx)),
        }
    }

    /* Expression yielding `error` after writing `value` */
    fn write_expression(
        &self,
        ctx: &TypeContext<'_>,
        logical: &str,
        type_ref: &TypeReference,
        value: &str,
    ) -> Result<Compiled, GenerationError> {
        match type_ref {
            TypeReference::Simple(simple) => {
                let primitive = GoPrimitive::of(ctx, simple)?;
                let width = self.width(ctx, simple, Mode::Serialize)?;
                let call = primitive
                    .write_call(logical, &width.code, ctx.encoding(), value)
                    .ok_or_else(|| unsupported_primitive(ctx, simple))?;
                Ok(width.map(|_| call))
            }
            TypeReference::Complex(_) => Ok(Compiled::new(format!("{}.Serialize(writeBuffer)", value))),
            TypeReference::Array(_) => Err(nested_array(ctx)),
        }
    }

    /* Declared width, or the compiled length term of a vstring */
    fn width(
        &self,
        ctx: &TypeContext<'_>,
        simple: &SimpleTypeReference,
        mode: Mode,
    ) -> Result<Compiled, GenerationError> {
        match (&simple.base_type, &simple.length) {
            (SimpleBaseType::Vstring, Some(length)) => compile(self, ctx, length, mode, Slot::Untyped),
            _ => Ok(Compiled::new(simple.bits().to_string())),
        }
    }

    fn length_statement(
        &self,
        ctx: &TypeContext<'_>,
        type_ref: &TypeReference,
        value: &str,
    ) -> Result<Compiled, GenerationError> {
        if let Some(bits) = fixed_bits(ctx, type_ref) {
            return Ok(Compiled::new(format!("lengthInBits += {}", bits)));
        }
        match type_ref.as_simple() {
            Some(simple) => Ok(self
                .width(ctx, simple, Mode::Serialize)?
                .map(|width| format!("lengthInBits += uint16({})", width))),
            None => Ok(Compiled::new(format!(
                "lengthInBits += {}.GetLengthInBits()",
                value
            ))),
        }
    }

    /* Reserved and const reference values, converted to the field's type */
    fn typed_value(
        &self,
        ctx: &TypeContext<'_>,
        type_ref: &TypeReference,
        code: &str,
    ) -> Result<Compiled, GenerationError> {
        let Some(simple) = type_ref.as_simple() else {
            return Ok(Compiled::new(code));
        };
        Ok(match GoPrimitive::of(ctx, simple)? {
            GoPrimitive::BigInt => {
                Compiled::new(format!("big.NewInt({})", code)).with_import(IMPORT_BIG)
            }
            GoPrimitive::BigFloat => {
                Compiled::new(format!("big.NewFloat({})", code)).with_import(IMPORT_BIG)
            }
            primitive if primitive.is_numeric() => Compiled::new(primitive.convert(code)),
            _ => Compiled::new(code),
        })
    }

    fn not_equal(&self, ctx: &TypeContext<'_>, type_ref: &TypeReference, a: &str, b: &str) -> String {
        let big = type_ref
            .as_simple()
            .and_then(|simple| GoPrimitive::of(ctx, simple).ok())
            .is_some_and(|primitive| primitive.is_big());
        if big {
            format!("{}.Cmp({}) != 0", a, b)
        } else {
            format!("{} != {}", a, b)
        }
    }

    fn converted(&self, ctx: &TypeContext<'_>, type_ref: &TypeReference, code: String) -> Result<String, GenerationError> {
        Ok(match type_ref.as_simple() {
            Some(simple) => GoPrimitive::of(ctx, simple)?.convert(&code),
            None => code,
        })
    }
}

fn nested_array(ctx: &TypeContext<'_>) -> GenerationError {
    ctx.fail(
        "array",
        GenerationErrorKind::UnsupportedConstruct("array of arrays".to_string()),
    )
}

/* Bits of one value when known at generation time */
fn fixed_bits(ctx: &TypeContext<'_>, type_ref: &TypeReference) -> Option<u32> {
    match type_ref {
        TypeReference::Simple(simple) if simple.base_type != SimpleBaseType::Vstring => {
            Some(simple.bits())
        }
        TypeReference::Complex(complex) => ctx
            .registry
            .enumeration(&complex.name)
            .and_then(|enumeration| enumeration.type_ref.as_ref())
            .and_then(TypeReference::as_simple)
            .map(SimpleTypeReference::bits),
        _ => None,
    }
}

/* `_x, _xErr := call` plus the error check of a parse step */
fn parse_step(lines: &mut Lines, depth: usize, ctx: &TypeContext<'_>, var: &str, field: &str, call: &str) {
    lines
        .line(depth, format!("{}, {}Err := {}", var, var, call))
        .line(depth, format!("if {}Err != nil {{", var))
        .line(
            depth + 1,
            format!(
                "return nil, errors.Wrap({}Err, \"Error parsing '{}' field of {}\")",
                var, field, ctx.type_name
            ),
        )
        .line(depth, "}");
}

fn write_step(lines: &mut Lines, depth: usize, var: &str, field: &str, call: &str) {
    lines
        .line(depth, format!("{}Err := {}", var, call))
        .line(depth, format!("if {}Err != nil {{", var))
        .line(
            depth + 1,
            format!(
                "return errors.Wrap({}Err, \"Error serializing '{}' field\")",
                var, field
            ),
        )
        .line(depth, "}");
}

impl FieldEmitter for GoBackend {
    fn const_field(&self, ctx: &TypeContext<'_>, field: &ConstField) -> Result<FieldPlan, GenerationError> {
        let mut req = Compiled::default().with_import(IMPORT_ERRORS);
        let target = self.type_name_for(ctx, &field.type_ref)?;
        req.imports.merge(&target.imports);
        let constant = format!("{}_{}", ctx.type_name, field.name.to_uppercase());
        let value = req.absorb(self.literal(ctx, &field.value, Slot::Typed(&field.type_ref))?);
        let call = req.absorb(self.read_expression(ctx, &field.name, &field.type_ref)?);
        let name = &field.name;

        let mut read = Lines::new(TAB);
        read.line(0, format!("// Const Field ({})", name));
        parse_step(&mut read, 0, ctx, name, name, &call);
        read.line(0, format!("if {} {{", self.not_equal(ctx, &field.type_ref, name, &constant)))
            .line(
                1,
                format!(
                    "return nil, errors.Errorf(\"Expected constant value %v but got %v\", {}, {})",
                    constant, name
                ),
            )
            .line(0, "}");

        let call = req.absorb(self.write_expression(ctx, name, &field.type_ref, &constant)?);
        let mut write = Lines::new(TAB);
        write.line(0, format!("// Const Field ({})", name));
        write_step(&mut write, 0, &format!("_{}", name), name, &call);

        let length = req.absorb(self.length_statement(ctx, &field.type_ref, &constant)?);

        let mut plan = FieldPlan::new(Some(name), "const");
        plan.target_type = Some(target.name);
        plan.read = read.finish();
        plan.write = write.finish();
        plan.length_in_bits = Some(length);
        plan.accessor = Some(value);
        plan.imports = req.imports;
        plan.requires_start_pos = req.requires_start_pos;
        Ok(plan)
    }

    fn reserved_field(&self, ctx: &TypeContext<'_>, field: &ReservedField) -> Result<FieldPlan, GenerationError> {
        let mut req = Compiled::default().with_import(IMPORT_ERRORS).with_import(IMPORT_LOG);
        let raw = req.absorb(self.literal(ctx, &field.reference_value, Slot::Typed(&field.type_ref))?);
        let expected = req.absorb(self.typed_value(ctx, &field.type_ref, &raw)?);
        let call = req.absorb(self.read_expression(ctx, "reserved", &field.type_ref)?);

        let mut read = Lines::new(TAB);
        read.line(0, "// Reserved Field (Compartmentalized so the \"reserved\" variable can't leak)")
            .line(0, "{");
        parse_step(&mut read, 1, ctx, "reserved", "reserved", &call);
        read.line(1, format!("if {} {{", self.not_equal(ctx, &field.type_ref, "reserved", &expected)))
            .line(2, "log.Info().Fields(map[string]any{")
            .line(3, format!("\"expected value\": {},", expected))
            .line(3, "\"got value\":      reserved,")
            .line(2, "}).Msg(\"Got unexpected response for reserved field.\")")
            .line(1, "}")
            .line(0, "}");

        let call = req.absorb(self.write_expression(ctx, "reserved", &field.type_ref, &expected)?);
        let mut write = Lines::new(TAB);
        write.line(0, "// Reserved Field (reserved)").line(0, "{");
        write_step(&mut write, 1, "_reserved", "reserved", &call);
        write.line(0, "}");

        let length = req.absorb(self.length_statement(ctx, &field.type_ref, &expected)?);

        let mut plan = FieldPlan::new(None, "reserved");
        plan.target_type = Some(self.type_name_for(ctx, &field.type_ref)?.name);
        plan.read = read.finish();
        plan.write = write.finish();
        plan.length_in_bits = Some(length);
        plan.imports = req.imports;
        Ok(plan)
    }

    fn simple_field(&self, ctx: &TypeContext<'_>, field: &SimpleField) -> Result<FieldPlan, GenerationError> {
        let mut req = Compiled::default().with_import(IMPORT_ERRORS);
        let target = self.type_name_for(ctx, &field.type_ref)?;
        req.imports.merge(&target.imports);
        let name = &field.name;
        let call = req.absorb(self.read_expression(ctx, name, &field.type_ref)?);

        let mut read = Lines::new(TAB);
        read.line(0, format!("// Simple Field ({})", name));
        parse_step(&mut read, 0, ctx, &format!("_{}", name), name, &call);
        read.line(0, format!("{} := _{}", name, name));

        let value = req.absorb(compile_name(self, ctx, name, Mode::Serialize)?);
        let call = req.absorb(self.write_expression(ctx, name, &field.type_ref, &format!("({})", name))?);
        let mut write = Lines::new(TAB);
        write
            .line(0, format!("// Simple Field ({})", name))
            .line(0, format!("{} := {}", name, value));
        write_step(&mut write, 0, &format!("_{}", name), name, &call);

        let length = req.absorb(self.length_statement(ctx, &field.type_ref, &value)?);

        let mut plan = FieldPlan::new(Some(name), "simple");
        plan.target_type = Some(target.name);
        plan.read = read.finish();
        plan.write = write.finish();
        plan.length_in_bits = Some(length);
        plan.imports = req.imports;
        plan.requires_start_pos = req.requires_start_pos;
        Ok(plan)
    }

    fn array_field(&self, ctx: &TypeContext<'_>, field: &ArrayField) -> Result<FieldPlan, GenerationError> {
        let mut req = Compiled::default().with_import(IMPORT_ERRORS);
        let element = self.type_name_for(ctx, &field.type_ref)?;
        req.imports.merge(&element.imports);
        let name = &field.name;
        let call = req.absorb(self.read_expression(ctx, name, &field.type_ref)?);
        let bound = req.absorb(compile(self, ctx, &field.loop_expression, Mode::Parse, Slot::Untyped)?);

        let mut read = Lines::new(TAB);
        read.line(0, format!("// Array Field ({})", name));
        match field.loop_type {
            ArrayLoop::Count => {
                read.line(0, "// Count array")
                    .line(0, format!("{} := make([]{}, int({}))", name, element.name, bound))
                    .line(0, "{")
                    .line(1, format!("_numItems := int({})", bound))
                    .line(1, "for _curItem := 0; _curItem < _numItems; _curItem++ {")
                    .line(2, "lastItem := _curItem == (_numItems - 1)")
                    .line(2, "_ = lastItem");
                parse_step(&mut read, 2, ctx, "_item", name, &call);
                read.line(2, format!("{}[_curItem] = _item", name))
                    .line(1, "}")
                    .line(0, "}");
            }
            ArrayLoop::Length => {
                read.line(0, "// Length array")
                    .line(0, format!("var {} []{}", name, element.name))
                    .line(0, "{")
                    .line(1, format!("_{}Length := {}", name, bound))
                    .line(1, format!("_{}EndPos := readBuffer.GetPos() + uint16(_{}Length)", name, name))
                    .line(1, format!("for readBuffer.GetPos() < _{}EndPos {{", name));
                parse_step(&mut read, 2, ctx, "_item", name, &call);
                read.line(2, format!("{} = append({}, _item)", name, name))
                    .line(1, "}")
                    .line(0, "}");
            }
            ArrayLoop::Terminated => {
                /* the term is checked before every element, an empty array reads nothing */
                read.line(0, "// Terminated array")
                    .line(0, format!("var {} []{}", name, element.name))
                    .line(0, "{")
                    .line(1, "lastItem := false")
                    .line(1, "_ = lastItem")
                    .line(1, format!("for !bool({}) {{", bound));
                parse_step(&mut read, 2, ctx, "_item", name, &call);
                read.line(2, format!("{} = append({}, _item)", name, name))
                    .line(1, "}")
                    .line(0, "}");
            }
        }

        let value = req.absorb(compile_name(self, ctx, name, Mode::Serialize)?);
        let call = req.absorb(self.write_expression(ctx, name, &field.type_ref, "_element")?);
        let mut write = Lines::new(TAB);
        write
            .line(0, format!("// Array Field ({})", name))
            .line(0, format!("for _curItem, _element := range {} {{", value))
            .line(1, format!("lastItem := _curItem == (len({}) - 1)", value))
            .line(1, "_ = lastItem");
        write_step(&mut write, 1, "_element", name, &call);
        write.line(0, "}");

        let mut length = Lines::new(TAB);
        length.line(0, format!("// Array field ({})", name));
        match fixed_bits(ctx, &field.type_ref) {
            Some(bits) => {
                length.line(0, format!("lengthInBits += {} * uint16(len({}))", bits, value));
            }
            None => {
                let element_length = req.absorb(self.length_statement(ctx, &field.type_ref, "element")?);
                length
                    .line(0, format!("for _, element := range {} {{", value))
                    .line(1, element_length)
                    .line(0, "}");
            }
        }

        let mut plan = FieldPlan::new(Some(name), "array");
        plan.target_type = Some(format!("[]{}", element.name));
        plan.read = read.finish();
        plan.write = write.finish();
        plan.length_in_bits = Some(length.finish());
        plan.imports = req.imports;
        plan.requires_start_pos = req.requires_start_pos;
        Ok(plan)
    }

    fn optional_field(&self, ctx: &TypeContext<'_>, field: &OptionalField) -> Result<FieldPlan, GenerationError> {
        let mut req = Compiled::default().with_import(IMPORT_ERRORS);
        let target = self.type_name_for(ctx, &field.type_ref)?;
        req.imports.merge(&target.imports);
        let name = &field.name;
        let pointer = matches!(
            PropertyKind::of(ctx, &field.type_ref)?,
            PropertyKind::Scalar | PropertyKind::Enum
        );
        let stored_type = if pointer {
            format!("*{}", target.name)
        } else {
            target.name.clone()
        };

        let presence = match &field.condition {
            Some(condition) => req.absorb(compile(self, ctx, condition, Mode::Parse, Slot::Bool)?),
            /* no condition: present while the buffer still has data */
            None => format!(
                "readBuffer.HasMore({})",
                fixed_bits(ctx, &field.type_ref).unwrap_or(8)
            ),
        };
        let call = req.absorb(self.read_expression(ctx, name, &field.type_ref)?);

        let mut read = Lines::new(TAB);
        read.line(
            0,
            format!(
                "// Optional Field ({}) (Can be skipped, if a given expression evaluates to false)",
                name
            ),
        )
        .line(0, format!("var {} {} = nil", name, stored_type))
        .line(0, format!("if {} {{", presence));
        parse_step(&mut read, 1, ctx, "_val", name, &call);
        read.line(
            1,
            if pointer {
                format!("{} = &_val", name)
            } else {
                format!("{} = _val", name)
            },
        )
        .line(0, "}");

        let is_set = req.absorb(compile(
            self,
            ctx,
            &Term::binary(BinaryOp::Ne, Term::var(name.as_str()), Term::null()),
            Mode::Serialize,
            Slot::Bool,
        )?);
        let value = req.absorb(compile_name(self, ctx, name, Mode::Serialize)?);
        let call = req.absorb(self.write_expression(ctx, name, &field.type_ref, &value)?);
        let mut write = Lines::new(TAB);
        write
            .line(
                0,
                format!("// Optional Field ({}) (Can be skipped, if the value is null)", name),
            )
            .line(0, format!("if {} {{", is_set));
        write_step(&mut write, 1, &format!("_{}", name), name, &call);
        write.line(0, "}");

        let element_length = req.absorb(self.length_statement(ctx, &field.type_ref, &value)?);
        let mut length = Lines::new(TAB);
        length
            .line(0, format!("// Optional Field ({})", name))
            .line(0, format!("if {} {{", is_set))
            .line(1, element_length)
            .line(0, "}");

        let mut plan = FieldPlan::new(Some(name), "optional");
        plan.target_type = Some(stored_type);
        plan.read = read.finish();
        plan.write = write.finish();
        plan.length_in_bits = Some(length.finish());
        plan.imports = req.imports;
        plan.requires_start_pos = req.requires_start_pos;
        Ok(plan)
    }

    fn implicit_field(&self, ctx: &TypeContext<'_>, field: &ImplicitField) -> Result<FieldPlan, GenerationError> {
        let mut req = Compiled::default().with_import(IMPORT_ERRORS);
        let target = self.type_name_for(ctx, &field.type_ref)?;
        req.imports.merge(&target.imports);
        let name = &field.name;
        let call = req.absorb(self.read_expression(ctx, name, &field.type_ref)?);

        let mut read = Lines::new(TAB);
        read.line(
            0,
            format!(
                "// Implicit Field ({}) (Used for parsing, but its value is not stored as it's implicitly given by the objects content)",
                name
            ),
        );
        parse_step(&mut read, 0, ctx, name, name, &call);
        read.line(0, format!("_ = {}", name));

        let recomputed = req.absorb(compile(
            self,
            ctx,
            &field.serialize_expression,
            Mode::Serialize,
            Slot::Typed(&field.type_ref),
        )?);
        let recomputed = self.converted(ctx, &field.type_ref, recomputed)?;
        let call = req.absorb(self.write_expression(ctx, name, &field.type_ref, &format!("({})", name))?);
        let mut write = Lines::new(TAB);
        write
            .line(
                0,
                format!(
                    "// Implicit Field ({}) (Used for parsing, but its value is not stored as it's implicitly given by the objects content)",
                    name
                ),
            )
            .line(0, format!("{} := {}", name, recomputed));
        write_step(&mut write, 0, &format!("_{}", name), name, &call);

        let length = req.absorb(self.length_statement(ctx, &field.type_ref, name)?);

        let mut plan = FieldPlan::new(Some(name), "implicit");
        plan.target_type = Some(target.name);
        plan.read = read.finish();
        plan.write = write.finish();
        plan.length_in_bits = Some(length);
        plan.imports = req.imports;
        plan.requires_start_pos = req.requires_start_pos;
        Ok(plan)
    }

    fn checksum_field(&self, ctx: &TypeContext<'_>, field: &ChecksumField) -> Result<FieldPlan, GenerationError> {
        let mut req = Compiled::default().with_import(IMPORT_ERRORS).with_start_pos();
        let target = self.type_name_for(ctx, &field.type_ref)?;
        req.imports.merge(&target.imports);
        let name = &field.name;
        let reference = format!("{}Ref", name);
        let call = req.absorb(self.read_expression(ctx, name, &field.type_ref)?);
        let expected = req.absorb(compile(
            self,
            ctx,
            &field.checksum_expression,
            Mode::Parse,
            Slot::Typed(&field.type_ref),
        )?);
        let expected = self.converted(ctx, &field.type_ref, expected)?;

        let mut read = Lines::new(TAB);
        read.line(0, format!("// Checksum Field ({})", name)).line(0, "{");
        parse_step(&mut read, 1, ctx, &reference, name, &call);
        read.line(1, format!("{} := {}", name, expected))
            .line(1, format!("if {} {{", self.not_equal(ctx, &field.type_ref, name, &reference)))
            .line(
                2,
                format!(
                    "return nil, errors.Errorf(\"Checksum verification failed. Expected %v but got %v\", {}, {})",
                    reference, name
                ),
            )
            .line(1, "}")
            .line(0, "}");

        let computed = req.absorb(compile(
            self,
            ctx,
            &field.checksum_expression,
            Mode::Serialize,
            Slot::Typed(&field.type_ref),
        )?);
        let computed = self.converted(ctx, &field.type_ref, computed)?;
        let call = req.absorb(self.write_expression(ctx, name, &field.type_ref, &format!("_{}", name))?);
        let mut write = Lines::new(TAB);
        write
            .line(0, format!("// Checksum Field ({}) (Calculated)", name))
            .line(0, "{")
            .line(1, format!("_{} := {}", name, computed));
        write_step(&mut write, 1, &format!("_{}", name), name, &call);
        write.line(0, "}");

        let length = req.absorb(self.length_statement(ctx, &field.type_ref, name)?);

        let mut plan = FieldPlan::new(Some(name), "checksum");
        plan.target_type = Some(target.name);
        plan.read = read.finish();
        plan.write = write.finish();
        plan.length_in_bits = Some(length);
        plan.imports = req.imports;
        plan.requires_start_pos = req.requires_start_pos;
        Ok(plan)
    }

    fn discriminator_field(
        &self,
        ctx: &TypeContext<'_>,
        field: &DiscriminatorField,
    ) -> Result<FieldPlan, GenerationError> {
        let mut req = Compiled::default().with_import(IMPORT_ERRORS);
        let target = self.type_name_for(ctx, &field.type_ref)?;
        req.imports.merge(&target.imports);
        let name = &field.name;
        let call = req.absorb(self.read_expression(ctx, name, &field.type_ref)?);

        let mut read = Lines::new(TAB);
        read.line(0, format!("// Discriminator Field ({}) (Used as input to a switch field)", name));
        parse_step(&mut read, 0, ctx, name, name, &call);

        let value = req.absorb(compile_name(self, ctx, name, Mode::Serialize)?);
        let call = req.absorb(self.write_expression(ctx, name, &field.type_ref, &format!("({})", name))?);
        let mut write = Lines::new(TAB);
        write
            .line(0, format!("// Discriminator Field ({}) (Used as input to a switch field)", name))
            .line(0, format!("{} := {}", name, value));
        write_step(&mut write, 0, &format!("_{}", name), name, &call);

        let length = req.absorb(self.length_statement(ctx, &field.type_ref, &value)?);

        let mut plan = FieldPlan::new(Some(name), "discriminator");
        plan.target_type = Some(target.name);
        plan.read = read.finish();
        plan.write = write.finish();
        plan.length_in_bits = Some(length);
        plan.imports = req.imports;
        Ok(plan)
    }

    fn switch_field(
        &self,
        _ctx: &TypeContext<'_>,
        site: SwitchSite<'_>,
        table: DispatchTable,
        imports: Imports,
    ) -> Result<FieldPlan, GenerationError> {
        let owner = &site.owner.name;
        let mut read = Lines::new(TAB);
        read.line(
            0,
            "// Switch Field (Depending on the discriminator values, passes the instantiation to a sub-type)",
        )
        .line(0, format!("var _child {}Child", owner))
        .line(0, "var typeSwitchError error")
        .line(0, "switch {");
        for case in &table.cases {
            let mut args = vec!["readBuffer".to_string()];
            args.extend(case.arguments.iter().cloned());
            read.line(
                0,
                format!(
                    "case {}: // {}",
                    case.condition.as_deref().unwrap_or("true"),
                    case.type_name
                ),
            )
            .line(
                1,
                format!(
                    "_child, typeSwitchError = {}Parse({})",
                    case.target_type,
                    args.join(", ")
                ),
            );
        }
        let labels = site
            .switch
            .discriminators
            .iter()
            .map(|discriminator| format!("{}=%v", discriminator.dotted()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut unmapped = vec![format!("\"Unmapped type for parameters [{}]\"", labels)];
        unmapped.extend(table.discriminators.iter().cloned());
        read.line(0, "default:")
            .line(1, format!("typeSwitchError = errors.Errorf({})", unmapped.join(", ")))
            .line(0, "}")
            .line(0, "if typeSwitchError != nil {")
            .line(
                1,
                format!(
                    "return nil, errors.Wrap(typeSwitchError, \"Error parsing sub-type for type-switch of {}\")",
                    owner
                ),
            )
            .line(0, "}");
        let mut forwarded = vec!["_child".to_string()];
        forwarded.extend(table.cases.first().map(|case| case.forwarded.clone()).unwrap_or_default());
        read.line(0, format!("_child.InitializeParent({})", forwarded.join(", ")));

        let mut write = Lines::new(TAB);
        write
            .line(0, "// Switch field (Serialize the sub-type)")
            .line(0, "if _typeSwitchErr := m.Child.SerializeChild(writeBuffer); _typeSwitchErr != nil {")
            .line(1, "return errors.Wrap(_typeSwitchErr, \"Error serializing sub-type field\")")
            .line(0, "}");

        let mut plan = FieldPlan::new(None, "switch");
        plan.target_type = Some(format!("{}Child", owner));
        plan.read = read.finish();
        plan.write = write.finish();
        plan.length_in_bits = Some("lengthInBits += m.Child.GetLengthInBits()".to_string());
        plan.imports = imports.union(&Imports::single(IMPORT_ERRORS));
        plan.dispatch = Some(table);
        Ok(plan)
    }

    fn manual_field(&self, ctx: &TypeContext<'_>, field: &ManualField) -> Result<FieldPlan, GenerationError> {
        let mut req = Compiled::default().with_import(IMPORT_ERRORS);
        let target = self.type_name_for(ctx, &field.type_ref)?;
        req.imports.merge(&target.imports);
        let name = &field.name;
        let parse = req.absorb(compile(
            self,
            ctx,
            &field.parse_expression,
            Mode::Parse,
            Slot::Typed(&field.type_ref),
        )?);

        let mut read = Lines::new(TAB);
        read.line(0, format!("// Manual Field ({})", name));
        parse_step(&mut read, 0, ctx, &format!("_{}", name), name, &parse);
        read.line(0, format!("{} := _{}", name, name));

        let serialize = req.absorb(compile(
            self,
            ctx,
            &field.serialize_expression,
            Mode::Serialize,
            Slot::Untyped,
        )?);
        let mut write = Lines::new(TAB);
        write.line(0, format!("// Manual Field ({})", name));
        write_step(&mut write, 0, &format!("_{}", name), name, &serialize);

        /* the length term counts bytes */
        let length = req.absorb(compile(
            self,
            ctx,
            &field.length_expression,
            Mode::Serialize,
            Slot::Untyped,
        )?);

        let mut plan = FieldPlan::new(Some(name), "manual");
        plan.target_type = Some(target.name);
        plan.read = read.finish();
        plan.write = write.finish();
        plan.length_in_bits = Some(format!("lengthInBits += uint16({}) * 8", length));
        plan.imports = req.imports;
        plan.requires_start_pos = req.requires_start_pos;
        Ok(plan)
    }

    fn virtual_field(&self, ctx: &TypeContext<'_>, field: &VirtualField) -> Result<FieldPlan, GenerationError> {
        let mut req = Compiled::default();
        let target = self.type_name_for(ctx, &field.type_ref)?;
        req.imports.merge(&target.imports);
        let name = &field.name;
        let slot = Slot::Typed(&field.type_ref);

        let parsed = req.absorb(compile(self, ctx, &field.value_expression, Mode::Parse, slot)?);
        let parsed = self.converted(ctx, &field.type_ref, parsed)?;
        let mut read = Lines::new(TAB);
        read.line(0, "// Virtual field")
            .line(0, format!("_{} := {}", name, parsed))
            .line(0, format!("{} := _{}", name, name))
            .line(0, format!("_ = {}", name));

        let mut write = Lines::new(TAB);
        write
            .line(0, "// Virtual field (doesn't actually serialize anything, just makes the value available)")
            .line(0, format!("{} := m.Get{}()", name, capitalize(name)))
            .line(0, format!("_ = {}", name));

        let accessor = req.absorb(compile(self, ctx, &field.value_expression, Mode::Serialize, slot)?);
        let accessor = self.converted(ctx, &field.type_ref, accessor)?;

        let mut plan = FieldPlan::new(Some(name), "virtual");
        plan.target_type = Some(target.name);
        plan.read = read.finish();
        plan.write = write.finish();
        plan.accessor = Some(accessor);
        plan.imports = req.imports;
        plan.requires_start_pos = req.requires_start_pos;
        Ok(plan)
    }
}
