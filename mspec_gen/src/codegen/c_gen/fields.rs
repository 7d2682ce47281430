/* C field statements
 *
 * Parse functions fill `(*_message)` and return a `plc4c_return_code`, the
 * serializer reads `_message`. Every buffer call is checked through `_res`.
 * Switch fields expand the fields of each case inline.
 */

use super::expr::member_name;
use super::types::{
  c_constant_name, c_header, c_type_name, CPrimitive, INCLUDE_LIST, INCLUDE_STDBOOL, INCLUDE_STDIO,
  INCLUDE_STDLIB, INCLUDE_STRING,
};
use super::CBackend;
use crate::codegen::shared::dispatch::SwitchSite;
use crate::codegen::shared::errors::{GenerationError, GenerationErrorKind};
use crate::codegen::shared::expression::{compile, compile_name, Dialect, Slot};
use crate::codegen::shared::fields::{plan_fields, FieldEmitter, Lines};
use crate::codegen::shared::plan::{DispatchTable, FieldPlan};
use crate::codegen::shared::resolver::PropertyKind;
use crate::codegen::shared::target::{unsupported_primitive, TargetType};
use crate::codegen::shared::{Compiled, Imports, Mode, TypeContext, TypeMapper};
use mspec_types::{
  ArrayField, ArrayLoop, BinaryOp, ChecksumField, ConstField, DiscriminatorField, ImplicitField,
  ManualField, OptionalField, ReservedField, SimpleBaseType, SimpleField, SimpleTypeReference,
  Term, TypeReference, VirtualField,
};

const INDENT: &str = "  ";

/* C local type and its initializer for one value of a type */
struct Local {
  ctype: String,
  init: String,
  /* complex values are always handled through pointers */
  pointer: bool,
}

impl CBackend {
  fn local(&self, ctx: &TypeContext<'_>, type_ref: &TypeReference) -> Result<Local, GenerationError> {
    let target = self.type_name_for(ctx, type_ref)?;
    Ok(match PropertyKind::of(ctx, type_ref)? {
      PropertyKind::Scalar => {
        let primitive = match type_ref.as_simple() {
          Some(simple) => CPrimitive::of(ctx, simple)?,
          None => return Err(nested_array(ctx)),
        };
        Local {
          ctype: target.name,
          init: primitive.zero().to_string(),
          pointer: false,
        }
      }
      PropertyKind::Enum => Local {
        init: format!("{}_null()", target.name),
        ctype: target.name,
        pointer: false,
      },
      PropertyKind::Complex => Local {
        ctype: format!("{}*", target.name),
        init: "NULL".to_string(),
        pointer: true,
      },
      PropertyKind::AnyData => Local {
        ctype: target.name,
        init: "NULL".to_string(),
        pointer: true,
      },
      PropertyKind::Array => return Err(nested_array(ctx)),
    })
  }

  /* Prefix of the parse, serialize and length functions of a complex, enum or any-data type */
  fn codec(&self, ctx: &TypeContext<'_>, type_ref: &TypeReference) -> Result<TargetType, GenerationError> {
    match type_ref.complex_name() {
      Some(name) if ctx.registry.is_any_data(name) => Ok(TargetType::with_import(
        c_type_name(ctx.registry, name),
        c_header(ctx.registry, name),
      )),
      _ => self.type_name_for(ctx, type_ref),
    }
  }

  /* Call reading one value of `type_ref` through the pointer expression `target` */
  fn read_into(
    &self,
    ctx: &TypeContext<'_>,
    type_ref: &TypeReference,
    target: &str,
  ) -> Result<Compiled, GenerationError> {
    match type_ref {
      TypeReference::Simple(simple) => {
        let primitive = CPrimitive::of(ctx, simple)?;
        let mut width = self.width(ctx, simple, Mode::Parse)?;
        let call = primitive
          .read_call(&width.code, ctx.encoding(), target)
          .ok_or_else(|| unsupported_primitive(ctx, simple))?;
        width.imports.merge(&primitive.target().imports);
        Ok(width.map(|_| call))
      }
      TypeReference::Complex(complex) => {
        let codec = self.codec(ctx, type_ref)?;
        let params = complex
          .params
          .iter()
          .map(|param| compile(self, ctx, param, Mode::Parse, Slot::Untyped))
          .collect::<Result<Vec<_>, _>>()?;
        let mut parsed = Compiled::combine(params, |codes| {
          let mut args = vec!["readBuffer".to_string()];
          args.extend(codes);
          args.push(format!("(void*) {}", target));
          format!("{}_parse({})", codec.name, args.join(", "))
        });
        parsed.imports.merge(&codec.imports);
        Ok(parsed)
      }
      TypeReference::Array(_) => Err(nested_array(ctx)),
    }
  }

  fn write_value(
    &self,
    ctx: &TypeContext<'_>,
    type_ref: &TypeReference,
    value: &str,
  ) -> Result<Compiled, GenerationError> {
    match type_ref {
      TypeReference::Simple(simple) => {
        let primitive = CPrimitive::of(ctx, simple)?;
        let width = self.width(ctx, simple, Mode::Serialize)?;
        let call = primitive
          .write_call(&width.code, ctx.encoding(), value)
          .ok_or_else(|| unsupported_primitive(ctx, simple))?;
        Ok(width.map(|_| call))
      }
      TypeReference::Complex(_) => {
        let codec = self.codec(ctx, type_ref)?;
        Ok(Compiled::new(format!("{}_serialize(writeBuffer, {})", codec.name, value)))
      }
      TypeReference::Array(_) => Err(nested_array(ctx)),
    }
  }

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
      return Ok(Compiled::new(format!("lengthInBits += {};", bits)));
    }
    match type_ref.as_simple() {
      Some(simple) => Ok(
        self
          .width(ctx, simple, Mode::Serialize)?
          .map(|width| format!("lengthInBits += {};", width)),
      ),
      None => {
        let codec = self.codec(ctx, type_ref)?;
        Ok(Compiled::new(format!(
          "lengthInBits += {}_length_in_bits({});",
          codec.name, value
        )))
      }
    }
  }

  /* `printf` conversion of a scalar or enum value */
  fn format_spec(&self, ctx: &TypeContext<'_>, type_ref: &TypeReference) -> Result<&'static str, GenerationError> {
    match type_ref.as_simple() {
      Some(simple) => Ok(CPrimitive::of(ctx, simple)?.format_spec()),
      None => Ok("%d"),
    }
  }

  fn not_equal(&self, type_ref: &TypeReference, a: &str, b: &str) -> Compiled {
    let string = type_ref.as_simple().is_some_and(|simple| simple.is_string());
    if string {
      Compiled::new(format!("strcmp({}, {}) != 0", a, b)).with_import(INCLUDE_STRING)
    } else {
      Compiled::new(format!("{} != {}", a, b))
    }
  }
}

fn nested_array(ctx: &TypeContext<'_>) -> GenerationError {
  ctx.fail(
    "array",
    GenerationErrorKind::UnsupportedConstruct("array of arrays".to_string()),
  )
}

fn fixed_bits(ctx: &TypeContext<'_>, type_ref: &TypeReference) -> Option<u32> {
  match type_ref {
    TypeReference::Simple(simple) if simple.base_type != SimpleBaseType::Vstring => Some(simple.bits()),
    TypeReference::Complex(complex) => ctx
      .registry
      .enumeration(&complex.name)
      .and_then(|enumeration| enumeration.type_ref.as_ref())
      .and_then(TypeReference::as_simple)
      .map(SimpleTypeReference::bits),
    _ => None,
  }
}

/* `(*_message)->member` receiving a parsed field */
fn stored(ctx: &TypeContext<'_>, name: &str) -> String {
  let member = match ctx.lookup_field(name) {
    Some((owner, _)) => member_name(&owner.name, owner.parent.is_some(), name),
    None => member_name(ctx.type_name, false, name),
  };
  format!("(*_message)->{}", member)
}

fn owner_name<'a>(ctx: &TypeContext<'a>, name: &str) -> &'a str {
  ctx
    .lookup_field(name)
    .map(|(owner, _)| owner.name.as_str())
    .unwrap_or(ctx.type_name)
}

/* `_res = call;` followed by its error check */
fn checked(lines: &mut Lines, depth: usize, call: &str) {
  lines
    .line(depth, format!("_res = {};", call))
    .line(depth, "if(_res != OK) {")
    .line(depth + 1, "return _res;")
    .line(depth, "}");
}

fn allocated(lines: &mut Lines, depth: usize, var: &str, ctype: &str) {
  lines
    .line(depth, format!("{} = malloc(sizeof({}));", var, ctype))
    .line(depth, format!("if({} == NULL) {{", var))
    .line(depth + 1, "return NO_MEMORY;")
    .line(depth, "}");
}

impl FieldEmitter for CBackend {
  fn const_field(&self, ctx: &TypeContext<'_>, field: &ConstField) -> Result<FieldPlan, GenerationError> {
    let mut req = Compiled::default().with_import(INCLUDE_STDIO);
    let local = self.local(ctx, &field.type_ref)?;
    req.imports.merge(&self.type_name_for(ctx, &field.type_ref)?.imports);
    let name = &field.name;
    let spec = self.format_spec(ctx, &field.type_ref)?;
    let constant = c_constant_name(ctx.registry, owner_name(ctx, name), name);
    let value = req.absorb(self.literal(ctx, &field.value, Slot::Typed(&field.type_ref))?);
    let call = req.absorb(self.read_into(ctx, &field.type_ref, &format!("&{}", name))?);
    let mismatch = req.absorb(self.not_equal(&field.type_ref, name, &constant));

    let mut read = Lines::new(INDENT);
    read
      .line(0, format!("// Const Field ({})", name))
      .line(0, format!("{} {} = {};", local.ctype, name, local.init));
    checked(&mut read, 0, &call);
    read
      .line(0, format!("if({}) {{", mismatch))
      .line(
        1,
        format!(
          "fprintf(stderr, \"Expected constant value '{}' but got '{}' for field {}.\\n\", {}, {});",
          spec, spec, name, constant, name
        ),
      )
      .line(1, "return PARSE_ERROR;")
      .line(0, "}");

    let call = req.absorb(self.write_value(ctx, &field.type_ref, &constant)?);
    let mut write = Lines::new(INDENT);
    write.line(0, format!("// Const Field ({})", name));
    checked(&mut write, 0, &call);

    let length = req.absorb(self.length_statement(ctx, &field.type_ref, &constant)?);

    let mut plan = FieldPlan::new(Some(name), "const");
    plan.target_type = Some(local.ctype);
    plan.read = read.finish();
    plan.write = write.finish();
    plan.length_in_bits = Some(length);
    plan.accessor = Some(value);
    plan.imports = req.imports;
    plan.requires_start_pos = req.requires_start_pos;
    Ok(plan)
  }

  fn reserved_field(&self, ctx: &TypeContext<'_>, field: &ReservedField) -> Result<FieldPlan, GenerationError> {
    let mut req = Compiled::default().with_import(INCLUDE_STDIO);
    let local = self.local(ctx, &field.type_ref)?;
    req.imports.merge(&self.type_name_for(ctx, &field.type_ref)?.imports);
    let expected = req.absorb(self.literal(ctx, &field.reference_value, Slot::Typed(&field.type_ref))?);
    let call = req.absorb(self.read_into(ctx, &field.type_ref, "&_reserved")?);
    let mismatch = req.absorb(self.not_equal(&field.type_ref, "_reserved", &expected));
    let spec = self.format_spec(ctx, &field.type_ref)?;

    let mut read = Lines::new(INDENT);
    read
      .line(0, "// Reserved Field (Compartmentalized so the \"reserved\" variable can't leak)")
      .line(0, "{")
      .line(1, format!("{} _reserved = {};", local.ctype, local.init));
    checked(&mut read, 1, &call);
    read
      .line(1, format!("if({}) {{", mismatch))
      .line(
        2,
        format!(
          "fprintf(stderr, \"Expected constant value '{}' but got '{}' for reserved field.\\n\", {}, _reserved);",
          spec, spec, expected
        ),
      )
      .line(1, "}")
      .line(0, "}");

    let call = req.absorb(self.write_value(ctx, &field.type_ref, &expected)?);
    let mut write = Lines::new(INDENT);
    write.line(0, "// Reserved Field");
    checked(&mut write, 0, &call);

    let length = req.absorb(self.length_statement(ctx, &field.type_ref, &expected)?);

    let mut plan = FieldPlan::new(None, "reserved");
    plan.target_type = Some(local.ctype);
    plan.read = read.finish();
    plan.write = write.finish();
    plan.length_in_bits = Some(length);
    plan.imports = req.imports;
    Ok(plan)
  }

  fn simple_field(&self, ctx: &TypeContext<'_>, field: &SimpleField) -> Result<FieldPlan, GenerationError> {
    let mut req = Compiled::default();
    let local = self.local(ctx, &field.type_ref)?;
    req.imports.merge(&self.type_name_for(ctx, &field.type_ref)?.imports);
    let name = &field.name;
    let call = req.absorb(self.read_into(ctx, &field.type_ref, &format!("&{}", name))?);

    let mut read = Lines::new(INDENT);
    read
      .line(0, format!("// Simple Field ({})", name))
      .line(0, format!("{} {} = {};", local.ctype, name, local.init));
    checked(&mut read, 0, &call);
    read.line(0, format!("{} = {};", stored(ctx, name), name));

    let value = req.absorb(compile_name(self, ctx, name, Mode::Serialize)?);
    let call = req.absorb(self.write_value(ctx, &field.type_ref, &value)?);
    let mut write = Lines::new(INDENT);
    write.line(0, format!("// Simple Field ({})", name));
    checked(&mut write, 0, &call);

    let length = req.absorb(self.length_statement(ctx, &field.type_ref, &value)?);

    let mut plan = FieldPlan::new(Some(name), "simple");
    plan.target_type = Some(local.ctype);
    plan.read = read.finish();
    plan.write = write.finish();
    plan.length_in_bits = Some(length);
    plan.imports = req.imports;
    plan.requires_start_pos = req.requires_start_pos;
    Ok(plan)
  }

  fn array_field(&self, ctx: &TypeContext<'_>, field: &ArrayField) -> Result<FieldPlan, GenerationError> {
    let mut req = Compiled::default()
      .with_import(INCLUDE_LIST)
      .with_import(INCLUDE_STDBOOL)
      .with_import(INCLUDE_STDLIB);
    let local = self.local(ctx, &field.type_ref)?;
    req.imports.merge(&self.type_name_for(ctx, &field.type_ref)?.imports);
    let name = &field.name;
    let bound = req.absorb(compile(self, ctx, &field.loop_expression, Mode::Parse, Slot::Untyped)?);

    /* one element: read it and push it onto the list */
    let mut element = Lines::new(INDENT);
    if local.pointer {
      let call = req.absorb(self.read_into(ctx, &field.type_ref, "&_value")?);
      element.line(0, format!("{} _value = NULL;", local.ctype));
      checked(&mut element, 0, &call);
    } else {
      let call = req.absorb(self.read_into(ctx, &field.type_ref, "_value")?);
      element.line(0, format!("{}* _value = NULL;", local.ctype));
      allocated(&mut element, 0, "_value", &local.ctype);
      checked(&mut element, 0, &call);
    }
    element.line(0, format!("plc4c_utils_list_insert_head_value({}, _value);", name));
    let element = element.finish();

    let mut read = Lines::new(INDENT);
    read
      .line(0, format!("// Array field ({})", name))
      .line(0, format!("plc4c_list* {} = NULL;", name))
      .line(0, format!("plc4c_utils_list_create(&{});", name))
      .line(0, format!("if({} == NULL) {{", name))
      .line(1, "return NO_MEMORY;")
      .line(0, "}")
      .line(0, "{");
    match field.loop_type {
      ArrayLoop::Count => {
        read
          .line(1, "// Count array")
          .line(1, format!("uint16_t itemCount = (uint16_t) {};", bound))
          .line(1, "for(int curItem = 0; curItem < itemCount; curItem++) {")
          .line(2, "bool lastItem = curItem == (itemCount - 1);")
          .block(2, &element)
          .line(1, "}");
      }
      ArrayLoop::Length => {
        read
          .line(1, "// Length array")
          .line(1, format!("uint16_t _{}Length = {};", name, bound))
          .line(
            1,
            format!(
              "uint16_t {}EndPos = plc4c_spi_read_get_pos(readBuffer) + _{}Length;",
              name, name
            ),
          )
          .line(1, format!("while(plc4c_spi_read_get_pos(readBuffer) < {}EndPos) {{", name))
          .block(2, &element)
          .line(1, "}");
      }
      ArrayLoop::Terminated => {
        /* the term is checked before every element, an empty array reads nothing */
        read
          .line(1, "// Terminated array")
          .line(1, "bool lastItem = false;")
          .line(1, format!("while(!({})) {{", bound))
          .block(2, &element)
          .line(1, "}");
      }
    }
    read
      .line(0, "}")
      .line(0, format!("{} = {};", stored(ctx, name), name));

    let value = req.absorb(compile_name(self, ctx, name, Mode::Serialize)?);
    let (value_type, element_value) = if local.pointer {
      (local.ctype.clone(), "_value")
    } else {
      (format!("{}*", local.ctype), "*_value")
    };
    let call = req.absorb(self.write_value(ctx, &field.type_ref, element_value)?);
    let mut write = Lines::new(INDENT);
    write
      .line(0, format!("// Array field ({})", name))
      .line(0, "{")
      .line(1, format!("uint16_t itemCount = plc4c_utils_list_size({});", value))
      .line(1, "for(int curItem = 0; curItem < itemCount; curItem++) {")
      .line(2, "bool lastItem = curItem == (itemCount - 1);")
      .line(
        2,
        format!(
          "{} _value = ({}) plc4c_utils_list_get_value({}, curItem);",
          value_type, value_type, value
        ),
      );
    checked(&mut write, 2, &call);
    write.line(1, "}").line(0, "}");

    let mut length = Lines::new(INDENT);
    length.line(0, format!("// Array field ({})", name));
    match fixed_bits(ctx, &field.type_ref) {
      Some(bits) => {
        length.line(0, format!("lengthInBits += {} * plc4c_utils_list_size({});", bits, value));
      }
      None => {
        let element_length = req.absorb(self.length_statement(
          ctx,
          &field.type_ref,
          &format!("({}) curElement->value", value_type),
        )?);
        length
          .line(0, format!("if({} != NULL) {{", value))
          .line(1, format!("plc4c_list_element* curElement = ({})->tail;", value))
          .line(1, "while(curElement != NULL) {")
          .line(2, element_length)
          .line(2, "curElement = curElement->next;")
          .line(1, "}")
          .line(0, "}");
      }
    }

    let mut plan = FieldPlan::new(Some(name), "array");
    plan.target_type = Some("plc4c_list*".to_string());
    plan.read = read.finish();
    plan.write = write.finish();
    plan.length_in_bits = Some(length.finish());
    plan.imports = req.imports;
    plan.requires_start_pos = req.requires_start_pos;
    Ok(plan)
  }

  fn optional_field(&self, ctx: &TypeContext<'_>, field: &OptionalField) -> Result<FieldPlan, GenerationError> {
    let mut req = Compiled::default().with_import(INCLUDE_STDLIB);
    let local = self.local(ctx, &field.type_ref)?;
    req.imports.merge(&self.type_name_for(ctx, &field.type_ref)?.imports);
    let name = &field.name;
    let stored_type = if local.pointer {
      local.ctype.clone()
    } else {
      format!("{}*", local.ctype)
    };

    let presence = match &field.condition {
      Some(condition) => req.absorb(compile(self, ctx, condition, Mode::Parse, Slot::Bool)?),
      /* no condition: present while the buffer still has data */
      None => format!(
        "plc4c_spi_read_has_more(readBuffer, {})",
        fixed_bits(ctx, &field.type_ref).unwrap_or(8)
      ),
    };

    let mut read = Lines::new(INDENT);
    read
      .line(
        0,
        format!(
          "// Optional Field ({}) (Can be skipped, if a given expression evaluates to false)",
          name
        ),
      )
      .line(0, format!("{} {} = NULL;", stored_type, name))
      .line(0, format!("if({}) {{", presence));
    if local.pointer {
      let call = req.absorb(self.read_into(ctx, &field.type_ref, &format!("&{}", name))?);
      checked(&mut read, 1, &call);
    } else {
      let call = req.absorb(self.read_into(ctx, &field.type_ref, name)?);
      allocated(&mut read, 1, name, &local.ctype);
      read.line(1, format!("*{} = {};", name, local.init));
      checked(&mut read, 1, &call);
    }
    read
      .line(1, format!("{} = {};", stored(ctx, name), name))
      .line(0, "} else {")
      .line(1, format!("{} = NULL;", stored(ctx, name)))
      .line(0, "}");

    let is_set = req.absorb(compile(
      self,
      ctx,
      &Term::binary(BinaryOp::Ne, Term::var(name.as_str()), Term::null()),
      Mode::Serialize,
      Slot::Bool,
    )?);
    let value = req.absorb(compile_name(self, ctx, name, Mode::Serialize)?);
    let call = req.absorb(self.write_value(ctx, &field.type_ref, &value)?);
    let mut write = Lines::new(INDENT);
    write
      .line(0, format!("// Optional Field ({})", name))
      .line(0, format!("if({}) {{", is_set));
    checked(&mut write, 1, &call);
    write.line(0, "}");

    let element_length = req.absorb(self.length_statement(ctx, &field.type_ref, &value)?);
    let mut length = Lines::new(INDENT);
    length
      .line(0, format!("// Optional Field ({})", name))
      .line(0, format!("if({}) {{", is_set))
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
    let mut req = Compiled::default();
    let local = self.local(ctx, &field.type_ref)?;
    req.imports.merge(&self.type_name_for(ctx, &field.type_ref)?.imports);
    let name = &field.name;
    let call = req.absorb(self.read_into(ctx, &field.type_ref, &format!("&{}", name))?);

    let mut read = Lines::new(INDENT);
    read
      .line(
        0,
        format!(
          "// Implicit Field ({}) (Used for parsing, but its value is not stored as it's implicitly given by the objects content)",
          name
        ),
      )
      .line(0, format!("{} {} = {};", local.ctype, name, local.init));
    checked(&mut read, 0, &call);

    let recomputed = req.absorb(compile(
      self,
      ctx,
      &field.serialize_expression,
      Mode::Serialize,
      Slot::Typed(&field.type_ref),
    )?);
    let call = req.absorb(self.write_value(ctx, &field.type_ref, &recomputed)?);
    let mut write = Lines::new(INDENT);
    write.line(0, format!("// Implicit Field ({}) (Used for parsing, but its value is not stored as it's implicitly given by the objects content)", name));
    checked(&mut write, 0, &call);

    let length = req.absorb(self.length_statement(ctx, &field.type_ref, name)?);

    let mut plan = FieldPlan::new(Some(name), "implicit");
    plan.target_type = Some(local.ctype);
    plan.read = read.finish();
    plan.write = write.finish();
    plan.length_in_bits = Some(length);
    plan.imports = req.imports;
    plan.requires_start_pos = req.requires_start_pos;
    Ok(plan)
  }

  fn checksum_field(&self, ctx: &TypeContext<'_>, field: &ChecksumField) -> Result<FieldPlan, GenerationError> {
    let mut req = Compiled::default().with_start_pos();
    let local = self.local(ctx, &field.type_ref)?;
    req.imports.merge(&self.type_name_for(ctx, &field.type_ref)?.imports);
    let name = &field.name;
    let reference = format!("_{}Ref", name);
    let call = req.absorb(self.read_into(ctx, &field.type_ref, &format!("&{}", reference))?);
    let expected = req.absorb(compile(
      self,
      ctx,
      &field.checksum_expression,
      Mode::Parse,
      Slot::Typed(&field.type_ref),
    )?);
    let mismatch = req.absorb(self.not_equal(&field.type_ref, &format!("_{}", name), &reference));

    let mut read = Lines::new(INDENT);
    read
      .line(0, format!("// Checksum Field ({})", name))
      .line(0, "{")
      .line(1, format!("{} {} = {};", local.ctype, reference, local.init));
    checked(&mut read, 1, &call);
    read
      .line(1, format!("{} _{} = ({}) ({});", local.ctype, name, local.ctype, expected))
      .line(1, format!("if({}) {{", mismatch))
      .line(2, "return PARSE_ERROR;")
      .line(1, "}")
      .line(0, "}");

    let computed = req.absorb(compile(
      self,
      ctx,
      &field.checksum_expression,
      Mode::Serialize,
      Slot::Typed(&field.type_ref),
    )?);
    let call = req.absorb(self.write_value(ctx, &field.type_ref, &format!("_{}", name))?);
    let mut write = Lines::new(INDENT);
    write
      .line(0, format!("// Checksum Field ({}) (Calculated)", name))
      .line(0, "{")
      .line(1, format!("{} _{} = ({}) ({});", local.ctype, name, local.ctype, computed));
    checked(&mut write, 1, &call);
    write.line(0, "}");

    let length = req.absorb(self.length_statement(ctx, &field.type_ref, name)?);

    let mut plan = FieldPlan::new(Some(name), "checksum");
    plan.target_type = Some(local.ctype);
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
    let mut req = Compiled::default();
    let local = self.local(ctx, &field.type_ref)?;
    req.imports.merge(&self.type_name_for(ctx, &field.type_ref)?.imports);
    let name = &field.name;
    let call = req.absorb(self.read_into(ctx, &field.type_ref, &format!("&{}", name))?);

    let mut read = Lines::new(INDENT);
    read
      .line(0, format!("// Discriminator Field ({}) (Used as input to a switch field)", name))
      .line(0, format!("{} {} = {};", local.ctype, name, local.init));
    checked(&mut read, 0, &call);

    let value = req.absorb(compile_name(self, ctx, name, Mode::Serialize)?);
    let call = req.absorb(self.write_value(ctx, &field.type_ref, &value)?);
    let mut write = Lines::new(INDENT);
    write.line(0, format!("// Discriminator Field ({})", name));
    checked(&mut write, 0, &call);

    let length = req.absorb(self.length_statement(ctx, &field.type_ref, &value)?);

    let mut plan = FieldPlan::new(Some(name), "discriminator");
    plan.target_type = Some(local.ctype);
    plan.read = read.finish();
    plan.write = write.finish();
    plan.length_in_bits = Some(length);
    plan.imports = req.imports;
    Ok(plan)
  }

  fn switch_field(
    &self,
    ctx: &TypeContext<'_>,
    site: SwitchSite<'_>,
    mut table: DispatchTable,
    imports: Imports,
  ) -> Result<FieldPlan, GenerationError> {
    let registry = ctx.registry;
    let root = ctx
      .root_type()
      .map(|root| c_type_name(registry, &root.name))
      .unwrap_or_else(|| c_type_name(registry, ctx.type_name));
    let mut req = Compiled::default().with_import(INCLUDE_STDIO);
    req.imports.merge(&imports);

    let mut read = Lines::new(INDENT);
    read.line(0, "// Switch Field (Depending of the current type, parse the sub-type elements)");
    let mut write = Lines::new(INDENT);
    write
      .line(0, "// Switch Field (Depending of the current type, serialize the sub-type elements)")
      .line(0, "switch(_message->_type) {");
    let mut length = Lines::new(INDENT);
    length
      .line(0, "// Depending of the current type, add the length of sub-type elements")
      .line(0, "switch(_message->_type) {");

    for (index, case) in table.cases.iter_mut().enumerate() {
      let Some(def) = registry.complex(&case.type_name) else {
        return Err(ctx.fail(
          case.type_name.clone(),
          GenerationErrorKind::UnknownType(case.type_name.clone()),
        ));
      };
      case.target_type = c_type_name(registry, &def.name);
      let type_constant = format!("{}_type_{}", root, case.target_type);
      let fields = plan_fields(self, &ctx.in_case(def), def)?;

      let keyword = if index == 0 { "if" } else { "} else if" };
      read
        .line(
          0,
          format!(
            "{}({}) {{ /* {} */",
            keyword,
            case.condition.as_deref().unwrap_or("true"),
            case.type_name
          ),
        )
        .line(1, format!("(*_message)->_type = {};", type_constant));
      write.line(1, format!("case {}: {{", type_constant));
      length.line(1, format!("case {}: {{", type_constant));
      for field in fields {
        req.imports.merge(&field.imports);
        req.requires_start_pos |= field.requires_start_pos;
        read.line(0, "").block(1, &field.read);
        write.line(0, "").block(2, &field.write);
        if let Some(field_length) = &field.length_in_bits {
          length.line(0, "").block(2, field_length);
        }
      }
      write.line(0, "").line(2, "break;").line(1, "}");
      length.line(0, "").line(2, "break;").line(1, "}");
    }

    let labels = site
      .switch
      .discriminators
      .iter()
      .map(|discriminator| format!("{}=%d", discriminator.dotted()))
      .collect::<Vec<_>>()
      .join(", ");
    let mut unmapped = vec![format!("\"Unmapped type for parameters [{}]\\n\"", labels)];
    unmapped.extend(table.discriminators.iter().cloned());
    if table.cases.is_empty() {
      read.line(0, "{");
    } else {
      read.line(0, "} else {");
    }
    read
      .line(1, format!("fprintf(stderr, {});", unmapped.join(", ")))
      .line(1, "return PARSE_ERROR;")
      .line(0, "}");
    write.line(1, "default: {").line(2, "break;").line(1, "}").line(0, "}");
    length.line(1, "default: {").line(2, "break;").line(1, "}").line(0, "}");

    let mut plan = FieldPlan::new(None, "switch");
    plan.target_type = Some(format!("{}_type", root));
    plan.read = read.finish();
    plan.write = write.finish();
    plan.length_in_bits = Some(length.finish());
    plan.imports = req.imports;
    plan.requires_start_pos = req.requires_start_pos;
    plan.dispatch = Some(table);
    Ok(plan)
  }

  fn manual_field(&self, ctx: &TypeContext<'_>, field: &ManualField) -> Result<FieldPlan, GenerationError> {
    let mut req = Compiled::default();
    let local = self.local(ctx, &field.type_ref)?;
    req.imports.merge(&self.type_name_for(ctx, &field.type_ref)?.imports);
    let name = &field.name;
    let parse = req.absorb(compile(
      self,
      ctx,
      &field.parse_expression,
      Mode::Parse,
      Slot::Typed(&field.type_ref),
    )?);

    let mut read = Lines::new(INDENT);
    read
      .line(0, format!("// Manual Field ({})", name))
      .line(0, format!("{} {} = ({}) ({});", local.ctype, name, local.ctype, parse))
      .line(0, format!("{} = {};", stored(ctx, name), name));

    let serialize = req.absorb(compile(
      self,
      ctx,
      &field.serialize_expression,
      Mode::Serialize,
      Slot::Untyped,
    )?);
    let mut write = Lines::new(INDENT);
    write.line(0, format!("// Manual Field ({})", name));
    checked(&mut write, 0, &serialize);

    /* the length term counts bytes */
    let length = req.absorb(compile(
      self,
      ctx,
      &field.length_expression,
      Mode::Serialize,
      Slot::Untyped,
    )?);

    let mut plan = FieldPlan::new(Some(name), "manual");
    plan.target_type = Some(local.ctype);
    plan.read = read.finish();
    plan.write = write.finish();
    plan.length_in_bits = Some(format!("lengthInBits += ({}) * 8;", length));
    plan.imports = req.imports;
    plan.requires_start_pos = req.requires_start_pos;
    Ok(plan)
  }

  fn virtual_field(&self, ctx: &TypeContext<'_>, field: &VirtualField) -> Result<FieldPlan, GenerationError> {
    let mut req = Compiled::default();
    let local = self.local(ctx, &field.type_ref)?;
    req.imports.merge(&self.type_name_for(ctx, &field.type_ref)?.imports);
    let name = &field.name;
    let slot = Slot::Typed(&field.type_ref);

    let parsed = req.absorb(compile(self, ctx, &field.value_expression, Mode::Parse, slot)?);
    let mut read = Lines::new(INDENT);
    read
      .line(0, "// Virtual field (doesn't actually serialize anything, just makes the value available)")
      .line(0, format!("{} {} = {};", local.ctype, name, parsed));

    let mut write = Lines::new(INDENT);
    write.line(0, "// Virtual field (doesn't actually serialize anything, just makes the value available)");

    let accessor = req.absorb(compile(self, ctx, &field.value_expression, Mode::Serialize, slot)?);

    let mut plan = FieldPlan::new(Some(name), "virtual");
    plan.target_type = Some(local.ctype);
    plan.read = read.finish();
    plan.write = write.finish();
    plan.accessor = Some(accessor);
    plan.imports = req.imports;
    plan.requires_start_pos = req.requires_start_pos;
    Ok(plan)
  }
}
