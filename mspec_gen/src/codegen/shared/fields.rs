/* Field-kind codegen
 *
 * One emitter method per field kind; `plan_fields` walks a type's field list
 * in declaration order and collects the plans. Backends only render
 * statements, the walk and the dispatch table are shared.
 */

use super::context::TypeContext;
use super::dispatch::{build_dispatch, SwitchSite};
use super::errors::GenerationError;
use super::expression::Dialect;
use super::imports::Imports;
use super::plan::{DispatchTable, FieldPlan};
use mspec_types::{
    ArrayField, ChecksumField, ComplexTypeDefinition, ConstField, DiscriminatorField, Field,
    ImplicitField, ManualField, OptionalField, ReservedField, SimpleField, VirtualField,
};

pub trait FieldEmitter: Dialect {
    fn const_field(&self, ctx: &TypeContext<'_>, field: &ConstField) -> Result<FieldPlan, GenerationError>;

    fn reserved_field(&self, ctx: &TypeContext<'_>, field: &ReservedField) -> Result<FieldPlan, GenerationError>;

    fn simple_field(&self, ctx: &TypeContext<'_>, field: &SimpleField) -> Result<FieldPlan, GenerationError>;

    fn array_field(&self, ctx: &TypeContext<'_>, field: &ArrayField) -> Result<FieldPlan, GenerationError>;

    fn optional_field(&self, ctx: &TypeContext<'_>, field: &OptionalField) -> Result<FieldPlan, GenerationError>;

    fn implicit_field(&self, ctx: &TypeContext<'_>, field: &ImplicitField) -> Result<FieldPlan, GenerationError>;

    fn checksum_field(&self, ctx: &TypeContext<'_>, field: &ChecksumField) -> Result<FieldPlan, GenerationError>;

    fn discriminator_field(
        &self,
        ctx: &TypeContext<'_>,
        field: &DiscriminatorField,
    ) -> Result<FieldPlan, GenerationError>;

    fn switch_field(
        &self,
        ctx: &TypeContext<'_>,
        site: SwitchSite<'_>,
        table: DispatchTable,
        imports: Imports,
    ) -> Result<FieldPlan, GenerationError>;

    fn manual_field(&self, ctx: &TypeContext<'_>, field: &ManualField) -> Result<FieldPlan, GenerationError>;

    fn virtual_field(&self, ctx: &TypeContext<'_>, field: &VirtualField) -> Result<FieldPlan, GenerationError>;
}

/// Plans every field of `owner` in declaration order.
pub fn plan_fields<'a, E: FieldEmitter>(
    emitter: &E,
    ctx: &TypeContext<'a>,
    owner: &'a ComplexTypeDefinition,
) -> Result<Vec<FieldPlan>, GenerationError> {
    owner
        .fields
        .iter()
        .enumerate()
        .map(|(position, field)| plan_field(emitter, ctx, owner, field, position))
        .collect()
}

pub fn plan_field<'a, E: FieldEmitter>(
    emitter: &E,
    ctx: &TypeContext<'a>,
    owner: &'a ComplexTypeDefinition,
    field: &'a Field,
    position: usize,
) -> Result<FieldPlan, GenerationError> {
    let ctx = ctx.with_field(field);
    tracing::debug!(
        type_name = ctx.type_name,
        field = field.name().unwrap_or("-"),
        kind = field.label(),
        backend = emitter.backend(),
        "planning field"
    );
    match field {
        Field::Const(f) => emitter.const_field(&ctx, f),
        Field::Reserved(f) => emitter.reserved_field(&ctx, f),
        Field::Simple(f) => emitter.simple_field(&ctx, f),
        Field::Array(f) => emitter.array_field(&ctx, f),
        Field::Optional(f) => emitter.optional_field(&ctx, f),
        Field::Implicit(f) => emitter.implicit_field(&ctx, f),
        Field::Checksum(f) => emitter.checksum_field(&ctx, f),
        Field::Discriminator(f) => emitter.discriminator_field(&ctx, f),
        Field::Switch(switch) => {
            let site = SwitchSite {
                owner,
                switch,
                position,
            };
            let (table, imports) = build_dispatch(emitter, &ctx, site)?;
            emitter.switch_field(&ctx, site, table, imports)
        }
        Field::Manual(f) => emitter.manual_field(&ctx, f),
        Field::Virtual(f) => emitter.virtual_field(&ctx, f),
    }
}

/// Line-oriented statement builder with a fixed indent unit.
#[derive(Debug, Clone)]
pub struct Lines {
    indent: &'static str,
    lines: Vec<String>,
}

impl Lines {
    pub fn new(indent: &'static str) -> Self {
        Self {
            indent,
            lines: Vec::new(),
        }
    }

    pub fn line(&mut self, depth: usize, text: impl AsRef<str>) -> &mut Self {
        self.lines
            .push(format!("{}{}", self.indent.repeat(depth), text.as_ref()));
        self
    }

    /// Appends a pre-rendered block, indenting each non-empty line by `depth`.
    pub fn block(&mut self, depth: usize, text: &str) -> &mut Self {
        for line in text.lines() {
            if line.is_empty() {
                self.lines.push(String::new());
            } else {
                self.line(depth, line);
            }
        }
        self
    }

    pub fn finish(&self) -> String {
        self.lines.join("\n")
    }
}
