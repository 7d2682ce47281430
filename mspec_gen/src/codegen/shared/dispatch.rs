/* Discriminated dispatch
 *
 * Builds the ordered case table of a switch field. Declaration order is the
 * tie-break: when two cases both match, the one declared first wins, even if
 * a later case is more specific.
 */

use super::context::{Mode, TypeContext};
use super::errors::{GenerationError, GenerationErrorKind};
use super::expression::{compile, Dialect, Slot};
use super::imports::{Compiled, Imports};
use super::plan::{DispatchCase, DispatchTable};
use super::resolver::{resolve, Classification};
use mspec_types::{
    BinaryOp, CaseValue, ComplexTypeDefinition, Field, SwitchCase, SwitchField, Term,
    TypeReference, VariableLiteral,
};
use std::collections::BTreeSet;

/// A switch field together with the type that declares it and its index there.
#[derive(Debug, Clone, Copy)]
pub struct SwitchSite<'a> {
    pub owner: &'a ComplexTypeDefinition,
    pub switch: &'a SwitchField,
    pub position: usize,
}

impl<'a> SwitchSite<'a> {
    /// Fields of the owner that are fully read before the switch runs.
    pub fn read_before(&self) -> &'a [Field] {
        &self.owner.fields[..self.position.min(self.owner.fields.len())]
    }

    fn read_after(&self) -> &'a [Field] {
        let start = (self.position + 1).min(self.owner.fields.len());
        &self.owner.fields[start..]
    }
}

pub fn build_dispatch<'a, D: Dialect>(
    dialect: &D,
    ctx: &TypeContext<'a>,
    site: SwitchSite<'a>,
) -> Result<(DispatchTable, Imports), GenerationError> {
    let mut imports = Imports::new();

    let mut discriminators = Vec::with_capacity(site.switch.discriminators.len());
    for discriminator in &site.switch.discriminators {
        check_read_before_use(
            ctx,
            &site,
            None,
            &BTreeSet::from([discriminator.name.clone()]),
        )?;
        let code = compile(
            dialect,
            ctx,
            &Term::Variable(discriminator.clone()),
            Mode::Parse,
            Slot::Untyped,
        )?;
        imports.merge(&code.imports);
        discriminators.push((discriminator, discriminator_type(ctx, discriminator)?, code));
    }

    let forwarded = forwarded_fields(&site);
    let mut cases = Vec::with_capacity(site.switch.cases.len());
    for case in &site.switch.cases {
        let (dispatch_case, case_imports) =
            build_case(dialect, ctx, &site, case, &discriminators, &forwarded)?;
        imports.merge(&case_imports);
        cases.push(dispatch_case);
    }

    tracing::debug!(
        type_name = ctx.type_name,
        cases = cases.len(),
        "built dispatch table"
    );

    Ok((
        DispatchTable {
            discriminators: discriminators
                .into_iter()
                .map(|(_, _, code)| code.code)
                .collect(),
            cases,
        },
        imports,
    ))
}

fn build_case<'a, D: Dialect>(
    dialect: &D,
    ctx: &TypeContext<'a>,
    site: &SwitchSite<'a>,
    case: &'a SwitchCase,
    discriminators: &[(&VariableLiteral, Option<&'a TypeReference>, Compiled)],
    forwarded: &[String],
) -> Result<(DispatchCase, Imports), GenerationError> {
    if case.values.len() > discriminators.len() {
        return Err(ctx.fail(
            case.name.clone(),
            GenerationErrorKind::MissingDiscriminator {
                case: case.name.clone(),
                values: case.values.len(),
                discriminators: discriminators.len(),
            },
        ));
    }

    let mut parts: Vec<Compiled> = Vec::new();
    let mut values = Vec::with_capacity(discriminators.len());
    for (index, (_, type_ref, discriminator_code)) in discriminators.iter().enumerate() {
        /* values missing at the tail match anything */
        let value = match case.values.get(index) {
            None | Some(CaseValue::Wildcard) => None,
            Some(CaseValue::Value(literal)) => {
                let slot = type_ref.map(Slot::Typed).unwrap_or(Slot::Untyped);
                Some(dialect.literal(ctx, literal, slot)?)
            }
            Some(CaseValue::Constant(constant)) => {
                Some(enum_constant(dialect, ctx, *type_ref, constant)?)
            }
        };
        values.push(value.as_ref().map(|value| value.code.clone()));
        if let Some(value) = value {
            parts.push(dialect.comparison(BinaryOp::Eq, discriminator_code.clone(), value));
        }
    }

    if let Some(condition) = &case.condition {
        check_read_before_use(ctx, site, Some(case), &condition.referenced_names())?;
        parts.push(compile(dialect, ctx, condition, Mode::Parse, Slot::Bool)?);
    }

    let condition = parts
        .into_iter()
        .reduce(|acc, part| dialect.logical(BinaryOp::And, acc, part));
    let imports = condition
        .as_ref()
        .map(|condition| condition.imports.clone())
        .unwrap_or_default();

    let target_type = dialect.type_name_for(ctx, &TypeReference::complex(case.name.clone()))?;
    let mut arguments: Vec<String> = Vec::new();
    for name in site
        .owner
        .parser_arguments
        .iter()
        .chain(case.parser_arguments.iter())
        .map(|arg| arg.name.clone())
    {
        if !arguments.contains(&name) {
            arguments.push(name);
        }
    }

    Ok((
        DispatchCase {
            type_name: case.name.clone(),
            target_type: target_type.name,
            values,
            condition: condition.map(|condition| condition.code),
            arguments,
            forwarded: forwarded.to_vec(),
        },
        imports.union(&target_type.imports),
    ))
}

/* Names in discriminators and case conditions must already have been read */
fn check_read_before_use(
    ctx: &TypeContext<'_>,
    site: &SwitchSite<'_>,
    case: Option<&SwitchCase>,
    names: &BTreeSet<String>,
) -> Result<(), GenerationError> {
    for name in names {
        if declares(site.read_before(), name) {
            continue;
        }
        let later = declares(site.read_after(), name)
            || case.is_some_and(|case| declares(case.fields.as_slice(), name));
        if later {
            let construct = match case {
                Some(case) => format!("condition of case {}", case.name),
                None => "switch discriminator".to_string(),
            };
            return Err(ctx.fail(construct, GenerationErrorKind::NotYetRead(name.clone())));
        }
    }
    Ok(())
}

fn declares(fields: &[Field], name: &str) -> bool {
    fields.iter().any(|field| field.name() == Some(name))
}

/* Type of a discriminator reference, used to type literal case values */
fn discriminator_type<'a>(
    ctx: &TypeContext<'a>,
    discriminator: &VariableLiteral,
) -> Result<Option<&'a TypeReference>, GenerationError> {
    Ok(match resolve(ctx, discriminator)? {
        Classification::Field(property) | Classification::Argument(property)
            if discriminator.child.is_none() =>
        {
            Some(property.type_ref)
        }
        Classification::DiscriminatorAccess { target, .. } => {
            let child = discriminator.child.as_deref().map(|child| child.name.as_str());
            std::iter::once(target)
                .chain(ctx.registry.parent_chain(&target.name))
                .flat_map(|def| def.discriminator_fields())
                .find(|field| Some(field.name.as_str()) == child)
                .map(|field| &field.type_ref)
        }
        _ => None,
    })
}

fn enum_constant<D: Dialect>(
    dialect: &D,
    ctx: &TypeContext<'_>,
    type_ref: Option<&TypeReference>,
    constant: &str,
) -> Result<Compiled, GenerationError> {
    let enumeration = type_ref
        .and_then(TypeReference::complex_name)
        .and_then(|name| ctx.registry.enumeration(name));
    match enumeration {
        Some(enumeration) if enumeration.value(constant).is_some() => compile(
            dialect,
            ctx,
            &Term::path(&[enumeration.name.as_str(), constant]),
            Mode::Parse,
            Slot::Untyped,
        ),
        _ => Err(ctx.fail(
            constant.to_string(),
            GenerationErrorKind::UnresolvedName(constant.to_string()),
        )),
    }
}

/* Stored fields read before the switch; these seed the case's parent part */
fn forwarded_fields(site: &SwitchSite<'_>) -> Vec<String> {
    site.read_before()
        .iter()
        .filter(|field| {
            matches!(
                field,
                Field::Simple(_) | Field::Array(_) | Field::Optional(_) | Field::Manual(_)
            )
        })
        .filter_map(|field| field.name().map(str::to_string))
        .collect()
}
