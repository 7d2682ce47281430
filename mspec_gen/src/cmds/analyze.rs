/* Analyze command - type hierarchy and switch case reporting */

use super::common::load_registry;
use anyhow::{Context, anyhow};
use mspec_gen::codegen::{Backend, GeneratorOptions, generate_all};
use mspec_gen::spec::TypeRegistry;
use mspec_types::{CaseValue, Field, Literal, TypeDefinition};
use std::path::PathBuf;

/* Execute the analyze command */
pub fn run(
    files: Vec<PathBuf>,
    print_plan: Option<String>,
    backend: Backend,
    verbose: bool,
) -> anyhow::Result<()> {
    println!("mspec-gen - Type Analysis Tool");
    println!("==============================\n");

    let registry = load_registry(&files, verbose)?;

    println!(
        "[~] Protocol {} ({}), {} type definition(s) from {} file(s)",
        registry.protocol(),
        registry.flavor(),
        registry.len(),
        files.len()
    );
    println!();

    for def in registry.iter() {
        print_type(&registry, def);
    }

    if let Some(type_name) = print_plan.as_deref() {
        print_type_plan(&registry, type_name, backend)?;
    }

    Ok(())
}

fn print_type(registry: &TypeRegistry, def: &TypeDefinition) {
    match def {
        TypeDefinition::ComplexType(complex) => {
            let kind = if complex.is_abstract() { "abstract complex" } else { "complex" };
            match &complex.parent {
                Some(parent) => println!("  {} [{}] extends {}", complex.name, kind, parent),
                None => println!("  {} [{}]", complex.name, kind),
            }
            for field in &complex.fields {
                match field {
                    Field::Switch(switch) => {
                        let discriminators: Vec<String> =
                            switch.discriminators.iter().map(|d| d.dotted()).collect();
                        println!("    switch on ({})", discriminators.join(", "));
                        for case in &switch.cases {
                            let values: Vec<String> = case.values.iter().map(describe_case_value).collect();
                            let condition = if case.condition.is_some() { " + condition" } else { "" };
                            println!("      [{}]{} -> {}", values.join(", "), condition, case.name);
                        }
                    }
                    other => println!(
                        "    {} {}: {}",
                        other.label(),
                        other.name().unwrap_or("_"),
                        other.type_ref().map(|t| t.describe()).unwrap_or_default()
                    ),
                }
            }
            let children = registry.children_of(&complex.name);
            if !children.is_empty() {
                let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
                println!("    children: {}", names.join(", "));
            }
        }
        TypeDefinition::EnumType(enumeration) => {
            let backing = enumeration
                .type_ref
                .as_ref()
                .map(|t| t.describe())
                .unwrap_or_else(|| "untyped".to_string());
            println!("  {} [enum {}] {} value(s)", enumeration.name, backing, enumeration.values.len());
        }
        TypeDefinition::AnyDataType(any) => {
            println!("  {} [data-io]", any.name);
        }
    }
}

fn describe_case_value(value: &CaseValue) -> String {
    match value {
        CaseValue::Wildcard => "_".to_string(),
        CaseValue::Constant(name) => name.clone(),
        CaseValue::Value(Literal::Numeric(number)) => number.to_string(),
        CaseValue::Value(Literal::Hex(hex)) => hex.clone(),
        CaseValue::Value(Literal::String(text)) => format!("{:?}", text),
        CaseValue::Value(Literal::Bool(flag)) => flag.to_string(),
        CaseValue::Value(Literal::Null) => "null".to_string(),
    }
}

fn print_type_plan(registry: &TypeRegistry, type_name: &str, backend: Backend) -> anyhow::Result<()> {
    if registry.get(type_name).is_none() {
        return Err(anyhow!("Type '{}' not found in registry", type_name));
    }

    let options = GeneratorOptions {
        backend,
        ..GeneratorOptions::default()
    };
    let report = generate_all(registry, &options);

    if let Some(failure) = report.failure(type_name) {
        return Err(anyhow!("{}", failure)).context(format!("generating plan for {}", type_name));
    }
    let artifact = report
        .artifact(type_name)
        .cloned()
        .ok_or_else(|| anyhow!("no plan generated for {}", type_name))?;

    println!("\n[~] {} plan for {}:", backend.name(), type_name);
    let json = serde_json::to_string_pretty(&report.plan_set(vec![artifact]))
        .context("serializing plan")?;
    println!("{}", json);
    Ok(())
}
