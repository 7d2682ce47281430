use crate::codegen::go_gen::GoBackend;
use crate::codegen::shared::fields::plan_fields;
use crate::codegen::shared::naming::quote;
use crate::codegen::shared::plan::{ArgumentPlan, EnumConstantPlan, TypeArtifact};
use crate::codegen::shared::{GenerationError, TypeContext, TypeMapper};
use crate::spec::TypeRegistry;
use mspec_types::{
    AnyDataTypeDefinition, Argument, ComplexTypeDefinition, EnumTypeDefinition, TypeDefinition,
    TypeReference,
};

pub struct GoCodeGenerator<'a> {
    registry: &'a TypeRegistry,
    options: GoCodeGeneratorOptions,
    backend: GoBackend,
}

pub struct GoCodeGeneratorOptions {
    /* emit the constant table of enum types */
    pub emit_enum_constants: bool,
}

impl Default for GoCodeGeneratorOptions {
    fn default() -> Self {
        Self {
            emit_enum_constants: true,
        }
    }
}

impl<'a> GoCodeGenerator<'a> {
    pub fn new(registry: &'a TypeRegistry, options: GoCodeGeneratorOptions) -> Self {
        Self {
            registry,
            options,
            backend: GoBackend,
        }
    }

    pub fn generate_type(&self, def: &'a TypeDefinition) -> Result<TypeArtifact, GenerationError> {
        tracing::debug!(type_name = def.name(), backend = "go", "generating type");
        match def {
            TypeDefinition::ComplexType(complex) => self.complex_type(complex),
            TypeDefinition::EnumType(enumeration) => self.enum_type(enumeration),
            TypeDefinition::AnyDataType(any) => self.any_data_type(any),
        }
    }

    fn complex_type(&self, def: &'a ComplexTypeDefinition) -> Result<TypeArtifact, GenerationError> {
        let ctx = TypeContext::for_type(self.registry, def);
        let mut artifact = TypeArtifact::new(def.name.clone(), def.name.clone());
        artifact.parent = def.parent.clone();
        artifact.arguments = self.arguments(&ctx, &def.parser_arguments)?;
        for argument in &artifact.arguments {
            artifact.imports.merge(&argument.target_type.imports);
        }
        artifact.push_fields(plan_fields(&self.backend, &ctx, def)?);
        Ok(artifact)
    }

    fn enum_type(&self, def: &'a EnumTypeDefinition) -> Result<TypeArtifact, GenerationError> {
        let ctx = TypeContext::for_name(self.registry, &def.name);
        let mut artifact = TypeArtifact::new(def.name.clone(), def.name.clone());
        if let Some(backing) = &def.type_ref {
            artifact.imports = self.backend.type_name_for(&ctx, backing)?.imports;
        }
        for argument in &def.constant_types {
            artifact
                .imports
                .merge(&self.backend.type_name_for(&ctx, &argument.type_ref)?.imports);
        }
        if !self.options.emit_enum_constants {
            return Ok(artifact);
        }
        artifact.enum_constants = def
            .values
            .iter()
            .map(|value| EnumConstantPlan {
                name: value.name.clone(),
                target_name: format!("{}_{}", def.name, value.name),
                value: value.value.clone(),
                constants: value
                    .constants
                    .iter()
                    .map(|(name, raw)| {
                        let rendered = match def.constant_type(name).map(|arg| &arg.type_ref) {
                            Some(TypeReference::Simple(simple))
                                if simple.is_string() && !raw.starts_with('"') =>
                            {
                                quote(raw)
                            }
                            /* enum-typed constants name a constant of that enum */
                            Some(TypeReference::Complex(complex))
                                if self.registry.enumeration(&complex.name).is_some() =>
                            {
                                format!("{}_{}", complex.name, raw)
                            }
                            _ => raw.clone(),
                        };
                        (name.clone(), rendered)
                    })
                    .collect(),
            })
            .collect();
        Ok(artifact)
    }

    fn any_data_type(&self, def: &'a AnyDataTypeDefinition) -> Result<TypeArtifact, GenerationError> {
        let ctx = TypeContext::for_name(self.registry, &def.name);
        let target = self
            .backend
            .type_name_for(&ctx, &TypeReference::complex(def.name.clone()))?;
        let mut artifact = TypeArtifact::new(def.name.clone(), target.name);
        artifact.imports = target.imports;
        artifact.arguments = self.arguments(&ctx, &def.parser_arguments)?;
        for argument in &artifact.arguments {
            artifact.imports.merge(&argument.target_type.imports);
        }
        Ok(artifact)
    }

    fn arguments(
        &self,
        ctx: &TypeContext<'_>,
        arguments: &[Argument],
    ) -> Result<Vec<ArgumentPlan>, GenerationError> {
        arguments
            .iter()
            .map(|argument| {
                Ok(ArgumentPlan {
                    name: argument.name.clone(),
                    target_type: self.backend.type_name_for(ctx, &argument.type_ref)?,
                })
            })
            .collect()
    }
}
