use std::collections::VecDeque;

use graphql_parser::query::{Definition, Type, Value};
use hive_compiler_config::CompilerConfig;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CompilerError;
use crate::schema::SchemaState;
use crate::transforms::pipeline::argument_declarations;
use crate::utils::ast::{OperationDefinitionExt, TypeExt};
use crate::utils::parsing::QueryDocument;
use crate::utils::value::value_to_json;

/// The variables a document accepts, and what the runtime needs to know to serialize them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    /// Variable name to the name of its type.
    pub fields: IndexMap<String, String>,
    /// Every input object reachable from the variables, with the type of each of its fields.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub types: IndexMap<String, IndexMap<String, String>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub defaults: IndexMap<String, serde_json::Value>,
    /// Variables typed with a runtime scalar, mapped to the scalar.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub runtime_scalars: IndexMap<String, String>,
}

struct InputVariable<'d> {
    name: &'d str,
    value_type: &'d Type<'static, String>,
    default_value: Option<&'d Value<'static, String>>,
}

/// Builds the input descriptor from the operation's variable definitions, or from the
/// `@arguments` of a fragment. `None` when the document takes no input.
pub fn input_descriptor(
    config: &CompilerConfig,
    schema: &SchemaState,
    document: &QueryDocument,
    stripped: &[String],
) -> Result<Option<InputDescriptor>, CompilerError> {
    let declarations;
    let variables: Vec<InputVariable> = match document.definitions.first() {
        Some(Definition::Operation(operation)) => operation
            .variable_definitions()
            .iter()
            .filter(|variable| !stripped.contains(&variable.name))
            .map(|variable| InputVariable {
                name: &variable.name,
                value_type: &variable.var_type,
                default_value: variable.default_value.as_ref(),
            })
            .collect(),
        Some(Definition::Fragment(fragment)) => {
            declarations = argument_declarations(fragment)?.unwrap_or_default();
            declarations
                .iter()
                .map(|declaration| InputVariable {
                    name: &declaration.name,
                    value_type: &declaration.value_type,
                    default_value: declaration.default_value.as_ref(),
                })
                .collect()
        }
        None => Vec::new(),
    };

    if variables.is_empty() {
        return Ok(None);
    }

    let mut descriptor = InputDescriptor::default();
    let mut pending = VecDeque::new();

    for variable in variables {
        let type_name = variable.value_type.inner_type();
        descriptor
            .fields
            .insert(variable.name.to_string(), type_name.to_string());
        if let Some(default_value) = variable.default_value {
            descriptor
                .defaults
                .insert(variable.name.to_string(), value_to_json(default_value));
        }
        if config.is_runtime_scalar(type_name) {
            descriptor
                .runtime_scalars
                .insert(variable.name.to_string(), type_name.to_string());
        }
        pending.push_back(type_name.to_string());
    }

    while let Some(type_name) = pending.pop_front() {
        if descriptor.types.contains_key(&type_name) {
            continue;
        }
        let Some(fields) = schema.input_fields(&type_name) else {
            continue;
        };

        let mut field_types = IndexMap::new();
        for (field_name, field) in fields {
            let field_type = field.value_type.inner_type();
            field_types.insert(field_name.clone(), field_type.to_string());
            pending.push_back(field_type.to_string());
        }
        descriptor.types.insert(type_name, field_types);
    }

    Ok(Some(descriptor))
}
