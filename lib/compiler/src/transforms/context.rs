use graphql_parser::query::Definition;
use hive_compiler_config::CompilerConfig;

use crate::documents::{Document, DocumentKind};
use crate::schema::SchemaState;
use crate::transforms::registry::FragmentRegistry;
use crate::utils::ast::fragment_type_condition;

pub struct TransformContext<'a> {
    pub config: &'a CompilerConfig,
    pub schema: &'a SchemaState,
    pub documents: &'a mut [Document],
    /// Definitions generated along the way, shared by every document of the run.
    pub registry: &'a mut FragmentRegistry,
}

/// The type a definition's selection set is evaluated against.
pub fn definition_root_type<'a>(
    schema: &'a SchemaState,
    kind: DocumentKind,
    definition: &'a Definition<'static, String>,
) -> Option<&'a str> {
    match definition {
        Definition::Operation(_) => schema.root_type(kind),
        Definition::Fragment(fragment) => Some(fragment_type_condition(fragment)),
    }
}
