use graphql_parser::query::{Definition as QueryDefinition, Value};
use graphql_parser::schema::{Definition, TypeDefinition, TypeExtension};
use hive_compiler_config::CompilerConfig;
use tracing::{debug, instrument, trace};

use crate::directives::{self, INTERNAL_SCHEMA};
use crate::documents::Document;
use crate::plugin::PluginRegistry;
use crate::schema::error::SchemaError;
use crate::schema::SchemaState;
use crate::utils::ast::{directive_argument, find_directive, fragment_type_condition};
use crate::utils::parsing::{safe_parse_schema, SchemaDocument};
use crate::utils::value::value_as_str;

const USER_SCHEMA: &str = "the schema";
const INTERNAL_DEFINITIONS: &str = "the internal definitions";
const RUNTIME_SCALARS: &str = "the runtime scalars";
const DOCUMENT_DEFINITIONS: &str = "the document definitions";

/// Builds the schema every later stage works with, one merge at a time.
///
/// Merging a definition that is already present verbatim is a no-op, so every step can be re-applied.
#[derive(Debug, Clone)]
pub struct SchemaAugmenter {
    document: SchemaDocument,
}

impl SchemaAugmenter {
    pub fn new(user_sdl: &str) -> Result<Self, SchemaError> {
        let mut augmenter = Self {
            document: SchemaDocument {
                definitions: Vec::new(),
            },
        };
        augmenter.merge_sdl(USER_SCHEMA, user_sdl)?;
        Ok(augmenter)
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    /// The merged schema, printed as SDL.
    pub fn sdl(&self) -> String {
        self.document.to_string()
    }

    pub fn build(&self) -> Result<SchemaState, SchemaError> {
        SchemaState::new(&self.document)
    }

    #[instrument(level = "trace", skip(self, sdl))]
    pub fn merge_sdl(&mut self, source_name: &str, sdl: &str) -> Result<(), SchemaError> {
        let parsed = safe_parse_schema(sdl).map_err(|error| SchemaError::ParseError {
            source_name: source_name.to_string(),
            message: error.to_string(),
        })?;

        let (extensions, definitions): (Vec<_>, Vec<_>) = parsed
            .definitions
            .into_iter()
            .partition(|definition| matches!(definition, Definition::TypeExtension(_)));

        for definition in definitions {
            self.merge_definition(source_name, definition)?;
        }

        for extension in extensions {
            if let Definition::TypeExtension(extension) = extension {
                self.fold_extension(source_name, extension)?;
            }
        }

        Ok(())
    }

    fn merge_definition(
        &mut self,
        source_name: &str,
        definition: Definition<'static, String>,
    ) -> Result<(), SchemaError> {
        let existing = self
            .document
            .definitions
            .iter()
            .find(|candidate| same_slot(candidate, &definition));

        match existing {
            None => {
                self.document.definitions.push(definition);
                Ok(())
            }
            Some(existing) if print_definition(existing) == print_definition(&definition) => {
                trace!(name = definition_name(&definition), "definition already present");
                Ok(())
            }
            Some(_) => Err(SchemaError::ConflictingDefinition {
                source_name: source_name.to_string(),
                name: definition_name(&definition).to_string(),
            }),
        }
    }

    fn fold_extension(
        &mut self,
        source_name: &str,
        extension: TypeExtension<'static, String>,
    ) -> Result<(), SchemaError> {
        let name = extension_name(&extension).to_string();
        let base = self
            .document
            .definitions
            .iter_mut()
            .find_map(|definition| match definition {
                Definition::TypeDefinition(type_definition)
                    if type_definition_name(type_definition) == name =>
                {
                    Some(type_definition)
                }
                _ => None,
            })
            .ok_or_else(|| SchemaError::ExtensionWithoutDefinition { name: name.clone() })?;

        let conflict = |member: &str| SchemaError::ConflictingDefinition {
            source_name: source_name.to_string(),
            name: format!("{}.{}", name, member),
        };

        match (base, extension) {
            (TypeDefinition::Object(object), TypeExtension::Object(extension)) => {
                merge_names(&mut object.implements_interfaces, extension.implements_interfaces);
                object.directives.extend(extension.directives);
                merge_fields(&mut object.fields, extension.fields, conflict)
            }
            (TypeDefinition::Interface(interface), TypeExtension::Interface(extension)) => {
                merge_names(
                    &mut interface.implements_interfaces,
                    extension.implements_interfaces,
                );
                interface.directives.extend(extension.directives);
                merge_fields(&mut interface.fields, extension.fields, conflict)
            }
            (TypeDefinition::Union(union_type), TypeExtension::Union(extension)) => {
                union_type.directives.extend(extension.directives);
                merge_names(&mut union_type.types, extension.types);
                Ok(())
            }
            (TypeDefinition::Enum(enum_type), TypeExtension::Enum(extension)) => {
                enum_type.directives.extend(extension.directives);
                for value in extension.values {
                    if !enum_type.values.iter().any(|known| known.name == value.name) {
                        enum_type.values.push(value);
                    }
                }
                Ok(())
            }
            (TypeDefinition::InputObject(input_object), TypeExtension::InputObject(extension)) => {
                input_object.directives.extend(extension.directives);
                for field in extension.fields {
                    match input_object.fields.iter().find(|known| known.name == field.name) {
                        Some(known) if known.value_type == field.value_type => {}
                        Some(_) => return Err(conflict(&field.name)),
                        None => input_object.fields.push(field),
                    }
                }
                Ok(())
            }
            (TypeDefinition::Scalar(scalar), TypeExtension::Scalar(extension)) => {
                scalar.directives.extend(extension.directives);
                Ok(())
            }
            _ => Err(SchemaError::MismatchedExtension { name: name.clone() }),
        }
    }

    /// Adds the definitions that depend on the collected documents: one `@<Type>_delete`
    /// directive per list type and one `Component` field per component field declaration.
    #[instrument(level = "trace", skip_all)]
    pub fn add_document_definitions(
        &mut self,
        schema: &SchemaState,
        documents: &[Document],
    ) -> Result<(), SchemaError> {
        let mut list_types: Vec<String> = Vec::new();
        let mut component_fields = String::new();

        for document in documents {
            for definition in &document.document.definitions {
                let root_type = match definition {
                    QueryDefinition::Operation(_) => schema.root_type(document.kind),
                    QueryDefinition::Fragment(fragment) => {
                        if let Some(sdl) = component_field_sdl(schema, fragment) {
                            component_fields.push_str(&sdl);
                        }
                        Some(fragment_type_condition(fragment))
                    }
                };
                let Some(root_type) = root_type else {
                    continue;
                };

                schema.walk_fields(
                    root_type,
                    crate::utils::ast::definition_selection_set(definition),
                    &mut |_, field, schema_field| {
                        let Some(schema_field) = schema_field else {
                            return;
                        };
                        let named_list = find_directive(&field.directives, directives::LIST)
                            .is_some()
                            || find_directive(&field.directives, directives::PAGINATE)
                                .and_then(|paginate| {
                                    directive_argument(paginate, directives::PAGINATE_NAME_ARG)
                                })
                                .is_some();
                        if named_list {
                            let (element_type, _) = schema.list_element_type(schema_field);
                            if !list_types.iter().any(|known| known == element_type) {
                                list_types.push(element_type.to_string());
                            }
                        }
                    },
                );
            }
        }

        let mut sdl = list_types
            .iter()
            .map(|type_name| {
                format!(
                    "directive @{} on FIELD\n",
                    directives::delete_directive_name(type_name)
                )
            })
            .collect::<String>();
        sdl.push_str(&component_fields);

        if sdl.is_empty() {
            return Ok(());
        }

        debug!(
            list_types = list_types.len(),
            "adding document definitions to the schema"
        );
        self.merge_sdl(DOCUMENT_DEFINITIONS, &sdl)
    }
}

/// Parses the user schema and merges the internal definitions, plugin contributions and runtime
/// scalars into it.
#[instrument(level = "trace", skip_all)]
pub fn augment_schema(
    config: &CompilerConfig,
    user_sdl: &str,
    plugins: &PluginRegistry,
) -> Result<SchemaAugmenter, SchemaError> {
    let mut augmenter = SchemaAugmenter::new(user_sdl)?;
    augmenter.merge_sdl(INTERNAL_DEFINITIONS, INTERNAL_SCHEMA)?;

    for plugin in plugins.iter() {
        if let Some(sdl) = plugin.schema(config) {
            debug!(plugin = plugin.name(), "merging plugin schema");
            augmenter.merge_sdl(&format!("plugin {}", plugin.name()), &sdl)?;
        }
    }

    let runtime_scalars = config
        .runtime_scalars
        .keys()
        .map(|name| format!("scalar {}\n", name))
        .collect::<String>();
    if !runtime_scalars.is_empty() {
        augmenter.merge_sdl(RUNTIME_SCALARS, &runtime_scalars)?;
    }

    Ok(augmenter)
}

/// `extend type T { field(args): Component }` for a fragment carrying `@componentField`.
fn component_field_sdl(
    schema: &SchemaState,
    fragment: &graphql_parser::query::FragmentDefinition<'static, String>,
) -> Option<String> {
    let directive = find_directive(&fragment.directives, directives::COMPONENT_FIELD)?;
    let field = directive_argument(directive, directives::COMPONENT_FIELD_FIELD_ARG)
        .and_then(value_as_str)?;
    let type_name = fragment_type_condition(fragment);
    let keyword = if schema.is_abstract(type_name) {
        "interface"
    } else {
        "type"
    };

    let arguments = find_directive(&fragment.directives, directives::ARGUMENTS)
        .map(|arguments| {
            arguments
                .arguments
                .iter()
                .filter_map(|(name, declaration)| match declaration {
                    Value::Object(fields) => fields
                        .get(directives::ARGUMENT_TYPE_KEY)
                        .and_then(value_as_str)
                        .map(|ty| format!("{}: {}", name, ty)),
                    _ => None,
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let arguments = if arguments.is_empty() {
        String::new()
    } else {
        format!("({})", arguments.join(", "))
    };

    Some(format!(
        "extend {} {} {{ {}{}: Component }}\n",
        keyword, type_name, field, arguments
    ))
}

fn merge_names(target: &mut Vec<String>, names: Vec<String>) {
    for name in names {
        if !target.contains(&name) {
            target.push(name);
        }
    }
}

fn merge_fields(
    target: &mut Vec<graphql_parser::schema::Field<'static, String>>,
    fields: Vec<graphql_parser::schema::Field<'static, String>>,
    conflict: impl Fn(&str) -> SchemaError,
) -> Result<(), SchemaError> {
    for field in fields {
        match target.iter().find(|known| known.name == field.name) {
            Some(known) if same_field(known, &field) => {}
            Some(_) => return Err(conflict(&field.name)),
            None => target.push(field),
        }
    }
    Ok(())
}

fn same_field(
    left: &graphql_parser::schema::Field<'static, String>,
    right: &graphql_parser::schema::Field<'static, String>,
) -> bool {
    left.field_type == right.field_type
        && left.arguments.len() == right.arguments.len()
        && left.arguments.iter().zip(&right.arguments).all(|(l, r)| {
            l.name == r.name && l.value_type == r.value_type && l.default_value == r.default_value
        })
}

fn same_slot(left: &Definition<'static, String>, right: &Definition<'static, String>) -> bool {
    match (left, right) {
        (Definition::SchemaDefinition(_), Definition::SchemaDefinition(_)) => true,
        (Definition::TypeDefinition(l), Definition::TypeDefinition(r)) => {
            type_definition_name(l) == type_definition_name(r)
        }
        (Definition::DirectiveDefinition(l), Definition::DirectiveDefinition(r)) => l.name == r.name,
        _ => false,
    }
}

/// Definitions are compared in their printed form, positions differ between sources.
fn print_definition(definition: &Definition<'static, String>) -> String {
    SchemaDocument {
        definitions: vec![definition.clone()],
    }
    .to_string()
}

fn definition_name<'d>(definition: &'d Definition<'static, String>) -> &'d str {
    match definition {
        Definition::SchemaDefinition(_) => "schema",
        Definition::TypeDefinition(type_definition) => type_definition_name(type_definition),
        Definition::TypeExtension(extension) => extension_name(extension),
        Definition::DirectiveDefinition(directive) => &directive.name,
    }
}

fn type_definition_name<'d>(definition: &'d TypeDefinition<'static, String>) -> &'d str {
    match definition {
        TypeDefinition::Scalar(scalar) => &scalar.name,
        TypeDefinition::Object(object) => &object.name,
        TypeDefinition::Interface(interface) => &interface.name,
        TypeDefinition::Union(union_type) => &union_type.name,
        TypeDefinition::Enum(enum_type) => &enum_type.name,
        TypeDefinition::InputObject(input_object) => &input_object.name,
    }
}

fn extension_name<'d>(extension: &'d TypeExtension<'static, String>) -> &'d str {
    match extension {
        TypeExtension::Scalar(scalar) => &scalar.name,
        TypeExtension::Object(object) => &object.name,
        TypeExtension::Interface(interface) => &interface.name,
        TypeExtension::Union(union_type) => &union_type.name,
        TypeExtension::Enum(enum_type) => &enum_type.name,
        TypeExtension::InputObject(input_object) => &input_object.name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{collect_documents, SourceDocument};
    use crate::plugin::CompilerPlugin;
    use crate::schema::TypeKind;
    use crate::utils::parsing::parse_document;
    use crate::utils::ast::TypeExt;

    const USER_SDL: &str = r#"
        type Query { user: User users: [User!]! }
        type User { id: ID! name: String }
        extend type User { age: Int }
    "#;

    #[test]
    fn internal_definitions_are_merged_once() {
        let config = CompilerConfig::default();
        let augmenter = augment_schema(&config, USER_SDL, &PluginRegistry::default()).unwrap();
        let sdl = augmenter.sdl();

        let mut again = augmenter.clone();
        again.merge_sdl("again", INTERNAL_SCHEMA).unwrap();

        assert_eq!(again.sdl(), sdl);
        assert_eq!(sdl.matches("directive @paginate").count(), 1);

        let state = augmenter.build().unwrap();
        assert_eq!(state.type_kind("CachePolicy"), Some(TypeKind::Enum));
        assert!(state.has_field("User", "age"));
    }

    #[test]
    fn conflicting_plugin_definitions_are_rejected() {
        struct Conflicting;
        impl CompilerPlugin for Conflicting {
            fn name(&self) -> &str {
                "conflicting"
            }
            fn schema(&self, _config: &CompilerConfig) -> Option<String> {
                Some("enum PaginateMode { Forever }".to_string())
            }
        }

        let config = CompilerConfig::default();
        let plugins = PluginRegistry::new(vec![Box::new(Conflicting)]);
        let error = augment_schema(&config, USER_SDL, &plugins).unwrap_err();

        assert_eq!(
            error,
            SchemaError::ConflictingDefinition {
                source_name: "plugin conflicting".to_string(),
                name: "PaginateMode".to_string(),
            }
        );
    }

    #[test]
    fn documents_contribute_delete_directives_and_component_fields() {
        let config = CompilerConfig::default();
        let mut augmenter = augment_schema(&config, USER_SDL, &PluginRegistry::default()).unwrap();
        let state = augmenter.build().unwrap();

        let documents = collect_documents(vec![
            SourceDocument::new(
                "a.graphql",
                parse_document("query AllUsers { users @list(name: \"All_Users\") { id } }"),
                "",
            ),
            SourceDocument::new(
                "b.graphql",
                parse_document(
                    "fragment UserAvatar on User @componentField(field: \"Avatar\", prop: \"user\") @arguments(size: {type: \"Int\"}) { name }",
                ),
                "",
            ),
        ])
        .unwrap();

        augmenter
            .add_document_definitions(&state, &documents)
            .unwrap();
        let state = augmenter.build().unwrap();

        assert!(augmenter.sdl().contains("directive @User_delete on FIELD"));
        let avatar = state.field("User", "Avatar").unwrap();
        assert_eq!(avatar.field_type.print(), "Component");
        assert!(avatar.has_argument("size"));
    }
}
