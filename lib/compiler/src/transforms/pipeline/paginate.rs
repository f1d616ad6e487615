use std::collections::BTreeMap;
use std::str::FromStr;

use graphql_parser::query::{
    Definition, Field, Selection, SelectionSet, Type, Value, VariableDefinition,
};
use graphql_parser::Pos;
use hive_compiler_config::runtime::PaginateMode;
use hive_compiler_config::CompilerConfig;
use tracing::{debug, instrument};

use crate::artifact::refetch::{PaginationDirection, PaginationMethod, Refetch};
use crate::directives;
use crate::documents::Document;
use crate::error::{CompilerError, CompilerErrors};
use crate::schema::SchemaState;
use crate::transforms::context::{definition_root_type, TransformContext};
use crate::transforms::fold::{fold_definition, fold_field_children, OwnedSelection, SelectionFolder};
use crate::utils::ast::{
    bare_directive, directive_argument, field_argument, find_directive, generated_field,
    has_directive, response_key, OperationDefinitionExt, TypeExt,
};
use crate::utils::value::{value_as_i64, value_as_str, value_to_json};

const CURSOR_ARGUMENTS: [&str; 4] = ["first", "after", "last", "before"];
const OFFSET_ARGUMENTS: [&str; 2] = ["limit", "offset"];

/// Whether the argument only selects a page, and is left out of the key of paginated fields.
pub fn is_pagination_argument(name: &str) -> bool {
    CURSOR_ARGUMENTS.contains(&name) || OFFSET_ARGUMENTS.contains(&name)
}

/// The mode of a `@paginate` field, `None` when the field is not paginated.
pub fn paginate_mode(field: &Field<'static, String>, config: &CompilerConfig) -> Option<PaginateMode> {
    let directive = find_directive(&field.directives, directives::PAGINATE)?;
    Some(
        directive_argument(directive, directives::PAGINATE_MODE_ARG)
            .and_then(value_as_str)
            .and_then(|mode| PaginateMode::from_str(mode).ok())
            .unwrap_or(config.default_paginate_mode),
    )
}

#[derive(Debug)]
struct PaginationVariable {
    name: String,
    value_type: Type<'static, String>,
    default_value: Option<Value<'static, String>>,
}

#[derive(Debug)]
struct PaginatedField {
    path: Vec<String>,
    method: PaginationMethod,
    direction: PaginationDirection,
    mode: PaginateMode,
    page_size: Option<Value<'static, String>>,
    start: Option<Value<'static, String>>,
    variables: Vec<PaginationVariable>,
}

/// Turns the pagination arguments of the `@paginate` field into variables, adds the connection
/// fields the runtime needs to load more pages and records the document's refetch descriptor.
#[instrument(level = "trace", skip_all)]
pub fn paginate(ctx: &mut TransformContext) -> Result<(), CompilerErrors> {
    let mut errors = CompilerErrors::new();

    for document in ctx.documents.iter_mut() {
        if let Err(error) = paginate_document(ctx.schema, ctx.config, document) {
            errors.push(error.or_filepath(&document.filepath));
        }
    }

    errors.into_result(())
}

fn paginate_document(
    schema: &SchemaState,
    config: &CompilerConfig,
    document: &mut Document,
) -> Result<(), CompilerError> {
    for definition in document.document.definitions.iter_mut() {
        let Some(root_type) =
            definition_root_type(schema, document.kind, definition).map(str::to_string)
        else {
            continue;
        };

        let mut folder = PaginateFolder {
            schema,
            config,
            path: Vec::new(),
            found: None,
        };
        fold_definition(&mut folder, &root_type, definition)?;
        let Some(paginated) = folder.found else {
            continue;
        };

        let embedded =
            matches!(definition, Definition::Fragment(_)) && !schema.is_root_type(&root_type);
        let keys = config.keys_for_type(&root_type);
        if embedded && !schema.has_key_fields(&root_type, keys) {
            return Err(CompilerError::structural(format!(
                "Paginated fragments must be defined on a type with identity fields, {} has none",
                root_type
            ))
            .with_description(format!("expected the fields: {}", keys.join(", "))));
        }

        declare_variables(definition, &paginated.variables);

        let page_size = paginated
            .page_size
            .as_ref()
            .and_then(|value| resolve_value(definition, value))
            .as_ref()
            .and_then(value_as_i64);
        let start = paginated
            .start
            .as_ref()
            .and_then(|value| resolve_value(definition, value))
            .filter(|value| !matches!(value, Value::Null))
            .map(|value| value_to_json(&value));

        debug!(
            document = %document.name,
            path = ?paginated.path,
            method = %paginated.method,
            "paginated document"
        );

        document.refetch = Some(Refetch {
            path: paginated.path,
            method: paginated.method,
            page_size,
            direction: paginated.direction,
            mode: paginated.mode,
            embedded,
            target_type: root_type,
            start,
        });
    }

    Ok(())
}

struct PaginateFolder<'a> {
    schema: &'a SchemaState,
    config: &'a CompilerConfig,
    path: Vec<String>,
    found: Option<PaginatedField>,
}

impl SelectionFolder for PaginateFolder<'_> {
    type Error = CompilerError;

    fn schema(&self) -> &SchemaState {
        self.schema
    }

    fn fold_field(
        &mut self,
        parent_type: &str,
        field: Field<'static, String>,
    ) -> Result<Vec<OwnedSelection>, CompilerError> {
        if has_directive(&field.directives, directives::PAGINATE) {
            return Ok(vec![Selection::Field(self.paginate_field(parent_type, field)?)]);
        }

        self.path.push(response_key(&field).to_string());
        let field = fold_field_children(self, parent_type, field)?;
        self.path.pop();

        Ok(vec![Selection::Field(field)])
    }
}

impl PaginateFolder<'_> {
    fn paginate_field(
        &mut self,
        parent_type: &str,
        mut field: Field<'static, String>,
    ) -> Result<Field<'static, String>, CompilerError> {
        let schema_field = self
            .schema
            .field(parent_type, &field.name)
            .cloned()
            .ok_or_else(|| {
                CompilerError::type_resolution(format!(
                    "Could not find the field {} on type {}",
                    field.name, parent_type
                ))
            })?;
        let declares = |name: &str| schema_field.has_argument(name);
        let connection = self
            .schema
            .connection_node_type(schema_field.field_type.inner_type())
            .is_some();

        let method = if connection && (declares("first") || declares("last")) {
            PaginationMethod::Cursor
        } else if declares("limit") && (connection || schema_field.field_type.is_list()) {
            PaginationMethod::Offset
        } else {
            return Err(CompilerError::structural(
                "@paginate can only be used on connections or lists that accept pagination arguments",
            )
            .with_description(format!("{}.{}", parent_type, field.name)));
        };

        let direction = match method {
            PaginationMethod::Cursor => match (declares("first"), declares("last")) {
                (true, true) => PaginationDirection::Both,
                (true, false) => PaginationDirection::Forward,
                _ => PaginationDirection::Backward,
            },
            PaginationMethod::Offset => PaginationDirection::Forward,
        };
        let (size_argument, start_argument) = match method {
            PaginationMethod::Cursor if direction.forward() => ("first", "after"),
            PaginationMethod::Cursor => ("last", "before"),
            PaginationMethod::Offset => ("limit", "offset"),
        };
        let page_size = field_argument(&field, size_argument).cloned();
        let start = field_argument(&field, start_argument).cloned();

        let argument_names: &[&str] = match method {
            PaginationMethod::Cursor => &CURSOR_ARGUMENTS,
            PaginationMethod::Offset => &OFFSET_ARGUMENTS,
        };

        let mut variables = Vec::new();
        for name in argument_names {
            let Some(schema_argument) = schema_field.argument(name) else {
                continue;
            };
            let variable = Value::Variable(name.to_string());
            let default_value = match field.arguments.iter_mut().find(|(arg, _)| arg == name) {
                Some((_, Value::Variable(_))) => continue,
                Some((_, value)) => Some(std::mem::replace(value, variable)),
                None => {
                    field.arguments.push((name.to_string(), variable));
                    None
                }
            };
            variables.push(PaginationVariable {
                name: name.to_string(),
                value_type: schema_argument.value_type.nullable().clone(),
                default_value,
            });
        }

        if connection {
            ensure_connection_fields(&mut field.selection_set);
        }

        let mut path = self.path.clone();
        path.push(response_key(&field).to_string());

        self.found = Some(PaginatedField {
            path,
            method,
            direction,
            mode: paginate_mode(&field, self.config).unwrap_or(self.config.default_paginate_mode),
            page_size,
            start,
            variables,
        });

        Ok(field)
    }
}

fn ensure_connection_fields(selection_set: &mut SelectionSet<'static, String>) {
    let edges = ensure_child(selection_set, "edges");
    ensure_child(&mut edges.selection_set, "cursor");
    let node = ensure_child(&mut edges.selection_set, "node");
    ensure_child(&mut node.selection_set, "__typename");

    let page_info = ensure_child(selection_set, "pageInfo");
    for name in ["hasPreviousPage", "hasNextPage", "startCursor", "endCursor"] {
        ensure_child(&mut page_info.selection_set, name);
    }
}

fn ensure_child<'s>(
    selection_set: &'s mut SelectionSet<'static, String>,
    name: &str,
) -> &'s mut Field<'static, String> {
    let position = selection_set.items.iter().position(|item| {
        matches!(item, Selection::Field(field) if field.name == name && response_key(field) == name)
    });
    let index = match position {
        Some(index) => index,
        None => {
            selection_set
                .items
                .push(Selection::Field(generated_field(name)));
            selection_set.items.len() - 1
        }
    };

    match &mut selection_set.items[index] {
        Selection::Field(field) => field,
        _ => unreachable!("the selection at this index is a field"),
    }
}

fn declare_variables(definition: &mut Definition<'static, String>, variables: &[PaginationVariable]) {
    match definition {
        Definition::Operation(operation) => {
            let Some(definitions) = operation.variable_definitions_mut() else {
                return;
            };
            for variable in variables {
                if definitions.iter().any(|known| known.name == variable.name) {
                    continue;
                }
                definitions.push(VariableDefinition {
                    position: Pos::default(),
                    name: variable.name.clone(),
                    var_type: variable.value_type.clone(),
                    default_value: variable.default_value.clone(),
                });
            }
        }
        Definition::Fragment(fragment) => {
            let index = match fragment
                .directives
                .iter()
                .position(|directive| directive.name == directives::ARGUMENTS)
            {
                Some(index) => index,
                None => {
                    fragment.directives.push(bare_directive(directives::ARGUMENTS));
                    fragment.directives.len() - 1
                }
            };
            let arguments = &mut fragment.directives[index].arguments;
            for variable in variables {
                if arguments.iter().any(|(name, _)| name == &variable.name) {
                    continue;
                }
                let mut declaration = BTreeMap::new();
                declaration.insert(
                    directives::ARGUMENT_TYPE_KEY.to_string(),
                    Value::String(variable.value_type.print()),
                );
                if let Some(default_value) = &variable.default_value {
                    declaration.insert(
                        directives::ARGUMENT_DEFAULT_KEY.to_string(),
                        default_value.clone(),
                    );
                }
                arguments.push((variable.name.clone(), Value::Object(declaration)));
            }
        }
    }
}

/// Resolves a variable to its default value, as declared by the operation or by `@arguments`.
fn resolve_value(
    definition: &Definition<'static, String>,
    value: &Value<'static, String>,
) -> Option<Value<'static, String>> {
    let Value::Variable(name) = value else {
        return Some(value.clone());
    };

    match definition {
        Definition::Operation(operation) => operation
            .variable_definitions()
            .iter()
            .find(|variable| &variable.name == name)
            .and_then(|variable| variable.default_value.clone()),
        Definition::Fragment(fragment) => find_directive(&fragment.directives, directives::ARGUMENTS)
            .and_then(|arguments| directive_argument(arguments, name))
            .and_then(|declaration| match declaration {
                Value::Object(fields) => fields.get(directives::ARGUMENT_DEFAULT_KEY).cloned(),
                _ => None,
            }),
    }
}
