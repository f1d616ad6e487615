use graphql_parser::query::{
    Field, FragmentDefinition, Selection, SelectionSet, TypeCondition,
};
use graphql_parser::Pos;
use tracing::{debug, instrument};

use crate::directives;
use crate::error::{CompilerError, CompilerErrors};
use crate::transforms::context::{definition_root_type, TransformContext};
use crate::transforms::registry::{ListDefinition, ListOperationKind};
use crate::utils::ast::{
    definition_selection_set, directive_argument, empty_selection_set, find_directive,
    response_key,
};
use crate::utils::value::value_as_str;

/// The name a field's list is registered under, from `@list(name:)` or `@paginate(name:)`.
pub fn list_name<'a>(field: &'a Field<'static, String>) -> Option<&'a str> {
    find_directive(&field.directives, directives::LIST)
        .and_then(|list| directive_argument(list, directives::LIST_NAME_ARG))
        .or_else(|| {
            find_directive(&field.directives, directives::PAGINATE)
                .and_then(|paginate| directive_argument(paginate, directives::PAGINATE_NAME_ARG))
        })
        .and_then(value_as_str)
}

struct FoundList<'d> {
    name: String,
    element_type: String,
    connection: bool,
    field: &'d Field<'static, String>,
}

/// Generates the `<List>_insert`, `<List>_toggle` and `<List>_remove` fragments of every named list.
#[instrument(level = "trace", skip_all)]
pub fn list_fragments(ctx: &mut TransformContext) -> Result<(), CompilerErrors> {
    let mut errors = CompilerErrors::new();

    for document in ctx.documents.iter() {
        let mut found: Vec<FoundList> = Vec::new();

        for definition in &document.document.definitions {
            let Some(root_type) = definition_root_type(ctx.schema, document.kind, definition)
            else {
                continue;
            };

            ctx.schema.walk_fields(
                root_type,
                definition_selection_set(definition),
                &mut |_, field, schema_field| {
                    let (Some(name), Some(schema_field)) = (list_name(field), schema_field) else {
                        return;
                    };
                    let (element_type, connection) = ctx.schema.list_element_type(schema_field);
                    found.push(FoundList {
                        name: name.to_string(),
                        element_type: element_type.to_string(),
                        connection,
                        field,
                    });
                },
            );
        }

        for list in found {
            let keys = ctx.config.keys_for_type(&list.element_type);
            if !ctx.schema.has_key_fields(&list.element_type, keys) {
                errors.push(
                    CompilerError::structural(format!(
                        "List {} holds {} records, which have no identity fields",
                        list.name, list.element_type
                    ))
                    .with_filepath(&document.filepath)
                    .with_description(format!("expected the fields: {}", keys.join(", "))),
                );
                continue;
            }

            let selection = element_selection(list.field, list.connection);
            for kind in [ListOperationKind::Insert, ListOperationKind::Toggle] {
                ctx.registry.add_generated(generated_fragment(
                    kind.fragment_name(&list.name),
                    &list.element_type,
                    selection.clone(),
                ));
            }

            let mut identity = empty_selection_set();
            identity.items = keys
                .iter()
                .map(|key| Selection::Field(plain_field(key)))
                .collect();
            ctx.registry.add_generated(generated_fragment(
                ListOperationKind::Remove.fragment_name(&list.name),
                &list.element_type,
                identity,
            ));

            debug!(list = %list.name, type_name = %list.element_type, "generated list fragments");
            ctx.registry.add_list(ListDefinition {
                name: list.name,
                type_name: list.element_type,
                connection: list.connection,
                filepath: document.filepath.clone(),
            });
        }
    }

    errors.into_result(())
}

/// The selection of a single record: the `node` selection of a connection, the field's own otherwise.
fn element_selection(field: &Field<'static, String>, connection: bool) -> SelectionSet<'static, String> {
    if !connection {
        return field.selection_set.clone();
    }

    find_child(&field.selection_set, "edges")
        .and_then(|edges| find_child(&edges.selection_set, "node"))
        .map(|node| node.selection_set.clone())
        .unwrap_or_else(empty_selection_set)
}

fn find_child<'s>(
    selection_set: &'s SelectionSet<'static, String>,
    name: &str,
) -> Option<&'s Field<'static, String>> {
    selection_set.items.iter().find_map(|item| match item {
        Selection::Field(field) if response_key(field) == name => Some(field),
        _ => None,
    })
}

fn plain_field(name: &str) -> Field<'static, String> {
    Field {
        position: Pos::default(),
        alias: None,
        name: name.to_string(),
        arguments: Vec::new(),
        directives: Vec::new(),
        selection_set: empty_selection_set(),
    }
}

fn generated_fragment(
    name: String,
    type_name: &str,
    selection_set: SelectionSet<'static, String>,
) -> FragmentDefinition<'static, String> {
    FragmentDefinition {
        position: Pos::default(),
        name,
        type_condition: TypeCondition::On(type_name.to_string()),
        directives: Vec::new(),
        selection_set,
    }
}
