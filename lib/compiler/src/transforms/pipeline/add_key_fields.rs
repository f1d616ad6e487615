use std::convert::Infallible;

use graphql_parser::query::{
    Definition, Field, InlineFragment, Selection, SelectionSet, TypeCondition,
};
use graphql_parser::Pos;
use hive_compiler_config::CompilerConfig;
use tracing::instrument;

use crate::error::CompilerErrors;
use crate::schema::{SchemaState, TypeKind, TYPENAME_FIELD};
use crate::transforms::context::{definition_root_type, TransformContext};
use crate::transforms::fold::{
    field_type_name, fold_definition, fold_field_children, fold_inline_children, inline_type_name,
    OwnedSelection, SelectionFolder,
};
use crate::utils::ast::{
    definition_selection_set_mut, empty_selection_set, generated_field, selects_field,
};

/// Adds the identity fields and `__typename` to every selection of a record.
///
/// Keys are only added when the type has all of them. Inline fragments on a narrower type get
/// that type's keys, so every concrete record under an abstract field can be identified.
/// Fields that are already selected under their own name are left alone, so running the
/// transform twice changes nothing.
#[instrument(level = "trace", skip_all)]
pub fn add_key_fields(ctx: &mut TransformContext) -> Result<(), CompilerErrors> {
    let mut folder = KeyFieldsFolder {
        schema: ctx.schema,
        config: ctx.config,
    };

    for document in ctx.documents.iter_mut() {
        for definition in document.document.definitions.iter_mut() {
            let Some(root_type) = definition_root_type(ctx.schema, document.kind, definition)
                .map(str::to_string)
            else {
                continue;
            };
            fold_definition(&mut folder, &root_type, definition)
                .unwrap_or_else(|never| match never {});

            if matches!(definition, Definition::Fragment(_)) {
                let selection_set = definition_selection_set_mut(definition);
                inject_key_fields(ctx.schema, ctx.config, &root_type, selection_set);
                if ctx.schema.is_abstract(&root_type)
                    && !provides_keys(ctx.schema, ctx.config, &root_type)
                {
                    let concrete_types: Vec<&str> = ctx
                        .schema
                        .possible_types(&root_type)
                        .iter()
                        .map(String::as_str)
                        .collect();
                    inject_concrete_keys(ctx.schema, ctx.config, &concrete_types, selection_set);
                }
            }
        }
    }

    Ok(())
}

pub(crate) fn inject_key_fields(
    schema: &SchemaState,
    config: &CompilerConfig,
    type_name: &str,
    selection_set: &mut SelectionSet<'static, String>,
) {
    inject_keys(schema, config, type_name, selection_set);

    if !selects_field(selection_set, TYPENAME_FIELD) {
        selection_set
            .items
            .push(Selection::Field(generated_field(TYPENAME_FIELD)));
    }
}

fn inject_keys(
    schema: &SchemaState,
    config: &CompilerConfig,
    type_name: &str,
    selection_set: &mut SelectionSet<'static, String>,
) {
    if !provides_keys(schema, config, type_name) {
        return;
    }
    for key in config.keys_for_type(type_name) {
        if !selects_field(selection_set, key) {
            selection_set
                .items
                .push(Selection::Field(generated_field(key)));
        }
    }
}

fn provides_keys(schema: &SchemaState, config: &CompilerConfig, type_name: &str) -> bool {
    schema.type_kind(type_name) != Some(TypeKind::Union)
        && schema.has_key_fields(type_name, config.keys_for_type(type_name))
}

struct KeyFieldsFolder<'a> {
    schema: &'a SchemaState,
    config: &'a CompilerConfig,
}

impl SelectionFolder for KeyFieldsFolder<'_> {
    type Error = Infallible;

    fn schema(&self) -> &SchemaState {
        self.schema
    }

    fn fold_field(
        &mut self,
        parent_type: &str,
        field: Field<'static, String>,
    ) -> Result<Vec<OwnedSelection>, Infallible> {
        let mut field = fold_field_children(self, parent_type, field)?;

        if let Some(type_name) = field_type_name(self, parent_type, &field) {
            if self.schema.is_composite(&type_name) && !field.selection_set.items.is_empty() {
                inject_key_fields(self.schema, self.config, &type_name, &mut field.selection_set);
            }
        }

        Ok(vec![Selection::Field(field)])
    }

    /// A type condition narrower than its parent gets its own keys, unless the parent already
    /// selects the same ones. An abstract condition without keys asks for the keys of each
    /// concrete type it can resolve to.
    fn fold_inline_fragment(
        &mut self,
        parent_type: &str,
        inline: InlineFragment<'static, String>,
    ) -> Result<Vec<OwnedSelection>, Infallible> {
        let mut inline = fold_inline_children(self, parent_type, inline)?;
        let type_name = inline_type_name(parent_type, &inline);
        if type_name == parent_type {
            return Ok(vec![Selection::InlineFragment(inline)]);
        }

        let covered_by_parent = provides_keys(self.schema, self.config, parent_type)
            && self.config.keys_for_type(parent_type) == self.config.keys_for_type(&type_name);
        if provides_keys(self.schema, self.config, &type_name) {
            if !covered_by_parent {
                inject_keys(self.schema, self.config, &type_name, &mut inline.selection_set);
            }
        } else if self.schema.is_abstract(parent_type) && self.schema.is_abstract(&type_name) {
            let concrete_types = self.schema.common_possible_types(parent_type, &type_name);
            inject_concrete_keys(self.schema, self.config, &concrete_types, &mut inline.selection_set);
        }

        Ok(vec![Selection::InlineFragment(inline)])
    }
}

/// Adds `... on Concrete { key }` for every concrete type that has keys and no such selection yet.
fn inject_concrete_keys(
    schema: &SchemaState,
    config: &CompilerConfig,
    concrete_types: &[&str],
    selection_set: &mut SelectionSet<'static, String>,
) {
    for concrete in concrete_types {
        if !provides_keys(schema, config, concrete) {
            continue;
        }
        let keys = config.keys_for_type(concrete);
        let already_selected = selection_set.items.iter().any(|item| match item {
            Selection::InlineFragment(inline) => {
                matches!(&inline.type_condition, Some(TypeCondition::On(name)) if name == *concrete)
                    && keys.iter().all(|key| selects_field(&inline.selection_set, key))
            }
            _ => false,
        });
        if already_selected {
            continue;
        }

        let mut keys_selection = empty_selection_set();
        keys_selection
            .items
            .extend(keys.iter().map(|key| Selection::Field(generated_field(key))));
        selection_set.items.push(Selection::InlineFragment(InlineFragment {
            position: Pos::default(),
            type_condition: Some(TypeCondition::On(concrete.to_string())),
            directives: Vec::new(),
            selection_set: keys_selection,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::testkit::{collect, test_schema};
    use crate::transforms::registry::FragmentRegistry;

    fn run(documents: &mut [crate::documents::Document]) {
        let schema = test_schema();
        let config = CompilerConfig::default();
        let mut registry = FragmentRegistry::default();
        add_key_fields(&mut TransformContext {
            config: &config,
            schema: &schema,
            documents,
            registry: &mut registry,
        })
        .unwrap();
    }

    #[test]
    fn injects_keys_and_typename() {
        let mut documents = collect(&[
            "query Q { user { firstName pets { ... on Cat { name } } } ghost { name } entities { ... on User { id } } }",
            "fragment UserName on User { firstName }",
        ]);
        run(&mut documents);

        insta::assert_snapshot!(documents[0].document.to_string(), @r###"
        query Q {
          user {
            firstName
            pets {
              ... on Cat {
                name
                id @__generated
              }
              __typename @__generated
            }
            id @__generated
            __typename @__generated
          }
          ghost {
            name
            __typename @__generated
          }
          entities {
            ... on User {
              id
            }
            __typename @__generated
          }
        }
        "###);
        insta::assert_snapshot!(documents[1].document.to_string(), @r###"
        fragment UserName on User {
          firstName
          id @__generated
          __typename @__generated
        }
        "###);
    }

    #[test]
    fn narrower_type_conditions_carry_their_own_keys() {
        let mut documents = collect(&[
            "query Q { animals { name ... on Cat { lives } ... on Dog { goodBoy } } node(id: \"1\") { ... on User { firstName } } entities { ... on Animal { name } } }",
            "fragment AnimalName on Animal { name }",
        ]);
        run(&mut documents);

        insta::assert_snapshot!(documents[0].document.to_string(), @r###"
        query Q {
          animals {
            name
            ... on Cat {
              lives
              id @__generated
            }
            ... on Dog {
              goodBoy
            }
            __typename @__generated
          }
          node(id: "1") {
            ... on User {
              firstName
            }
            id @__generated
            __typename @__generated
          }
          entities {
            ... on Animal {
              name
              ... on Cat {
                id @__generated
              }
            }
            __typename @__generated
          }
        }
        "###);
        insta::assert_snapshot!(documents[1].document.to_string(), @r###"
        fragment AnimalName on Animal {
          name
          __typename @__generated
          ... on Cat {
            id @__generated
          }
        }
        "###);
    }

    #[test]
    fn running_twice_changes_nothing() {
        let mut documents = collect(&["query Q { user { id friends { firstName } } node(id: \"1\") { id } entities { ... on Animal { name } ... on User { firstName } } }"]);
        run(&mut documents);
        let once = documents[0].document.to_string();
        run(&mut documents);
        assert_eq!(documents[0].document.to_string(), once);
    }
}
