//! A persistent-tree traversal over selection sets.
//!
//! Every method consumes a node and returns its replacement, so a transform only overrides the
//! nodes it rewrites. Returning several selections from one node splices them into the parent,
//! returning none drops the node. The `fold_*_children` helpers are the default behaviour and can
//! be called from an override to keep descending.

use graphql_parser::query::{
    Definition, Field, FragmentSpread, InlineFragment, Selection, SelectionSet, TypeCondition,
};

use crate::schema::SchemaState;
use crate::utils::ast::{definition_selection_set_mut, empty_selection_set, TypeExt};

pub type OwnedSelection = Selection<'static, String>;

pub trait SelectionFolder {
    type Error;

    fn schema(&self) -> &SchemaState;

    fn fold_selection_set(
        &mut self,
        parent_type: &str,
        selection_set: SelectionSet<'static, String>,
    ) -> Result<SelectionSet<'static, String>, Self::Error> {
        let SelectionSet { span, items } = selection_set;
        let mut folded = Vec::with_capacity(items.len());
        for item in items {
            folded.extend(self.fold_selection(parent_type, item)?);
        }
        Ok(SelectionSet {
            span,
            items: folded,
        })
    }

    fn fold_selection(
        &mut self,
        parent_type: &str,
        selection: OwnedSelection,
    ) -> Result<Vec<OwnedSelection>, Self::Error> {
        match selection {
            Selection::Field(field) => self.fold_field(parent_type, field),
            Selection::InlineFragment(inline) => self.fold_inline_fragment(parent_type, inline),
            Selection::FragmentSpread(spread) => self.fold_fragment_spread(parent_type, spread),
        }
    }

    fn fold_field(
        &mut self,
        parent_type: &str,
        field: Field<'static, String>,
    ) -> Result<Vec<OwnedSelection>, Self::Error> {
        Ok(vec![Selection::Field(fold_field_children(
            self,
            parent_type,
            field,
        )?)])
    }

    fn fold_inline_fragment(
        &mut self,
        parent_type: &str,
        inline: InlineFragment<'static, String>,
    ) -> Result<Vec<OwnedSelection>, Self::Error> {
        Ok(vec![Selection::InlineFragment(fold_inline_children(
            self,
            parent_type,
            inline,
        )?)])
    }

    fn fold_fragment_spread(
        &mut self,
        _parent_type: &str,
        spread: FragmentSpread<'static, String>,
    ) -> Result<Vec<OwnedSelection>, Self::Error> {
        Ok(vec![Selection::FragmentSpread(spread)])
    }
}

/// The type of a field's selection set, `None` when the schema does not know the field.
pub fn field_type_name<F: SelectionFolder + ?Sized>(
    folder: &F,
    parent_type: &str,
    field: &Field<'static, String>,
) -> Option<String> {
    folder
        .schema()
        .field(parent_type, &field.name)
        .map(|schema_field| schema_field.field_type.inner_type().to_string())
}

pub fn inline_type_name(parent_type: &str, inline: &InlineFragment<'static, String>) -> String {
    match &inline.type_condition {
        Some(TypeCondition::On(type_name)) => type_name.clone(),
        None => parent_type.to_string(),
    }
}

pub fn fold_field_children<F: SelectionFolder + ?Sized>(
    folder: &mut F,
    parent_type: &str,
    mut field: Field<'static, String>,
) -> Result<Field<'static, String>, F::Error> {
    if field.selection_set.items.is_empty() {
        return Ok(field);
    }

    if let Some(child_type) = field_type_name(folder, parent_type, &field) {
        let selection_set = std::mem::replace(&mut field.selection_set, empty_selection_set());
        field.selection_set = folder.fold_selection_set(&child_type, selection_set)?;
    }

    Ok(field)
}

pub fn fold_inline_children<F: SelectionFolder + ?Sized>(
    folder: &mut F,
    parent_type: &str,
    mut inline: InlineFragment<'static, String>,
) -> Result<InlineFragment<'static, String>, F::Error> {
    let type_name = inline_type_name(parent_type, &inline);
    let selection_set = std::mem::replace(&mut inline.selection_set, empty_selection_set());
    inline.selection_set = folder.fold_selection_set(&type_name, selection_set)?;
    Ok(inline)
}

/// Replaces the selection set of a definition with its folded version.
pub fn fold_definition<F: SelectionFolder + ?Sized>(
    folder: &mut F,
    root_type: &str,
    definition: &mut Definition<'static, String>,
) -> Result<(), F::Error> {
    let selection_set = definition_selection_set_mut(definition);
    let taken = std::mem::replace(selection_set, empty_selection_set());
    *definition_selection_set_mut(definition) = folder.fold_selection_set(root_type, taken)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::utils::parsing::{parse_document, parse_schema};

    struct DropNames<'a> {
        schema: &'a SchemaState,
        visited: Vec<String>,
    }

    impl SelectionFolder for DropNames<'_> {
        type Error = Infallible;

        fn schema(&self) -> &SchemaState {
            self.schema
        }

        fn fold_field(
            &mut self,
            parent_type: &str,
            field: Field<'static, String>,
        ) -> Result<Vec<OwnedSelection>, Infallible> {
            self.visited.push(format!("{}.{}", parent_type, field.name));
            if field.name == "name" {
                return Ok(vec![]);
            }
            Ok(vec![Selection::Field(fold_field_children(
                self,
                parent_type,
                field,
            )?)])
        }
    }

    #[test]
    fn folds_with_parent_types() {
        let schema = SchemaState::new(&parse_schema(
            r#"
            type Query { node: Node }
            interface Node { id: ID! }
            type User implements Node { id: ID! name: String best: User }
            "#,
        ))
        .unwrap();
        let mut document =
            parse_document("query Q { node { id ... on User { name best { id name } } } }");

        let mut folder = DropNames {
            schema: &schema,
            visited: vec![],
        };
        fold_definition(&mut folder, "Query", &mut document.definitions[0]).unwrap();

        assert_eq!(
            folder.visited,
            vec![
                "Query.node",
                "Node.id",
                "User.name",
                "User.best",
                "User.id",
                "User.name"
            ]
        );
        insta::assert_snapshot!(document.to_string(), @r###"
        query Q {
          node {
            id
            ... on User {
              best {
                id
              }
            }
          }
        }
        "###);
    }
}
