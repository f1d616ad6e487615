use std::convert::Infallible;

use graphql_parser::query::{Definition, InlineFragment, Selection, SelectionSet};
use tracing::instrument;

use crate::error::CompilerErrors;
use crate::schema::{SchemaState, TYPENAME_FIELD};
use crate::transforms::context::{definition_root_type, TransformContext};
use crate::transforms::fold::{
    fold_definition, fold_inline_children, inline_type_name, OwnedSelection, SelectionFolder,
};
use crate::utils::ast::{definition_selection_set_mut, generated_field, selects_field};

/// Selects `__typename` wherever the selection targets an abstract type, so the runtime can
/// pick the concrete type of every record.
#[instrument(level = "trace", skip_all)]
pub fn add_typename(ctx: &mut TransformContext) -> Result<(), CompilerErrors> {
    let mut folder = TypenameFolder { schema: ctx.schema };

    for document in ctx.documents.iter_mut() {
        for definition in document.document.definitions.iter_mut() {
            let Some(root_type) = definition_root_type(ctx.schema, document.kind, definition)
                .map(str::to_string)
            else {
                continue;
            };
            fold_definition(&mut folder, &root_type, definition)
                .unwrap_or_else(|never| match never {});

            if matches!(definition, Definition::Fragment(_)) && ctx.schema.is_abstract(&root_type) {
                add_typename_field(definition_selection_set_mut(definition));
            }
        }
    }

    Ok(())
}

fn add_typename_field(selection_set: &mut SelectionSet<'static, String>) {
    if !selects_field(selection_set, TYPENAME_FIELD) {
        selection_set
            .items
            .push(Selection::Field(generated_field(TYPENAME_FIELD)));
    }
}

struct TypenameFolder<'a> {
    schema: &'a SchemaState,
}

impl SelectionFolder for TypenameFolder<'_> {
    type Error = Infallible;

    fn schema(&self) -> &SchemaState {
        self.schema
    }

    fn fold_inline_fragment(
        &mut self,
        parent_type: &str,
        inline: InlineFragment<'static, String>,
    ) -> Result<Vec<OwnedSelection>, Infallible> {
        let type_name = inline_type_name(parent_type, &inline);
        let mut inline = fold_inline_children(self, parent_type, inline)?;
        if self.schema.is_abstract(&type_name) {
            add_typename_field(&mut inline.selection_set);
        }
        Ok(vec![Selection::InlineFragment(inline)])
    }
}
