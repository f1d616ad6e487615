use std::collections::HashMap;
use std::convert::Infallible;

use graphql_parser::query::{Definition, Directive, Field, FragmentSpread, Selection, Value};
use tracing::{instrument, trace};

use crate::directives;
use crate::error::CompilerErrors;
use crate::schema::{SchemaDefinition, SchemaState};
use crate::transforms::context::{definition_root_type, TransformContext};
use crate::transforms::fold::{fold_definition, fold_field_children, OwnedSelection, SelectionFolder};
use crate::utils::ast::{directive_argument, find_directive, fragment_type_condition};
use crate::utils::value::value_as_str;

#[derive(Debug, Clone)]
struct ComponentField {
    fragment: String,
    field: String,
    prop: Option<String>,
}

/// Replaces every selection of a component field with a spread of the fragment backing it.
///
/// The spread keeps the field's name and prop in `@componentField` and its arguments in `@with`,
/// so the fragment arguments transform and the selection compiler can pick them up.
#[instrument(level = "trace", skip_all)]
pub fn expand_component_fields(ctx: &mut TransformContext) -> Result<(), CompilerErrors> {
    let mut component_fields: HashMap<(String, String), ComponentField> = HashMap::new();

    for document in ctx.documents.iter() {
        for definition in &document.document.definitions {
            let Definition::Fragment(fragment) = definition else {
                continue;
            };
            let Some(directive) = find_directive(&fragment.directives, directives::COMPONENT_FIELD)
            else {
                continue;
            };
            let Some(field) = directive_argument(directive, directives::COMPONENT_FIELD_FIELD_ARG)
                .and_then(value_as_str)
            else {
                continue;
            };
            let prop = directive_argument(directive, directives::COMPONENT_FIELD_PROP_ARG)
                .and_then(value_as_str)
                .map(str::to_string);

            component_fields.insert(
                (fragment_type_condition(fragment).to_string(), field.to_string()),
                ComponentField {
                    fragment: fragment.name.clone(),
                    field: field.to_string(),
                    prop,
                },
            );
        }
    }

    if component_fields.is_empty() {
        return Ok(());
    }

    let mut folder = ComponentFieldFolder {
        schema: ctx.schema,
        component_fields: &component_fields,
    };

    for document in ctx.documents.iter_mut() {
        for definition in document.document.definitions.iter_mut() {
            let Some(root_type) = definition_root_type(ctx.schema, document.kind, definition)
                .map(str::to_string)
            else {
                continue;
            };
            fold_definition(&mut folder, &root_type, definition).unwrap_or_else(|never| match never {});
        }
    }

    Ok(())
}

struct ComponentFieldFolder<'a> {
    schema: &'a SchemaState,
    component_fields: &'a HashMap<(String, String), ComponentField>,
}

impl ComponentFieldFolder<'_> {
    /// Component fields declared on the type itself or on one of its interfaces.
    fn lookup(&self, parent_type: &str, field_name: &str) -> Option<&ComponentField> {
        let direct = self
            .component_fields
            .get(&(parent_type.to_string(), field_name.to_string()));
        if direct.is_some() {
            return direct;
        }

        match self.schema.definition(parent_type) {
            Some(SchemaDefinition::Object(object)) => object.interfaces.iter().find_map(|interface| {
                self.component_fields
                    .get(&(interface.clone(), field_name.to_string()))
            }),
            _ => None,
        }
    }
}

impl SelectionFolder for ComponentFieldFolder<'_> {
    type Error = Infallible;

    fn schema(&self) -> &SchemaState {
        self.schema
    }

    fn fold_field(
        &mut self,
        parent_type: &str,
        field: Field<'static, String>,
    ) -> Result<Vec<OwnedSelection>, Infallible> {
        let Some(component) = self.lookup(parent_type, &field.name).cloned() else {
            return Ok(vec![Selection::Field(fold_field_children(
                self,
                parent_type,
                field,
            )?)]);
        };

        trace!(field = %field.name, fragment = %component.fragment, "expanding component field");

        let mut component_arguments = vec![(
            directives::COMPONENT_FIELD_FIELD_ARG.to_string(),
            Value::String(component.field.clone()),
        )];
        if let Some(prop) = component.prop {
            component_arguments.push((
                directives::COMPONENT_FIELD_PROP_ARG.to_string(),
                Value::String(prop),
            ));
        }

        let mut spread_directives = vec![Directive {
            position: field.position,
            name: directives::COMPONENT_FIELD.to_string(),
            arguments: component_arguments,
        }];
        if !field.arguments.is_empty() {
            spread_directives.push(Directive {
                position: field.position,
                name: directives::WITH.to_string(),
                arguments: field.arguments,
            });
        }
        spread_directives.extend(field.directives);

        Ok(vec![Selection::FragmentSpread(FragmentSpread {
            position: field.position,
            fragment_name: component.fragment,
            directives: spread_directives,
        })])
    }
}
