use std::collections::HashMap;

use graphql_parser::query::Definition;

use crate::directives;
use crate::error::CompilerError;
use crate::utils::ast::{directive_argument, find_directive, fragment_type_condition};
use crate::utils::value::value_as_str;
use crate::validation::{ValidationContext, ValidationRule};

/// `@componentField` declarations add a field to the schema: it needs a name that is not taken
/// by the schema or by another declaration on the same type.
pub struct ComponentFields;

impl ValidationRule for ComponentFields {
    fn error_code<'a>(&self) -> &'a str {
        "ComponentFields"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) {
        let mut errors = Vec::new();
        let mut declared: HashMap<(String, String), &str> = HashMap::new();

        for document in ctx.documents {
            for definition in &document.document.definitions {
                let Definition::Fragment(fragment) = definition else {
                    continue;
                };
                let Some(directive) =
                    find_directive(&fragment.directives, directives::COMPONENT_FIELD)
                else {
                    continue;
                };
                let type_name = fragment_type_condition(fragment);

                let Some(field) = directive_argument(directive, directives::COMPONENT_FIELD_FIELD_ARG)
                    .and_then(value_as_str)
                else {
                    errors.push(
                        CompilerError::structural(format!(
                            "@{} on fragment {} requires the {} argument",
                            directives::COMPONENT_FIELD,
                            fragment.name,
                            directives::COMPONENT_FIELD_FIELD_ARG
                        ))
                        .with_filepath(&document.filepath),
                    );
                    continue;
                };

                if ctx.schema.has_field(type_name, field) {
                    errors.push(
                        CompilerError::structural(format!(
                            "Component field {}.{} conflicts with a field of the schema",
                            type_name, field
                        ))
                        .with_filepath(&document.filepath)
                        .with_description(format!("declared by fragment {}", fragment.name)),
                    );
                    continue;
                }

                let key = (type_name.to_string(), field.to_string());
                match declared.get(&key) {
                    Some(earlier) => errors.push(
                        CompilerError::structural(format!(
                            "Component field {}.{} is declared more than once",
                            type_name, field
                        ))
                        .with_filepath(&document.filepath)
                        .with_description(format!("also declared in {}", earlier)),
                    ),
                    None => {
                        declared.insert(key, &document.filepath);
                    }
                }
            }
        }

        for error in errors {
            ctx.report_error(error);
        }
    }
}
