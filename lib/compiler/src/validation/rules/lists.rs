use std::collections::HashMap;

use crate::directives;
use crate::error::CompilerError;
use crate::transforms::context::definition_root_type;
use crate::transforms::pipeline::list_name;
use crate::utils::ast::{definition_selection_set, has_directive, TypeExt};
use crate::validation::{ValidationContext, ValidationRule};

/// Placement of `@list` and `@paginate`: list or connection fields only, one `@paginate` per
/// document, and list names unique across documents.
pub struct ListDirectives;

impl ValidationRule for ListDirectives {
    fn error_code<'a>(&self) -> &'a str {
        "ListDirectives"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) {
        let mut errors = Vec::new();
        let mut list_names: HashMap<String, String> = HashMap::new();

        for document in ctx.documents {
            let mut paginated = 0;

            for definition in &document.document.definitions {
                let Some(root_type) = definition_root_type(ctx.schema, document.kind, definition)
                else {
                    continue;
                };

                ctx.schema.walk_fields(
                    root_type,
                    definition_selection_set(definition),
                    &mut |parent_type, field, schema_field| {
                        let list = has_directive(&field.directives, directives::LIST);
                        let paginate = has_directive(&field.directives, directives::PAGINATE);
                        if !list && !paginate {
                            return;
                        }
                        let location = format!("{}.{}", parent_type, field.name);

                        if paginate {
                            paginated += 1;
                        }

                        let list_shaped = schema_field.is_some_and(|schema_field| {
                            schema_field.field_type.is_list()
                                || ctx
                                    .schema
                                    .connection_node_type(schema_field.field_type.inner_type())
                                    .is_some()
                        });
                        if !list_shaped {
                            errors.push(
                                CompilerError::type_resolution(format!(
                                    "@{} can only be used on lists or connections",
                                    if list { directives::LIST } else { directives::PAGINATE }
                                ))
                                .with_filepath(&document.filepath)
                                .with_description(location.clone()),
                            );
                        }

                        let name = list_name(field);
                        if list && name.is_none() {
                            errors.push(
                                CompilerError::structural(format!(
                                    "@{} requires a name",
                                    directives::LIST
                                ))
                                .with_filepath(&document.filepath)
                                .with_description(location),
                            );
                            return;
                        }

                        if let Some(name) = name {
                            match list_names.get(name) {
                                Some(earlier) => errors.push(
                                    CompilerError::structural(format!(
                                        "List name {} is not unique",
                                        name
                                    ))
                                    .with_filepath(&document.filepath)
                                    .with_description(format!("also used in {}", earlier)),
                                ),
                                None => {
                                    list_names.insert(name.to_string(), document.filepath.clone());
                                }
                            }
                        }
                    },
                );
            }

            if paginated > 1 {
                errors.push(
                    CompilerError::structural(format!(
                        "A document may only contain a single @{}",
                        directives::PAGINATE
                    ))
                    .with_filepath(&document.filepath),
                );
            }
        }

        for error in errors {
            ctx.report_error(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::testkit::{collect, validation_errors};

    #[test]
    fn accepts_lists_and_connections() {
        let documents = collect(&[
            r#"query A { users(first: 10) @paginate(name: "All_Users") { edges { node { id } } } }"#,
            r#"query B { user { friends @list(name: "User_Friends") { id } } }"#,
        ]);

        assert!(validation_errors(&documents).is_empty());
    }

    #[test]
    fn reports_misplaced_and_duplicate_lists() {
        let documents = collect(&[
            r#"query A { user @list(name: "One") { id } }"#,
            r#"query B { user { friends @list { id } } }"#,
            r#"query C { usersByOffset(limit: 1) @list(name: "Dup") { id } }"#,
            r#"query D { usersWhere @list(name: "Dup") { id } }"#,
            r#"query E { users(first: 1) @paginate { edges { node { id } } } usersByOffset(limit: 2) @paginate { id } }"#,
        ]);

        assert_eq!(
            validation_errors(&documents),
            vec![
                "@list can only be used on lists or connections (doc_0.graphql): Query.user",
                "@list requires a name (doc_1.graphql): User.friends",
                "List name Dup is not unique (doc_3.graphql): also used in doc_2.graphql",
                "A document may only contain a single @paginate (doc_4.graphql)",
            ]
        );
    }
}
