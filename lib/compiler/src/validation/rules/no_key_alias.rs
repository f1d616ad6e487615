use crate::error::CompilerError;
use crate::transforms::context::definition_root_type;
use crate::utils::ast::definition_selection_set;
use crate::validation::{ValidationContext, ValidationRule};

/// The cache identifies records by their key fields, so another field cannot be aliased to one.
pub struct NoKeyAlias;

impl ValidationRule for NoKeyAlias {
    fn error_code<'a>(&self) -> &'a str {
        "NoKeyAlias"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) {
        let mut errors = Vec::new();

        for document in ctx.documents {
            for definition in &document.document.definitions {
                let Some(root_type) = definition_root_type(ctx.schema, document.kind, definition)
                else {
                    continue;
                };

                ctx.schema.walk_fields(
                    root_type,
                    definition_selection_set(definition),
                    &mut |parent_type, field, _| {
                        let Some(alias) = field.alias.as_deref() else {
                            return;
                        };
                        if alias == field.name {
                            return;
                        }
                        let keys = ctx.config.keys_for_type(parent_type);
                        if keys.iter().any(|key| key == alias) {
                            errors.push(
                                CompilerError::structural(format!(
                                    "{} is an identity field of {} and cannot be used as an alias",
                                    alias, parent_type
                                ))
                                .with_filepath(&document.filepath)
                                .with_description(format!("{}: {}", alias, field.name)),
                            );
                        }
                    },
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
    fn rejects_aliases_to_key_fields() {
        let documents = collect(&[
            "query Q { user { id: firstName name: lastName } }",
            "fragment UserId on User { id: id }",
        ]);

        assert_eq!(
            validation_errors(&documents),
            vec!["id is an identity field of User and cannot be used as an alias (doc_0.graphql): id: firstName"]
        );
    }
}
