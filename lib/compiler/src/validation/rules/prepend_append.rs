use graphql_parser::query::{Selection, SelectionSet};

use crate::directives;
use crate::error::CompilerError;
use crate::utils::ast::{definition_selection_set, has_directive};
use crate::validation::{ValidationContext, ValidationRule};

/// A list insertion lands either at the start or at the end of the list.
pub struct PrependAppend;

impl ValidationRule for PrependAppend {
    fn error_code<'a>(&self) -> &'a str {
        "PrependAppend"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) {
        let mut errors = Vec::new();

        for document in ctx.documents {
            for definition in &document.document.definitions {
                let mut conflicting = Vec::new();
                find_conflicts(definition_selection_set(definition), &mut conflicting);

                for fragment_name in conflicting {
                    errors.push(
                        CompilerError::structural(format!(
                            "@{} and @{} cannot be used together",
                            directives::PREPEND,
                            directives::APPEND
                        ))
                        .with_filepath(&document.filepath)
                        .with_description(format!("on the spread of {}", fragment_name)),
                    );
                }
            }
        }

        for error in errors {
            ctx.report_error(error);
        }
    }
}

fn find_conflicts(selection_set: &SelectionSet<'static, String>, conflicting: &mut Vec<String>) {
    for item in &selection_set.items {
        match item {
            Selection::Field(field) => find_conflicts(&field.selection_set, conflicting),
            Selection::InlineFragment(inline) => find_conflicts(&inline.selection_set, conflicting),
            Selection::FragmentSpread(spread) => {
                if has_directive(&spread.directives, directives::PREPEND)
                    && has_directive(&spread.directives, directives::APPEND)
                {
                    conflicting.push(spread.fragment_name.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::testkit::{collect, validation_errors};

    #[test]
    fn rejects_prepend_with_append() {
        let documents = collect(&[
            r#"query Q { user { friends @list(name: "Friends") { id } } }"#,
            "mutation M { addFriend(id: \"1\") { friend { ...Friends_insert @prepend @append } } }",
        ]);

        assert_eq!(
            validation_errors(&documents),
            vec!["@prepend and @append cannot be used together (doc_1.graphql): on the spread of Friends_insert"]
        );
    }
}
