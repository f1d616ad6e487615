use graphql_parser::query::{Definition, Directive, Selection, SelectionSet, VariableDefinition};
use hive_compiler_config::CompilerConfig;

use crate::directives::is_internal_directive;
use crate::utils::ast::{
    collect_directive_variables, collect_selection_variables, definition_selection_set,
    definition_selection_set_mut, rename_inner_type, OperationDefinitionExt, TypeExt,
};
use crate::utils::parsing::QueryDocument;

/// Variables of the operation that only internal directives refer to, in declaration order.
pub fn strip_variables(document: &QueryDocument) -> Vec<String> {
    let Some(Definition::Operation(operation)) = document.definitions.first() else {
        return Vec::new();
    };

    let mut referenced = Vec::new();
    let mut sent = Vec::new();
    collect_directive_variables(operation.directives(), &|_| true, &mut referenced);
    collect_directive_variables(operation.directives(), &|name| !is_internal_directive(name), &mut sent);
    for definition in &document.definitions {
        let selection_set = definition_selection_set(definition);
        collect_selection_variables(selection_set, &|_| true, &mut referenced);
        collect_selection_variables(selection_set, &|name| !is_internal_directive(name), &mut sent);
    }

    operation
        .variable_definitions()
        .iter()
        .map(|variable| &variable.name)
        .filter(|name| referenced.contains(name) && !sent.contains(name))
        .cloned()
        .collect()
}

/// Prints the document the way it is sent to the server.
///
/// Internal directives and the variables only they use are removed, and runtime scalars are
/// replaced by the type the server knows them as.
pub fn print_raw(document: &QueryDocument, stripped: &[String], config: &CompilerConfig) -> String {
    let mut printed = document.clone();

    for definition in printed.definitions.iter_mut() {
        match definition {
            Definition::Operation(operation) => {
                if let Some(directives) = operation.directives_mut() {
                    strip_directives(directives);
                }
                if let Some(variables) = operation.variable_definitions_mut() {
                    variables.retain(|variable| !stripped.contains(&variable.name));
                    for variable in variables.iter_mut() {
                        replace_runtime_scalar(variable, config);
                    }
                }
            }
            Definition::Fragment(fragment) => strip_directives(&mut fragment.directives),
        }
        strip_selection_set(definition_selection_set_mut(definition));
    }

    printed.to_string()
}

fn replace_runtime_scalar(variable: &mut VariableDefinition<'static, String>, config: &CompilerConfig) {
    if let Some(underlying) = config.runtime_scalars.get(variable.var_type.inner_type()) {
        variable.var_type = rename_inner_type(&variable.var_type, underlying);
    }
}

fn strip_directives(directives: &mut Vec<Directive<'static, String>>) {
    directives.retain(|directive| !is_internal_directive(&directive.name));
}

fn strip_selection_set(selection_set: &mut SelectionSet<'static, String>) {
    for item in selection_set.items.iter_mut() {
        match item {
            Selection::Field(field) => {
                strip_directives(&mut field.directives);
                strip_selection_set(&mut field.selection_set);
            }
            Selection::InlineFragment(inline) => {
                strip_directives(&mut inline.directives);
                strip_selection_set(&mut inline.selection_set);
            }
            Selection::FragmentSpread(spread) => strip_directives(&mut spread.directives),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parsing::parse_document;

    #[test]
    fn strips_internal_directives_and_their_variables() {
        let document = parse_document(
            r#"
            query Q($pid: ID!, $id: ID, $at: ViewerIDFromSession) @cache(policy: NetworkOnly) {
              user(id: $id) @include(if: true) {
                id @__generated
                ...A @prepend @parentID(value: $pid)
              }
              node(id: $at) { id }
            }
            fragment A on User @arguments(size: {type: "Int"}) { firstName }
            "#,
        );
        let mut config = CompilerConfig::default();
        config
            .runtime_scalars
            .insert("ViewerIDFromSession".to_string(), "ID".to_string());

        let stripped = strip_variables(&document);
        assert_eq!(stripped, vec!["pid"]);

        insta::assert_snapshot!(print_raw(&document, &stripped, &config), @r###"
        query Q($id: ID, $at: ID) {
          user(id: $id) @include(if: true) {
            id
            ...A
          }
          node(id: $at) {
            id
          }
        }

        fragment A on User {
          firstName
        }
        "###);
    }
}
