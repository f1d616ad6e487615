use std::collections::{HashMap, HashSet, VecDeque};

use graphql_parser::query::{Definition, FragmentDefinition};
use tracing::{instrument, trace};

use crate::error::{CompilerError, CompilerErrors};
use crate::transforms::context::TransformContext;
use crate::utils::ast::{collect_fragment_spreads, definition_selection_set};

/// Appends to every document the definitions of the fragments it references, transitively.
///
/// Fragments are appended in the order they are first reached, so the output only depends on
/// the document itself and not on the order documents were loaded in.
#[instrument(level = "trace", skip_all)]
pub fn compose_fragments(ctx: &mut TransformContext) -> Result<(), CompilerErrors> {
    let mut fragments: HashMap<String, FragmentDefinition<'static, String>> = HashMap::new();
    for document in ctx.documents.iter() {
        for definition in &document.document.definitions {
            if let Definition::Fragment(fragment) = definition {
                fragments
                    .entry(fragment.name.clone())
                    .or_insert_with(|| fragment.clone());
            }
        }
    }
    for fragment in ctx.registry.generated_fragments() {
        fragments
            .entry(fragment.name.clone())
            .or_insert_with(|| fragment.clone());
    }

    let mut errors = CompilerErrors::new();

    for document in ctx.documents.iter_mut() {
        let mut defined: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();

        for definition in &document.document.definitions {
            if let Definition::Fragment(fragment) = definition {
                defined.insert(fragment.name.clone());
            }
            let mut spreads = Vec::new();
            collect_fragment_spreads(definition_selection_set(definition), &mut spreads);
            queue.extend(spreads);
        }

        let mut missing: Vec<String> = Vec::new();
        while let Some(name) = queue.pop_front() {
            if defined.contains(&name) || missing.contains(&name) {
                continue;
            }
            let Some(fragment) = fragments.get(&name) else {
                missing.push(name);
                continue;
            };

            trace!(document = %document.name, fragment = %name, "composing fragment");
            let mut spreads = Vec::new();
            collect_fragment_spreads(&fragment.selection_set, &mut spreads);
            queue.extend(spreads);

            defined.insert(name);
            document
                .document
                .definitions
                .push(Definition::Fragment(fragment.clone()));
        }

        for name in missing {
            errors.push(
                CompilerError::structural(format!("Fragment {} is not defined", name))
                    .with_filepath(&document.filepath),
            );
        }
    }

    errors.into_result(())
}

#[cfg(test)]
mod tests {
    use hive_compiler_config::CompilerConfig;

    use super::*;
    use crate::tests::testkit::{collect, test_schema};
    use crate::transforms::registry::FragmentRegistry;

    #[test]
    fn appends_reachable_fragments_once() {
        let schema = test_schema();
        let config = CompilerConfig::default();
        let mut registry = FragmentRegistry::default();
        let mut documents = collect(&[
            "fragment UserName on User { firstName ...UserAge }",
            "fragment UserAge on User { age }",
            "query Q { user { ...UserName ...UserAge } }",
        ]);

        compose_fragments(&mut TransformContext {
            config: &config,
            schema: &schema,
            documents: &mut documents,
            registry: &mut registry,
        })
        .unwrap();

        insta::assert_snapshot!(documents[2].document.to_string(), @r###"
        query Q {
          user {
            ...UserName
            ...UserAge
          }
        }

        fragment UserName on User {
          firstName
          ...UserAge
        }

        fragment UserAge on User {
          age
        }
        "###);
        assert_eq!(documents[1].document.definitions.len(), 1);
    }

    #[test]
    fn reports_each_missing_fragment_once() {
        let schema = test_schema();
        let config = CompilerConfig::default();
        let mut registry = FragmentRegistry::default();
        let mut documents = collect(&["query Q { user { ...Missing ... on User { ...Missing } } }"]);

        let errors = compose_fragments(&mut TransformContext {
            config: &config,
            schema: &schema,
            documents: &mut documents,
            registry: &mut registry,
        })
        .unwrap_err();

        assert_eq!(
            errors.to_string(),
            "Fragment Missing is not defined (doc_0.graphql)"
        );
    }
}
