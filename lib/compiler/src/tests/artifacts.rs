use hive_compiler_config::runtime::{CachePolicy, DedupeMatchMode};
use hive_compiler_config::CompilerConfig;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::artifact::{hash_raw, Dedupe, DedupeCancel};
use crate::documents::DocumentKind;
use crate::pipeline::compile;
use crate::plugin::{ArtifactDataPayload, CompilerPlugin, PluginRegistry};
use crate::selection::tree::SelectionTree;
use crate::tests::testkit::{
    artifact, compile_documents, compile_documents_with, compile_error, init_logger, sources,
    TEST_SDL,
};

#[test]
fn internal_directives_and_their_variables_are_not_sent() {
    let output = compile_documents(&[
        "fragment A on User { firstName }",
        "query Q($pid: ID!) { user { ...A @prepend @parentID(value: $pid) } }",
    ]);
    let q = artifact(&output, "Q");

    assert_eq!(q.strip_variables, vec!["pid".to_string()]);
    assert_eq!(q.input, None);
    insta::assert_snapshot!(q.raw, @r###"
    query Q {
      user {
        ...A
        id
        __typename
      }
    }

    fragment A on User {
      firstName
      id
      __typename
    }
    "###);
    assert_eq!(q.hash, hash_raw(&q.raw));
}

#[test]
fn fragments_are_compiled_on_their_type() {
    let output = compile_documents(&["fragment A on User { firstName }"]);
    let a = artifact(&output, "A");

    assert_eq!(a.kind, DocumentKind::Fragment);
    assert_eq!(a.root_type, "User");
    assert_eq!(a.policy, None);
    assert_eq!(a.partial, None);
    assert_eq!(a.input, None);
}

#[test]
fn conditions_on_unset_fragment_arguments_are_dropped() {
    let output = compile_documents(&[
        r#"fragment UserAvatar on User @arguments(round: {type: "Boolean"}) { avatarURL @include(if: $round) lastName @skip(if: $round) }"#,
        "query Q { user { ...UserAvatar } }",
        "query Round { user { ...UserAvatar @with(round: true) } }",
    ]);

    let q = artifact(&output, "Q");
    assert!(!q.raw.contains("@include"));
    assert!(!q.raw.contains("@skip"));
    assert!(q.raw.contains("  avatarURL\n  lastName\n"));

    let round = artifact(&output, "Round");
    assert!(round.raw.contains("avatarURL @include(if: true)"));
    assert!(round.raw.contains("lastName @skip(if: true)"));
}

#[test]
fn cache_and_dedupe_settings_are_read_from_the_operation() {
    let output = compile_documents(&[
        "query Cached @cache(policy: NetworkOnly, partial: true) @dedupe(cancelFirst: true, match: Variables) { viewer { id } }",
        "query Defaults @dedupe { viewer { id } }",
        r#"mutation Delete { deleteUser(id: "1") { userID } }"#,
    ]);

    let cached = artifact(&output, "Cached");
    assert_eq!(cached.policy, Some(CachePolicy::NetworkOnly));
    assert_eq!(cached.partial, Some(true));
    assert_eq!(
        cached.dedupe,
        Some(Dedupe {
            cancel: DedupeCancel::First,
            match_mode: DedupeMatchMode::Variables,
        })
    );
    assert!(!cached.raw.contains("@cache"));

    let defaults = artifact(&output, "Defaults");
    assert_eq!(defaults.policy, Some(CachePolicy::CacheOrNetwork));
    assert_eq!(defaults.partial, Some(false));
    assert_eq!(
        defaults.dedupe,
        Some(Dedupe {
            cancel: DedupeCancel::Last,
            match_mode: DedupeMatchMode::Operation,
        })
    );

    let delete = artifact(&output, "Delete");
    assert_eq!(delete.policy, None);
    assert_eq!(delete.dedupe, None);
}

#[test]
fn configured_cache_defaults_apply() {
    let mut config = CompilerConfig::default();
    config.default_cache_policy = CachePolicy::CacheAndNetwork;
    config.default_partial = true;
    let output = compile_documents_with(&config, &["query Q { viewer { id } }"]);

    let mut q = artifact(&output, "Q").clone();
    q.hash = "[hash]".to_string();

    insta::assert_json_snapshot!(q, @r###"
    {
      "name": "Q",
      "kind": "query",
      "hash": "[hash]",
      "raw": "query Q {\n  viewer {\n    id\n    __typename\n  }\n}\n",
      "rootType": "Query",
      "selection": {
        "fields": {
          "viewer": {
            "type": "User",
            "keyRaw": "viewer",
            "nullable": true,
            "selection": {
              "fields": {
                "id": {
                  "type": "ID",
                  "keyRaw": "id",
                  "visible": true
                },
                "__typename": {
                  "type": "String",
                  "keyRaw": "__typename"
                }
              }
            },
            "visible": true
          }
        }
      },
      "policy": "CacheAndNetwork",
      "partial": true,
      "pluginData": {}
    }
    "###);
}

#[test]
fn unknown_cache_policies_are_rejected() {
    assert_eq!(
        compile_error(&["query Q @cache(policy: Sometimes) { viewer { id } }"]),
        "Unknown cache policy Sometimes (doc_0.graphql)"
    );
}

#[test]
fn runtime_scalars_are_sent_as_their_server_type() {
    let mut config = CompilerConfig::default();
    config
        .runtime_scalars
        .insert("ViewerIDFromSession".to_string(), "ID".to_string());
    let output = compile_documents_with(
        &config,
        &["query Q($viewer: ViewerIDFromSession!) { user(id: $viewer) { firstName } }"],
    );
    let q = artifact(&output, "Q");

    assert!(q.raw.starts_with("query Q($viewer: ID!) {"));
    insta::assert_json_snapshot!(q.input, @r###"
    {
      "fields": {
        "viewer": "ViewerIDFromSession"
      },
      "runtimeScalars": {
        "viewer": "ViewerIDFromSession"
      }
    }
    "###);
}

#[test]
fn operation_inputs_resolve_input_objects() {
    let output = compile_documents(&[
        "query Q($filter: UserFilter) { usersWhere(filter: $filter) { firstName } }",
    ]);

    insta::assert_json_snapshot!(artifact(&output, "Q").input, @r###"
    {
      "fields": {
        "filter": "UserFilter"
      },
      "types": {
        "UserFilter": {
          "name": "String",
          "and": "UserFilter"
        }
      }
    }
    "###);
}

struct DocumentKindPlugin;

impl CompilerPlugin for DocumentKindPlugin {
    fn name(&self) -> &str {
        "document-kind"
    }

    fn schema(&self, _config: &CompilerConfig) -> Option<String> {
        Some("directive @loading on FIELD".to_string())
    }

    fn artifact_data(&self, payload: &ArtifactDataPayload<'_>) -> Option<serde_json::Value> {
        (payload.document.kind != DocumentKind::Fragment)
            .then(|| json!({ "kind": payload.artifact.kind, "hash": payload.artifact.hash }))
    }
}

#[test]
fn plugins_extend_the_schema_and_the_artifacts() {
    init_logger();
    let plugins = PluginRegistry::new(vec![Box::new(DocumentKindPlugin)]);
    let output = compile(
        &CompilerConfig::default(),
        TEST_SDL,
        sources(&[
            "fragment A on User { firstName }",
            "query Q { viewer @loading { ...A } }",
        ]),
        &plugins,
    )
    .unwrap();

    assert!(output.schema_sdl.contains("directive @loading on FIELD"));
    let q = artifact(&output, "Q");
    assert_eq!(
        q.plugin_data["document-kind"],
        json!({ "kind": "query", "hash": q.hash })
    );
    assert!(artifact(&output, "A").plugin_data.is_empty());
}

#[test]
fn compiling_twice_gives_the_same_artifacts() {
    let documents = [
        r#"fragment Sized on User @arguments(size: {type: "Int"}) { avatarURL(size: $size) }"#,
        "fragment Named on User { firstName ...Sized @with(size: 10) }",
        "query Q { user { ...Named ...Sized @with(size: 20) } }",
    ];

    let first = compile_documents(&documents);
    let second = compile_documents(&documents);

    assert_eq!(first.artifacts, second.artifacts);
    for artifact in &first.artifacts {
        assert_eq!(artifact.hash, hash_raw(&artifact.raw));
    }
}

fn without_visibility(tree: &SelectionTree) -> SelectionTree {
    let mut tree = tree.clone();
    clear_visibility(&mut tree);
    tree
}

fn clear_visibility(tree: &mut SelectionTree) {
    let buckets = tree
        .abstract_fields
        .iter_mut()
        .flat_map(|abstract_fields| abstract_fields.fields.values_mut())
        .flat_map(|bucket| bucket.values_mut());
    for node in tree.fields.values_mut().chain(buckets) {
        node.visible = false;
        if let Some(selection) = node.selection.as_mut() {
            clear_visibility(selection);
        }
    }
}

#[test]
fn printed_queries_compile_to_the_same_artifact() {
    let first = compile_documents(&[
        r#"query Q($size: Int) { user(id: "1") { firstName avatarURL(size: $size) friends { lastName } } }"#,
    ]);
    let first = artifact(&first, "Q");

    let second = compile_documents(&[first.raw.as_str()]);
    let second = artifact(&second, "Q");

    assert_eq!(second.raw, first.raw);
    assert_eq!(second.hash, first.hash);
    assert_eq!(second.input, first.input);
    assert_eq!(
        without_visibility(&second.selection),
        without_visibility(&first.selection)
    );
}
