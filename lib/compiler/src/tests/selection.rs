use std::collections::BTreeMap;

use hive_compiler_config::runtime::FragmentMasking;
use hive_compiler_config::CompilerConfig;
use pretty_assertions::assert_eq;

use crate::selection::tree::{SelectionNode, SelectionTree};
use crate::tests::testkit::{artifact, compile_documents, compile_documents_with, compile_error};
use crate::utils::value::ArgumentValue;

fn field<'t>(tree: &'t SelectionTree, path: &[&str]) -> &'t SelectionNode {
    let (first, rest) = path.split_first().expect("empty path");
    let node = &tree.fields[*first];
    match rest {
        [] => node,
        _ => field(node.selection.as_ref().expect("no selection"), rest),
    }
}

fn keys<V>(map: &indexmap::IndexMap<String, V>) -> Vec<&str> {
    map.keys().map(String::as_str).collect()
}

#[test]
fn fragment_fields_merge_into_the_spreading_level() {
    let output = compile_documents(&[
        "fragment A on User { firstName }",
        "query Q { user { firstName ...A } }",
    ]);

    insta::assert_json_snapshot!(artifact(&output, "Q").selection, @r###"
    {
      "fields": {
        "user": {
          "type": "User",
          "keyRaw": "user",
          "nullable": true,
          "selection": {
            "fields": {
              "firstName": {
                "type": "String",
                "keyRaw": "firstName",
                "visible": true
              },
              "id": {
                "type": "ID",
                "keyRaw": "id"
              },
              "__typename": {
                "type": "String",
                "keyRaw": "__typename"
              }
            },
            "fragments": {
              "A": {
                "arguments": {}
              }
            }
          },
          "visible": true
        }
      }
    }
    "###);
}

#[test]
fn masked_fragment_fields_are_not_visible() {
    let sources = [
        "fragment UserLastName on User { lastName }",
        "query Q { user { firstName ...UserLastName } }",
        "query Unmasked { user { ...UserLastName @mask_disable } }",
    ];

    let output = compile_documents(&sources);
    assert!(!field(&artifact(&output, "Q").selection, &["user", "lastName"]).visible);
    assert!(field(&artifact(&output, "Unmasked").selection, &["user", "lastName"]).visible);

    let mut config = CompilerConfig::default();
    config.default_fragment_masking = FragmentMasking::Disable;
    let output = compile_documents_with(&config, &sources);
    assert!(field(&artifact(&output, "Q").selection, &["user", "lastName"]).visible);
}

#[test]
fn abstract_selections_have_a_bucket_per_concrete_type() {
    let output = compile_documents(&[
        "query Animals { animals { name ... on Cat { lives } ... on Dog { goodBoy } } }",
    ]);
    let animals = field(&artifact(&output, "Animals").selection, &["animals"]);
    let selection = animals.selection.as_ref().unwrap();

    assert_eq!(keys(&selection.fields), vec!["name", "__typename"]);
    let abstract_fields = selection.abstract_fields.as_ref().unwrap();
    assert_eq!(keys(&abstract_fields.fields), vec!["Cat", "Dog"]);
    assert_eq!(
        keys(&abstract_fields.fields["Cat"]),
        vec!["name", "lives", "id", "__typename"]
    );
    assert_eq!(
        keys(&abstract_fields.fields["Dog"]),
        vec!["name", "goodBoy", "__typename"]
    );
    assert!(abstract_fields.type_map.is_empty());
    assert!(!abstract_fields.fields["Cat"]["id"].visible);
}

#[test]
fn abstract_conditions_map_their_concrete_types() {
    let output = compile_documents(&[
        "query Entities { entities { ... on Animal { name } ... on User { firstName } } }",
    ]);
    let entities = field(&artifact(&output, "Entities").selection, &["entities"]);
    let selection = entities.selection.as_ref().unwrap();
    let abstract_fields = selection.abstract_fields.as_ref().unwrap();

    assert_eq!(keys(&selection.fields), vec!["__typename"]);
    assert_eq!(keys(&abstract_fields.fields), vec!["Cat", "Dog", "User"]);
    assert_eq!(
        keys(&abstract_fields.fields["Cat"]),
        vec!["name", "id", "__typename"]
    );
    assert_eq!(keys(&abstract_fields.fields["Dog"]), vec!["name", "__typename"]);
    assert_eq!(
        keys(&abstract_fields.fields["User"]),
        vec!["firstName", "id", "__typename"]
    );
    assert_eq!(
        abstract_fields
            .type_map
            .iter()
            .map(|(concrete, condition)| (concrete.as_str(), condition.as_str()))
            .collect::<Vec<_>>(),
        vec![("Cat", "Animal"), ("Dog", "Animal")]
    );
}

#[test]
fn same_field_with_other_arguments_keeps_the_last_one() {
    let output = compile_documents(&[
        "query Q { user { avatarURL(size: 10) avatarURL(size: 20) } }",
    ]);
    let user = field(&artifact(&output, "Q").selection, &["user"]);

    assert_eq!(
        keys(&user.selection.as_ref().unwrap().fields),
        vec!["avatarURL", "id", "__typename"]
    );
    assert_eq!(
        field(&artifact(&output, "Q").selection, &["user", "avatarURL"]).key_raw,
        "avatarURL(size: 20)"
    );
}

#[test]
fn aliases_are_keyed_by_response_name() {
    let output = compile_documents(&[
        "query Q { user { small: avatarURL(size: 10) large: avatarURL(size: 200) } }",
    ]);
    let selection = &artifact(&output, "Q").selection;

    assert_eq!(field(selection, &["user", "small"]).key_raw, "avatarURL(size: 10)");
    assert_eq!(field(selection, &["user", "large"]).key_raw, "avatarURL(size: 200)");
}

#[test]
fn required_fields_make_their_parent_nullable() {
    let output = compile_documents(&[
        "query Q { user { friends { lastName @required } pets { ... on Cat { name @required } } } }",
    ]);
    let selection = &artifact(&output, "Q").selection;

    let last_name = field(selection, &["user", "friends", "lastName"]);
    assert!(last_name.required);
    assert!(!last_name.nullable);

    let friends = field(selection, &["user", "friends"]);
    assert!(friends.nullable);
    assert!(!friends.required);
    assert!(!friends.abstract_has_required);

    let pets = field(selection, &["user", "pets"]);
    assert!(pets.nullable);
    assert!(pets.abstract_has_required);

    assert!(!artifact(&output, "Q").raw.contains("@required"));
}

#[test]
fn component_fields_compile_to_component_nodes() {
    let output = compile_documents(&[
        r#"fragment UserAvatar on User @componentField(field: "Avatar", prop: "user") @arguments(size: {type: "Int"}) { avatarURL(size: $size) }"#,
        r#"query Profile { user { firstName Avatar(size: 100) } }"#,
    ]);
    let profile = artifact(&output, "Profile");
    let user = field(&profile.selection, &["user"]);
    let selection = user.selection.as_ref().unwrap();

    assert_eq!(
        keys(&selection.fields),
        vec!["firstName", "Avatar", "avatarURL", "id", "__typename"]
    );
    insta::assert_json_snapshot!(selection.fields["Avatar"], @r###"
    {
      "type": "Component",
      "keyRaw": "Avatar(size: 100)",
      "component": {
        "prop": "user",
        "key": "User.Avatar",
        "fragment": "UserAvatar",
        "variables": {
          "size": {
            "kind": "Int",
            "value": 100
          }
        }
      },
      "visible": true
    }
    "###);
    assert_eq!(
        selection.fragments["UserAvatar"].arguments,
        BTreeMap::from([("size".to_string(), ArgumentValue::Int(100))])
    );
    assert!(!selection.fields["avatarURL"].visible);
}

#[test]
fn runtime_directives_are_kept_on_the_node() {
    let output = compile_documents(&[
        "query Q($admin: Boolean!) { user { age @include(if: $admin) id @optimisticKey } }",
    ]);
    let q = artifact(&output, "Q");
    let age = field(&q.selection, &["user", "age"]);

    insta::assert_json_snapshot!(age.directives, @r###"
    [
      {
        "name": "include",
        "arguments": {
          "if": {
            "kind": "Variable",
            "value": "admin"
          }
        }
      }
    ]
    "###);
    assert!(field(&q.selection, &["user", "id"]).optimistic_key);
    assert!(q.optimistic_keys);
}

#[test]
fn recursive_fragments_are_rejected() {
    assert_eq!(
        compile_error(&[
            "fragment A on User { friends { ...A } }",
            "query Q { user { ...A } }",
        ]),
        "Fragment A spreads itself (doc_0.graphql)\nFragment A spreads itself (doc_1.graphql)"
    );
}

#[test]
fn concrete_records_under_abstract_fields_keep_their_identity() {
    let output = compile_documents(&["query Entities { entities { ... on User { firstName } } }"]);
    let entities = artifact(&output, "Entities");

    assert!(entities
        .raw
        .contains("... on User {\n      firstName\n      id\n    }"));
    let selection = field(&entities.selection, &["entities"]).selection.as_ref().unwrap();
    let user = &selection.abstract_fields.as_ref().unwrap().fields["User"];
    assert_eq!(keys(user), vec!["firstName", "id", "__typename"]);
}
