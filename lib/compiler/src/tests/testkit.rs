use std::sync::Once;

use hive_compiler_config::CompilerConfig;
use lazy_static::lazy_static;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::artifact::Artifact;
use crate::documents::{collect_documents, Document, SourceDocument};
use crate::pipeline::{compile, CompileOutput};
use crate::plugin::PluginRegistry;
use crate::schema::augment::augment_schema;
use crate::schema::SchemaState;
use crate::validation::validate_documents;

fn init_test_logger_internal() {
    let tree_layer = tracing_tree::HierarchicalLayer::new(2)
        .with_bracketed_fields(true)
        .with_deferred_spans(false)
        .with_wraparound(25)
        .with_indent_lines(true)
        .with_timer(tracing_tree::time::Uptime::default())
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_targets(false);

    tracing_subscriber::registry()
        .with(tree_layer)
        .with(EnvFilter::from_default_env())
        .init();
}

lazy_static! {
    static ref TRACING_INIT: Once = Once::new();
}

pub fn init_logger() {
    TRACING_INIT.call_once(|| {
        init_test_logger_internal();
    });
}

pub const TEST_SDL: &str = r#"
type Query {
  viewer: User
  user(id: ID): User
  node(id: ID!): Node
  ghost: Ghost
  ghosts: [Ghost!]!
  entities: [Entity!]!
  animals: [Animal!]!
  users(first: Int, after: String, last: Int, before: String, filter: String): UserConnection!
  usersByOffset(limit: Int, offset: Int): [User!]!
  usersWhere(filter: UserFilter): [User!]!
}

type Mutation {
  addFriend(id: ID!): AddFriendOutput!
  deleteUser(id: ID!): DeleteUserOutput!
}

type Subscription {
  userChanged(id: ID!): User
}

interface Node {
  id: ID!
}

interface Animal {
  name: String
}

type User implements Node {
  id: ID!
  firstName: String!
  lastName: String
  age: Int
  avatarURL(size: Int): String
  friends: [User!]!
  pets: [Pet!]!
  friendsByCursor(first: Int, after: String, last: Int, before: String, filter: String): UserConnection!
  friendsByOffset(limit: Int, offset: Int, filter: String): [User!]!
}

type Cat implements Node & Animal {
  id: ID!
  name: String
  lives: Int
}

type Dog implements Animal {
  name: String
  goodBoy: Boolean
}

type Ghost {
  name: String
  aka: String
  haunts(limit: Int, offset: Int): [User!]!
}

union Pet = Cat | Dog

union Entity = User | Cat | Dog

type UserConnection {
  edges: [UserEdge!]!
  pageInfo: PageInfo!
}

type UserEdge {
  cursor: String!
  node: User
}

type PageInfo {
  hasPreviousPage: Boolean!
  hasNextPage: Boolean!
  startCursor: String
  endCursor: String
}

type AddFriendOutput {
  friend: User!
}

type DeleteUserOutput {
  userID: ID!
}

input UserFilter {
  name: String
  and: [UserFilter!]
}

enum Role {
  ADMIN
  MEMBER
}
"#;

/// The test schema with the internal definitions merged in.
pub fn test_schema() -> SchemaState {
    augment_schema(&CompilerConfig::default(), TEST_SDL, &PluginRegistry::default())
        .expect("failed to augment the test schema")
        .build()
        .expect("failed to build the test schema")
}

/// The test schema with the definitions derived from the given documents.
pub fn test_schema_with(documents: &[Document]) -> SchemaState {
    let mut augmenter =
        augment_schema(&CompilerConfig::default(), TEST_SDL, &PluginRegistry::default())
            .expect("failed to augment the test schema");
    let schema = augmenter.build().expect("failed to build the test schema");
    augmenter
        .add_document_definitions(&schema, documents)
        .expect("failed to add the document definitions");
    augmenter.build().expect("failed to build the test schema")
}

/// Sources named `doc_0.graphql`, `doc_1.graphql`, ...
pub fn sources(documents: &[&str]) -> Vec<SourceDocument> {
    documents
        .iter()
        .enumerate()
        .map(|(index, text)| {
            SourceDocument::parse(format!("doc_{}.graphql", index), text)
                .expect("failed to parse document")
        })
        .collect()
}

pub fn collect(documents: &[&str]) -> Vec<Document> {
    collect_documents(sources(documents)).expect("failed to collect documents")
}

/// Collects each source on its own, so the cross-document checks of the collector do not run.
pub fn collect_unchecked(documents: &[&str]) -> Vec<Document> {
    sources(documents)
        .into_iter()
        .flat_map(|source| collect_documents(vec![source]).expect("failed to collect document"))
        .collect()
}

pub fn validation_errors(documents: &[Document]) -> Vec<String> {
    match validate_documents(&CompilerConfig::default(), &test_schema(), documents) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    }
}

pub fn compile_documents(documents: &[&str]) -> CompileOutput {
    compile_documents_with(&CompilerConfig::default(), documents)
}

pub fn compile_documents_with(config: &CompilerConfig, documents: &[&str]) -> CompileOutput {
    init_logger();
    match compile(config, TEST_SDL, sources(documents), &PluginRegistry::default()) {
        Ok(output) => output,
        Err(errors) => panic!("compilation failed:\n{}", errors),
    }
}

/// Every error of a failed run, one per line.
pub fn compile_error(documents: &[&str]) -> String {
    init_logger();
    match compile(
        &CompilerConfig::default(),
        TEST_SDL,
        sources(documents),
        &PluginRegistry::default(),
    ) {
        Ok(_) => panic!("compilation was expected to fail"),
        Err(errors) => errors.to_string(),
    }
}

pub fn artifact<'o>(output: &'o CompileOutput, name: &str) -> &'o Artifact {
    output
        .artifacts
        .iter()
        .find(|artifact| artifact.name == name)
        .unwrap_or_else(|| panic!("no artifact named {}", name))
}
