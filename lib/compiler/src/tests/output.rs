use std::fs;

use pretty_assertions::assert_eq;

use crate::output::{
    persisted_queries, write_enums, write_persisted_queries, write_schema, ArtifactWriter,
    FileSystemArtifactWriter,
};
use crate::tests::testkit::{artifact, compile_documents};

const DOCUMENTS: [&str; 2] = [
    "fragment UserName on User { firstName }",
    "query Viewer { viewer { ...UserName } }",
];

#[test]
fn writes_one_file_per_artifact() {
    let output = compile_documents(&DOCUMENTS);
    let directory = tempfile::tempdir().unwrap();
    let writer = FileSystemArtifactWriter::new(directory.path().join("artifacts")).unwrap();

    writer.write_all(&output.artifacts).unwrap();

    let viewer = artifact(&output, "Viewer");
    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(writer.artifact_path(viewer)).unwrap()).unwrap();
    assert_eq!(written, serde_json::to_value(viewer).unwrap());
    assert!(directory.path().join("artifacts/UserName.json").exists());
}

#[test]
fn persisted_queries_only_hold_operations() {
    let output = compile_documents(&DOCUMENTS);
    let viewer = artifact(&output, "Viewer");

    let queries = persisted_queries(&output.artifacts);
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[viewer.hash.as_str()], viewer.raw);

    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("nested/persisted_queries.json");
    write_persisted_queries(&path, &output.artifacts).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, serde_json::json!({ (viewer.hash.clone()): viewer.raw }));
}

#[test]
fn writes_the_schema_and_its_enums() {
    let output = compile_documents(&DOCUMENTS);
    let directory = tempfile::tempdir().unwrap();

    let schema_path = directory.path().join("schema.graphql");
    write_schema(&schema_path, &output.schema_sdl).unwrap();
    let schema = fs::read_to_string(&schema_path).unwrap();
    assert!(schema.contains("type User implements Node"));
    assert!(schema.contains("directive @paginate"));

    let enums_path = directory.path().join("enums.json");
    write_enums(&enums_path, &output.schema).unwrap();
    let enums: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&enums_path).unwrap()).unwrap();
    assert_eq!(enums["Role"], serde_json::json!(["ADMIN", "MEMBER"]));
    assert_eq!(
        enums["CachePolicy"],
        serde_json::json!(["CacheAndNetwork", "CacheOnly", "CacheOrNetwork", "NetworkOnly", "NoCache"])
    );
}
