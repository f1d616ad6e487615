//! Assembles the artifact of a compiled document: the printed query sent to the server, its hash,
//! the input descriptor and the runtime settings read from the operation's directives.

pub mod input;
pub mod print;
pub mod refetch;

use std::str::FromStr;

use graphql_parser::query::{Definition, Directive};
use hive_compiler_config::runtime::{CachePolicy, DedupeMatchMode};
use hive_compiler_config::CompilerConfig;
use indexmap::IndexMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::directives;
use crate::documents::{Document, DocumentKind};
use crate::error::CompilerError;
use crate::plugin::{ArtifactDataPayload, PluginRegistry};
use crate::schema::SchemaState;
use crate::selection::tree::SelectionTree;
use crate::transforms::context::definition_root_type;
use crate::utils::ast::{directive_argument, find_directive, OperationDefinitionExt};
use crate::utils::value::{value_as_bool, value_as_str};
use input::{input_descriptor, InputDescriptor};
use print::{print_raw, strip_variables};
use refetch::Refetch;

/// The compiled form of one document, as consumed by the runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub name: String,
    pub kind: DocumentKind,
    pub hash: String,
    pub raw: String,
    pub root_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub strip_variables: Vec<String>,
    pub selection: SelectionTree,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<InputDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refetch: Option<Refetch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<CachePolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedupe: Option<Dedupe>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub optimistic_keys: bool,
    pub plugin_data: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupeCancel {
    First,
    Last,
}

/// Which in-flight request is cancelled when the same request is sent twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dedupe {
    pub cancel: DedupeCancel,
    #[serde(rename = "match")]
    pub match_mode: DedupeMatchMode,
}

/// Lower-case hex SHA-256 of the printed query.
pub fn hash_raw(raw: &str) -> String {
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

#[instrument(level = "trace", skip_all, fields(document = %document.name))]
pub fn assemble_artifact(
    config: &CompilerConfig,
    schema: &SchemaState,
    plugins: &PluginRegistry,
    document: &Document,
    selection: SelectionTree,
) -> Result<Artifact, CompilerError> {
    let definition = document.main_definition().ok_or_else(|| {
        CompilerError::structural("Document does not contain any definition")
            .with_filepath(&document.filepath)
    })?;
    let root_type = definition_root_type(schema, document.kind, definition)
        .ok_or_else(|| {
            CompilerError::type_resolution(format!(
                "The schema does not define a {} root type",
                document.kind
            ))
            .with_filepath(&document.filepath)
        })?
        .to_string();

    let stripped = strip_variables(&document.document);
    let raw = print_raw(&document.document, &stripped, config);
    let hash = hash_raw(&raw);
    let input = input_descriptor(config, schema, &document.document, &stripped)
        .map_err(|error| error.or_filepath(&document.filepath))?;

    let operation_directives: &[Directive<'static, String>] = match definition {
        Definition::Operation(operation) => operation.directives(),
        Definition::Fragment(_) => &[],
    };

    let (policy, partial) = if document.kind == DocumentKind::Query {
        let (policy, partial) = cache_settings(config, operation_directives)
            .map_err(|error| error.with_filepath(&document.filepath))?;
        (Some(policy), Some(partial))
    } else {
        (None, None)
    };

    let dedupe = find_directive(operation_directives, directives::DEDUPE)
        .map(|directive| {
            let cancel = match directive_argument(directive, directives::DEDUPE_CANCEL_FIRST_ARG)
                .and_then(value_as_bool)
            {
                Some(true) => DedupeCancel::First,
                _ => DedupeCancel::Last,
            };
            let match_mode = directive_argument(directive, directives::DEDUPE_MATCH_ARG)
                .and_then(value_as_str)
                .map(|mode| {
                    DedupeMatchMode::from_str(mode).map_err(|_| {
                        CompilerError::structural(format!("Unknown dedupe match mode {}", mode))
                            .with_filepath(&document.filepath)
                    })
                })
                .transpose()?
                .unwrap_or_default();
            Ok::<_, CompilerError>(Dedupe { cancel, match_mode })
        })
        .transpose()?;

    let mut artifact = Artifact {
        name: document.name.clone(),
        kind: document.kind,
        hash,
        raw,
        root_type,
        strip_variables: stripped,
        optimistic_keys: has_optimistic_keys(&selection),
        selection,
        input,
        refetch: document.refetch.clone(),
        policy,
        partial,
        dedupe,
        plugin_data: IndexMap::new(),
    };

    let mut plugin_data = IndexMap::new();
    for plugin in plugins.iter() {
        let payload = ArtifactDataPayload {
            config,
            document,
            artifact: &artifact,
        };
        if let Some(data) = plugin.artifact_data(&payload) {
            plugin_data.insert(plugin.name().to_string(), data);
        }
    }
    artifact.plugin_data = plugin_data;

    debug!(hash = %artifact.hash, "assembled artifact");
    Ok(artifact)
}

fn cache_settings(
    config: &CompilerConfig,
    operation_directives: &[Directive<'static, String>],
) -> Result<(CachePolicy, bool), CompilerError> {
    let Some(cache) = find_directive(operation_directives, directives::CACHE) else {
        return Ok((config.default_cache_policy, config.default_partial));
    };

    let policy = match directive_argument(cache, directives::CACHE_POLICY_ARG).and_then(value_as_str) {
        Some(policy) => CachePolicy::from_str(policy).map_err(|_| {
            CompilerError::structural(format!("Unknown cache policy {}", policy))
        })?,
        None => config.default_cache_policy,
    };
    let partial = directive_argument(cache, directives::CACHE_PARTIAL_ARG)
        .and_then(value_as_bool)
        .unwrap_or(config.default_partial);

    Ok((policy, partial))
}

fn has_optimistic_keys(tree: &SelectionTree) -> bool {
    tree.nodes().any(|node| {
        node.optimistic_key || node.selection.as_ref().is_some_and(has_optimistic_keys)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_lower_case_hex_sha256() {
        assert_eq!(
            hash_raw("query Q {\n  viewer\n}\n"),
            format!("{:x}", Sha256::digest(b"query Q {\n  viewer\n}\n"))
        );
        assert_eq!(hash_raw("").len(), 64);
        assert_eq!(
            hash_raw(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
