mod env_overrides;
pub mod log;
pub mod runtime;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat, FileSourceFile};
use envconfig::Envconfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    env_overrides::{EnvVarOverrides, EnvVarOverridesError},
    log::LoggingConfig,
    runtime::{CachePolicy, FragmentMasking, ListPosition, ListTarget, PaginateMode},
};

/// The configuration of a compiler run.
///
/// One instance is created before the run and handed by reference to every stage of the pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    #[serde(skip)]
    root_directory: PathBuf,

    /// The compiler logger configuration.
    #[serde(default)]
    pub log: LoggingConfig,

    /// Path to the SDL file that holds the user schema.
    ///
    /// Can also be set via the `COMPILER_SCHEMA_PATH` environment variable.
    #[serde(default = "default_schema_path")]
    pub schema: PathBuf,

    /// Files and directories that are scanned for `.graphql` and `.gql` documents.
    #[serde(default = "default_documents")]
    pub documents: Vec<PathBuf>,

    /// The directory that receives one JSON artifact per document.
    ///
    /// Can also be set via the `COMPILER_OUTPUT_DIR` environment variable.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// When set, a `{ hash: query }` map of every operation is written to this path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persisted_queries: Option<PathBuf>,

    /// The fields that identify a record of any type, unless overridden in `types`.
    #[serde(default = "default_keys")]
    pub default_keys: Vec<String>,

    /// Per-type configuration.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub types: HashMap<String, TypeConfig>,

    /// The pagination mode of `@paginate` fields that do not pass `mode`.
    #[serde(default)]
    pub default_paginate_mode: PaginateMode,

    /// The cache policy of queries that do not use `@cache(policy:)`.
    #[serde(default)]
    pub default_cache_policy: CachePolicy,

    /// Whether queries accept partial data from the cache by default.
    #[serde(default)]
    pub default_partial: bool,

    /// Where list inserts go when neither `@prepend` nor `@append` is used.
    #[serde(default)]
    pub default_list_position: ListPosition,

    /// Which lists a list operation targets when `@allLists` is not used.
    #[serde(default)]
    pub default_list_target: ListTarget,

    /// Whether fragment spreads hide the fragment's fields from the surrounding document.
    #[serde(default)]
    pub default_fragment_masking: FragmentMasking,

    /// Scalars whose value is provided by the application at request time,
    /// mapped to the GraphQL type sent to the server.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub runtime_scalars: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TypeConfig {
    /// The fields that identify a record of this type.
    #[serde(default)]
    pub keys: Option<Vec<String>>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            root_directory: PathBuf::new(),
            log: LoggingConfig::default(),
            schema: default_schema_path(),
            documents: default_documents(),
            output: default_output(),
            persisted_queries: None,
            default_keys: default_keys(),
            types: HashMap::new(),
            default_paginate_mode: PaginateMode::default(),
            default_cache_policy: CachePolicy::default(),
            default_partial: false,
            default_list_position: ListPosition::default(),
            default_list_target: ListTarget::default(),
            default_fragment_masking: FragmentMasking::default(),
            runtime_scalars: BTreeMap::new(),
        }
    }
}

impl CompilerConfig {
    /// The identity fields of the given type.
    pub fn keys_for_type(&self, type_name: &str) -> &[String] {
        self.types
            .get(type_name)
            .and_then(|type_config| type_config.keys.as_deref())
            .unwrap_or(&self.default_keys)
    }

    /// Every field name that is used as an identity field by any type.
    pub fn all_key_fields(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.default_keys.iter().map(String::as_str).collect();
        for type_config in self.types.values() {
            for key in type_config.keys.iter().flatten() {
                if !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    pub fn is_runtime_scalar(&self, type_name: &str) -> bool {
        self.runtime_scalars.contains_key(type_name)
    }

    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// Resolves a configured path against the directory of the configuration file.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_directory.join(path)
        }
    }
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("./schema.graphql")
}

fn default_documents() -> Vec<PathBuf> {
    vec![PathBuf::from("./src")]
}

fn default_output() -> PathBuf {
    PathBuf::from("./artifacts")
}

fn default_keys() -> Vec<String> {
    vec!["id".to_string()]
}

#[derive(Debug, thiserror::Error)]
pub enum CompilerConfigError {
    #[error("Failed to load configuration: {0}")]
    ConfigLoadError(#[from] config::ConfigError),
    #[error("Failed to apply configuration overrides: {0}")]
    EnvVarOverridesError(#[from] EnvVarOverridesError),
    #[error("Failed to load the environment variables: {0}")]
    EnvVarLoadError(#[from] envconfig::Error),
    #[error("Failed to get the current directory: {0}")]
    CurrentDirError(std::io::Error),
}

static DEFAULT_FILE_NAMES: &[&str] = &[
    "compiler.config.yaml",
    "compiler.config.yml",
    "compiler.config.json",
    "compiler.config.json5",
];

fn get_current_dir() -> Result<PathBuf, CompilerConfigError> {
    std::env::current_dir().map_err(CompilerConfigError::CurrentDirError)
}

pub fn load_config(
    override_config_path: Option<String>,
) -> Result<CompilerConfig, CompilerConfigError> {
    let env_overrides = EnvVarOverrides::init_from_env()?;
    let mut config = Config::builder();
    let mut config_root_path = get_current_dir()?;

    if let Some(path_str) = override_config_path {
        let path_buf = PathBuf::from(path_str);
        if let Some(parent_dir) = path_buf.parent() {
            config_root_path = config_root_path.join(parent_dir);
        }
        let as_file: File<FileSourceFile, _> = path_buf.into();

        config = config.add_source(as_file.required(true));
    } else {
        for name in DEFAULT_FILE_NAMES {
            config = config.add_source(File::with_name(name).required(false));
        }
    }

    config = env_overrides.apply_overrides(config)?;

    let mut base_cfg = config.build()?.try_deserialize::<CompilerConfig>()?;
    base_cfg.root_directory = config_root_path;

    Ok(base_cfg)
}

pub fn parse_yaml_config(config_raw: &str) -> Result<CompilerConfig, CompilerConfigError> {
    let mut base_cfg = Config::builder()
        .add_source(File::from_str(config_raw, FileFormat::Yaml))
        .build()?
        .try_deserialize::<CompilerConfig>()?;
    base_cfg.root_directory = get_current_dir()?;

    Ok(base_cfg)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_yaml_config("{}").unwrap();

        assert_eq!(config.default_keys, vec!["id".to_string()]);
        assert_eq!(config.default_paginate_mode, PaginateMode::Infinite);
        assert_eq!(config.default_cache_policy, CachePolicy::CacheOrNetwork);
        assert_eq!(config.default_list_position, ListPosition::Last);
        assert_eq!(config.default_fragment_masking, FragmentMasking::Enable);
        assert!(!config.default_partial);
    }

    #[test]
    fn per_type_keys_override_default_keys() {
        let config: CompilerConfig = serde_json::from_str(
            r#"{
              "default_keys": ["id"],
              "types": { "Ghost": { "keys": ["name", "aka"] } },
              "default_paginate_mode": "SinglePage",
              "runtime_scalars": { "ViewerIDFromSession": "ID" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.keys_for_type("User"), ["id".to_string()]);
        assert_eq!(
            config.keys_for_type("Ghost"),
            ["name".to_string(), "aka".to_string()]
        );
        assert_eq!(config.all_key_fields(), vec!["id", "name", "aka"]);
        assert_eq!(config.default_paginate_mode, PaginateMode::SinglePage);
        assert!(config.is_runtime_scalar("ViewerIDFromSession"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<CompilerConfig>(r#"{ "not_a_field": true }"#).is_err());
    }
}
