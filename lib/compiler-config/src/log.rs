//! How the compiler reports what it is doing.
//!
//! A compile run is short-lived and mostly quiet, so the default filter keeps third-party
//! crates at `warn` and only raises the compiler's own targets to the configured level.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Tracing targets of the compiler crates, the ones `level` applies to.
pub const COMPILER_TARGETS: [&str; 3] =
    ["document_compiler", "hive_compiler_config", "compiler_dev_cli"];

#[derive(Debug, Deserialize, Serialize, JsonSchema, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// How much the compiler reports. `info` covers the loaded documents and the written
    /// artifacts.
    ///
    /// Can also be set via the `LOG_LEVEL` environment variable.
    #[serde(default)]
    pub level: LogLevel,

    /// The format of the log messages, written to stderr.
    ///
    /// Can also be set via the `LOG_FORMAT` environment variable.
    #[serde(default)]
    pub format: LogFormat,

    /// A complete `tracing` filter directive, replacing the one derived from `level`.
    ///
    /// Can also be set via the `LOG_FILTER` environment variable.
    #[serde(default)]
    pub filter: Option<String>,
}

impl LoggingConfig {
    /// The filter directive handed to the subscriber.
    pub fn env_filter_str(&self) -> String {
        if let Some(filter) = &self.filter {
            return filter.clone();
        }

        let global = self.level.max(LogLevel::Warn);
        std::iter::once(global.to_string())
            .chain(
                COMPILER_TARGETS
                    .iter()
                    .map(|target| format!("{}={}", target, self.level)),
            )
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Ordered from the most to the least verbose.
#[derive(
    Debug,
    Default,
    Deserialize,
    Serialize,
    JsonSchema,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(
    Debug,
    Default,
    Deserialize,
    Serialize,
    JsonSchema,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Nested spans, one per compile step.
    PrettyTree,
    #[default]
    PrettyCompact,
    Json,
}
