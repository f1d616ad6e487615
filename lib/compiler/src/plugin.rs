use hive_compiler_config::CompilerConfig;

use crate::artifact::Artifact;
use crate::documents::Document;

pub struct ArtifactDataPayload<'exec> {
    pub config: &'exec CompilerConfig,
    pub document: &'exec Document,
    /// The assembled artifact, `plugin_data` is still empty at this point.
    pub artifact: &'exec Artifact,
}

/// A capability bundle contributed to the compiler. Every hook is optional.
pub trait CompilerPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// SDL merged into the schema next to the internal definitions.
    #[inline]
    fn schema(&self, _config: &CompilerConfig) -> Option<String> {
        None
    }

    /// Data stored in the artifact under `pluginData.<name>`.
    #[inline]
    fn artifact_data(&self, _payload: &ArtifactDataPayload<'_>) -> Option<serde_json::Value> {
        None
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn CompilerPlugin>>,
}

impl PluginRegistry {
    pub fn new(plugins: Vec<Box<dyn CompilerPlugin>>) -> Self {
        Self { plugins }
    }

    pub fn register(&mut self, plugin: Box<dyn CompilerPlugin>) {
        self.plugins.push(plugin);
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn CompilerPlugin> {
        self.plugins.iter().map(|plugin| plugin.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|plugin| plugin.name()))
            .finish()
    }
}
