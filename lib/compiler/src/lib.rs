pub mod artifact;
pub mod directives;
pub mod documents;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod plugin;
pub mod schema;
pub mod selection;
pub mod transforms;
pub mod utils;
pub mod validation;

#[cfg(test)]
mod tests;

pub use artifact::Artifact;
pub use documents::SourceDocument;
pub use error::{CompilerError, CompilerErrors};
pub use pipeline::{compile, CompileOutput};
pub use plugin::{CompilerPlugin, PluginRegistry};
