use hive_compiler_config::CompilerConfig;
use tracing::{debug, info, instrument};

use crate::artifact::{assemble_artifact, Artifact};
use crate::documents::{collect_documents, SourceDocument};
use crate::error::{CompilerError, CompilerErrors};
use crate::plugin::PluginRegistry;
use crate::schema::augment::augment_schema;
use crate::schema::SchemaState;
use crate::selection::compile_selection;
use crate::transforms::context::TransformContext;
use crate::transforms::registry::FragmentRegistry;
use crate::transforms::run_transforms;
use crate::validation::validate_documents;

/// The result of a successful run.
#[derive(Debug)]
pub struct CompileOutput {
    /// The fully augmented schema, printed as SDL.
    pub schema_sdl: String,
    pub schema: SchemaState,
    /// One artifact per document, in input order.
    pub artifacts: Vec<Artifact>,
}

/// Compiles every document against the schema.
///
/// All documents go through every transform before any of them is compiled, since a document
/// may use fragments defined in another one. Errors of every document are collected and returned
/// together; no artifact is returned unless the whole run succeeded.
#[instrument(level = "trace", skip_all, fields(documents = sources.len()))]
pub fn compile(
    config: &CompilerConfig,
    schema_sdl: &str,
    sources: Vec<SourceDocument>,
    plugins: &PluginRegistry,
) -> Result<CompileOutput, CompilerErrors> {
    let mut augmenter = augment_schema(config, schema_sdl, plugins).map_err(CompilerError::from)?;
    let schema = augmenter.build().map_err(CompilerError::from)?;

    let mut documents = collect_documents(sources)?;
    validate_documents(config, &schema, &documents)?;

    augmenter
        .add_document_definitions(&schema, &documents)
        .map_err(CompilerError::from)?;
    let schema = augmenter.build().map_err(CompilerError::from)?;
    debug!(types = schema.definitions.len(), "schema augmented");

    let mut registry = FragmentRegistry::default();
    run_transforms(&mut TransformContext {
        config,
        schema: &schema,
        documents: &mut documents,
        registry: &mut registry,
    })?;

    let mut errors = CompilerErrors::new();
    let mut artifacts = Vec::with_capacity(documents.len());
    for document in &documents {
        let artifact = compile_selection(config, &schema, &registry, document).and_then(
            |selection| assemble_artifact(config, &schema, plugins, document, selection),
        );
        match artifact {
            Ok(artifact) => artifacts.push(artifact),
            Err(error) => errors.push(error.or_filepath(&document.filepath)),
        }
    }

    let artifacts = errors.into_result(artifacts)?;
    info!(artifacts = artifacts.len(), "compiled documents");

    Ok(CompileOutput {
        schema_sdl: augmenter.sdl(),
        schema,
        artifacts,
    })
}
