mod loader;
mod logging;

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use document_compiler::output::{
    write_enums, write_persisted_queries, write_schema, ArtifactWriter, FileSystemArtifactWriter,
};
use document_compiler::{compile, CompileOutput, CompilerError, PluginRegistry};
use hive_compiler_config::log::LogLevel;
use hive_compiler_config::{load_config, CompilerConfig};
use tracing::{error, info};

#[derive(Parser)]
#[command(version, about = "Compiles GraphQL documents into runtime artifacts")]
struct Args {
    /// Path to the configuration file. The default file names are looked up in the current directory otherwise.
    #[arg(long, global = true, env = "COMPILER_CONFIG")]
    config: Option<String>,

    /// Overrides the configured log level.
    #[arg(long, global = true)]
    log: Option<LogLevel>,

    /// Shorthand for `--log debug`.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Compiles every document and writes the artifacts
    Generate {
        /// Overrides the configured artifact directory.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Prints the schema with every internal and document-derived definition merged in
    PrintSchema,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.clone())?;
    if let Some(level) = args.log {
        config.log.level = level;
        config.log.filter = None;
    }
    if args.verbose {
        config.log.level = LogLevel::Debug;
        config.log.filter = None;
    }
    logging::init(&config.log)?;

    match args.command {
        Command::Generate { output } => {
            if let Some(output) = output {
                config.output = output;
            }
            generate(&config)
        }
        Command::PrintSchema => {
            let output = run(&config)?;
            println!("{}", output.schema_sdl);
            Ok(())
        }
    }
}

fn run(config: &CompilerConfig) -> anyhow::Result<CompileOutput> {
    let schema_path = config.resolve_path(&config.schema);
    if !schema_path.is_file() {
        return Err(CompilerError::config(format!(
            "Schema file {} does not exist",
            schema_path.display()
        ))
        .with_description("set `schema` in the configuration or COMPILER_SCHEMA_PATH")
        .into());
    }
    let schema_sdl = fs::read_to_string(&schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;

    let document_paths: Vec<PathBuf> = config
        .documents
        .iter()
        .map(|path| config.resolve_path(path))
        .collect();
    let sources = loader::load_documents(&document_paths)?;
    info!(documents = sources.len(), "loaded documents");

    match compile(config, &schema_sdl, sources, &PluginRegistry::default()) {
        Ok(output) => Ok(output),
        Err(errors) => {
            for error in errors.iter() {
                error!("{}", error);
            }
            bail!("compilation failed with {} error(s)", errors.len())
        }
    }
}

fn generate(config: &CompilerConfig) -> anyhow::Result<()> {
    let output = run(config)?;

    let output_dir = config.resolve_path(&config.output);
    let writer = FileSystemArtifactWriter::new(&output_dir)?;
    writer.write_all(&output.artifacts)?;
    write_schema(&output_dir.join("schema.graphql"), &output.schema_sdl)?;
    write_enums(&output_dir.join("enums.json"), &output.schema)?;
    if let Some(path) = &config.persisted_queries {
        write_persisted_queries(&config.resolve_path(path), &output.artifacts)?;
    }

    info!(
        artifacts = output.artifacts.len(),
        output = %output_dir.display(),
        "generated artifacts"
    );
    Ok(())
}
