use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::artifact::Artifact;
use crate::documents::DocumentKind;
use crate::error::{CompilerError, CompilerErrors};
use crate::schema::SchemaState;

/// Persists finished artifacts. Only called once the whole run succeeded.
pub trait ArtifactWriter {
    fn write(&self, artifact: &Artifact) -> Result<(), CompilerError>;

    fn write_all(&self, artifacts: &[Artifact]) -> Result<(), CompilerErrors> {
        let mut errors = CompilerErrors::new();
        for artifact in artifacts {
            if let Err(error) = self.write(artifact) {
                errors.push(error);
            }
        }
        errors.into_result(())
    }
}

/// Writes one pretty-printed `<name>.json` file per artifact.
pub struct FileSystemArtifactWriter {
    directory: PathBuf,
}

impl FileSystemArtifactWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, CompilerError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|error| io_error(&directory, error))?;
        Ok(Self { directory })
    }

    pub fn artifact_path(&self, artifact: &Artifact) -> PathBuf {
        self.directory.join(format!("{}.json", artifact.name))
    }
}

impl ArtifactWriter for FileSystemArtifactWriter {
    fn write(&self, artifact: &Artifact) -> Result<(), CompilerError> {
        let path = self.artifact_path(artifact);
        write_json(&path, artifact)?;
        debug!(path = %path.display(), "wrote artifact");
        Ok(())
    }
}

/// Writes the `{ hash: query }` map of every operation, sorted by hash.
#[instrument(level = "trace", skip_all)]
pub fn write_persisted_queries(path: &Path, artifacts: &[Artifact]) -> Result<(), CompilerError> {
    let queries = persisted_queries(artifacts);
    write_json(path, &queries)?;
    info!(path = %path.display(), count = queries.len(), "wrote persisted queries");
    Ok(())
}

pub fn persisted_queries(artifacts: &[Artifact]) -> BTreeMap<&str, &str> {
    artifacts
        .iter()
        .filter(|artifact| artifact.kind != DocumentKind::Fragment)
        .map(|artifact| (artifact.hash.as_str(), artifact.raw.as_str()))
        .collect()
}

pub fn write_schema(path: &Path, sdl: &str) -> Result<(), CompilerError> {
    ensure_parent(path)?;
    fs::write(path, sdl).map_err(|error| io_error(path, error))
}

/// Writes a JSON map of every enum type of the schema to its values.
pub fn write_enums(path: &Path, schema: &SchemaState) -> Result<(), CompilerError> {
    let enums: BTreeMap<&str, &[String]> = schema
        .enums()
        .map(|enum_type| (enum_type.name.as_str(), enum_type.values.as_slice()))
        .collect();
    write_json(path, &enums)
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CompilerError> {
    let json = serde_json::to_string_pretty(value).map_err(|error| {
        CompilerError::io(format!("Failed to serialize {}", path.display()))
            .with_description(error.to_string())
    })?;
    ensure_parent(path)?;
    fs::write(path, json).map_err(|error| io_error(path, error))
}

fn ensure_parent(path: &Path) -> Result<(), CompilerError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|error| io_error(parent, error))
        }
        _ => Ok(()),
    }
}

fn io_error(path: &Path, error: std::io::Error) -> CompilerError {
    CompilerError::io(format!("Failed to write {}", path.display())).with_description(error.to_string())
}
