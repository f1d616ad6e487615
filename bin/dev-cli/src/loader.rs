use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use document_compiler::SourceDocument;
use tracing::debug;

const DOCUMENT_EXTENSIONS: [&str; 2] = ["graphql", "gql"];

/// Every `.graphql` and `.gql` file under the given paths, sorted so runs are reproducible.
pub fn find_document_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, &mut files)?;
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            debug!(path = %path.display(), "skipping missing document path");
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk(directory: &Path, files: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let entries = fs::read_dir(directory)
        .with_context(|| format!("failed to read directory {}", directory.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, files)?;
        } else if is_document(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| DOCUMENT_EXTENSIONS.contains(&extension))
}

pub fn load_documents(paths: &[PathBuf]) -> anyhow::Result<Vec<SourceDocument>> {
    find_document_files(paths)?
        .iter()
        .map(|file| {
            let text = fs::read_to_string(file)
                .with_context(|| format!("failed to read document {}", file.display()))?;
            Ok(SourceDocument::parse(file.display().to_string(), &text)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_documents_recursively() {
        let directory = tempfile::tempdir().unwrap();
        let nested = directory.path().join("routes/profile");
        fs::create_dir_all(&nested).unwrap();
        fs::write(directory.path().join("b.graphql"), "query B { viewer { id } }").unwrap();
        fs::write(nested.join("a.gql"), "query A { viewer { id } }").unwrap();
        fs::write(nested.join("notes.md"), "not a document").unwrap();

        let files = find_document_files(&[directory.path().to_path_buf()]).unwrap();

        assert_eq!(
            files,
            vec![directory.path().join("b.graphql"), nested.join("a.gql")]
        );
    }

    #[test]
    fn reports_unparsable_documents() {
        let directory = tempfile::tempdir().unwrap();
        let file = directory.path().join("broken.graphql");
        fs::write(&file, "query {").unwrap();

        let error = load_documents(&[file]).unwrap_err();

        assert!(error.to_string().starts_with("Failed to parse document"));
    }
}
