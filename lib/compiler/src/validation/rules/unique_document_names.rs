use std::collections::HashMap;

use crate::documents::Document;
use crate::error::{CompilerError, CompilerErrors};

/// Document names and fragment names must be unique across the whole document set.
///
/// Runs while documents are collected, before any schema-aware rule.
pub fn validate(documents: &[Document]) -> CompilerErrors {
    let mut errors = CompilerErrors::new();
    let mut document_names: HashMap<&str, &str> = HashMap::new();
    let mut fragment_names: HashMap<&str, &str> = HashMap::new();

    for document in documents {
        match document_names.get(document.name.as_str()) {
            Some(earlier) => errors.push(
                CompilerError::structural(format!("Document name {} is not unique", document.name))
                    .with_filepath(&document.filepath)
                    .with_description(format!("also defined in {}", earlier)),
            ),
            None => {
                document_names.insert(&document.name, &document.filepath);
            }
        }

        for fragment in document.own_fragment_names() {
            match fragment_names.get(fragment) {
                Some(earlier) => errors.push(
                    CompilerError::structural(format!("Fragment name {} is not unique", fragment))
                        .with_filepath(&document.filepath)
                        .with_description(format!("also defined in {}", earlier)),
                ),
                None => {
                    fragment_names.insert(fragment, &document.filepath);
                }
            }
        }
    }

    errors
}
