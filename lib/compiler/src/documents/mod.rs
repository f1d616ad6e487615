use graphql_parser::query::Definition;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::artifact::refetch::Refetch;
use crate::error::{CompilerError, CompilerErrors};
use crate::utils::ast::OperationDefinitionExt;
use crate::utils::parsing::{safe_parse_document, QueryDocument};
use crate::validation::rules::unique_document_names;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentKind {
    Query,
    Mutation,
    Subscription,
    Fragment,
}

/// A parsed document as supplied by the source loader.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub filepath: String,
    pub document: QueryDocument,
    pub original_string: String,
}

impl SourceDocument {
    pub fn new(
        filepath: impl Into<String>,
        document: QueryDocument,
        original_string: impl Into<String>,
    ) -> Self {
        Self {
            filepath: filepath.into(),
            document,
            original_string: original_string.into(),
        }
    }

    pub fn parse(filepath: impl Into<String>, text: &str) -> Result<Self, CompilerError> {
        let filepath = filepath.into();
        let document = safe_parse_document(text).map_err(|error| {
            CompilerError::structural("Failed to parse document")
                .with_filepath(&filepath)
                .with_description(error.to_string())
        })?;
        Ok(Self::new(filepath, document, text))
    }
}

/// One operation, or one file of fragments, on its way through the pipeline.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub kind: DocumentKind,
    pub filepath: String,
    /// The working AST, replaced by every transform.
    pub document: QueryDocument,
    /// The AST exactly as it was authored.
    pub original_document: QueryDocument,
    pub original_string: String,
    /// The pagination descriptor, recorded by the pagination transform.
    pub refetch: Option<Refetch>,
}

impl Document {
    /// The operation definition, or the first fragment definition of a fragment document.
    pub fn main_definition(&self) -> Option<&Definition<'static, String>> {
        self.document.definitions.first()
    }

    /// Names of the fragments defined by the document itself, excluding composed ones.
    pub fn own_fragment_names(&self) -> Vec<&str> {
        self.original_document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                Definition::Fragment(fragment) => Some(fragment.name.as_str()),
                Definition::Operation(_) => None,
            })
            .collect()
    }
}

/// Assigns a canonical name and kind to every source document.
///
/// A file holds either exactly one named operation, or one or more fragments. Document names
/// must be unique across the whole set.
#[instrument(level = "trace", skip_all)]
pub fn collect_documents(sources: Vec<SourceDocument>) -> Result<Vec<Document>, CompilerErrors> {
    let mut errors = CompilerErrors::new();
    let mut documents = Vec::with_capacity(sources.len());

    for source in sources {
        match collect_document(source) {
            Ok(document) => {
                debug!(name = %document.name, kind = %document.kind, "collected document");
                documents.push(document)
            }
            Err(error) => errors.push(error),
        }
    }

    errors.extend(unique_document_names::validate(&documents));
    errors.into_result(documents)
}

fn collect_document(source: SourceDocument) -> Result<Document, CompilerError> {
    let mut operations = Vec::new();
    let mut fragments = Vec::new();

    for definition in &source.document.definitions {
        match definition {
            Definition::Operation(operation) => operations.push(operation),
            Definition::Fragment(fragment) => fragments.push(fragment.name.as_str()),
        }
    }

    let (name, kind) = match (operations.as_slice(), fragments.is_empty()) {
        ([], true) => {
            return Err(CompilerError::structural("Document does not contain any definition")
                .with_filepath(&source.filepath))
        }
        ([], false) => (fragments.join("_"), DocumentKind::Fragment),
        ([operation], true) => {
            let name = operation.name().ok_or_else(|| {
                CompilerError::structural("Operations must have a name")
                    .with_filepath(&source.filepath)
                    .with_description("anonymous operations are not supported")
            })?;
            (name.to_string(), operation.kind())
        }
        ([_], false) => {
            return Err(CompilerError::structural(
                "Operations and fragments must be defined in separate files",
            )
            .with_filepath(&source.filepath))
        }
        _ => {
            return Err(
                CompilerError::structural("A file may only define a single operation")
                    .with_filepath(&source.filepath),
            )
        }
    };

    Ok(Document {
        name,
        kind,
        filepath: source.filepath,
        original_document: source.document.clone(),
        document: source.document,
        original_string: source.original_string,
        refetch: None,
    })
}
