use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ErrorKind {
    /// Invalid or missing configuration, reported before compilation starts.
    Config,
    /// A problem with the shape of the documents: missing fragments, duplicated names, misused directives.
    Structural,
    /// The type of a selection could not be resolved against the schema.
    TypeResolution,
    /// Reading the schema or writing the output failed.
    Io,
}

/// A single problem found while compiling documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}{}", format_location(.filepath, .description))]
pub struct CompilerError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn format_location(filepath: &Option<String>, description: &Option<String>) -> String {
    let mut suffix = String::new();
    if let Some(filepath) = filepath {
        suffix.push_str(&format!(" ({})", filepath));
    }
    if let Some(description) = description {
        suffix.push_str(&format!(": {}", description));
    }
    suffix
}

impl CompilerError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            filepath: None,
            description: None,
        }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural, message)
    }

    pub fn type_resolution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeResolution, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn with_filepath(mut self, filepath: impl Into<String>) -> Self {
        self.filepath = Some(filepath.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches the file path unless the error already carries one.
    pub fn or_filepath(mut self, filepath: &str) -> Self {
        if self.filepath.is_none() {
            self.filepath = Some(filepath.to_string());
        }
        self
    }
}

/// A batch of independent problems, reported together so that a single run surfaces all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{}", join_errors(.0))]
pub struct CompilerErrors(pub Vec<CompilerError>);

fn join_errors(errors: &[CompilerError]) -> String {
    errors
        .iter()
        .map(|error| error.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl CompilerErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, error: CompilerError) {
        self.0.push(error);
    }

    pub fn extend(&mut self, other: CompilerErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompilerError> {
        self.0.iter()
    }

    /// Returns `value` when no error was collected.
    pub fn into_result<T>(self, value: T) -> Result<T, CompilerErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<CompilerError> for CompilerErrors {
    fn from(error: CompilerError) -> Self {
        Self(vec![error])
    }
}

impl From<Vec<CompilerError>> for CompilerErrors {
    fn from(errors: Vec<CompilerError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for CompilerErrors {
    type Item = CompilerError;
    type IntoIter = std::vec::IntoIter<CompilerError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
