use crate::error::CompilerError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to parse the schema of {source_name}: {message}")]
    ParseError {
        source_name: String,
        message: String,
    },

    #[error("{source_name} defines '{name}' which conflicts with an existing definition")]
    ConflictingDefinition { source_name: String, name: String },

    #[error("Cannot extend '{name}': the type is not defined")]
    ExtensionWithoutDefinition { name: String },

    #[error("Cannot extend '{name}' with a different kind of type")]
    MismatchedExtension { name: String },

    #[error("The schema does not define a query type")]
    MissingQueryType,
}

impl From<SchemaError> for CompilerError {
    fn from(error: SchemaError) -> Self {
        match error {
            SchemaError::ParseError { .. } | SchemaError::MissingQueryType => {
                CompilerError::config(error.to_string())
            }
            SchemaError::ConflictingDefinition { .. }
            | SchemaError::ExtensionWithoutDefinition { .. }
            | SchemaError::MismatchedExtension { .. } => {
                CompilerError::structural(error.to_string())
            }
        }
    }
}
