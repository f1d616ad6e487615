use hive_compiler_config::runtime::PaginateMode;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaginationMethod {
    Cursor,
    Offset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaginationDirection {
    Forward,
    Backward,
    Both,
}

impl PaginationDirection {
    pub fn forward(&self) -> bool {
        matches!(self, PaginationDirection::Forward | PaginationDirection::Both)
    }

    pub fn backward(&self) -> bool {
        matches!(self, PaginationDirection::Backward | PaginationDirection::Both)
    }
}

/// Describes how the runtime loads more pages of the paginated field of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Refetch {
    /// Response keys leading from the document root to the paginated field.
    pub path: Vec<String>,
    pub method: PaginationMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    pub direction: PaginationDirection,
    pub mode: PaginateMode,
    /// The document is a fragment on a non-root type, pages are fetched through its record.
    pub embedded: bool,
    pub target_type: String,
    /// The cursor or offset of the first page, when the document passes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<serde_json::Value>,
}
