use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("No access token available: {0}")]
    MissingToken(String),

    #[error("Invalid drive URL built for '{path}'")]
    InvalidUrl { path: String },

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    // Missing objects (404) and denied access (401/403) both land here
    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to open workbook '{path}'")]
    WorkbookOpen {
        path: String,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("Sheet '{sheet}' not found in workbook '{path}'")]
    SheetNotFound { path: String, sheet: String },

    #[error("Invalid column range '{0}'")]
    InvalidColumnSpec(String),

    #[error("Required column '{column}' not found in '{path}'")]
    MissingColumn { path: String, column: String },

    #[error("Failed building table from '{path}'")]
    DataFrame {
        path: String,
        #[source]
        source: PolarsError,
    },

    #[error("Cache entry '{0}' holds a different kind of table")]
    CachedTypeMismatch(String),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl FetchError {
    /// The upstream HTTP status, when the failure came from the drive API.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            FetchError::NetworkRequest(_, e) => e.status(),
            _ => None,
        }
    }
}
