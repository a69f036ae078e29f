use thiserror::Error;

use super::common::ApiErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {source}; body: {body}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid API key: must be a printable ASCII string")]
    InvalidApiKey,

    #[error("Operation cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Messages from the `{"errors": [...]}` envelope, if the body has one
    pub fn messages(&self) -> Vec<String> {
        match self {
            ApiError::Status { body, .. } => serde_json::from_str::<ApiErrorResponse>(body)
                .map(|r| r.errors)
                .unwrap_or_default(),
            _ => vec![],
        }
    }
}
