use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level error payload the merge server returns on any failed
/// request: `{"error": "..."}`. The message is user-facing verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[error("{error}")]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
