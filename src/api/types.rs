use serde::{Deserialize, Serialize};

/// Error envelope and the acknowledgement body for deletions.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Body of `POST /api/tickets/{ticketId}/notes`.
#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub text: String,
}

/// Body returned by `POST /api/users/api-key/regenerate`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiKeyResponse {
    pub token: String,
}
