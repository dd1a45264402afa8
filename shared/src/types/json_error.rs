use serde::{Deserialize, Serialize};

/// Standard error response structure.
///
/// `error` is the human-readable message clients display; `code` is the
/// stable machine-readable tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error: message.to_string(),
            code: code.to_string(),
        }
    }

    /// The one denial body used for every unauthenticated request to a
    /// protected path, whatever the reason the token was rejected.
    pub fn unauthorized() -> Self {
        Self::new("UNAUTHORIZED", "Unauthorized - invalid or expired session")
    }
}

/// `{"success": true}` acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn with_message(message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
        }
    }
}
