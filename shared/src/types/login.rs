use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::json_error::ErrorResponse;

// ---------------------------------------------------------------------------
// Login wire types
// ---------------------------------------------------------------------------

/// Body of `POST /api/auth`. There is a single admin principal, so the
/// password is the only credential.
#[derive(Deserialize)]
pub struct LoginData {
    pub password: String,
}

impl fmt::Debug for LoginData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginData")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login body. The token itself travels only in the cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
}

impl LoginResponse {
    pub fn success() -> Self {
        Self { success: true }
    }
}

// ---------------------------------------------------------------------------
// Login errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    InvalidCredentials,
    MissingField(String),
    MalformedBody,
    InternalError,
}

impl LoginError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::MalformedBody => "MALFORMED_BODY",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// `InvalidCredentials` reads the same for every wrong password.
    pub fn to_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid password".to_string(),
            Self::MissingField(field) => format!("Missing required field: {}", field),
            Self::MalformedBody => "Request body must be JSON: {\"password\": string}".to_string(),
            Self::InternalError => "Authentication error".to_string(),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.to_code(), &self.to_message())
    }
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.to_code(), self.to_message())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_password() {
        let d = LoginData {
            password: "hunter2-very-secret".into(),
        };
        let out = format!("{:?}", d);
        assert!(!out.contains("hunter2"));
        assert!(out.contains("redacted"));
    }

    #[test]
    fn display_includes_code() {
        let e = LoginError::MissingField("password".into());
        assert!(e.to_string().starts_with("MISSING_FIELD"));
    }
}
