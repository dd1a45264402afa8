use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The only principal this system ever authenticates.
pub const ADMIN_PRINCIPAL: &str = "admin";

/// Signature algorithm tag carried in every token header.
pub const TOKEN_ALG: &str = "HS256";

/// Token type tag carried in every token header.
pub const TOKEN_TYP: &str = "JWT";

/// First segment of a session token.
///
/// `kid` names the signing key so keys can be rotated: new tokens are signed
/// with the newest key while older keys keep verifying until their tokens
/// expire naturally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl TokenHeader {
    pub fn for_key(kid: &str) -> Self {
        Self {
            alg: TOKEN_ALG.to_string(),
            typ: TOKEN_TYP.to_string(),
            kid: Some(kid.to_string()),
        }
    }
}

/// Second segment of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Principal identity; always [`ADMIN_PRINCIPAL`] in practice.
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: i64,

    /// Expiry (Unix timestamp, seconds). The token is valid strictly before
    /// this instant.
    pub exp: i64,
}

impl TokenPayload {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.exp, 0)
    }
}

/// Principal extracted from a token for display or audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// `GET /api/auth` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl SessionStatus {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            expires_at: None,
            user_id: None,
        }
    }

    pub fn for_principal(principal: &Principal) -> Self {
        Self {
            authenticated: true,
            expires_at: Some(principal.expires_at.to_rfc3339()),
            user_id: Some(principal.user_id.clone()),
        }
    }
}

/// One line of the bounded session audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// First 8 characters of the signature segment followed by `...`.
    pub fingerprint: String,
    pub user_id: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// `data` of the `GET /api/auth/sessions` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: String,
    pub expires_at: String,
    pub session_type: String,
    pub active_sessions: usize,
    pub recent: Vec<AuditEntry>,
}
