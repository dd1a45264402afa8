use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Placeholder secret shipped in early deployments; never acceptable.
pub const PLACEHOLDER_SECRET: &str = "your-super-secret-jwt-key-change-in-production";

/// Key id given to the single `jwt_secret` / `JWT_SECRET` key.
pub const DEFAULT_KEY_ID: &str = "default";

/// Minimum signing secret length, in characters.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted session: one year.
pub const MAX_SESSION_LIFETIME_HOURS: u64 = 24 * 365;

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for any request body, uploads included.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    pub web_dir: String,
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_db_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_db_connections(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct SigningKeyConfig {
    pub id: String,
    pub secret: String,
}

impl std::fmt::Debug for SigningKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyConfig")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize, Clone)]
pub struct AuthConfig {
    /// Shared admin password. Prefer the `ADMIN_PASSWORD` env var.
    pub admin_password: Option<String>,

    /// Single HMAC key. Prefer the `JWT_SECRET` env var.
    ///
    /// **Hot-reload safe:** NO, the key ring is built once at startup.
    pub jwt_secret: Option<String>,

    /// Ordered key ring for rotation. The last entry signs new tokens; any
    /// entry verifies tokens carrying its id.
    #[serde(default)]
    pub signing_keys: Vec<SigningKeyConfig>,

    #[serde(default = "default_session_lifetime_hours")]
    pub session_lifetime_hours: u64,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Force the cookie `Secure` attribute on or off. Unset means "Secure
    /// when the request came in over HTTPS".
    #[serde(default)]
    pub secure_cookies: Option<bool>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("signing_keys", &self.signing_keys)
            .field("session_lifetime_hours", &self.session_lifetime_hours)
            .field("cookie_name", &self.cookie_name)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ServerConfig {
    /// Full bind address, e.g. `"0.0.0.0:3000"`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

impl AuthConfig {
    /// Session lifetime in hours, with `SESSION_LIFETIME_HOURS` taking
    /// priority over the config field.
    pub fn resolved_lifetime_hours(&self) -> u64 {
        env_non_empty("SESSION_LIFETIME_HOURS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(self.session_lifetime_hours)
    }

    /// Resolve the admin password with `ADMIN_PASSWORD` taking priority over
    /// the config file field.
    pub fn resolved_admin_password(&self) -> Option<String> {
        env_non_empty("ADMIN_PASSWORD")
            .or_else(|| self.admin_password.clone().filter(|s| !s.is_empty()))
    }

    /// Resolve the key ring in signing order (last entry signs).
    ///
    /// `JWT_SECRET` (or `jwt_secret`) contributes a key with id
    /// [`DEFAULT_KEY_ID`] placed before any `signing_keys`, so appending a
    /// `[[auth.signing_keys]]` entry is how a rotation starts.
    pub fn resolved_signing_keys(&self) -> Vec<SigningKeyConfig> {
        let single = env_non_empty("JWT_SECRET")
            .or_else(|| self.jwt_secret.clone().filter(|s| !s.is_empty()))
            .map(|secret| SigningKeyConfig {
                id: DEFAULT_KEY_ID.to_string(),
                secret,
            });

        single
            .into_iter()
            .chain(self.signing_keys.iter().cloned())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_bind() -> String {
    "127.0.0.1".to_string()
}

pub fn default_port() -> u16 {
    3000
}

pub fn default_max_body_bytes() -> u64 {
    10 * 1024 * 1024
}

pub fn default_uploads_dir() -> String {
    "uploads".to_string()
}

pub fn default_database_url() -> String {
    "sqlite://site.db?mode=rwc".to_string()
}

pub fn default_db_connections() -> u32 {
    5
}

pub fn default_session_lifetime_hours() -> u64 {
    24
}

pub fn default_cookie_name() -> String {
    "admin_session".to_string()
}
