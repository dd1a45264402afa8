use std::collections::HashSet;
use std::fs;
use tracing::{debug, error, info};

use crate::types::server_config::{
    AppConfig, ConfigError, MAX_SESSION_LIFETIME_HOURS, MIN_SECRET_LEN, PLACEHOLDER_SECRET,
};

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Loading configuration from: {}", path);

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path);

    parse_config(&contents)
}

/// Parse and validate configuration text.
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let config: AppConfig = toml::from_str(contents)?;

    info!("Configuration loaded successfully");
    debug!("Config: {:?}", config);

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.paths.web_dir.is_empty() {
        return Err(ConfigError::InvalidConfig("web_dir cannot be empty".into()));
    }

    if config.paths.uploads_dir.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "uploads_dir cannot be empty".into(),
        ));
    }

    let lifetime_hours = config.auth.resolved_lifetime_hours();
    if lifetime_hours == 0 {
        return Err(ConfigError::InvalidConfig(
            "session_lifetime_hours must be greater than 0".into(),
        ));
    }
    if lifetime_hours > MAX_SESSION_LIFETIME_HOURS {
        return Err(ConfigError::InvalidConfig(format!(
            "session_lifetime_hours must be at most {}",
            MAX_SESSION_LIFETIME_HOURS
        )));
    }

    if config.auth.cookie_name.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "cookie_name cannot be empty".into(),
        ));
    }

    if config.auth.resolved_admin_password().is_none() {
        return Err(ConfigError::InvalidConfig(
            "admin_password must be set via the ADMIN_PASSWORD env var or auth.admin_password"
                .into(),
        ));
    }

    // Signing keys must be resolvable and long enough. Checked here so a bad
    // config is rejected at startup (and on SIGHUP) instead of at first login.
    let keys = config.auth.resolved_signing_keys();
    if keys.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "a signing key must be set via the JWT_SECRET env var, auth.jwt_secret or auth.signing_keys"
                .into(),
        ));
    }

    let mut seen = HashSet::new();
    for key in &keys {
        if key.id.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "signing key ids cannot be empty".into(),
            ));
        }
        if !seen.insert(key.id.as_str()) {
            return Err(ConfigError::InvalidConfig(format!(
                "duplicate signing key id: {}",
                key.id
            )));
        }
        if key.secret == PLACEHOLDER_SECRET {
            return Err(ConfigError::InvalidConfig(format!(
                "signing key {} uses the placeholder secret",
                key.id
            )));
        }
        if key.secret.chars().count() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidConfig(format!(
                "signing key {} must be at least {} characters long",
                key.id, MIN_SECRET_LEN
            )));
        }
    }

    Ok(())
}
