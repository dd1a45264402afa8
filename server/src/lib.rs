pub mod app;
pub mod database;
pub mod handlers;
pub mod security;
pub mod tower_middle;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use shared::config::LiveConfig;
use shared::types::server_config::AppConfig;
use sqlx::SqlitePool;

use crate::security::{AdminCredential, SessionAudit, SessionTokenService};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Request body seen by every handler: the connection body behind a size
/// limit, type-erased so tests can feed in plain buffers.
pub type ReqBody = BoxBody<Bytes, BoxError>;

/// Session settings captured once at startup. A config reload does not touch
/// them, so tokens issued before and after a SIGHUP follow the same rules.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub lifetime_hours: u64,
    pub secure_cookies: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: LiveConfig,
    pub db: SqlitePool,
    pub tokens: Arc<SessionTokenService>,
    pub admin: Arc<AdminCredential>,
    pub audit: SessionAudit,
    pub session: Arc<SessionSettings>,
}

impl AppState {
    /// Build state from a validated config and an open pool.
    pub fn new(config: AppConfig, db: SqlitePool) -> Result<Self> {
        let auth = &config.auth;

        let tokens = SessionTokenService::from_config(&auth.resolved_signing_keys())
            .context("Failed to build signing key ring")?;

        let password = auth
            .resolved_admin_password()
            .ok_or_else(|| anyhow!("Admin password is not configured"))?;

        let session = SessionSettings {
            cookie_name: auth.cookie_name.clone(),
            lifetime_hours: auth.resolved_lifetime_hours(),
            secure_cookies: auth.secure_cookies,
        };

        Ok(Self {
            config: LiveConfig::new(config),
            db,
            tokens: Arc::new(tokens),
            admin: Arc::new(AdminCredential::new(&password)),
            audit: SessionAudit::default(),
            session: Arc::new(session),
        })
    }
}
