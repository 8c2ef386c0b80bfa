use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// JWT secrets that ship in examples and must be replaced in production.
pub const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub verify_code_secret: String,
    pub whatsapp_number: Option<String>,
    pub recommender_model: Option<PathBuf>,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    pub admin_emails: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = var_or("PAWHAVEN_HOST", "0.0.0.0");
        let port: u16 = var_or("PAWHAVEN_PORT", "8000")
            .parse()
            .context("PAWHAVEN_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let jwt_secret = var_or("PAWHAVEN_JWT_SECRET", "dev-secret-change-me");
        let token_ttl_minutes: i64 = var_or("PAWHAVEN_TOKEN_TTL_MINUTES", "30")
            .parse()
            .context("PAWHAVEN_TOKEN_TTL_MINUTES must be a whole number of minutes")?;
        if token_ttl_minutes <= 0 {
            anyhow::bail!("PAWHAVEN_TOKEN_TTL_MINUTES must be positive");
        }

        Ok(Self {
            addr,
            db_path: var_or("PAWHAVEN_DB_PATH", "pawhaven.db").into(),
            verify_code_secret: std::env::var("PAWHAVEN_VERIFY_CODE_SECRET")
                .unwrap_or_else(|_| jwt_secret.clone()),
            jwt_secret,
            token_ttl_minutes,
            whatsapp_number: non_empty("PAWHAVEN_WHATSAPP_NUMBER")
                .map(|n| n.trim_start_matches('+').to_string()),
            recommender_model: non_empty("PAWHAVEN_RECOMMENDER_MODEL").map(PathBuf::from),
            cors_origins: list("PAWHAVEN_CORS_ORIGINS"),
            admin_emails: list("PAWHAVEN_ADMIN_EMAILS")
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
        })
    }

    pub fn uses_placeholder_secret(&self) -> bool {
        self.jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Comma separated list, blanks dropped.
fn list(key: &str) -> Vec<String> {
    non_empty(key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
