use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Which `SessionStore` backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStoreKind {
    Redis,
    Memory,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub session_store: SessionStoreKind,
    /// Required when `session_store` is Redis.
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub llm_timeout_secs: u64,
    pub session_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let session_store = parse_store_kind(&env_or("SESSION_STORE", "redis"))?;
        let redis_url = match session_store {
            SessionStoreKind::Redis => Some(require_env("REDIS_URL")?),
            SessionStoreKind::Memory => std::env::var("REDIS_URL").ok(),
        };

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            session_store,
            redis_url,
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            llm_timeout_secs: parse_secs("LLM_TIMEOUT_SECS", "60")?,
            session_ttl_secs: parse_secs("SESSION_TTL_SECS", "86400")?,
        })
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_secs(key: &str, default: &str) -> Result<u64> {
    let secs = env_or(key, default)
        .parse::<u64>()
        .with_context(|| format!("{key} must be a whole number of seconds"))?;
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(secs)
}

fn parse_store_kind(value: &str) -> Result<SessionStoreKind> {
    match value.trim().to_ascii_lowercase().as_str() {
        "redis" => Ok(SessionStoreKind::Redis),
        "memory" => Ok(SessionStoreKind::Memory),
        other => bail!("SESSION_STORE must be 'redis' or 'memory', got '{other}'"),
    }
}
