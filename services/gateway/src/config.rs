use anyhow::{Context, Result};
use reservation::RetryPolicy;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEV_JWT_SECRET: &str = "dev-only-secret-change-me";

/// Gateway settings, read from the environment
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub addr: SocketAddr,
    /// Journal directory; `None` keeps all state in memory
    pub journal_dir: Option<PathBuf>,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub retry: RetryPolicy,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let addr = get("GATEWAY_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("GATEWAY_ADDR must be a socket address")?;

        let journal_dir = get("JOURNAL_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        let jwt_secret = match get("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET is not set; using an insecure development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let ttl_minutes: u64 = parse_or(&get, "TOKEN_TTL_MINUTES", 30)?;
        let attempts: u32 = parse_or(&get, "STORAGE_RETRY_ATTEMPTS", 3)?;
        let base_ms: u64 = parse_or(&get, "STORAGE_RETRY_BASE_MS", 25)?;
        let ttl_secs = ttl_minutes
            .checked_mul(60)
            .with_context(|| format!("TOKEN_TTL_MINUTES is too large: {}", ttl_minutes))?;

        Ok(Self {
            addr,
            journal_dir,
            jwt_secret,
            token_ttl: Duration::from_secs(ttl_secs),
            retry: RetryPolicy {
                max_attempts: attempts.max(1),
                base_delay: Duration::from_millis(base_ms),
                ..RetryPolicy::default()
            },
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}
