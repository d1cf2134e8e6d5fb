use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;
use retailpos_core::segmentation::RecencyReference;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    /// Longest a checkout waits for the write lock.
    pub lock_wait: Duration,
    pub kmeans_seed: u64,
    pub default_clusters: usize,
    pub recency_reference: RecencyReference,
    /// Recorded on sales submitted without an `x-operator-id` header.
    pub default_operator_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            db_path: "./db/app.db".to_string(),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(30_000),
            lock_wait: Duration::from_millis(5_000),
            kmeans_seed: 42,
            default_clusters: 3,
            recency_reference: RecencyReference::Now,
            default_operator_id: "system".to_string(),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", key, e)),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr: SocketAddr = std::env::var("RP_LISTEN_ADDR")
            .unwrap_or_else(|_| defaults.listen_addr.to_string())
            .parse()
            .context("Invalid RP_LISTEN_ADDR")?;
        let db_path = std::env::var("RP_DB_PATH").unwrap_or(defaults.db_path);
        let cors_allow = std::env::var("RP_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = env_or("RP_REQUEST_TIMEOUT_MS", 30_000)?;
        let lock_wait_ms: u64 = env_or("RP_LOCK_WAIT_MS", 5_000)?;
        let default_clusters: usize = env_or("RP_DEFAULT_CLUSTERS", defaults.default_clusters)?;
        if default_clusters == 0 {
            anyhow::bail!("RP_DEFAULT_CLUSTERS must be at least 1");
        }

        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            lock_wait: Duration::from_millis(lock_wait_ms),
            kmeans_seed: env_or("RP_KMEANS_SEED", defaults.kmeans_seed)?,
            default_clusters,
            recency_reference: env_or("RP_RECENCY_REFERENCE", defaults.recency_reference)?,
            default_operator_id: std::env::var("RP_DEFAULT_OPERATOR_ID")
                .unwrap_or(defaults.default_operator_id),
        })
    }
}
