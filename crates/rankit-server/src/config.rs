//! Server configuration loaded from environment variables.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use rankit_db::DbConfig;
use tracing::{info, warn};

pub struct ServerConfig {
    pub db: DbConfig,
    /// Seconds between reconciliation sweeps.
    pub reconcile_interval_secs: u64,
}

impl ServerConfig {
    pub fn load() -> Self {
        let defaults = DbConfig::default();
        Self {
            db: DbConfig {
                url: load_or("RANKIT_DB_URL", defaults.url),
                namespace: load_or("RANKIT_DB_NAMESPACE", defaults.namespace),
                database: load_or("RANKIT_DB_NAME", defaults.database),
                username: load_or("RANKIT_DB_USER", defaults.username),
                password: load_secret_or("RANKIT_DB_PASS", defaults.password),
            },
            reconcile_interval_secs: parse_or("RANKIT_RECONCILE_INTERVAL_SECS", 300),
        }
    }
}

fn load_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default
    })
}

/// Like [`load_or`], but the value never reaches the log.
fn load_secret_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default");
        default
    })
}

fn parse_or<T: FromStr + Display + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid {key} value {raw:?}, using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
