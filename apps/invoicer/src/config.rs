use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every key has a default; only malformed values are rejected.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Directory holding the service's `invoices.json` and `date.json`.
    pub data_dir: PathBuf,
    /// Explicit template PDF; overrides the built-in lookup list.
    pub template_path: Option<PathBuf>,
    pub rust_log: String,
    /// API root of the remote invoice service used by `DualPathStore`.
    pub remote_base_url: String,
    /// SQLite file backing the local fallback store.
    pub local_store_path: PathBuf,
    pub remote_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let data_dir = PathBuf::from(env_or("DATA_DIR", "data"));
        Ok(Config {
            port: env_or("PORT", "3000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            template_path: std::env::var("TEMPLATE_PATH").ok().map(PathBuf::from),
            rust_log: env_or("RUST_LOG", "info"),
            remote_base_url: env_or("REMOTE_BASE_URL", "http://localhost:3000/api"),
            local_store_path: std::env::var("LOCAL_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("local-invoices.db")),
            remote_timeout: Duration::from_secs(
                env_or("REMOTE_TIMEOUT_SECS", "30")
                    .parse::<u64>()
                    .context("REMOTE_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            data_dir,
        })
    }

    /// Template files to try in order; the first readable one is used.
    pub fn template_candidates(&self) -> Vec<PathBuf> {
        match &self.template_path {
            Some(path) => vec![path.clone()],
            None => vec![
                PathBuf::from("assets/invoice-template.pdf"),
                PathBuf::from("invoice-template.pdf"),
            ],
        }
    }

    #[cfg(test)]
    pub(crate) fn for_data_dir(dir: &std::path::Path) -> Self {
        Config {
            port: 0,
            data_dir: dir.to_path_buf(),
            template_path: Some(dir.join("template.pdf")),
            rust_log: "debug".to_string(),
            remote_base_url: "http://localhost:3000/api".to_string(),
            local_store_path: dir.join("local-invoices.db"),
            remote_timeout: Duration::from_secs(5),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
