use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_ENV: &str = "HTTPFRAME_CONFIG";
/// Environment variable overriding the listen address.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    /// Root directory for `/video/...` files.
    pub assets_dir: PathBuf,
    /// Base URL `/httpbin/...` requests are forwarded to.
    pub upstream_url: String,
    pub upstream_timeout_secs: u64,
    /// Block size for chunked responses.
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:42069".to_string(),
            assets_dir: PathBuf::from("assets"),
            upstream_url: "http://httpbin.org".to_string(),
            upstream_timeout_secs: 10,
            chunk_size: 1024,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Loads configuration using `lookup` in place of the environment.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = match lookup(CONFIG_ENV) {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {path}"))?;
                Self::from_yaml(&raw).with_context(|| format!("Invalid config file {path}"))?
            }
            None => Self::default(),
        };

        if let Some(listen_addr) = lookup(LISTEN_ENV) {
            cfg.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    /// Parses a YAML document; missing fields keep their defaults.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(raw).context("Failed to parse YAML")?;
        if cfg.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than zero");
        }
        url::Url::parse(&cfg.upstream_url).context("Invalid upstream_url")?;
        Ok(cfg)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}
