use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

/// Region used when neither the config nor `AWS_REGION` names one.
pub const DEFAULT_REGION: &str = "us-west-2";

const DEFAULT_PER_CALL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt for transient faults (0 = no retry).
    pub max_retries: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_secs: 0.25,
            max_delay_secs: 10,
        }
    }
}

/// Global configuration loaded from `~/.config/orcinfo/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Number of files probed concurrently.
    pub concurrency: usize,
    /// Bytes fetched from the end of each file on the first range read.
    pub tail_read_size: u64,
    /// Upper bound on a single size/range request, in seconds.
    pub per_call_timeout_secs: f64,
    /// Upper bound on establishing a connection, in seconds.
    pub connect_timeout_secs: f64,
    /// S3 region for virtual-hosted URLs; falls back to `AWS_REGION`.
    pub region: Option<String>,
    /// S3-compatible endpoint (path-style addressing), e.g. `http://127.0.0.1:9000`.
    pub endpoint: Option<String>,
    /// Extra request headers sent with every HTTP call (e.g. a gateway token).
    pub headers: BTreeMap<String, String>,
    /// Optional retry policy; if missing, built-in defaults are used.
    pub retry: Option<RetryConfig>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            tail_read_size: 16 * 1024,
            per_call_timeout_secs: DEFAULT_PER_CALL_TIMEOUT_SECS as f64,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS as f64,
            region: None,
            endpoint: None,
            headers: BTreeMap::new(),
            retry: None,
        }
    }
}

impl ProbeConfig {
    /// Check every value the core consumes. Called before any probe starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Concurrency(self.concurrency));
        }
        if self.tail_read_size == 0 {
            return Err(ConfigError::TailReadSize);
        }
        check_secs("per_call_timeout_secs", self.per_call_timeout_secs)?;
        check_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        if let Some(retry) = &self.retry {
            if Duration::try_from_secs_f64(retry.base_delay_secs).is_err() {
                return Err(ConfigError::Duration {
                    name: "retry.base_delay_secs",
                    value: retry.base_delay_secs.to_string(),
                });
            }
        }
        if let Some(endpoint) = &self.endpoint {
            let parsed = url::Url::parse(endpoint).map_err(|e| ConfigError::Endpoint {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(ConfigError::Endpoint {
                    endpoint: endpoint.clone(),
                    reason: "scheme must be http or https".to_string(),
                });
            }
        }
        for (name, value) in &self.headers {
            let bad = |s: &str| s.contains('\r') || s.contains('\n');
            if name.trim().is_empty() || name.contains(':') || bad(name) || bad(value) {
                return Err(ConfigError::Header(name.clone()));
            }
        }
        Ok(())
    }

    /// Falls back to the default when the value would not pass `validate`.
    pub fn per_call_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.per_call_timeout_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_PER_CALL_TIMEOUT_SECS))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.connect_timeout_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match &self.retry {
            Some(r) => RetryPolicy::from_config(r),
            None => RetryPolicy::default(),
        }
    }

    /// Config region, else `AWS_REGION`, else [`DEFAULT_REGION`].
    pub fn effective_region(&self) -> String {
        self.region
            .clone()
            .or_else(|| std::env::var("AWS_REGION").ok().filter(|r| !r.is_empty()))
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }
}

fn check_secs(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && Duration::try_from_secs_f64(value).is_ok() {
        Ok(())
    } else {
        Err(ConfigError::Duration {
            name,
            value: value.to_string(),
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("orcinfo")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ProbeConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ProbeConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file (no default is written).
pub fn load_from_path(path: &Path) -> Result<ProbeConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: ProbeConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
