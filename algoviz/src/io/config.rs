//! Service configuration loaded from a TOML file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Top-level configuration (TOML).
///
/// Every section and field is optional; missing values take the defaults
/// below. Command-line flags override file values after loading.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub hub: HubConfig,
    pub executions: ExecutionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind: String,

    pub port: u16,

    /// Origins allowed by CORS. `["*"]` allows any origin without credentials.
    pub allowed_origins: Vec<String>,

    /// Free-form deployment label reported in logs (`development`, `production`).
    pub environment: String,

    /// Raise the default log level to `debug`.
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
            environment: "development".to_string(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HubConfig {
    /// Frames buffered per subscriber before it is disconnected.
    pub subscriber_queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            subscriber_queue_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutionsConfig {
    /// Executions allowed to run at once; further submissions are refused.
    pub max_concurrent: usize,

    /// Wall-clock limit per execution, checked between steps.
    pub timeout_secs: u64,
}

impl Default for ExecutionsConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 64,
            timeout_secs: 30,
        }
    }
}

impl ExecutionsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            return Err(anyhow!("server.bind must not be empty"));
        }
        if self.hub.subscriber_queue_capacity == 0 {
            return Err(anyhow!("hub.subscriber_queue_capacity must be > 0"));
        }
        if self.executions.max_concurrent == 0 {
            return Err(anyhow!("executions.max_concurrent must be > 0"));
        }
        if self.executions.timeout_secs == 0 {
            return Err(anyhow!("executions.timeout_secs must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AppConfig::default()`.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        let cfg = AppConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AppConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
