//! Configuration file management for stockwright.
//!
//! Provides a TOML config file at `~/.config/stockwright/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use stockwright_api::ApiConfig;

const URL_ENV: &str = "STOCKWRIGHT_API_URL";
const TIMEOUT_ENV: &str = "STOCKWRIGHT_API_TIMEOUT_SECS";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub api: ApiSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiSection {
    pub base_url: String,
    /// Per-request transport timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: ApiConfig::DEFAULT_URL.to_string(),
            timeout_secs: None,
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the stockwright config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/stockwright` or
/// `~/.config/stockwright`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("stockwright");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("stockwright")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// Load the config file. A missing file is not an error; a malformed one is.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    load_config_from(&path).map(Some)
}

/// Serialize and write `config` to `path`, creating parent dirs as needed.
pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct StockwrightConfig {
    pub api: ApiConfig,
}

impl StockwrightConfig {
    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - API URL: `cli_api_url` > `STOCKWRIGHT_API_URL` > `api.base_url` > `ApiConfig::DEFAULT_URL`
    /// - Timeout: `STOCKWRIGHT_API_TIMEOUT_SECS` > `api.timeout_secs` > `ApiConfig::DEFAULT_TIMEOUT`
    pub fn resolve(cli_api_url: Option<&str>) -> Result<Self> {
        let file = load_config()?;
        Self::resolve_with(cli_api_url, file.as_ref())
    }

    pub fn resolve_with(cli_api_url: Option<&str>, file: Option<&ConfigFile>) -> Result<Self> {
        let base_url = if let Some(url) = cli_api_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(URL_ENV) {
            url
        } else if let Some(cfg) = file {
            cfg.api.base_url.clone()
        } else {
            ApiConfig::DEFAULT_URL.to_string()
        };

        let timeout = if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("{TIMEOUT_ENV} is not a number of seconds: {raw:?}"))?;
            Duration::from_secs(secs)
        } else if let Some(secs) = file.and_then(|cfg| cfg.api.timeout_secs) {
            Duration::from_secs(secs)
        } else {
            ApiConfig::DEFAULT_TIMEOUT
        };

        Ok(Self {
            api: ApiConfig::new(base_url).with_timeout(timeout),
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
