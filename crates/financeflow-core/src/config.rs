//! Client configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a three-layer resolution:
//! 1. Check for override in data dir (~/.local/share/financeflow/config.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//! 3. Apply `FINANCEFLOW_API_URL` / `FINANCEFLOW_PAGE_SIZE` from the environment

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::{offset_from_minutes, LocalZone};
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/financeflow.toml");

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "FINANCEFLOW_API_URL";
/// Environment variable overriding the page size
pub const PAGE_SIZE_ENV: &str = "FINANCEFLOW_PAGE_SIZE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub page_size: u32,
    pub timeout_secs: u64,
    /// Minutes east of UTC; `None` uses the system time zone
    pub utc_offset_minutes: Option<i32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            page_size: 20,
            timeout_secs: 30,
            utc_offset_minutes: None,
        }
    }
}

impl ClientConfig {
    /// Load from the default override location, the embedded defaults and the
    /// process environment
    pub fn load() -> Result<Self> {
        let mut config = load_config(None)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load with an explicit override file (no environment)
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            debug!("API URL overridden by {}", API_URL_ENV);
            self.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(PAGE_SIZE_ENV) {
            match raw.trim().parse::<u32>() {
                Ok(size) if size > 0 => self.page_size = size,
                _ => warn!("Ignoring invalid {}={:?}", PAGE_SIZE_ENV, raw),
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::InvalidData("page_size must be at least 1".into()));
        }
        if let Some(minutes) = self.utc_offset_minutes {
            if offset_from_minutes(minutes).is_none() {
                return Err(Error::InvalidData(format!(
                    "utc_offset_minutes out of range: {}",
                    minutes
                )));
            }
        }
        Ok(())
    }

    /// Zone used to turn timestamps into local dates.
    ///
    /// A configured `utc_offset_minutes` pins a fixed offset; otherwise the
    /// system zone applies, DST rules included.
    pub fn zone(&self) -> LocalZone {
        self.utc_offset_minutes
            .and_then(LocalZone::from_minutes)
            .unwrap_or_default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("financeflow").join("config.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<ClientConfig> {
    let path = match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    let content = match path {
        Some(path) if path.exists() => {
            debug!("Loading config override from {}", path.display());
            fs::read_to_string(&path)?
        }
        _ => DEFAULT_CONFIG.to_string(),
    };

    ClientConfig::parse(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use std::collections::HashMap;

    #[test]
    fn test_parse_default_config() {
        let config = ClientConfig::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_partial_override_uses_defaults() {
        let config = ClientConfig::parse("api_base_url = \"https://api.example.com\"").unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn test_zone_defaults_to_system() {
        // Without a configured offset, DST rules of the system zone apply
        assert_eq!(ClientConfig::default().zone(), LocalZone::System);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ClientConfig::parse("page_size = 0").is_err());
        assert!(ClientConfig::parse("utc_offset_minutes = 100000").is_err());
        assert!(matches!(
            ClientConfig::parse("page_size = \"many\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (API_URL_ENV, "https://staging.example.com"),
            (PAGE_SIZE_ENV, "50"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.api_base_url, "https://staging.example.com");
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn test_invalid_env_page_size_ignored() {
        let mut config = ClientConfig::default();
        config.apply_env(|key| (key == PAGE_SIZE_ENV).then(|| "zero".to_string()));
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "page_size = 5\nutc_offset_minutes = 60\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.page_size, 5);
        assert_eq!(config.zone(), LocalZone::Fixed(FixedOffset::east_opt(3600).unwrap()));
    }

    #[test]
    fn test_missing_override_falls_back_to_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }
}
