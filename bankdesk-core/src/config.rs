use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DeskError, Result};
use crate::query::ListSettings;

/// Environment variable overriding `api.endpoint`
pub const ENDPOINT_ENV: &str = "BANKDESK_ENDPOINT";

/// Configuration for the bankdesk tools
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub api: ApiConfig,
    pub list: ListConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the banking API, e.g. `http://localhost:8000/api`
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Accept invalid TLS certificates (development only)
    pub insecure: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/api".to_string(),
            timeout_secs: 15,
            insecure: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub page_sizes: Vec<u32>,
    pub default_page_size: u32,
    pub quiet_period_ms: u64,
    pub roles: Vec<String>,
    pub statuses: Vec<String>,
}

impl Default for ListConfig {
    fn default() -> Self {
        let settings = ListSettings::default();
        Self {
            page_sizes: settings.page_sizes,
            default_page_size: settings.default_page_size,
            quiet_period_ms: settings.quiet_period.as_millis() as u64,
            roles: settings.filter_keys,
            statuses: settings.status_keys,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session file override (default `~/.bankdesk/session.json`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl DeskConfig {
    /// Config directory: ~/.bankdesk
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bankdesk")
    }

    /// Get config file path: ~/.bankdesk/config.toml
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load config from ~/.bankdesk/config.toml
    ///
    /// Fails with an actionable error if the file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Err(DeskError::ConfigMissing { path });
        }
        let config = Self::load_from(&path)?;
        Ok(config.with_endpoint_override(env::var(ENDPOINT_ENV).ok()))
    }

    /// Like [`DeskConfig::load`], but a missing file yields defaults
    pub fn load_or_default() -> Result<Self> {
        let path = Self::config_path();
        let config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        Ok(config.with_endpoint_override(env::var(ENDPOINT_ENV).ok()))
    }

    /// Parse and validate a config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|source| DeskError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the endpoint when `endpoint` is set and non-blank
    pub fn with_endpoint_override(mut self, endpoint: Option<String>) -> Self {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.api.endpoint = endpoint.trim().to_string();
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let list = &self.list;
        let mut errors = Vec::new();

        if self.api.endpoint.trim().is_empty() {
            errors.push("api.endpoint is empty".to_string());
        }
        if self.api.timeout_secs == 0 {
            errors.push("api.timeout_secs must be greater than 0".to_string());
        }
        if list.page_sizes.is_empty() {
            errors.push("list.page_sizes is empty".to_string());
        }
        if list.page_sizes.contains(&0) {
            errors.push("list.page_sizes contains 0".to_string());
        }
        if !list.page_sizes.contains(&list.default_page_size) {
            errors.push(format!(
                "list.default_page_size {} is not one of {:?}",
                list.default_page_size, list.page_sizes
            ));
        }
        if list.quiet_period_ms == 0 {
            errors.push("list.quiet_period_ms must be greater than 0".to_string());
        }

        if !errors.is_empty() {
            return Err(DeskError::config(format!(
                "validation failed:\n{}",
                errors
                    .iter()
                    .map(|e| format!("  ✗ {}", e))
                    .collect::<Vec<_>>()
                    .join("\n")
            )));
        }
        Ok(())
    }

    /// Settings for a user-list controller
    pub fn list_settings(&self) -> ListSettings {
        ListSettings {
            page_sizes: self.list.page_sizes.clone(),
            default_page_size: self.list.default_page_size,
            quiet_period: Duration::from_millis(self.list.quiet_period_ms),
            filter_keys: self.list.roles.clone(),
            status_keys: self.list.statuses.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Session file path, honoring `[session] path`
    pub fn session_path(&self) -> PathBuf {
        self.session
            .path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("session.json"))
    }

    /// Save config to ~/.bankdesk/config.toml
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DeskConfig::default();
        config.validate().unwrap();
        assert_eq!(config.list_settings(), ListSettings::default());
        assert_eq!(config.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[api]
endpoint = "https://bank.example/api"

[list]
page_sizes = [5, 10, 25]
default_page_size = 25
"#,
        )
        .unwrap();

        let config = DeskConfig::load_from(&path).unwrap();
        assert_eq!(config.api.endpoint, "https://bank.example/api");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.list.quiet_period_ms, 300);
        assert_eq!(config.list_settings().default_page_size, 25);
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api\nendpoint = ").unwrap();
        assert!(matches!(
            DeskConfig::load_from(&path),
            Err(DeskError::ConfigParse { .. })
        ));
    }

    #[test]
    fn validate_collects_every_problem() {
        let mut config = DeskConfig::default();
        config.list.page_sizes = vec![0, 5];
        config.list.default_page_size = 10;
        config.list.quiet_period_ms = 0;

        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("contains 0"));
        assert!(message.contains("default_page_size 10"));
        assert!(message.contains("quiet_period_ms"));
    }

    #[test]
    fn empty_page_sizes_rejected() {
        let mut config = DeskConfig::default();
        config.list.page_sizes.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn endpoint_override() {
        let config = DeskConfig::default().with_endpoint_override(Some(" http://x/api ".into()));
        assert_eq!(config.api.endpoint, "http://x/api");

        let config = DeskConfig::default().with_endpoint_override(Some("  ".into()));
        assert_eq!(config.api.endpoint, "http://localhost:8000/api");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = DeskConfig::default();
        config.session.path = Some(dir.path().join("s.json"));
        config.save_to(&path).unwrap();

        let loaded = DeskConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.session_path(), dir.path().join("s.json"));
    }
}
