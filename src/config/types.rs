//! Configuration types and structures.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Base URL compiled in when `TODO_API_URL` is set at build time.
pub const DEFAULT_API_URL: &str = match option_env!("TODO_API_URL") {
    Some(url) => url,
    None => "http://127.0.0.1:8000/api/myapp/",
};

/// Client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Backend endpoints. Paths are joined onto `base_url` unless they are
/// absolute URLs themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root of the REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Task collection, relative to `base_url` (items live at `{tasks_path}{id}/`).
    #[serde(default)]
    pub tasks_path: String,

    /// Token pair endpoint (`{username, password}` -> `{access, refresh}`).
    #[serde(default = "default_token_path")]
    pub token_path: String,

    /// Refresh endpoint (`{refresh}` -> `{access}`).
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            tasks_path: String::new(),
            token_path: default_token_path(),
            refresh_path: default_refresh_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Config pointing every endpoint at `base_url` with default paths.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Resolve an endpoint path against the base URL.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_token_path() -> String {
    "token/".to_string()
}

fn default_refresh_path() -> String {
    "token/refresh/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Join `path` onto `base` with exactly one slash between them.
/// Absolute `http(s)://` paths are returned unchanged.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    if path.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Where persisted key/value data (tokens, preferences) lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("todo-client").join("storage.json"))
        .unwrap_or_else(|| PathBuf::from(".todo-client/storage.json"))
}

impl Config {
    /// Load configuration from a single YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Reject settings the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        let base = self.api.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(anyhow!(
                "api.base_url must be an http(s) URL, got '{}'",
                self.api.base_url
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(anyhow!("api.timeout_secs must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_inserts_single_slash() {
        assert_eq!(join_url("http://h/api/", "token/"), "http://h/api/token/");
        assert_eq!(join_url("http://h/api", "token/"), "http://h/api/token/");
        assert_eq!(join_url("http://h/api/", "/token/"), "http://h/api/token/");
        assert_eq!(join_url("http://h/api/", ""), "http://h/api/");
    }

    #[test]
    fn join_url_keeps_absolute_paths() {
        assert_eq!(
            join_url("http://h/api/", "https://auth.example/token/"),
            "https://auth.example/token/"
        );
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str(
            r#"
api:
  base_url: https://todo.example/api/
"#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://todo.example/api/");
        assert_eq!(config.api.token_path, "token/");
        assert_eq!(config.api.refresh_path, "token/refresh/");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_settings() {
        let mut config = Config::default();
        config.api.base_url = "ftp://nope".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
