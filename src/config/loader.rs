//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Built-in defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/todo-client/)
    Project = 1,
    /// User-level config (~/.todo-client/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Where each tier's `config.yaml` is looked up.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Single explicit config file; replaces the tier search when set.
    pub explicit_file: Option<PathBuf>,
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let explicit_file = std::env::var("TODO_CLIENT_CONFIG_PATH")
            .ok()
            .map(PathBuf::from);

        // User dir: TODO_CLIENT_USER_DIR or ~/.todo-client
        let user_dir = std::env::var("TODO_CLIENT_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".todo-client")));

        // Project dir: TODO_CLIENT_PROJECT_DIR or $CWD/todo-client
        let project_dir = std::env::var("TODO_CLIENT_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("todo-client")));

        Self {
            explicit_file,
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            explicit_file: None,
            project_dir,
            user_dir,
        }
    }

    /// Use one config file instead of searching the tiers.
    pub fn with_explicit_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    fn tier_files(&self) -> Vec<(ConfigTier, PathBuf)> {
        let mut files = Vec::new();
        if let Some(ref dir) = self.project_dir {
            files.push((ConfigTier::Project, dir.join("config.yaml")));
        }
        if let Some(ref dir) = self.user_dir {
            files.push((ConfigTier::User, dir.join("config.yaml")));
        }
        files
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Paths for each tier
    pub paths: ConfigPaths,
    config: Config,
    /// Config files that contributed, lowest tier first
    sources: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        if let Some(ref explicit) = paths.explicit_file {
            let mut config = Config::load(explicit)
                .with_context(|| format!("loading config file {}", explicit.display()))?;
            Self::apply_env_overrides(&mut config);
            let sources = vec![explicit.clone()];
            return Ok(Self {
                paths,
                config,
                sources,
            });
        }

        let mut configs: Vec<Value> = Vec::new();
        let mut sources = Vec::new();

        // Tier 1: Defaults
        configs.push(serde_json::to_value(Config::default())?);

        // Tiers 2-3: project, then user
        for (tier, file) in paths.tier_files() {
            if !file.exists() {
                continue;
            }
            match read_yaml(&file) {
                Ok(value) => {
                    debug!(tier = %tier, path = %file.display(), "Loaded config tier");
                    configs.push(value);
                    sources.push(file);
                }
                Err(e) => {
                    warn!(tier = %tier, path = %file.display(), error = %e, "Ignoring unreadable config file");
                }
            }
        }

        let merged = deep_merge_all(configs);
        let mut config: Config = serde_json::from_value(merged)?;

        // Tier 4: Environment variable overrides
        Self::apply_env_overrides(&mut config);

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    /// Apply environment variable overrides to config.
    fn apply_env_overrides(config: &mut Config) {
        apply_overrides(config, |key| std::env::var(key).ok());
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Config files that were merged, lowest tier first.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// The highest-priority config file that was used, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.sources.last().map(PathBuf::as_path)
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let value = serde_yaml::from_str::<Value>(&content)?;
    Ok(value)
}

/// Apply the `TODO_CLIENT_*` overrides found through `lookup`.
pub fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("TODO_CLIENT_API_URL") {
        config.api.base_url = url;
    }

    if let Some(path) = lookup("TODO_CLIENT_STORAGE_PATH") {
        config.storage.path = PathBuf::from(path);
    }

    if let Some(timeout) = lookup("TODO_CLIENT_TIMEOUT_SECS") {
        match timeout.parse() {
            Ok(secs) => config.api.timeout_secs = secs,
            Err(_) => warn!(value = %timeout, "Ignoring non-numeric TODO_CLIENT_TIMEOUT_SECS"),
        }
    }
}
