//! User configuration loaded from `config.toml`

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "JJ_STACK_CONFIG";

/// Default number of simultaneous GitHub API operations
pub const DEFAULT_API_CONCURRENCY: usize = 8;

/// Settings read from the optional config file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Remote to push to and read PRs from
    pub remote: Option<String>,
    /// Ceiling on concurrent API calls
    pub api_concurrency: usize,
    /// Revset submitted when none is given on the command line
    pub default_revset: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: None,
            api_concurrency: DEFAULT_API_CONCURRENCY,
            default_revset: "@".to_string(),
        }
    }
}

impl Config {
    /// Concurrency ceiling, never below one
    pub fn concurrency(&self) -> usize {
        self.api_concurrency.max(1)
    }
}

/// Location of the config file: `$JJ_STACK_CONFIG`, else the platform config dir
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("jj-stack").join("config.toml"))
}

/// Load configuration from the default location
pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(Config::default()),
    }
}

/// Load configuration from a specific file. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}
