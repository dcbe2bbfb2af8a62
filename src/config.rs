//! Runtime configuration.
//!
//! Built once at startup and passed explicitly to the client and the secret
//! store. Layers, lowest priority first: JSON config file, environment
//! variables, command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "project-porter";
const CONFIG_FILE: &str = "config.json";

pub const ENV_SERVER_URL: &str = "PORTER_SERVER_URL";
pub const ENV_API_KEY: &str = "PORTER_API_KEY";
pub const ENV_SECRET_STORE: &str = "PORTER_SECRET_STORE";
pub const ENV_STRICT_EXIT: &str = "PORTER_STRICT_EXIT";

/// How failures map onto the process exit code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPolicy {
    /// Exit 0 on usage errors and on caught failures.
    #[default]
    Lenient,
    /// Exit 2 on usage errors and 1 on failed operations.
    Strict,
}

impl ExitPolicy {
    pub fn usage_code(&self) -> u8 {
        match self {
            Self::Lenient => 0,
            Self::Strict => 2,
        }
    }

    pub fn failure_code(&self) -> u8 {
        match self {
            Self::Lenient => 0,
            Self::Strict => 1,
        }
    }
}

/// Values as they appear in a config file or the environment; all optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialConfig {
    pub server_url: Option<String>,
    pub api_key: Option<String>,
    /// Path of the SQLite file backing sensitive variable values.
    pub secret_store: Option<PathBuf>,
    pub exit_policy: Option<ExitPolicy>,
}

impl PartialConfig {
    /// Read a JSON config file. A missing file yields an empty layer.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let exit_policy = lookup(ENV_STRICT_EXIT).map(|v| {
            if matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes") {
                ExitPolicy::Strict
            } else {
                ExitPolicy::Lenient
            }
        });
        Self {
            server_url: lookup(ENV_SERVER_URL).filter(|s| !s.is_empty()),
            api_key: lookup(ENV_API_KEY).filter(|s| !s.is_empty()),
            secret_store: lookup(ENV_SECRET_STORE)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            exit_policy,
        }
    }

    /// Overlay `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: PartialConfig) -> Self {
        Self {
            server_url: other.server_url.or(self.server_url),
            api_key: other.api_key.or(self.api_key),
            secret_store: other.secret_store.or(self.secret_store),
            exit_policy: other.exit_policy.or(self.exit_policy),
        }
    }
}

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub api_key: String,
    pub secret_store: Option<PathBuf>,
    pub exit_policy: ExitPolicy,
}

impl Config {
    /// Load the file layer (explicit path or the default location), then the
    /// environment, then `overrides`.
    pub fn load(file: Option<&Path>, overrides: PartialConfig) -> Result<Self> {
        let file_layer = match file {
            Some(path) => PartialConfig::from_file(path)?,
            None => match default_config_path() {
                Some(path) => PartialConfig::from_file(&path)?,
                None => PartialConfig::default(),
            },
        };
        Self::resolve(file_layer.merge(PartialConfig::from_env()).merge(overrides))
    }

    pub fn resolve(partial: PartialConfig) -> Result<Self> {
        let server_url = partial.server_url.ok_or_else(|| {
            anyhow::anyhow!("Server URL not configured (set {} or --server-url)", ENV_SERVER_URL)
        })?;
        let api_key = partial.api_key.ok_or_else(|| {
            anyhow::anyhow!("API key not configured (set {} or --api-key)", ENV_API_KEY)
        })?;
        Ok(Self {
            server_url,
            api_key,
            secret_store: partial.secret_store,
            exit_policy: partial.exit_policy.unwrap_or_default(),
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Some(path)
}
