//! Configuration Management
//!
//! Resolves the Kanidm server URL, API token and timeout from explicit
//! values, the environment, and a JSON settings file, in that order.

use crate::error::{Error, Result};
use crate::kanidm::client::{ClientConfig, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const URL_ENV: &str = "KANIDM_URL";
pub const TOKEN_ENV: &str = "KANIDM_TOKEN";
pub const TIMEOUT_ENV: &str = "KANIDM_TIMEOUT";

/// Persisted settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    /// Kanidm server URL
    #[serde(default)]
    pub url: Option<String>,
    /// API token; prefer the environment over storing it here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Values given explicitly, e.g. on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Get the settings file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("kanidm-tf").join("config.json"))
    }

    /// Load settings from the default path; missing or unreadable files yield defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed settings file {:?}: {}", path, e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Could not read settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save settings to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Build a client configuration.
    ///
    /// Precedence per value: `overrides` > environment (`env` lookup) > this file.
    pub fn resolve<F>(&self, overrides: &Overrides, env: F) -> Result<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());

        let url = non_empty(overrides.url.clone())
            .or_else(|| non_empty(env(URL_ENV)))
            .or_else(|| non_empty(self.url.clone()))
            .ok_or_else(|| {
                Error::Config(format!(
                    "missing Kanidm URL; set it with --url or the {} environment variable",
                    URL_ENV
                ))
            })?;

        let token = non_empty(overrides.token.clone())
            .or_else(|| non_empty(env(TOKEN_ENV)))
            .or_else(|| non_empty(self.token.clone()))
            .ok_or_else(|| {
                Error::Config(format!(
                    "missing Kanidm token; set it with --token or the {} environment variable",
                    TOKEN_ENV
                ))
            })?;

        let timeout = match overrides.timeout_secs {
            Some(secs) => Duration::from_secs(secs),
            None => match env(TIMEOUT_ENV) {
                Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                    Error::Config(format!("{} must be a number of seconds, got '{}'", TIMEOUT_ENV, raw))
                })?),
                None => self
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_TIMEOUT),
            },
        };

        Ok(ClientConfig::new(url, token).with_timeout(timeout))
    }

    /// [`Settings::resolve`] against the process environment
    pub fn resolve_from_env(&self, overrides: &Overrides) -> Result<ClientConfig> {
        self.resolve(overrides, |key| std::env::var(key).ok())
    }
}
