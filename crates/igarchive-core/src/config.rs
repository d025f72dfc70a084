//! Configuration types and loading for igarchive.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::error::Result;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the igarchive database.
    pub database: PathBuf,

    /// Root directory for extracted archives, one subdirectory per user.
    pub uploads_dir: PathBuf,

    /// HTTP API configuration.
    pub api: ApiConfig,

    /// Access token configuration.
    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("igarchive");

        Self {
            database: data_dir.join("igarchive.db"),
            uploads_dir: data_dir.join("uploads"),
            api: ApiConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.expand_paths();
        Ok(config)
    }

    /// Get the default config file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("igarchive")
            .join("config.toml")
    }

    /// Save configuration to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Ensure config exists at the given path, creating defaults if missing.
    pub fn ensure_at(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            let mut config = Self::default();
            config.expand_paths();
            config.save_to_path(path)?;
            Ok(config)
        }
    }

    /// Expand a path, replacing ~ with home directory.
    pub fn expand_path(path: &str) -> PathBuf {
        let expanded = shellexpand::full(path)
            .map(std::borrow::Cow::into_owned)
            .unwrap_or_else(|_| path.to_string());
        PathBuf::from(expanded)
    }

    fn expand_paths(&mut self) {
        self.database = Self::expand_path(&self.database.to_string_lossy());
        self.uploads_dir = Self::expand_path(&self.uploads_dir.to_string_lossy());
    }

    /// Directory holding a user's extracted archive files.
    pub fn user_upload_dir(&self, user_id: i64) -> PathBuf {
        self.uploads_dir.join(user_id.to_string())
    }

    /// Resolve the token signing secret.
    ///
    /// `IGARCHIVE_TOKEN_SECRET` wins over `auth.token_secret`. There is no
    /// built-in fallback: a missing or empty secret is a configuration error.
    pub fn token_secret(&self) -> Result<String> {
        let env_key = format!("{}_TOKEN_SECRET", crate::env_prefix());
        let secret = std::env::var(&env_key)
            .ok()
            .or_else(|| self.auth.token_secret.clone())
            .filter(|s| !s.trim().is_empty());
        secret.ok_or_else(|| {
            Error::Config(format!(
                "No token secret configured; set auth.token_secret or {env_key}"
            ))
        })
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Port to listen on.
    pub port: u16,

    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,

    /// Maximum accepted upload body in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            max_upload_bytes: 32 << 20,
        }
    }
}

/// Access token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for access tokens.
    pub token_secret: Option<String>,

    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_secs: 24 * 60 * 60,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
