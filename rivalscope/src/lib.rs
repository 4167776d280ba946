//! RivalScope - competitor research client
//!
//! This crate provides:
//! - A validating client for the remote analysis gateway
//! - Per-user query history over PostgREST (or in memory)
//! - View-state controllers for the query, history, and result pages
//! - A local gateway server that serves sample data

pub mod api;
pub mod auth;
pub mod classify;
pub mod controller;
pub mod gateway;
pub mod history;
pub mod model;
pub mod render;

pub use classify::{classify, Classified};
pub use gateway::{AnalysisGateway, GatewayError, HttpGateway};
pub use history::{HistoryError, HistoryStore, StoreError};
pub use model::{AnalysisResponse, CompetitorResult, HistoryEntry};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file read when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "scout.toml";

/// Errors loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Configuration for the client
#[derive(Debug, Clone, Deserialize)]
pub struct ScoutConfig {
    /// Longest query accepted, in characters
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

fn default_max_query_length() -> usize { controller::DEFAULT_MAX_QUERY_LENGTH }

/// Analysis gateway settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Base URL; `/run-research` is appended
    #[serde(default = "default_gateway_url")]
    pub base_url: String,

    /// Transport timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gateway_url() -> String { "http://localhost:8080".to_string() }
fn default_timeout_secs() -> u64 { 120 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_gateway_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// History store settings
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Project URL, e.g. https://xyz.supabase.co
    pub url: Option<String>,

    /// Public anon key sent as `apikey`
    pub anon_key: Option<String>,

    /// Table holding history rows
    #[serde(default = "default_table")]
    pub table: String,

    /// Access token of the signed-in user
    pub access_token: Option<String>,

    /// Fixed user id; skips resolving the user from the token
    pub user_id: Option<String>,

    /// Entries kept per user by the local store
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,

    /// File holding the local store's history between runs
    #[serde(default = "default_local_path")]
    pub local_path: PathBuf,
}

fn default_table() -> String { "query_history".to_string() }
fn default_history_cap() -> usize { history::DEFAULT_HISTORY_CAP }
fn default_local_path() -> PathBuf { PathBuf::from(".scout/history.json") }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            table: default_table(),
            access_token: None,
            user_id: None,
            history_cap: default_history_cap(),
            local_path: default_local_path(),
        }
    }
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            max_query_length: default_max_query_length(),
            gateway: GatewayConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl ScoutConfig {
    /// Load from `path`, or from `scout.toml` if present, then apply
    /// environment overrides. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override settings from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("SCOUT_GATEWAY_URL") {
            self.gateway.base_url = url;
        }
        if let Some(url) = lookup("SUPABASE_URL") {
            self.store.url = Some(url);
        }
        if let Some(key) = lookup("SUPABASE_ANON_KEY") {
            self.store.anon_key = Some(key);
        }
        if let Some(token) = lookup("SCOUT_ACCESS_TOKEN") {
            self.store.access_token = Some(token);
        }
        if let Some(user) = lookup("SCOUT_USER_ID") {
            self.store.user_id = Some(user);
        }
        if let Some(path) = lookup("SCOUT_HISTORY_PATH") {
            self.store.local_path = PathBuf::from(path);
        }
    }

    /// Whether a remote history store is configured
    pub fn has_remote_store(&self) -> bool {
        self.store.url.is_some() && self.store.anon_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ScoutConfig::default();
        assert_eq!(config.max_query_length, 200);
        assert_eq!(config.gateway.timeout(), Duration::from_secs(120));
        assert_eq!(config.store.table, "query_history");
        assert_eq!(config.store.history_cap, 50);
        assert_eq!(config.store.local_path, Path::new(".scout/history.json"));
        assert!(!config.has_remote_store());
    }

    #[test]
    fn test_parse_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
max_query_length = 120

[gateway]
base_url = "https://research.example.com"

[store]
url = "https://xyz.supabase.co"
anon_key = "anon"
"#
        )
        .unwrap();

        let config = ScoutConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_query_length, 120);
        assert_eq!(config.gateway.base_url, "https://research.example.com");
        assert_eq!(config.gateway.timeout_secs, 120);
        assert_eq!(config.store.table, "query_history");
        assert_eq!(config.store.history_cap, 50);
        assert!(config.has_remote_store());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ScoutConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SCOUT_GATEWAY_URL", "http://gateway:9000"),
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("SCOUT_ACCESS_TOKEN", "  "),
            ("SCOUT_HISTORY_PATH", "/tmp/scout/history.json"),
        ]
        .into_iter()
        .collect();

        let mut config = ScoutConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.gateway.base_url, "http://gateway:9000");
        assert_eq!(config.store.url.as_deref(), Some("https://abc.supabase.co"));
        assert_eq!(config.store.access_token, None);
        assert_eq!(config.store.local_path, Path::new("/tmp/scout/history.json"));
    }
}
