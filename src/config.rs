use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variables consulted by [`MemoryOsConfig::apply_overrides`].
pub const ENV_OVERRIDES: [&str; 6] = [
    "MEMORYOS_DB",
    "MEMORYOS_HOST",
    "MEMORYOS_PORT",
    "MEMORYOS_LOG_LEVEL",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
];

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MemoryOsConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub provider: ProviderConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub provider: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub summary_model: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub summary_max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_memoryos_dir()
            .join("memory.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            base_url: "https://api.openai.com".into(),
            api_key: None,
            summary_model: "gpt-3.5-turbo".into(),
            embedding_model: "text-embedding-ada-002".into(),
            embedding_dim: 1536,
            summary_max_tokens: 100,
            timeout_secs: 30,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("summary_model", &self.summary_model)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dim", &self.embedding_dim)
            .field("summary_max_tokens", &self.summary_max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Returns `~/.memoryos/`
pub fn default_memoryos_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".memoryos")
}

/// Returns the default config file path: `~/.memoryos/config.toml`
pub fn default_config_path() -> PathBuf {
    default_memoryos_dir().join("config.toml")
}

impl MemoryOsConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MemoryOsConfig::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    ///
    /// Recognizes the names in [`ENV_OVERRIDES`]. Values are not validated here; a
    /// missing API key only degrades summaries and embeddings.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("MEMORYOS_DB") {
            self.storage.db_path = val;
        }
        if let Some(val) = lookup("MEMORYOS_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("MEMORYOS_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid MEMORYOS_PORT"),
            }
        }
        if let Some(val) = lookup("MEMORYOS_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Some(val) = lookup("OPENAI_API_KEY") {
            if !val.trim().is_empty() {
                self.provider.api_key = Some(val);
            }
        }
        if let Some(val) = lookup("OPENAI_BASE_URL") {
            self.provider.base_url = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
