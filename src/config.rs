//! Server configuration.
//!
//! Loaded once from a YAML file before the server starts, then passed around
//! by reference. Every field has a default, so an empty file is valid.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;

use crate::capsule::builtin;
use crate::capsule::registry::normalize_prefix;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "GEMLET_CONFIG";
/// Configuration file used when neither an argument nor [`CONFIG_ENV`] is given.
pub const DEFAULT_CONFIG_PATH: &str = "gemlet.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value for {name}: '{value}'")]
    InvalidEnv { name: &'static str, value: String },

    #[error("port must not be 0")]
    InvalidPort,

    #[error("workers.min must be at least 1")]
    NoWorkers,

    #[error("workers.max ({max}) is smaller than workers.min ({min})")]
    WorkerBounds { min: usize, max: usize },

    #[error("capsule path '{0}' is configured more than once")]
    DuplicateCapsule(String),

    #[error("unknown capsule '{name}' at '{path}' (known: {known})")]
    UnknownCapsule {
        name: String,
        path: String,
        known: String,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub tls: TlsConfig,
    pub workers: WorkerConfig,
    pub capsules: Vec<CapsuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Virtual host filter; `None` or empty accepts any host
    pub hostname: Option<String>,
    pub bind: String,
    pub port: u16,
    /// Static serving is disabled when unset
    pub document_root: Option<PathBuf>,
    pub read_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TlsConfig {
    /// PEM certificate chain
    pub cert: PathBuf,
    /// PEM private key
    pub key: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    pub min: usize,
    pub max: usize,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapsuleConfig {
    pub path: String,
    pub capsule: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            bind: "0.0.0.0".to_string(),
            port: 1965,
            document_root: None,
            read_timeout_secs: None,
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert: PathBuf::from("cert.pem"),
            key: PathBuf::from("key.pem"),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            min: 10,
            max: 100,
            idle_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Address passed to the listening socket.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }

    /// The virtual host filter, with empty treated as unset.
    pub fn virtual_host(&self) -> Option<&str> {
        self.hostname.as_deref().filter(|h| !h.is_empty())
    }
}

impl WorkerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Config {
    /// Loads the file at `path`, applies environment overrides and validates.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        tracing::info!("Loading configuration from '{}'", path.display());

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration file '{}'", path.display()))?;
        let mut cfg = Self::from_yaml(&text)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Path of the configuration file: first CLI argument, then
    /// `GEMLET_CONFIG`, then `gemlet.yaml`.
    pub fn path_from_args() -> PathBuf {
        std::env::args()
            .nth(1)
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
            .into()
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Applies `GEMLET_PORT`, `GEMLET_HOSTNAME` and `GEMLET_DOCUMENT_ROOT`.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides named like the environment variables, reading each
    /// value from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("GEMLET_PORT") {
            self.server.port = value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "GEMLET_PORT",
                value,
            })?;
        }
        if let Some(value) = lookup("GEMLET_HOSTNAME") {
            self.server.hostname = Some(value);
        }
        if let Some(value) = lookup("GEMLET_DOCUMENT_ROOT") {
            self.server.document_root = Some(PathBuf::from(value));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.workers.min == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.workers.max < self.workers.min {
            return Err(ConfigError::WorkerBounds {
                min: self.workers.min,
                max: self.workers.max,
            });
        }

        let mut seen = HashSet::new();
        for entry in &self.capsules {
            let path = normalize_prefix(&entry.path);
            if builtin::by_name(&entry.capsule).is_none() {
                return Err(ConfigError::UnknownCapsule {
                    name: entry.capsule.clone(),
                    path,
                    known: builtin::NAMES.join(", "),
                });
            }
            if !seen.insert(path.clone()) {
                return Err(ConfigError::DuplicateCapsule(path));
            }
        }

        Ok(())
    }
}
