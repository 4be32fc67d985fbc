//! Configuration system for the performer.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $PERFORMER_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/performer/config.toml
//!   3. ~/.config/performer/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::interface::{InterfaceDescriptor, ParseError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformerConfig {
    pub interface: InterfaceConfig,
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    /// Method to accept. Looked up by name in `abi`.
    pub method: String,
    /// ABI JSON document describing the method.
    pub abi: String,
    /// Human-readable signature, e.g. "dummy(bytes32)". Takes precedence
    /// over `abi` when non-empty.
    pub signature: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// SHA-256 of the payload, hex-encoded. No I/O.
    Local,
    /// Forward the first argument to a JSON-RPC endpoint.
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub strategy: StrategyKind,
    pub remote: RemoteSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// JSON-RPC endpoint URL. Required when `strategy = "remote"`.
    pub endpoint: String,
    /// JSON-RPC method invoked on the endpoint.
    pub method: String,
    /// Per-call timeout. 0 = no timeout.
    pub timeout_secs: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

const DEFAULT_METHOD: &str = "core_issuePaymentCert";

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            abi: format!(
                r#"[{{"name":"{DEFAULT_METHOD}","type":"function","inputs":[{{"name":"txHash","type":"bytes32"}}]}}]"#
            ),
            signature: String::new(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Remote,
            remote: RemoteSettings::default(),
        }
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000".to_string(),
            method: DEFAULT_METHOD.to_string(),
            timeout_secs: 5,
        }
    }
}

impl RemoteSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("performer")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("invalid interface description: {0}")]
    Interface(#[from] ParseError),
    #[error("remote strategy selected but no endpoint configured")]
    MissingEndpoint,
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl PerformerConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            PerformerConfig::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("PERFORMER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&PerformerConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Build the interface descriptor this config declares.
    pub fn descriptor(&self) -> Result<InterfaceDescriptor, ConfigError> {
        let iface = &self.interface;
        let descriptor = if iface.signature.trim().is_empty() {
            InterfaceDescriptor::parse(&iface.abi, &iface.method)?
        } else {
            InterfaceDescriptor::from_signature(&iface.signature)?
        };
        Ok(descriptor)
    }

    /// Startup checks beyond what serde enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution.strategy == StrategyKind::Remote
            && self.execution.remote.endpoint.trim().is_empty()
        {
            return Err(ConfigError::MissingEndpoint);
        }
        self.descriptor().map(|_| ())
    }

    /// Apply PERFORMER_* overrides. `lookup` is `std::env::var` in
    /// production and a map in tests.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("PERFORMER_INTERFACE__METHOD") {
            self.interface.method = v;
        }
        if let Some(v) = lookup("PERFORMER_INTERFACE__SIGNATURE") {
            self.interface.signature = v;
        }
        if let Some(v) = lookup("PERFORMER_EXECUTION__STRATEGY") {
            match v.as_str() {
                "local" => self.execution.strategy = StrategyKind::Local,
                "remote" => self.execution.strategy = StrategyKind::Remote,
                _ => {}
            }
        }
        if let Some(v) = lookup("PERFORMER_EXECUTION__REMOTE__ENDPOINT") {
            self.execution.remote.endpoint = v;
        }
        if let Some(v) = lookup("PERFORMER_EXECUTION__REMOTE__METHOD") {
            self.execution.remote.method = v;
        }
        if let Some(v) = lookup("PERFORMER_EXECUTION__REMOTE__TIMEOUT_SECS") {
            if let Ok(n) = v.parse() {
                self.execution.remote.timeout_secs = n;
            }
        }
    }
}
