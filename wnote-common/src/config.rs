//! Configuration loading
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Levels 1 and 2 arrive together as [`ConfigOverrides`] (the binary's clap
//! parser reads both). A missing default config file is not an error.

use crate::{Error, Result};
use rand::RngCore;
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8070";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://wnote.db?mode=rwc";
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_OUTBOUND_QUEUE: usize = 32;

/// Settings as written in `config.toml`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub bind_addr: Option<String>,
    pub database_url: Option<String>,
    pub secret_key: Option<String>,
    pub send_timeout_ms: Option<u64>,
    pub outbound_queue: Option<usize>,
    pub gemini_api_key: Option<String>,
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load the file the user asked for, or the platform default if present
    ///
    /// An explicitly requested file must exist. The default location is
    /// optional: when absent, a warning is logged and defaults apply.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            Some(path) => {
                warn!(
                    "No config file at {}, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub bind_addr: Option<String>,
    pub database_url: Option<String>,
    pub secret_key: Option<String>,
    pub send_timeout_ms: Option<u64>,
    pub outbound_queue: Option<usize>,
    pub gemini_api_key: Option<String>,
}

/// String whose value never appears in `Debug` output
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    /// HMAC key for session credentials
    pub secret_key: Secret,
    /// True when no key was configured and one was generated for this run
    pub secret_generated: bool,
    /// Upper bound on each per-connection send during a broadcast
    pub send_timeout: Duration,
    /// Capacity of each connection's outbound queue
    pub outbound_queue: usize,
    pub gemini_api_key: Option<Secret>,
}

impl ServiceConfig {
    /// Merge overrides over the TOML file over compiled defaults
    pub fn resolve(overrides: ConfigOverrides, file: TomlConfig) -> Result<Self> {
        let bind_addr = overrides
            .bind_addr
            .or(file.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .map_err(|e| Error::Config(format!("Invalid bind_addr '{}': {}", bind_addr, e)))?;

        let database_url = overrides
            .database_url
            .or(file.database_url)
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let send_timeout_ms = overrides
            .send_timeout_ms
            .or(file.send_timeout_ms)
            .unwrap_or(DEFAULT_SEND_TIMEOUT_MS);
        if send_timeout_ms == 0 {
            return Err(Error::Config("send_timeout_ms must be greater than 0".to_string()));
        }

        let outbound_queue = overrides
            .outbound_queue
            .or(file.outbound_queue)
            .unwrap_or(DEFAULT_OUTBOUND_QUEUE);
        if outbound_queue == 0 {
            return Err(Error::Config("outbound_queue must be greater than 0".to_string()));
        }

        let configured_secret = overrides
            .secret_key
            .or(file.secret_key)
            .filter(|s| !s.is_empty());
        let secret_generated = configured_secret.is_none();
        let secret_key = match configured_secret {
            Some(secret) => Secret::new(secret),
            None => {
                warn!("No secret_key configured; generated a random one. Sessions will not survive a restart.");
                Secret::new(generate_secret())
            }
        };

        let gemini_api_key = overrides
            .gemini_api_key
            .or(file.gemini_api_key)
            .filter(|s| !s.is_empty())
            .map(Secret::new);

        Ok(Self {
            bind_addr,
            database_url,
            secret_key,
            secret_generated,
            send_timeout: Duration::from_millis(send_timeout_ms),
            outbound_queue,
            gemini_api_key,
        })
    }
}

/// Platform config file location: `<config dir>/wnote/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wnote").join("config.toml"))
}

/// 32 random bytes, hex encoded
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_secret_is_random_hex() {
        let a = generate_secret();
        let b = generate_secret();

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("super-secret");
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("super-secret"));
    }

    #[test]
    fn test_default_config_path_ends_with_wnote() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("wnote/config.toml"));
        }
    }
}
