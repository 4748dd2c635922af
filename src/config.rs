//! # Configuration Management
//!
//! Centralized configuration for the sync server.
//!
//! This module provides structured configuration for the daemon, including
//! the listen address, the synchronized directory, event-log location, and
//! connection capacity.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides
//!
//! ## Security Considerations
//! - Frame size is capped (16 MB) to prevent memory exhaustion
//! - Connection capacity is bounded by the slot table

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Current supported protocol version.
///
/// Every packet carries this as its integer `version` field; packets with
/// any other value fail validation.
pub const PROTOCOL_VERSION: i64 = 1;

/// Capacity of the session slot table (maximum concurrent clients)
pub const MAX_CLIENTS: usize = 1024;

/// Max allowed frame size before the delimiter (16 MB)
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Default path of the append-only event log
pub const DEFAULT_LOG_FILE: &str = "serverLog.txt";

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address the listener binds to (e.g., "0.0.0.0")
    pub address: String,

    /// TCP port the listener binds to
    pub port: u16,

    /// Directory whose files are served to clients (flat, non-recursive)
    pub directory: PathBuf,

    /// Path of the append-only event log
    pub log_file: PathBuf,

    /// Maximum number of concurrent client sessions
    pub max_clients: usize,

    /// Timeout for graceful server shutdown
    #[serde(with = "duration_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: String::from("0.0.0.0"),
            port: 9000,
            directory: PathBuf::from("."),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            max_clients: MAX_CLIENTS,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Start with defaults
        let mut config = Self::default();

        // Override with environment variables
        if let Ok(addr) = std::env::var("FILESYNC_ADDRESS") {
            config.address = addr;
        }

        if let Ok(port) = std::env::var("FILESYNC_PORT") {
            if let Ok(val) = port.parse::<u16>() {
                config.port = val;
            }
        }

        if let Ok(dir) = std::env::var("FILESYNC_DIRECTORY") {
            config.directory = PathBuf::from(dir);
        }

        if let Ok(log) = std::env::var("FILESYNC_LOG_FILE") {
            config.log_file = PathBuf::from(log);
        }

        if let Ok(max) = std::env::var("FILESYNC_MAX_CLIENTS") {
            if let Ok(val) = max.parse::<usize>() {
                config.max_clients = val;
            }
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// The full listen address ("address:port") for the TCP listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.is_empty() {
            errors.push("Server address cannot be empty".to_string());
        } else if self.listen_addr().parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid server address format: '{}' (expected format: '0.0.0.0:8080')",
                self.listen_addr()
            ));
        }

        if !self.directory.is_dir() {
            errors.push(format!(
                "Could not access provided directory: {}, are you sure that's a directory?",
                self.directory.display()
            ));
        }

        if self.max_clients == 0 {
            errors.push("Max clients must be greater than 0".to_string());
        } else if self.max_clients > 100_000 {
            errors.push(format!(
                "Max clients very high: {} (ensure system resources can support this)",
                self.max_clients
            ));
        }

        if self.shutdown_timeout.as_secs() < 1 {
            errors.push("Shutdown timeout too short (minimum: 1s)".to_string());
        } else if self.shutdown_timeout.as_secs() > 60 {
            errors.push("Shutdown timeout too long (maximum: 60s)".to_string());
        }

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
