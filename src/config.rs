//! # Configuration Management
//!
//! Centralized configuration for the encryption and decryption services and
//! their clients.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` / `from_toml()`
//! - Environment variables via `from_env()` (`OTP_PROTOCOL_*`)
//! - Direct instantiation with defaults
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//! ```toml
//! [server]
//! max_connections = 5
//! admission_policy = "strict"
//!
//! [client]
//! host = "127.0.0.1"
//! ```

use crate::core::codec::TRANSMISSION_UNIT;
use crate::error::{constants, ProtocolError, Result};
use crate::utils::timeout;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Largest message, in symbols, a service is expected to handle
pub const MAX_MESSAGE_SIZE: usize = 100_000;

/// Default ceiling on concurrently active workers
pub const DEFAULT_MAX_CONNECTIONS: usize = 5;

/// Default listen backlog
pub const DEFAULT_BACKLOG: u32 = 5;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ServiceConfig {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Requester configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Transport configuration
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_OPEN))
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_PARSE))
        })
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("OTP_PROTOCOL_BIND_ADDRESS") {
            config.server.bind_address = addr;
        }

        if let Ok(limit) = std::env::var("OTP_PROTOCOL_MAX_CONNECTIONS") {
            if let Ok(val) = limit.parse::<usize>() {
                config.server.max_connections = val;
            }
        }

        if let Ok(policy) = std::env::var("OTP_PROTOCOL_ADMISSION_POLICY") {
            match policy.to_ascii_lowercase().as_str() {
                "inclusive" => config.server.admission_policy = AdmissionPolicy::Inclusive,
                "strict" => config.server.admission_policy = AdmissionPolicy::Strict,
                _ => {}
            }
        }

        if let Ok(timeout) = std::env::var("OTP_PROTOCOL_IO_TIMEOUT_MS") {
            if let Ok(val) = timeout.parse::<u64>() {
                config.server.io_timeout_ms = Some(val);
                config.client.io_timeout_ms = Some(val);
            }
        }

        if let Ok(host) = std::env::var("OTP_PROTOCOL_HOST") {
            config.client.host = host;
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

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.client.validate());
        errors.extend(self.transport.validate());
        errors.extend(self.logging.validate());
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

/// How the admission ceiling is compared against the active worker count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionPolicy {
    /// Admit while `active <= limit`. A ceiling of 5 lets six workers run at
    /// once; this is how the deployed services have always behaved.
    #[default]
    Inclusive,
    /// Admit while `active < limit`.
    Strict,
}

impl AdmissionPolicy {
    /// Whether another connection may be accepted with `active` workers running.
    #[inline]
    pub fn admits(self, active: usize, limit: usize) -> bool {
        match self {
            AdmissionPolicy::Inclusive => active <= limit,
            AdmissionPolicy::Strict => active < limit,
        }
    }

    /// Largest number of workers that can be active at once.
    pub fn effective_ceiling(self, limit: usize) -> usize {
        match self {
            AdmissionPolicy::Inclusive => limit.saturating_add(1),
            AdmissionPolicy::Strict => limit,
        }
    }
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind (the port comes from the command line)
    pub bind_address: String,

    /// Listen backlog handed to the OS
    pub backlog: u32,

    /// Admission ceiling on concurrently active workers
    pub max_connections: usize,

    /// How the ceiling is compared
    pub admission_policy: AdmissionPolicy,

    /// Per-read/write timeout in milliseconds; unset means wait forever
    pub io_timeout_ms: Option<u64>,

    /// Timeout for graceful shutdown
    #[serde(with = "duration_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("0.0.0.0"),
            backlog: DEFAULT_BACKLOG,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            admission_policy: AdmissionPolicy::Inclusive,
            io_timeout_ms: None,
            shutdown_timeout: timeout::SHUTDOWN_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Per-operation I/O timeout, if any
    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout_ms.map(Duration::from_millis)
    }

    /// Validate server configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.bind_address.is_empty() {
            errors.push("Server bind address cannot be empty".to_string());
        } else if self.bind_address.parse::<std::net::IpAddr>().is_err() {
            errors.push(format!(
                "Invalid server bind address: '{}' (expected an IP such as '0.0.0.0')",
                self.bind_address
            ));
        }

        if self.backlog == 0 {
            errors.push("Listen backlog must be greater than 0".to_string());
        }

        if self.max_connections == 0 && self.admission_policy == AdmissionPolicy::Strict {
            errors.push(
                "Max connections must be greater than 0 with the strict admission policy"
                    .to_string(),
            );
        } else if self.max_connections > 10_000 {
            errors.push(format!(
                "Max connections very high: {} (ensure system resources can support this)",
                self.max_connections
            ));
        }

        if let Some(ms) = self.io_timeout_ms {
            if ms < 10 {
                errors.push("I/O timeout too short (minimum: 10ms)".to_string());
            }
        }

        if self.shutdown_timeout.as_secs() > 60 {
            errors.push("Shutdown timeout too long (maximum: 60s)".to_string());
        }

        errors
    }
}

/// Requester configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Host running the service
    pub host: String,

    /// Per-read/write timeout in milliseconds; unset means wait forever
    pub io_timeout_ms: Option<u64>,

    /// Timeout for connection attempts
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            io_timeout_ms: None,
            connect_timeout: timeout::CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Per-operation I/O timeout, if any
    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout_ms.map(Duration::from_millis)
    }

    /// Validate client configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.host.is_empty() {
            errors.push("Client host cannot be empty".to_string());
        }

        if self.connect_timeout.as_millis() < 100 {
            errors.push("Connection timeout too short (minimum: 100ms)".to_string());
        }

        if let Some(ms) = self.io_timeout_ms {
            if ms < 10 {
                errors.push("I/O timeout too short (minimum: 10ms)".to_string());
            }
        }

        errors
    }
}

/// Transport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Size of a transmission unit in bytes
    pub transmission_unit: usize,

    /// Largest message, in symbols, a requester will send
    pub max_message_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            transmission_unit: TRANSMISSION_UNIT,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

impl TransportConfig {
    /// Validate transport configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.transmission_unit < 2 {
            errors.push("Transmission unit too small (minimum: 2 bytes)".to_string());
        } else if self.transmission_unit > 64 * 1024 {
            errors.push(format!(
                "Transmission unit too large: {} bytes (maximum: 64 KB)",
                self.transmission_unit
            ));
        }

        if self.max_message_size == 0 {
            errors.push("Max message size cannot be 0".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to colour console output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("otp-protocol"),
            log_level: Level::WARN,
            ansi: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
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

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
