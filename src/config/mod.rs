//! Configuration types and loading for the relay.

use crate::dns::wire::{HEADER_SIZE, MAX_DATAGRAM_SIZE};
use crate::error::RelayError;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default config.yaml embedded at compile time
pub const DEFAULT_CONFIG_YAML: &str = include_str!("../../config.yaml");

/// Main configuration struct for the relay
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============== Relay Config ==============

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_upstream")]
    pub upstream: String,
    /// Suffix removed from question names before forwarding
    #[serde(default = "default_suffix")]
    pub suffix: String,
    /// Receive buffer size for client queries and upstream responses
    #[serde(default = "default_max_datagram_size")]
    pub max_datagram_size: usize,
    /// Deadline for the upstream send and receive combined
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
    /// Maximum concurrent requests (0 = unlimited)
    #[serde(default)]
    pub max_in_flight: usize,
}

fn default_suffix() -> String {
    ".proxy".to_string()
}

fn default_max_datagram_size() -> usize {
    MAX_DATAGRAM_SIZE
}

fn default_upstream_timeout_ms() -> u64 {
    10_000
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            listen: default_listen(),
            upstream: default_upstream(),
            suffix: default_suffix(),
            max_datagram_size: default_max_datagram_size(),
            upstream_timeout_ms: default_upstream_timeout_ms(),
            max_in_flight: 0,
        }
    }
}

/// Validated runtime form of [`RelayConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    pub listen: SocketAddr,
    pub upstream: SocketAddr,
    pub suffix: String,
    pub max_datagram_size: usize,
    pub upstream_timeout: Duration,
    pub max_in_flight: usize,
}

impl RelayConfig {
    /// Parse addresses and check limits
    pub fn settings(&self) -> Result<RelaySettings, RelayError> {
        let listen: SocketAddr = self.listen.parse().map_err(|e| {
            RelayError::Config(format!("invalid listen address {:?}: {}", self.listen, e))
        })?;
        let upstream: SocketAddr = self.upstream.parse().map_err(|e| {
            RelayError::Config(format!(
                "invalid upstream address {:?}: {}",
                self.upstream, e
            ))
        })?;

        if self.max_datagram_size <= HEADER_SIZE {
            return Err(RelayError::Config(format!(
                "max_datagram_size {} cannot hold a DNS header",
                self.max_datagram_size
            )));
        }
        if self.upstream_timeout_ms == 0 {
            return Err(RelayError::Config(
                "upstream_timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(RelaySettings {
            listen,
            upstream,
            suffix: self.suffix.clone(),
            max_datagram_size: self.max_datagram_size,
            upstream_timeout: Duration::from_millis(self.upstream_timeout_ms),
            max_in_flight: self.max_in_flight,
        })
    }
}

// ============== Logging Config ==============

/// Output format for stdout logs; also accepted by `--log-format`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Daily,
    Hourly,
    Never,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_requests")]
    pub log_requests: bool,
    /// Filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// File logging configuration
    #[serde(default)]
    pub file: Option<FileLoggingConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FileLoggingConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
    #[serde(default)]
    pub rotation: LogRotation,
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_file_prefix() -> String {
    "dns-relay.log".to_string()
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        FileLoggingConfig {
            log_dir: default_log_dir(),
            file_prefix: default_log_file_prefix(),
            rotation: LogRotation::Daily,
        }
    }
}

fn default_log_requests() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_requests: true,
            level: default_log_level(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

// ============== Default Values ==============

pub fn default_listen() -> String {
    "127.0.0.1:53".to_string()
}

pub fn default_upstream() -> String {
    "8.8.8.8:53".to_string()
}

// ============== Config Loading ==============

/// Get the directory containing the executable
fn exe_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
}

/// Load configuration from file, falling back to defaults when none exists
pub fn load_config(path: Option<&str>) -> Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let config_paths = if let Some(p) = path {
        vec![PathBuf::from(p)]
    } else {
        let mut paths = vec![PathBuf::from("config.yaml")];
        if let Some(dir) = exe_dir() {
            paths.push(dir.join("config.yaml"));
        }
        paths
    };

    for config_path in config_paths {
        if config_path.exists() {
            println!("Loading config from: {}", config_path.display());
            let content = fs::read_to_string(&config_path)?;
            let config: Config = serde_yaml_ng::from_str(&content)?;
            return Ok(config);
        }
    }

    Ok(Config::default())
}

// ============== Unit Tests ==============

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_addresses() {
        assert_eq!(default_listen(), "127.0.0.1:53");
        assert_eq!(default_upstream(), "8.8.8.8:53");
    }

    #[test]
    fn test_relay_config_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.suffix, ".proxy");
        assert_eq!(config.max_datagram_size, MAX_DATAGRAM_SIZE);
        assert_eq!(config.max_datagram_size, 512);
        assert_eq!(config.upstream_timeout_ms, 10_000);
        assert_eq!(config.max_in_flight, 0);
    }

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::default();
        assert!(config.log_requests);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Text);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_file_logging_config_default() {
        let config = FileLoggingConfig::default();
        assert_eq!(config.log_dir, "logs");
        assert_eq!(config.file_prefix, "dns-relay.log");
        assert_eq!(config.rotation, LogRotation::Daily);
    }

    #[test]
    fn test_config_deserialization_full() {
        let yaml = r#"
relay:
  listen: "0.0.0.0:5353"
  upstream: "1.1.1.1:53"
  suffix: ".internal"
  max_datagram_size: 1232
  upstream_timeout_ms: 2500
  max_in_flight: 64
logging:
  log_requests: false
  level: "debug"
  format: json
  file:
    log_dir: "/var/log/relay"
    rotation: hourly
"#;
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.relay.listen, "0.0.0.0:5353");
        assert_eq!(config.relay.upstream, "1.1.1.1:53");
        assert_eq!(config.relay.suffix, ".internal");
        assert_eq!(config.relay.max_datagram_size, 1232);
        assert_eq!(config.relay.upstream_timeout_ms, 2500);
        assert_eq!(config.relay.max_in_flight, 64);
        assert!(!config.logging.log_requests);
        assert_eq!(config.logging.format, LogFormat::Json);
        let file = config.logging.file.unwrap();
        assert_eq!(file.log_dir, "/var/log/relay");
        assert_eq!(file.file_prefix, "dns-relay.log");
        assert_eq!(file.rotation, LogRotation::Hourly);
    }

    #[test]
    fn test_config_deserialization_partial() {
        let yaml = r#"
relay:
  upstream: "9.9.9.9:53"
"#;
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.relay.upstream, "9.9.9.9:53");
        assert_eq!(config.relay.listen, "127.0.0.1:53");
        assert_eq!(config.relay.suffix, ".proxy");
        assert!(config.logging.log_requests);
    }

    #[test]
    fn test_embedded_default_config_parses() {
        let config: Config = serde_yaml_ng::from_str(DEFAULT_CONFIG_YAML).unwrap();
        let defaults = RelayConfig::default();
        assert_eq!(config.relay.listen, defaults.listen);
        assert_eq!(config.relay.upstream, defaults.upstream);
        assert_eq!(config.relay.suffix, defaults.suffix);
        assert_eq!(config.relay.upstream_timeout_ms, defaults.upstream_timeout_ms);
    }

    #[test]
    fn test_load_config_nonexistent_file() {
        let config = load_config(Some("/nonexistent/path/config.yaml")).unwrap();
        assert_eq!(config.relay.listen, "127.0.0.1:53");
    }

    #[test]
    fn test_settings_from_defaults() {
        let settings = RelayConfig::default().settings().unwrap();
        assert_eq!(settings.listen, "127.0.0.1:53".parse::<SocketAddr>().unwrap());
        assert_eq!(settings.upstream, "8.8.8.8:53".parse::<SocketAddr>().unwrap());
        assert_eq!(settings.upstream_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_settings_ipv6_upstream() {
        let config = RelayConfig {
            upstream: "[2001:4860:4860::8888]:53".to_string(),
            ..RelayConfig::default()
        };
        let settings = config.settings().unwrap();
        assert!(settings.upstream.is_ipv6());
    }

    #[test]
    fn test_settings_rejects_bad_listen() {
        let config = RelayConfig {
            listen: "not-an-address".to_string(),
            ..RelayConfig::default()
        };
        let err = config.settings().unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
        assert!(err.to_string().contains("listen"));
    }

    #[test]
    fn test_settings_rejects_upstream_without_port() {
        let config = RelayConfig {
            upstream: "8.8.8.8".to_string(),
            ..RelayConfig::default()
        };
        assert!(config.settings().is_err());
    }

    #[test]
    fn test_settings_rejects_tiny_buffer() {
        let config = RelayConfig {
            max_datagram_size: 8,
            ..RelayConfig::default()
        };
        assert!(config.settings().is_err());
    }

    #[test]
    fn test_settings_rejects_zero_timeout() {
        let config = RelayConfig {
            upstream_timeout_ms: 0,
            ..RelayConfig::default()
        };
        assert!(config.settings().is_err());
    }
}
