use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub webrtc: WebRtcConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    /// Directory served at the HTTP root (player page and assets).
    pub public_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 8080,
            public_dir: "./public".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

/// WebRTC negotiation configuration
///
/// `peer_connection_options` is handed to each admitted player verbatim
/// inside its `config` message. The relay never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebRtcConfig {
    pub peer_connection_options: serde_json::Value,
}

impl Default for WebRtcConfig {
    fn default() -> Self {
        Self {
            peer_connection_options: serde_json::json!({
                "iceServers": [
                    { "urls": ["stun:stun.l.google.com:19302"] }
                ]
            }),
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // Override with environment variables (PIXELSIG_SERVER_HOST, etc.)
        builder = builder.add_source(
            Environment::with_prefix("PIXELSIG")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only (for Docker/K8s)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Get HTTP address
    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.http_port)
    }

    /// Validate configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.host.is_empty() {
            errors.push("server.host must not be empty".to_string());
        }
        if self.server.http_port == 0 {
            errors.push("server.http_port must be non-zero".to_string());
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be \"json\" or \"pretty\", got \"{}\"",
                self.logging.format
            ));
        }
        if !self.webrtc.peer_connection_options.is_object() {
            errors.push("webrtc.peer_connection_options must be a JSON object".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Load configuration from config file or environment variables
///
/// Config file search order:
/// 1. Explicit path passed by the caller (CLI flag)
/// 2. ./config.yaml (current working directory)
/// 3. Fall back to environment variables only
pub fn load_config(explicit_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = explicit_path
        .map(str::to_string)
        .filter(|p| Path::new(p).exists())
        .or_else(|| {
            let cwd = "config.yaml";
            if Path::new(cwd).exists() {
                Some(cwd.to_string())
            } else {
                None
            }
        });

    let config = if let Some(path) = config_path {
        eprintln!("Loading config from {path}");
        Config::from_file(&path)?
    } else {
        Config::from_env().unwrap_or_else(|e| {
            eprintln!("Failed to load config from environment: {e}");
            eprintln!("Using default configuration");
            Config::default()
        })
    };

    if let Err(errors) = config.validate() {
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        ));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.server.http_port > 0);
        assert_eq!(config.logging.level, "info");
        assert!(config.webrtc.peer_connection_options.is_object());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_http_address() {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                http_port: 9000,
                public_dir: "./public".to_string(),
            },
            logging: LoggingConfig::default(),
            webrtc: WebRtcConfig::default(),
        };

        assert_eq!(config.http_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.server.http_port = 0;
        config.logging.format = "xml".to_string();

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
