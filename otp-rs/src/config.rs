//! Configuration for otp-rs

use crate::error::{OtpError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address for the HTTP API (e.g., "127.0.0.1:8787")
    pub listen_addr: String,
}

/// Longest accepted code lifetime (one week)
pub const MAX_TTL_MINUTES: i64 = 7 * 24 * 60;

/// Code lifetime and attempt budget
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct OtpConfig {
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: i64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl_minutes(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Which notifier delivers issued codes
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryBackend {
    Log,
    Resend,
    Smtp,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
    pub backend: DeliveryBackend,
    pub resend: Option<ResendConfig>,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResendConfig {
    #[serde(default = "default_resend_api_url")]
    pub api_url: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_resend_api_key_env")]
    pub api_key_env: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    /// Relay address (e.g., "localhost:2525")
    pub server_addr: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_ttl_minutes() -> i64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_resend_api_url() -> String {
    "https://api.resend.com".to_string()
}

fn default_resend_api_key_env() -> String {
    "RESEND_API_KEY".to_string()
}

fn default_app_name() -> String {
    "Health Dashboard".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| OtpError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| OtpError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Local development defaults: codes go to the log only
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                listen_addr: "127.0.0.1:8787".to_string(),
            },
            otp: OtpConfig::default(),
            delivery: DeliveryConfig {
                backend: DeliveryBackend::Log,
                resend: None,
                smtp: None,
            },
            email: EmailConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.otp.ttl_minutes <= 0 {
            return Err(OtpError::Config("otp.ttl_minutes must be positive".to_string()));
        }

        if self.otp.ttl_minutes > MAX_TTL_MINUTES {
            return Err(OtpError::Config(format!(
                "otp.ttl_minutes must be at most {} (one week)",
                MAX_TTL_MINUTES
            )));
        }

        if self.otp.max_attempts == 0 {
            return Err(OtpError::Config("otp.max_attempts must be at least 1".to_string()));
        }

        match self.delivery.backend {
            DeliveryBackend::Log => {}
            DeliveryBackend::Resend if self.delivery.resend.is_none() => {
                return Err(OtpError::Config(
                    "delivery.backend = \"resend\" requires [delivery.resend]".to_string(),
                ));
            }
            DeliveryBackend::Smtp if self.delivery.smtp.is_none() => {
                return Err(OtpError::Config(
                    "delivery.backend = \"smtp\" requires [delivery.smtp]".to_string(),
                ));
            }
            _ => {}
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(OtpError::Config(format!(
                "Unknown logging format: {}",
                self.logging.format
            )));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::development()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.otp.ttl_minutes, 10);
        assert_eq!(config.otp.max_attempts, 3);
        assert_eq!(config.delivery.backend, DeliveryBackend::Log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
listen_addr = "0.0.0.0:8080"

[otp]
ttl_minutes = 5

[delivery]
backend = "resend"

[delivery.resend]
from = "Health Dashboard <onboarding@resend.dev>"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.otp.ttl_minutes, 5);
        assert_eq!(config.otp.max_attempts, 3);
        assert_eq!(config.delivery.backend, DeliveryBackend::Resend);

        let resend = config.delivery.resend.as_ref().unwrap();
        assert_eq!(resend.api_url, "https://api.resend.com");
        assert_eq!(resend.api_key_env, "RESEND_API_KEY");
        assert_eq!(config.email.app_name, "Health Dashboard");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_backend_section() {
        let mut config = Config::development();
        config.delivery.backend = DeliveryBackend::Smtp;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_attempts() {
        let mut config = Config::development();
        config.otp.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ttl_cap() {
        let mut config = Config::development();
        config.otp.ttl_minutes = MAX_TTL_MINUTES;
        assert!(config.validate().is_ok());

        config.otp.ttl_minutes = MAX_TTL_MINUTES + 1;
        assert!(matches!(config.validate(), Err(OtpError::Config(_))));

        config.otp.ttl_minutes = i64::MAX;
        assert!(matches!(config.validate(), Err(OtpError::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
listen_addr = "127.0.0.1:9000"

[delivery]
backend = "log"

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_missing_file() {
        let result = Config::from_file("/nonexistent/otp.toml");
        assert!(matches!(result, Err(OtpError::Config(_))));
    }
}
