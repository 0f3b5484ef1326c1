//! Account Provisioner Configuration
//!
//! TOML-based configuration with environment variable overrides. The
//! environment names (`RUNTIME_ENV`, `EMAIL_DOMAIN`, `WORKLOAD_OU`, `SEC_OU`,
//! `ASSUME_ROLE_ARN`) are the deployment contract and always win over the file.

use ap_common::RuntimeMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to parse line-of-business OU mapping: {0}")]
    LobMappingError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Raw execution mode value; `prod` selects production
    pub runtime_env: String,

    /// Suffix appended to the account name to build its root email
    pub email_domain: String,

    /// Parent OU for lines of business without a dedicated OU
    pub workload_ou: String,

    /// Line of business -> dedicated parent OU id
    pub lob_ous: BTreeMap<String, String>,

    /// Role assumed for Organizations calls in production
    pub assume_role_arn: Option<String>,

    pub aws_region: Option<String>,

    pub poll: PollConfig,
    pub http: HttpConfig,
    pub offline: OfflineConfig,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            runtime_env: String::new(),
            email_domain: String::new(),
            workload_ou: String::new(),
            lob_ous: BTreeMap::new(),
            assume_role_arn: None,
            aws_region: None,
            poll: PollConfig::default(),
            http: HttpConfig::default(),
            offline: OfflineConfig::default(),
        }
    }
}

/// Creation status polling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    /// Unbounded when unset
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_attempts: None,
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// In-memory provider seed used outside production
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    pub root_id: String,
    pub account_name: String,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            root_id: "r-test".to_string(),
            account_name: "AWS_SEC_test_Dev".to_string(),
        }
    }
}

impl ProvisioningConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ProvisioningConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    pub fn mode(&self) -> RuntimeMode {
        RuntimeMode::from_runtime_env(&self.runtime_env)
    }

    /// Parent OU for a line of business, falling back to the workload OU.
    pub fn parent_ou_for(&self, lob: &str) -> &str {
        self.lob_ous
            .get(lob)
            .map(String::as_str)
            .unwrap_or(&self.workload_ou)
    }

    /// Whether the line of business has a dedicated OU mapping.
    pub fn has_dedicated_ou(&self, lob: &str) -> bool {
        self.lob_ous.contains_key(lob)
    }

    /// Parse the JSON-encoded `SEC_OU` mapping.
    pub fn parse_lob_ous(json: &str) -> Result<BTreeMap<String, String>> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(0) = self.poll.max_attempts {
            return Err(ConfigError::ValidationError(
                "poll.max_attempts must be greater than zero when set".to_string(),
            ));
        }

        if !self.mode().is_production() {
            return Ok(());
        }

        if self.email_domain.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "EMAIL_DOMAIN is required in production".to_string(),
            ));
        }
        if self.workload_ou.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "WORKLOAD_OU is required in production".to_string(),
            ));
        }
        if self.poll.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poll.interval_secs must be greater than zero in production".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Account Provisioner Configuration
# Environment variables override these settings

runtime_env = "dev"                # "prod" issues real Organizations calls
email_domain = "@example.com"
workload_ou = "ou-abcd-01234567"
# assume_role_arn = "arn:aws:iam::123456789012:role/account-provisioner"
# aws_region = "us-east-1"

[lob_ous]
SEC = "ou-abcd-12345678"
IS = "ou-abcd-23456789"

[poll]
interval_secs = 5
# max_attempts = 120

[http]
host = "0.0.0.0"
port = 8080

[offline]
root_id = "r-test"
account_name = "AWS_SEC_test_Dev"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProvisioningConfig::default();
        assert_eq!(config.mode(), RuntimeMode::NonProduction);
        assert_eq!(config.poll.interval_secs, 5);
        assert!(config.poll.max_attempts.is_none());
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.offline.account_name, "AWS_SEC_test_Dev");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_toml_parses() {
        let config: ProvisioningConfig = toml::from_str(&ProvisioningConfig::example_toml()).unwrap();
        assert_eq!(config.workload_ou, "ou-abcd-01234567");
        assert_eq!(config.lob_ous.get("SEC").map(String::as_str), Some("ou-abcd-12345678"));
        assert_eq!(config.lob_ous.len(), 2);
    }

    #[test]
    fn test_parent_ou_lookup() {
        let mut config = ProvisioningConfig::default();
        config.workload_ou = "ou-abcd-01234567".to_string();
        config.lob_ous = ProvisioningConfig::parse_lob_ous(r#"{"SEC":"ou-abcd-12345678"}"#).unwrap();

        assert_eq!(config.parent_ou_for("SEC"), "ou-abcd-12345678");
        assert!(config.has_dedicated_ou("SEC"));
        assert_eq!(config.parent_ou_for("FIN"), "ou-abcd-01234567");
        assert!(!config.has_dedicated_ou("FIN"));
        // lookup is exact
        assert_eq!(config.parent_ou_for("sec"), "ou-abcd-01234567");
    }

    #[test]
    fn test_invalid_lob_mapping() {
        assert!(matches!(
            ProvisioningConfig::parse_lob_ous("not json"),
            Err(ConfigError::LobMappingError(_))
        ));
        assert!(ProvisioningConfig::parse_lob_ous(r#"["SEC"]"#).is_err());
    }

    #[test]
    fn test_production_requires_domain_and_workload_ou() {
        let mut config = ProvisioningConfig {
            runtime_env: "prod".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.email_domain = "@example.com".to_string();
        assert!(config.validate().is_err());

        config.workload_ou = "ou-abcd-01234567".to_string();
        assert!(config.validate().is_ok());

        config.poll.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_max_attempts_rejected() {
        let mut config = ProvisioningConfig::default();
        config.poll.max_attempts = Some(0);
        assert!(config.validate().is_err());
    }
}
