//! Configuration loader with file and environment variable support

use crate::{ConfigError, ProvisioningConfig, Result};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "./config/config.toml",
    "/etc/account-provisioner/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with process environment overrides
    pub fn load(&self) -> Result<ProvisioningConfig> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Same as [`ConfigLoader::load`] with an explicit variable lookup.
    pub fn load_with<F>(&self, lookup: F) -> Result<ProvisioningConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match self.find_config_file(&lookup) {
            Some(path) => {
                info!(?path, "Loading configuration from file");
                ProvisioningConfig::from_file(&path)?
            }
            None => ProvisioningConfig::default(),
        };

        apply_env_overrides(&mut config, &lookup)?;
        config.validate()?;

        info!(
            mode = %config.mode(),
            workload_ou = %config.workload_ou,
            dedicated_ous = config.lob_ous.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Some(path) = lookup("AP_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_env_overrides<F>(config: &mut ProvisioningConfig, lookup: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("RUNTIME_ENV") {
        config.runtime_env = val;
    }
    if let Some(val) = lookup("EMAIL_DOMAIN") {
        config.email_domain = val;
    }
    if let Some(val) = lookup("WORKLOAD_OU") {
        config.workload_ou = val;
    }
    if let Some(val) = lookup("SEC_OU") {
        if !val.trim().is_empty() {
            config.lob_ous = ProvisioningConfig::parse_lob_ous(&val)?;
        }
    }
    if let Some(val) = lookup("ASSUME_ROLE_ARN") {
        config.assume_role_arn = non_empty(val);
    }

    // Region
    if let Some(val) = lookup("AP_AWS_REGION").or_else(|| lookup("AWS_REGION")) {
        config.aws_region = non_empty(val);
    }

    // Poll
    if let Some(val) = lookup("AP_POLL_INTERVAL_SECS") {
        config.poll.interval_secs = parse_number("AP_POLL_INTERVAL_SECS", &val)?;
    }
    if let Some(val) = lookup("AP_POLL_MAX_ATTEMPTS") {
        config.poll.max_attempts = Some(parse_number("AP_POLL_MAX_ATTEMPTS", &val)?);
    }

    // HTTP
    if let Some(val) = lookup("AP_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(val) = lookup("AP_HTTP_PORT") {
        config.http.port = parse_number("AP_HTTP_PORT", &val)?;
    }

    // Offline provider
    if let Some(val) = lookup("AP_OFFLINE_ACCOUNT_NAME") {
        config.offline.account_name = val;
    }

    Ok(())
}

fn non_empty(val: String) -> Option<String> {
    if val.trim().is_empty() {
        None
    } else {
        Some(val)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, val: &str) -> Result<T> {
    val.trim()
        .parse()
        .map_err(|_| ConfigError::EnvError(format!("{} is not a valid number: {}", key, val)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn missing_file_loader() -> ConfigLoader {
        ConfigLoader::with_path("/nonexistent/account-provisioner.toml")
    }

    #[test]
    fn test_env_overrides() {
        let lookup = lookup_from(&[
            ("RUNTIME_ENV", "prod"),
            ("EMAIL_DOMAIN", "@example.com"),
            ("WORKLOAD_OU", "ou-abcd-01234567"),
            ("SEC_OU", r#"{"SEC":"ou-abcd-12345678","IS":"ou-abcd-23456789"}"#),
            ("ASSUME_ROLE_ARN", "arn:aws:iam::123456789012:role/provisioner"),
            ("AP_POLL_INTERVAL_SECS", "2"),
            ("AP_POLL_MAX_ATTEMPTS", "30"),
        ]);

        let config = missing_file_loader().load_with(lookup).unwrap();
        assert!(config.mode().is_production());
        assert_eq!(config.email_domain, "@example.com");
        assert_eq!(config.parent_ou_for("IS"), "ou-abcd-23456789");
        assert_eq!(
            config.assume_role_arn.as_deref(),
            Some("arn:aws:iam::123456789012:role/provisioner")
        );
        assert_eq!(config.poll.interval_secs, 2);
        assert_eq!(config.poll.max_attempts, Some(30));
    }

    #[test]
    fn test_empty_role_arn_is_unset() {
        let lookup = lookup_from(&[("ASSUME_ROLE_ARN", "")]);
        let config = missing_file_loader().load_with(lookup).unwrap();
        assert!(config.assume_role_arn.is_none());
    }

    #[test]
    fn test_malformed_sec_ou_fails() {
        let lookup = lookup_from(&[("SEC_OU", "{SEC:")]);
        let result = missing_file_loader().load_with(lookup);
        assert!(matches!(result, Err(ConfigError::LobMappingError(_))));
    }

    #[test]
    fn test_invalid_number_fails() {
        let lookup = lookup_from(&[("AP_HTTP_PORT", "eighty")]);
        let result = missing_file_loader().load_with(lookup);
        assert!(matches!(result, Err(ConfigError::EnvError(_))));
    }

    #[test]
    fn test_production_without_domain_fails_validation() {
        let lookup = lookup_from(&[("RUNTIME_ENV", "PROD"), ("WORKLOAD_OU", "ou-abcd-01234567")]);
        let result = missing_file_loader().load_with(lookup);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
runtime_env = "dev"
workload_ou = "ou-file-00000000"

[lob_ous]
SEC = "ou-file-11111111"

[http]
port = 9090
"#
        )
        .unwrap();

        let lookup = lookup_from(&[("WORKLOAD_OU", "ou-env-22222222")]);
        let config = ConfigLoader::with_path(file.path()).load_with(lookup).unwrap();

        assert_eq!(config.workload_ou, "ou-env-22222222");
        assert_eq!(config.parent_ou_for("SEC"), "ou-file-11111111");
        assert_eq!(config.http.port, 9090);
        assert!(!config.mode().is_production());
    }
}
