//! Account creation and creation-status polling

use std::time::Duration;

use ap_common::RuntimeMode;
use ap_config::PollConfig;
use ap_organizations::{CreationState, OrganizationsApi, OrganizationsError};
use tracing::{debug, info, warn};

use crate::{ProvisioningError, Result};

/// Tracking id returned instead of a real request outside production.
pub const NON_PRODUCTION_REQUEST_ID: &str = "test";

/// Account id returned instead of a real account outside production.
pub const NON_PRODUCTION_ACCOUNT_ID: &str = "test_account_id";

/// Root email for a new account: the account name followed by the domain suffix.
pub fn account_email(account_name: &str, email_domain: &str) -> String {
    format!("{}{}", account_name, email_domain)
}

/// Submit an account creation request and return its tracking id.
pub async fn create_account(
    org: &dyn OrganizationsApi,
    mode: RuntimeMode,
    account_name: &str,
    email_domain: &str,
) -> Result<String> {
    if !mode.is_production() {
        info!(%mode, "Account creation skipped outside production");
        return Ok(NON_PRODUCTION_REQUEST_ID.to_string());
    }

    let email = account_email(account_name, email_domain);
    let request_id = org.create_account(account_name, &email).await?;
    info!(request_id = %request_id, account_name, "Account creation submitted");
    Ok(request_id)
}

/// Polls creation status on a fixed interval until it is terminal.
#[derive(Debug, Clone)]
pub struct StatusPoller {
    interval: Duration,
    max_attempts: Option<u32>,
}

impl StatusPoller {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    /// Unbounded poller with the default interval.
    pub fn new() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            max_attempts: None,
        }
    }

    pub fn from_config(config: &PollConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            max_attempts: config.max_attempts,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Give up after `attempts` in-progress answers.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Wait for the request to finish and return the new account id.
    pub async fn wait_for_account(
        &self,
        org: &dyn OrganizationsApi,
        mode: RuntimeMode,
        request_id: &str,
    ) -> Result<String> {
        if !mode.is_production() {
            info!(%mode, "Creation status check skipped outside production");
            return Ok(NON_PRODUCTION_ACCOUNT_ID.to_string());
        }

        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            let status = org.describe_create_account_status(request_id).await?;

            match status.state {
                CreationState::Failed => {
                    let reason = status
                        .failure_reason
                        .unwrap_or_else(|| "Account creation failed".to_string());
                    warn!(request_id, reason = %reason, "Account creation failed");
                    return Err(ProvisioningError::CreationFailed(reason));
                }
                CreationState::Succeeded => {
                    let account_id = status
                        .account_id
                        .ok_or(OrganizationsError::MissingField("account id"))?;
                    info!(request_id, account_id = %account_id, attempts, "Account creation succeeded");
                    return Ok(account_id);
                }
                CreationState::InProgress => {
                    if self.max_attempts.is_some_and(|max| attempts >= max) {
                        return Err(ProvisioningError::PollLimitExceeded {
                            request_id: request_id.to_string(),
                            attempts,
                        });
                    }
                    debug!(request_id, attempts, "Account creation in progress");
                    tokio::time::sleep(self.interval).await;
                }
            }
        }
    }
}

impl Default for StatusPoller {
    fn default() -> Self {
        Self::new()
    }
}
