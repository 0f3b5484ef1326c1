//! Organization Management Providers
//!
//! A single [`OrganizationsApi`] trait covers every provider operation the
//! provisioning flows consume:
//! - account creation and creation-status lookup
//! - account description (display name)
//! - root and organizational unit listing
//! - account moves between parents
//! - resource tagging and untagging
//!
//! Backends:
//! - [`InMemoryOrganizations`] - local model for non-production mode and tests
//! - `AwsOrganizationsClient` - AWS Organizations (feature flag `aws`)

use ap_common::Tag;
use async_trait::async_trait;
use thiserror::Error;

mod memory;

pub use memory::{InMemoryOrganizations, ProviderCall};

#[cfg(feature = "aws")]
mod aws;
#[cfg(feature = "aws")]
pub use aws::AwsOrganizationsClient;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrganizationsError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Service(String),
    #[error("Provider response missing {0}")]
    MissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, OrganizationsError>;

/// State of an asynchronous account creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationState {
    InProgress,
    Succeeded,
    Failed,
}

impl CreationState {
    /// Map a provider state string. Anything that is neither `FAILED` nor
    /// `IN_PROGRESS` counts as success.
    pub fn from_provider(state: &str) -> Self {
        match state {
            "FAILED" => CreationState::Failed,
            "IN_PROGRESS" => CreationState::InProgress,
            _ => CreationState::Succeeded,
        }
    }
}

/// Snapshot returned by describe-create-account-status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccountStatus {
    pub request_id: String,
    pub state: CreationState,
    pub account_id: Option<String>,
    pub failure_reason: Option<String>,
}

impl CreateAccountStatus {
    pub fn in_progress(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            state: CreationState::InProgress,
            account_id: None,
            failure_reason: None,
        }
    }

    pub fn succeeded(request_id: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            state: CreationState::Succeeded,
            account_id: Some(account_id.into()),
            failure_reason: None,
        }
    }

    pub fn failed(request_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            state: CreationState::Failed,
            account_id: None,
            failure_reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationalUnit {
    pub id: String,
    pub name: String,
}

/// Organization management provider
#[async_trait]
pub trait OrganizationsApi: Send + Sync {
    /// Submit an account creation request, returning its tracking id
    async fn create_account(&self, account_name: &str, email: &str) -> Result<String>;

    async fn describe_create_account_status(&self, request_id: &str) -> Result<CreateAccountStatus>;

    async fn describe_account(&self, account_id: &str) -> Result<Account>;

    /// List roots in provider order
    async fn list_roots(&self) -> Result<Vec<Root>>;

    /// List the direct child OUs of a root or OU
    async fn list_organizational_units_for_parent(&self, parent_id: &str) -> Result<Vec<OrganizationalUnit>>;

    async fn move_account(&self, account_id: &str, source_parent_id: &str, destination_parent_id: &str) -> Result<()>;

    async fn tag_resource(&self, resource_id: &str, tags: &[Tag]) -> Result<()>;

    async fn untag_resource(&self, resource_id: &str, tag_keys: &[String]) -> Result<()>;

    /// Provider name
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_state_mapping() {
        assert_eq!(CreationState::from_provider("FAILED"), CreationState::Failed);
        assert_eq!(CreationState::from_provider("IN_PROGRESS"), CreationState::InProgress);
        assert_eq!(CreationState::from_provider("SUCCEEDED"), CreationState::Succeeded);
    }

    #[test]
    fn test_error_messages_pass_through() {
        let err = OrganizationsError::Service("AccessDeniedException: not allowed".to_string());
        assert_eq!(err.to_string(), "AccessDeniedException: not allowed");
        assert_eq!(
            OrganizationsError::MissingField("account id").to_string(),
            "Provider response missing account id"
        );
    }
}
