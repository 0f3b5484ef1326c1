//! AWS Organizations provider
//!
//! Credentials come from the standard AWS SDK chain. When a role ARN is
//! configured, calls are made with credentials from an STS assume-role
//! provider layered on top of that chain.

use ap_common::Tag;
use async_trait::async_trait;
use aws_config::sts::AssumeRoleProvider;
use aws_sdk_organizations::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_organizations::types::Tag as OrgTag;
use aws_sdk_organizations::Client;
use tracing::{debug, info};

use crate::{
    Account, CreateAccountStatus, CreationState, OrganizationalUnit, OrganizationsApi,
    OrganizationsError, Result, Root,
};

const SESSION_NAME: &str = "account-provisioner";

/// AWS Organizations backed provider
pub struct AwsOrganizationsClient {
    client: Client,
}

impl AwsOrganizationsClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `region` - Optional AWS region (uses default chain if not specified)
    /// * `assume_role_arn` - Optional role to assume before calling Organizations
    pub async fn new(region: Option<String>, assume_role_arn: Option<String>) -> Self {
        let base = if let Some(region) = region {
            aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(region))
                .load()
                .await
        } else {
            aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await
        };

        let client = match assume_role_arn {
            Some(role_arn) => {
                info!(role_arn = %role_arn, "Assuming role for Organizations access");
                let provider = AssumeRoleProvider::builder(role_arn)
                    .session_name(SESSION_NAME)
                    .configure(&base)
                    .build()
                    .await;
                let config = aws_sdk_organizations::config::Builder::from(&base)
                    .credentials_provider(provider)
                    .build();
                Client::from_conf(config)
            }
            None => Client::new(&base),
        };

        info!("Initialized AWS Organizations provider");
        Self { client }
    }
}

/// Flatten an SDK error into the provider's own message.
fn provider_error<E, R>(operation: &str, err: SdkError<E, R>) -> OrganizationsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug + 'static,
{
    let message = match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        (Some(code), None) => code.to_string(),
        _ => format!("{} failed: {}", operation, DisplayErrorContext(&err)),
    };

    if err.code().is_some_and(|code| code.ends_with("NotFoundException")) {
        OrganizationsError::NotFound(message)
    } else {
        OrganizationsError::Service(message)
    }
}

#[async_trait]
impl OrganizationsApi for AwsOrganizationsClient {
    async fn create_account(&self, account_name: &str, email: &str) -> Result<String> {
        debug!(account_name, email, "Submitting CreateAccount");
        let output = self
            .client
            .create_account()
            .account_name(account_name)
            .email(email)
            .send()
            .await
            .map_err(|e| provider_error("CreateAccount", e))?;

        output
            .create_account_status()
            .and_then(|status| status.id())
            .map(|id| id.to_string())
            .ok_or(OrganizationsError::MissingField("create account request id"))
    }

    async fn describe_create_account_status(&self, request_id: &str) -> Result<CreateAccountStatus> {
        let output = self
            .client
            .describe_create_account_status()
            .create_account_request_id(request_id)
            .send()
            .await
            .map_err(|e| provider_error("DescribeCreateAccountStatus", e))?;

        let status = output
            .create_account_status()
            .ok_or(OrganizationsError::MissingField("create account status"))?;
        let state = status
            .state()
            .map(|s| CreationState::from_provider(s.as_str()))
            .ok_or(OrganizationsError::MissingField("create account state"))?;

        Ok(CreateAccountStatus {
            request_id: request_id.to_string(),
            state,
            account_id: status.account_id().map(|id| id.to_string()),
            failure_reason: status.failure_reason().map(|r| r.as_str().to_string()),
        })
    }

    async fn describe_account(&self, account_id: &str) -> Result<Account> {
        let output = self
            .client
            .describe_account()
            .account_id(account_id)
            .send()
            .await
            .map_err(|e| provider_error("DescribeAccount", e))?;

        let account = output
            .account()
            .ok_or(OrganizationsError::MissingField("account"))?;
        Ok(Account {
            id: account.id().unwrap_or(account_id).to_string(),
            name: account
                .name()
                .ok_or(OrganizationsError::MissingField("account name"))?
                .to_string(),
        })
    }

    async fn list_roots(&self) -> Result<Vec<Root>> {
        let mut roots = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_roots()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| provider_error("ListRoots", e))?;

            roots.extend(output.roots().iter().filter_map(|root| {
                Some(Root {
                    id: root.id()?.to_string(),
                    name: root.name().unwrap_or_default().to_string(),
                })
            }));

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(roots)
    }

    async fn list_organizational_units_for_parent(&self, parent_id: &str) -> Result<Vec<OrganizationalUnit>> {
        let mut units = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_organizational_units_for_parent()
                .parent_id(parent_id)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| provider_error("ListOrganizationalUnitsForParent", e))?;

            units.extend(output.organizational_units().iter().filter_map(|ou| {
                Some(OrganizationalUnit {
                    id: ou.id()?.to_string(),
                    name: ou.name().unwrap_or_default().to_string(),
                })
            }));

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(parent_id, count = units.len(), "Listed organizational units");
        Ok(units)
    }

    async fn move_account(&self, account_id: &str, source_parent_id: &str, destination_parent_id: &str) -> Result<()> {
        self.client
            .move_account()
            .account_id(account_id)
            .source_parent_id(source_parent_id)
            .destination_parent_id(destination_parent_id)
            .send()
            .await
            .map_err(|e| provider_error("MoveAccount", e))?;
        Ok(())
    }

    async fn tag_resource(&self, resource_id: &str, tags: &[Tag]) -> Result<()> {
        let tags = tags
            .iter()
            .map(|tag| {
                OrgTag::builder()
                    .key(&tag.key)
                    .value(&tag.value)
                    .build()
                    .map_err(|e| OrganizationsError::Service(format!("Invalid tag {}: {}", tag.key, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        self.client
            .tag_resource()
            .resource_id(resource_id)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|e| provider_error("TagResource", e))?;
        Ok(())
    }

    async fn untag_resource(&self, resource_id: &str, tag_keys: &[String]) -> Result<()> {
        self.client
            .untag_resource()
            .resource_id(resource_id)
            .set_tag_keys(Some(tag_keys.to_vec()))
            .send()
            .await
            .map_err(|e| provider_error("UntagResource", e))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "aws-organizations"
    }
}
