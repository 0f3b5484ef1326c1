//! Account tag application and removal

use ap_common::{RuntimeMode, Tag};
use ap_organizations::OrganizationsApi;
use tracing::info;

use crate::Result;

/// Apply `tags` to the account, replacing values of existing keys.
pub async fn tag_account(
    org: &dyn OrganizationsApi,
    mode: RuntimeMode,
    account_id: &str,
    tags: &[Tag],
) -> Result<()> {
    if !mode.is_production() {
        info!(%mode, "Tagging skipped outside production");
        return Ok(());
    }

    org.tag_resource(account_id, tags).await?;
    info!(account_id, count = tags.len(), "Account tagged");
    Ok(())
}

/// Remove `keys` from the account.
pub async fn untag_account(
    org: &dyn OrganizationsApi,
    mode: RuntimeMode,
    account_id: &str,
    keys: &[String],
) -> Result<()> {
    if !mode.is_production() {
        info!(%mode, "Untagging skipped outside production");
        return Ok(());
    }

    org.untag_resource(account_id, keys).await?;
    info!(account_id, count = keys.len(), "Account untagged");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_organizations::{InMemoryOrganizations, OrganizationsError};

    #[tokio::test]
    async fn test_tag_and_untag_in_production() {
        let org = InMemoryOrganizations::new().with_account("999999999999", "aws_SEC_test_Dev", "r-abcd");
        let tags = vec![Tag::new("Env", "Dev"), Tag::new("Lob", "SEC")];

        tag_account(&org, RuntimeMode::Production, "999999999999", &tags).await.unwrap();
        assert_eq!(org.account_tags("999999999999").unwrap(), tags);

        untag_account(&org, RuntimeMode::Production, "999999999999", &["Env".to_string()])
            .await
            .unwrap();
        assert_eq!(org.account_tags("999999999999").unwrap(), vec![Tag::new("Lob", "SEC")]);
    }

    #[tokio::test]
    async fn test_noop_outside_production() {
        let org = InMemoryOrganizations::new();
        tag_account(&org, RuntimeMode::NonProduction, "test_account_id", &[Tag::new("Env", "Dev")])
            .await
            .unwrap();
        untag_account(&org, RuntimeMode::NonProduction, "test_account_id", &["Env".to_string()])
            .await
            .unwrap();
        assert!(org.calls().is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let org = InMemoryOrganizations::new().with_failure(
            "TagResource",
            OrganizationsError::Service("TooManyRequestsException: slow down".to_string()),
        );
        let err = tag_account(&org, RuntimeMode::Production, "999999999999", &[Tag::new("Env", "Dev")])
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "TooManyRequestsException: slow down");
    }
}
