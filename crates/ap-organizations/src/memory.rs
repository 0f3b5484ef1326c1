//! In-memory organization provider
//!
//! Models roots, the OU tree, accounts with their parents and tags, and
//! account creation requests. Every call is recorded so callers can assert
//! which operations were issued. Used as the provider outside production.

use std::collections::{BTreeMap, HashMap, VecDeque};

use ap_common::Tag;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    Account, CreateAccountStatus, OrganizationalUnit, OrganizationsApi, OrganizationsError,
    Result, Root,
};

/// A provider operation as issued by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    CreateAccount { account_name: String, email: String },
    DescribeCreateAccountStatus { request_id: String },
    DescribeAccount { account_id: String },
    ListRoots,
    ListOrganizationalUnitsForParent { parent_id: String },
    MoveAccount { account_id: String, source_parent_id: String, destination_parent_id: String },
    TagResource { resource_id: String, tags: Vec<Tag> },
    UntagResource { resource_id: String, tag_keys: Vec<String> },
}

impl ProviderCall {
    pub fn operation(&self) -> &'static str {
        match self {
            ProviderCall::CreateAccount { .. } => "CreateAccount",
            ProviderCall::DescribeCreateAccountStatus { .. } => "DescribeCreateAccountStatus",
            ProviderCall::DescribeAccount { .. } => "DescribeAccount",
            ProviderCall::ListRoots => "ListRoots",
            ProviderCall::ListOrganizationalUnitsForParent { .. } => "ListOrganizationalUnitsForParent",
            ProviderCall::MoveAccount { .. } => "MoveAccount",
            ProviderCall::TagResource { .. } => "TagResource",
            ProviderCall::UntagResource { .. } => "UntagResource",
        }
    }

    /// Whether the operation changes provider state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            ProviderCall::CreateAccount { .. }
                | ProviderCall::MoveAccount { .. }
                | ProviderCall::TagResource { .. }
                | ProviderCall::UntagResource { .. }
        )
    }
}

#[derive(Debug, Clone)]
struct AccountRecord {
    name: String,
    parent_id: String,
    tags: Vec<Tag>,
}

#[derive(Default)]
struct State {
    roots: Vec<Root>,
    /// (parent id, unit) in insertion order
    units: Vec<(String, OrganizationalUnit)>,
    accounts: BTreeMap<String, AccountRecord>,
    fallback_account_name: Option<String>,
    /// request id -> account id
    requests: HashMap<String, String>,
    creation_script: VecDeque<CreateAccountStatus>,
    failures: HashMap<&'static str, OrganizationsError>,
    next_id: u64,
    calls: Vec<ProviderCall>,
}

impl State {
    fn record(&mut self, call: ProviderCall) -> Result<()> {
        let operation = call.operation();
        debug!(operation, "In-memory provider call");
        self.calls.push(call);
        match self.failures.get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn parent_exists(&self, id: &str) -> bool {
        self.roots.iter().any(|r| r.id == id) || self.units.iter().any(|(_, ou)| ou.id == id)
    }
}

/// In-memory [`OrganizationsApi`] implementation
pub struct InMemoryOrganizations {
    state: Mutex<State>,
}

impl InMemoryOrganizations {
    const FIRST_ACCOUNT_NUMBER: u64 = 100_000_000_001;

    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: Self::FIRST_ACCOUNT_NUMBER,
                ..Default::default()
            }),
        }
    }

    pub fn with_root(self, id: &str) -> Self {
        self.state.lock().roots.push(Root {
            id: id.to_string(),
            name: "Root".to_string(),
        });
        self
    }

    /// Add an OU under a root or another OU.
    pub fn with_unit(self, parent_id: &str, id: &str, name: &str) -> Self {
        self.state.lock().units.push((
            parent_id.to_string(),
            OrganizationalUnit {
                id: id.to_string(),
                name: name.to_string(),
            },
        ));
        self
    }

    pub fn with_account(self, id: &str, name: &str, parent_id: &str) -> Self {
        self.state.lock().accounts.insert(
            id.to_string(),
            AccountRecord {
                name: name.to_string(),
                parent_id: parent_id.to_string(),
                tags: Vec::new(),
            },
        );
        self
    }

    /// Display name reported by describe-account for ids not in the model.
    pub fn with_fallback_account_name(self, name: &str) -> Self {
        self.state.lock().fallback_account_name = Some(name.to_string());
        self
    }

    /// Statuses returned by successive describe-create-account-status calls.
    /// The last entry repeats once the script is exhausted.
    pub fn with_creation_statuses(self, statuses: Vec<CreateAccountStatus>) -> Self {
        self.state.lock().creation_script = statuses.into();
        self
    }

    /// Fail every call to `operation` (e.g. `"TagResource"`) with `error`.
    pub fn with_failure(self, operation: &'static str, error: OrganizationsError) -> Self {
        self.state.lock().failures.insert(operation, error);
        self
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.state.lock().calls.clone()
    }

    pub fn mutating_calls(&self) -> Vec<ProviderCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.is_mutating())
            .cloned()
            .collect()
    }

    pub fn account_parent(&self, account_id: &str) -> Option<String> {
        self.state
            .lock()
            .accounts
            .get(account_id)
            .map(|a| a.parent_id.clone())
    }

    pub fn account_tags(&self, account_id: &str) -> Option<Vec<Tag>> {
        self.state
            .lock()
            .accounts
            .get(account_id)
            .map(|a| a.tags.clone())
    }
}

impl Default for InMemoryOrganizations {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrganizationsApi for InMemoryOrganizations {
    async fn create_account(&self, account_name: &str, email: &str) -> Result<String> {
        let mut state = self.state.lock();
        state.record(ProviderCall::CreateAccount {
            account_name: account_name.to_string(),
            email: email.to_string(),
        })?;

        let number = state.next_id;
        state.next_id += 1;
        let request_id = format!("car-{}", number);
        let account_id = number.to_string();
        let parent_id = state.roots.first().map(|r| r.id.clone()).unwrap_or_default();

        state.accounts.insert(
            account_id.clone(),
            AccountRecord {
                name: account_name.to_string(),
                parent_id,
                tags: Vec::new(),
            },
        );
        state.requests.insert(request_id.clone(), account_id);
        Ok(request_id)
    }

    async fn describe_create_account_status(&self, request_id: &str) -> Result<CreateAccountStatus> {
        let mut state = self.state.lock();
        state.record(ProviderCall::DescribeCreateAccountStatus {
            request_id: request_id.to_string(),
        })?;

        let scripted = if state.creation_script.len() > 1 {
            state.creation_script.pop_front()
        } else {
            state.creation_script.front().cloned()
        };
        if let Some(mut status) = scripted {
            status.request_id = request_id.to_string();
            return Ok(status);
        }

        state
            .requests
            .get(request_id)
            .map(|account_id| CreateAccountStatus::succeeded(request_id, account_id.clone()))
            .ok_or_else(|| {
                OrganizationsError::NotFound(format!(
                    "CreateAccountStatusNotFoundException: request {} not found",
                    request_id
                ))
            })
    }

    async fn describe_account(&self, account_id: &str) -> Result<Account> {
        let mut state = self.state.lock();
        state.record(ProviderCall::DescribeAccount {
            account_id: account_id.to_string(),
        })?;

        let name = state
            .accounts
            .get(account_id)
            .map(|a| a.name.clone())
            .or_else(|| state.fallback_account_name.clone())
            .ok_or_else(|| {
                OrganizationsError::NotFound(format!(
                    "AccountNotFoundException: account {} not found",
                    account_id
                ))
            })?;

        Ok(Account {
            id: account_id.to_string(),
            name,
        })
    }

    async fn list_roots(&self) -> Result<Vec<Root>> {
        let mut state = self.state.lock();
        state.record(ProviderCall::ListRoots)?;
        Ok(state.roots.clone())
    }

    async fn list_organizational_units_for_parent(&self, parent_id: &str) -> Result<Vec<OrganizationalUnit>> {
        let mut state = self.state.lock();
        state.record(ProviderCall::ListOrganizationalUnitsForParent {
            parent_id: parent_id.to_string(),
        })?;

        Ok(state
            .units
            .iter()
            .filter(|(parent, _)| parent == parent_id)
            .map(|(_, ou)| ou.clone())
            .collect())
    }

    async fn move_account(&self, account_id: &str, source_parent_id: &str, destination_parent_id: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.record(ProviderCall::MoveAccount {
            account_id: account_id.to_string(),
            source_parent_id: source_parent_id.to_string(),
            destination_parent_id: destination_parent_id.to_string(),
        })?;

        if !state.parent_exists(destination_parent_id) {
            return Err(OrganizationsError::NotFound(format!(
                "DestinationParentNotFoundException: parent {} not found",
                destination_parent_id
            )));
        }

        let account = state.accounts.get_mut(account_id).ok_or_else(|| {
            OrganizationsError::NotFound(format!(
                "AccountNotFoundException: account {} not found",
                account_id
            ))
        })?;
        if account.parent_id != source_parent_id {
            return Err(OrganizationsError::NotFound(format!(
                "SourceParentNotFoundException: account {} is not under {}",
                account_id, source_parent_id
            )));
        }
        account.parent_id = destination_parent_id.to_string();
        Ok(())
    }

    async fn tag_resource(&self, resource_id: &str, tags: &[Tag]) -> Result<()> {
        let mut state = self.state.lock();
        state.record(ProviderCall::TagResource {
            resource_id: resource_id.to_string(),
            tags: tags.to_vec(),
        })?;

        let account = state.accounts.get_mut(resource_id).ok_or_else(|| {
            OrganizationsError::NotFound(format!(
                "TargetNotFoundException: resource {} not found",
                resource_id
            ))
        })?;
        for tag in tags {
            match account.tags.iter_mut().find(|t| t.key == tag.key) {
                Some(existing) => existing.value = tag.value.clone(),
                None => account.tags.push(tag.clone()),
            }
        }
        Ok(())
    }

    async fn untag_resource(&self, resource_id: &str, tag_keys: &[String]) -> Result<()> {
        let mut state = self.state.lock();
        state.record(ProviderCall::UntagResource {
            resource_id: resource_id.to_string(),
            tag_keys: tag_keys.to_vec(),
        })?;

        let account = state.accounts.get_mut(resource_id).ok_or_else(|| {
            OrganizationsError::NotFound(format!(
                "TargetNotFoundException: resource {} not found",
                resource_id
            ))
        })?;
        account.tags.retain(|t| !tag_keys.contains(&t.key));
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn organization() -> InMemoryOrganizations {
        InMemoryOrganizations::new()
            .with_root("r-abcd")
            .with_unit("r-abcd", "ou-abcd-12345678", "SEC")
            .with_unit("ou-abcd-12345678", "ou-abcd-dev00000", "Dev")
            .with_unit("ou-abcd-12345678", "ou-abcd-prd00000", "Prod")
    }

    #[tokio::test]
    async fn test_create_then_describe_status() {
        let org = organization();
        let request_id = org.create_account("aws_SEC_test_Dev", "aws_SEC_test_Dev@example.com").await.unwrap();

        let status = org.describe_create_account_status(&request_id).await.unwrap();
        assert_eq!(status.state, crate::CreationState::Succeeded);
        let account_id = status.account_id.unwrap();
        assert_eq!(org.account_parent(&account_id).as_deref(), Some("r-abcd"));

        let account = org.describe_account(&account_id).await.unwrap();
        assert_eq!(account.name, "aws_SEC_test_Dev");
    }

    #[tokio::test]
    async fn test_unknown_request_not_found() {
        let org = organization();
        let err = org.describe_create_account_status("car-missing").await.unwrap_err();
        assert!(matches!(err, OrganizationsError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_creation_script_repeats_last_status() {
        let org = organization().with_creation_statuses(vec![
            CreateAccountStatus::in_progress(""),
            CreateAccountStatus::failed("", "EMAIL_ALREADY_EXISTS"),
        ]);

        let first = org.describe_create_account_status("car-1").await.unwrap();
        assert_eq!(first.state, crate::CreationState::InProgress);
        assert_eq!(first.request_id, "car-1");
        for _ in 0..2 {
            let next = org.describe_create_account_status("car-1").await.unwrap();
            assert_eq!(next.failure_reason.as_deref(), Some("EMAIL_ALREADY_EXISTS"));
        }
    }

    #[tokio::test]
    async fn test_units_listed_per_parent() {
        let org = organization();
        let units = org.list_organizational_units_for_parent("ou-abcd-12345678").await.unwrap();
        let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Dev", "Prod"]);
        assert!(org.list_organizational_units_for_parent("ou-unknown").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_checks_source_parent() {
        let org = organization().with_account("111111111111", "aws_SEC_test_Dev", "r-abcd");

        let err = org
            .move_account("111111111111", "ou-abcd-12345678", "ou-abcd-dev00000")
            .await
            .unwrap_err();
        assert!(matches!(err, OrganizationsError::NotFound(_)));

        org.move_account("111111111111", "r-abcd", "ou-abcd-dev00000").await.unwrap();
        assert_eq!(org.account_parent("111111111111").as_deref(), Some("ou-abcd-dev00000"));
    }

    #[tokio::test]
    async fn test_tag_and_untag() {
        let org = organization().with_account("111111111111", "aws_SEC_test_Dev", "r-abcd");
        org.tag_resource("111111111111", &[Tag::new("Env", "Dev"), Tag::new("Lob", "SEC")])
            .await
            .unwrap();
        org.tag_resource("111111111111", &[Tag::new("Env", "Prod")]).await.unwrap();
        assert_eq!(
            org.account_tags("111111111111").unwrap(),
            vec![Tag::new("Env", "Prod"), Tag::new("Lob", "SEC")]
        );

        org.untag_resource("111111111111", &["Env".to_string()]).await.unwrap();
        assert_eq!(org.account_tags("111111111111").unwrap(), vec![Tag::new("Lob", "SEC")]);
    }

    #[tokio::test]
    async fn test_fallback_account_name() {
        let org = InMemoryOrganizations::new().with_fallback_account_name("AWS_SEC_test_Dev");
        let account = org.describe_account("999999999999").await.unwrap();
        assert_eq!(account.name, "AWS_SEC_test_Dev");

        let strict = InMemoryOrganizations::new();
        assert!(strict.describe_account("999999999999").await.is_err());
    }

    #[tokio::test]
    async fn test_injected_failure_is_recorded() {
        let org = organization().with_failure(
            "ListRoots",
            OrganizationsError::Service("ThrottlingException: rate exceeded".to_string()),
        );
        let err = org.list_roots().await.unwrap_err();
        assert_eq!(err.to_string(), "ThrottlingException: rate exceeded");
        assert_eq!(org.calls(), vec![ProviderCall::ListRoots]);
        assert!(org.mutating_calls().is_empty());
    }
}
