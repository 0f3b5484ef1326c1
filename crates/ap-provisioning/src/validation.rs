//! Request parsing and naming-convention checks
//!
//! Account names follow `provider_lob_freeform_env`. The create flow checks
//! the requested name against the payload's `lob`/`env`; the update flow
//! first re-reads the live account name and checks that instead.

use ap_common::AccountPayload;
use ap_organizations::OrganizationsApi;
use tracing::debug;

use crate::{ProvisioningError, Result};

/// Parse an inbound JSON body. Missing fields are rejected, not defaulted.
pub fn parse_payload(body: &str) -> Result<AccountPayload> {
    Ok(serde_json::from_str(body)?)
}

/// The leading four tokens of an account name. Anything after the env token
/// is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountName<'a> {
    pub provider: &'a str,
    pub lob: &'a str,
    pub freeform: &'a str,
    pub env: &'a str,
}

impl<'a> AccountName<'a> {
    pub fn parse(name: &'a str) -> Result<Self> {
        let tokens: Vec<&str> = name.split('_').collect();
        match tokens[..] {
            [provider, lob, freeform, env, ..] => Ok(Self {
                provider,
                lob,
                freeform,
                env,
            }),
            _ => Err(ProvisioningError::MalformedName {
                name: name.to_string(),
            }),
        }
    }

    /// Whether the lob and env tokens match the payload, ignoring case.
    pub fn matches(&self, payload: &AccountPayload) -> bool {
        equal_fold(self.lob, &payload.lob) && equal_fold(self.env, &payload.env)
    }
}

/// Case-insensitive comparison under simple (one char to one char) case
/// folding, so `ς`, `σ` and `Σ` all compare equal but `ß` never matches `ss`.
pub fn equal_fold(a: &str, b: &str) -> bool {
    a.chars().map(simple_fold).eq(b.chars().map(simple_fold))
}

fn simple_fold(c: char) -> char {
    let upper = single(c.to_uppercase()).unwrap_or(c);
    single(upper.to_lowercase()).unwrap_or(upper)
}

fn single(mut chars: impl Iterator<Item = char>) -> Option<char> {
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Create flow: the requested name must agree with `lob` and `env`.
pub fn validate_payload(payload: &AccountPayload) -> Result<()> {
    let name = AccountName::parse(&payload.name)?;
    if !name.matches(payload) {
        return Err(ProvisioningError::Validation(
            "lob or env provided differs from those in the account name".to_string(),
        ));
    }
    Ok(())
}

/// Update flow: the live account must carry the payload's name, and that
/// name must agree with `lob` and `env`.
pub async fn validate_identity(
    org: &dyn OrganizationsApi,
    account_id: &str,
    payload: &AccountPayload,
) -> Result<()> {
    let account = org.describe_account(account_id).await?;
    debug!(account_id, actual_name = %account.name, "Fetched current account name");

    if !equal_fold(&account.name, &payload.name) {
        return Err(ProvisioningError::Validation(
            "The account name provided differs from the actual account name".to_string(),
        ));
    }

    let name = AccountName::parse(&account.name)?;
    if !name.matches(payload) {
        return Err(ProvisioningError::Validation(
            "lob or env provided differs from the actual values for the account".to_string(),
        ));
    }
    Ok(())
}
