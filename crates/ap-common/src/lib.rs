use serde::{Deserialize, Serialize};
use std::fmt;

pub mod logging;
pub mod tags;

pub use tags::{account_tags, keys_and_tags, tag_keys, Tag, TaggedField};

// ============================================================================
// Account Payload
// ============================================================================

/// Request/response body for both provisioning flows.
///
/// `name` follows the `provider_lob_freeform_env` convention. `account_id` is
/// absent on a create request and populated on every successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPayload {
    pub name: String,
    #[serde(rename = "costCenter")]
    pub cost_center: String,
    #[serde(rename = "accountPOC")]
    pub account_poc: String,
    #[serde(rename = "applicationId")]
    pub application_id: String,
    pub env: String,
    pub lob: String,
    #[serde(rename = "accountId", default)]
    pub account_id: Option<String>,
}

impl AccountPayload {
    /// Returns the payload with the resolved account id injected.
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }
}

// ============================================================================
// Runtime Mode
// ============================================================================

/// Execution mode gating every provider-mutating call.
///
/// Only `Production` issues create/move/tag calls; `NonProduction` runs the
/// same parse/validate/format pipeline and answers with sentinel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeMode {
    Production,
    #[default]
    NonProduction,
}

impl RuntimeMode {
    /// Interprets a `RUNTIME_ENV` value: `prod` in any case is production.
    pub fn from_runtime_env(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("prod") {
            RuntimeMode::Production
        } else {
            RuntimeMode::NonProduction
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, RuntimeMode::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeMode::Production => "production",
            RuntimeMode::NonProduction => "non-production",
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
