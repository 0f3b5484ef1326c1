//! Create and update request handlers
//!
//! Both flows are strictly sequential. Any error ends the request; steps that
//! already succeeded (creation, move) are not rolled back.

use std::sync::Arc;

use ap_common::{account_tags, keys_and_tags, AccountPayload, RuntimeMode};
use ap_config::ProvisioningConfig;
use ap_organizations::OrganizationsApi;
use tracing::{field, info, info_span, Instrument, Span};

use crate::account::{create_account, StatusPoller};
use crate::placement::{move_account, resolve_placement};
use crate::response::{format_response, ProvisioningResponse};
use crate::tagging::{tag_account, untag_account};
use crate::validation::{parse_payload, validate_identity, validate_payload};
use crate::{ProvisioningError, Result};

/// Runs the provisioning flows against one provider.
pub struct Provisioner {
    org: Arc<dyn OrganizationsApi>,
    config: ProvisioningConfig,
    mode: RuntimeMode,
    poller: StatusPoller,
}

impl Provisioner {
    pub fn new(org: Arc<dyn OrganizationsApi>, config: ProvisioningConfig) -> Self {
        let mode = config.mode();
        let poller = StatusPoller::from_config(&config.poll);
        Self {
            org,
            config,
            mode,
            poller,
        }
    }

    /// Override the mode derived from configuration.
    pub fn with_mode(mut self, mode: RuntimeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_poller(mut self, poller: StatusPoller) -> Self {
        self.poller = poller;
        self
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    pub fn provider_name(&self) -> &str {
        self.org.name()
    }

    /// Create flow, formatted as a response.
    pub async fn handle_create(&self, body: &str) -> ProvisioningResponse {
        let span = info_span!(
            "create_account",
            mode = %self.mode,
            lob = field::Empty,
            env = field::Empty,
            account_id = field::Empty,
        );
        format_response(self.create(body).instrument(span).await)
    }

    /// Update flow, formatted as a response.
    pub async fn handle_update(&self, account_id: Option<&str>, body: &str) -> ProvisioningResponse {
        let span = info_span!(
            "update_account",
            mode = %self.mode,
            account_id = account_id.unwrap_or_default(),
            lob = field::Empty,
            env = field::Empty,
        );
        format_response(self.update(account_id, body).instrument(span).await)
    }

    /// Parse, validate, create, wait, place, tag.
    pub async fn create(&self, body: &str) -> Result<AccountPayload> {
        let org = self.org.as_ref();

        let payload = parse_payload(body)?;
        record_payload(&payload);
        info!(name = %payload.name, "Payload parsed");

        validate_payload(&payload)?;
        info!("Payload passed validation");

        let request_id = create_account(org, self.mode, &payload.name, &self.config.email_domain).await?;

        let account_id = self.poller.wait_for_account(org, self.mode, &request_id).await?;
        Span::current().record("account_id", account_id.as_str());

        let placement = resolve_placement(org, self.mode, &self.config, &payload).await?;
        move_account(org, self.mode, &account_id, &placement).await?;

        let tags = account_tags(&payload);
        info!(?tags, "Generated account tags");
        tag_account(org, self.mode, &account_id, &tags).await?;

        Ok(payload.with_account_id(account_id))
    }

    /// Parse, re-validate against the live account, replace tags.
    pub async fn update(&self, account_id: Option<&str>, body: &str) -> Result<AccountPayload> {
        let org = self.org.as_ref();

        let payload = parse_payload(body)?;
        record_payload(&payload);
        info!(name = %payload.name, "Payload parsed");

        let account_id = account_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ProvisioningError::MissingAccountId)?;

        validate_identity(org, account_id, &payload).await?;
        info!("Payload matches the live account");

        let (keys, tags) = keys_and_tags(&payload);
        untag_account(org, self.mode, account_id, &keys).await?;
        tag_account(org, self.mode, account_id, &tags).await?;

        Ok(payload.with_account_id(account_id))
    }
}

fn record_payload(payload: &AccountPayload) {
    let span = Span::current();
    span.record("lob", payload.lob.as_str());
    span.record("env", payload.env.as_str());
}
