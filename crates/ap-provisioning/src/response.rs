//! Response formatting
//!
//! Every outcome becomes a well-formed status/body pair; failures never
//! escape as transport errors.

use ap_common::AccountPayload;
use tracing::error;

use crate::{ProvisioningError, Result};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningResponse {
    pub status_code: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl ProvisioningResponse {
    /// 200 with the payload as JSON.
    pub fn success(payload: &AccountPayload) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self {
                status_code: 200,
                content_type: CONTENT_TYPE_JSON,
                body,
            },
            Err(e) => Self::from_error(&ProvisioningError::Serialization(e)),
        }
    }

    /// Error message as the body, status chosen by the error category.
    pub fn from_error(err: &ProvisioningError) -> Self {
        let status_code = err.status_code();
        error!(status_code, error = %err, "Request failed");
        Self {
            status_code,
            content_type: CONTENT_TYPE_TEXT,
            body: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Turn a flow result into a response.
pub fn format_response(result: Result<AccountPayload>) -> ProvisioningResponse {
    match result {
        Ok(payload) => ProvisioningResponse::success(&payload),
        Err(err) => ProvisioningResponse::from_error(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_organizations::OrganizationsError;

    const REQUEST_BODY: &str = r#"{"name":"aws_SEC_test_Dev","costCenter":"01234","accountPOC":"john.doe@example.com","applicationId":"00000000-0000-0000-0000-000000000000","env":"Dev","lob":"SEC"}"#;

    #[test]
    fn test_round_trip_preserves_fields() {
        let payload = crate::parse_payload(REQUEST_BODY).unwrap().with_account_id("999999999999");
        let response = format_response(Ok(payload));

        assert_eq!(response.status_code, 200);
        assert_eq!(response.content_type, CONTENT_TYPE_JSON);

        let original: serde_json::Value = serde_json::from_str(REQUEST_BODY).unwrap();
        let echoed: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        for (key, value) in original.as_object().unwrap() {
            assert_eq!(&echoed[key], value, "field {}", key);
        }
        assert_eq!(echoed["accountId"], "999999999999");
    }

    #[test]
    fn test_client_error_response() {
        let response = format_response(Err(ProvisioningError::Validation(
            "lob or env provided differs from those in the account name".to_string(),
        )));
        assert_eq!(response.status_code, 400);
        assert_eq!(response.content_type, CONTENT_TYPE_TEXT);
        assert_eq!(response.body, "lob or env provided differs from those in the account name");
        assert!(!response.is_success());
    }

    #[test]
    fn test_server_error_response() {
        let response = format_response(Err(ProvisioningError::Provider(OrganizationsError::Service(
            "AccessDeniedException: denied".to_string(),
        ))));
        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, "AccessDeniedException: denied");
    }
}
