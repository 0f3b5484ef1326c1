use ap_organizations::OrganizationsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisioningError {
    #[error("Invalid request body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed account name '{name}': expected provider_lob_name_env")]
    MalformedName { name: String },

    #[error("{0}")]
    Validation(String),

    #[error("Query parameter account-id is required")]
    MissingAccountId,

    #[error(transparent)]
    Provider(#[from] OrganizationsError),

    #[error("{0}")]
    CreationFailed(String),

    #[error("Account creation {request_id} still in progress after {attempts} status checks")]
    PollLimitExceeded { request_id: String, attempts: u32 },

    #[error("Destination OU not found for lob '{lob}' and env '{env}'")]
    OuNotFound { lob: String, env: String },

    #[error("Failed to serialize response: {0}")]
    Serialization(serde_json::Error),
}

impl ProvisioningError {
    /// Caller supplied input that can never succeed as sent.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ProvisioningError::Parse(_)
                | ProvisioningError::MalformedName { .. }
                | ProvisioningError::Validation(_)
                | ProvisioningError::MissingAccountId
        )
    }

    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }
}
