//! Account Provisioning
//!
//! Two request flows over an [`ap_organizations::OrganizationsApi`] provider:
//!
//! - **create**: parse -> validate name -> create account -> poll status ->
//!   resolve OU -> move -> tag -> respond
//! - **update**: parse -> re-validate against the live account -> untag ->
//!   tag -> respond
//!
//! Outside production every provider-mutating step is skipped and sentinel
//! ids are returned, while parsing, validation and formatting run unchanged.

pub mod account;
pub mod api;
pub mod error;
pub mod handler;
pub mod placement;
pub mod response;
pub mod tagging;
pub mod validation;

pub use account::{
    account_email, create_account, StatusPoller, NON_PRODUCTION_ACCOUNT_ID,
    NON_PRODUCTION_REQUEST_ID,
};
pub use api::{create_router, AppState};
pub use error::ProvisioningError;
pub use handler::Provisioner;
pub use placement::{resolve_placement, move_account, Placement};
pub use response::{format_response, ProvisioningResponse};
pub use tagging::{tag_account, untag_account};
pub use validation::{parse_payload, validate_identity, validate_payload, AccountName};

pub type Result<T> = std::result::Result<T, ProvisioningError>;
