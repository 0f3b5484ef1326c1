//! OU resolution and account moves
//!
//! Hierarchy: root -> parent OU per line of business (dedicated mapping or
//! the shared workload OU) -> OU per environment. Lines of business without a
//! dedicated mapping get one more level: an OU named after the lob beneath
//! the environment OU.

use ap_common::{AccountPayload, RuntimeMode};
use ap_config::ProvisioningConfig;
use ap_organizations::{OrganizationsApi, OrganizationsError};
use tracing::{debug, info, warn};

use crate::validation::equal_fold;
use crate::{ProvisioningError, Result};

/// Where a new account is moved from and to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub root_id: String,
    /// Empty when no destination was found outside production.
    pub destination_ou: String,
}

/// Resolve the root and destination OU for a payload.
///
/// An unresolved destination is an error in production only.
pub async fn resolve_placement(
    org: &dyn OrganizationsApi,
    mode: RuntimeMode,
    config: &ProvisioningConfig,
    payload: &AccountPayload,
) -> Result<Placement> {
    let parent_ou = config.parent_ou_for(&payload.lob);
    debug!(lob = %payload.lob, parent_ou, "Selected parent OU");

    let (root_id, env_ou) = find_env_ou(org, parent_ou, &payload.env).await?;
    let destination_ou = determine_destination_ou(org, config, &env_ou, &payload.lob).await?;

    if destination_ou.is_empty() {
        if mode.is_production() {
            return Err(ProvisioningError::OuNotFound {
                lob: payload.lob.clone(),
                env: payload.env.clone(),
            });
        }
        warn!(lob = %payload.lob, env = %payload.env, "Destination OU not found, ignored outside production");
    }

    info!(root_id = %root_id, destination_ou = %destination_ou, "Resolved account placement");
    Ok(Placement {
        root_id,
        destination_ou,
    })
}

/// First root plus the child of `parent_ou` named `env` (any case).
/// The env OU is empty when no child matches.
pub async fn find_env_ou(
    org: &dyn OrganizationsApi,
    parent_ou: &str,
    env: &str,
) -> Result<(String, String)> {
    let root_id = org
        .list_roots()
        .await?
        .into_iter()
        .next()
        .map(|root| root.id)
        .ok_or(OrganizationsError::MissingField("organization root"))?;

    let env_ou = org
        .list_organizational_units_for_parent(parent_ou)
        .await?
        .into_iter()
        .find(|ou| equal_fold(&ou.name, env))
        .map(|ou| ou.id)
        .unwrap_or_default();

    Ok((root_id, env_ou))
}

/// The env OU itself for dedicated lobs, otherwise its child named exactly
/// `lob`. Empty when nothing matches.
pub async fn determine_destination_ou(
    org: &dyn OrganizationsApi,
    config: &ProvisioningConfig,
    env_ou: &str,
    lob: &str,
) -> Result<String> {
    if config.has_dedicated_ou(lob) {
        return Ok(env_ou.to_string());
    }
    if env_ou.is_empty() {
        return Ok(String::new());
    }

    Ok(org
        .list_organizational_units_for_parent(env_ou)
        .await?
        .into_iter()
        .find(|ou| ou.name == lob)
        .map(|ou| ou.id)
        .unwrap_or_default())
}

/// Move the account from the root to its destination OU.
pub async fn move_account(
    org: &dyn OrganizationsApi,
    mode: RuntimeMode,
    account_id: &str,
    placement: &Placement,
) -> Result<()> {
    if !mode.is_production() {
        info!(%mode, "Account move skipped outside production");
        return Ok(());
    }

    org.move_account(account_id, &placement.root_id, &placement.destination_ou)
        .await?;
    info!(account_id, destination_ou = %placement.destination_ou, "Account moved");
    Ok(())
}
