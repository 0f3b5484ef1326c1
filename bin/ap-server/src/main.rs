//! Account Provisioner Server
//!
//! Serves the create and update provisioning flows over HTTP.
//!
//! ## Modes
//!
//! - `RUNTIME_ENV=prod`: AWS Organizations client, optionally assuming
//!   `ASSUME_ROLE_ARN`. Accounts are really created, moved and tagged.
//! - anything else: in-memory provider seeded with a single root and a fixed
//!   account name. No provider state is changed.

use std::sync::Arc;

use anyhow::Result;
use ap_config::{ConfigLoader, ProvisioningConfig};
use ap_organizations::{AwsOrganizationsClient, InMemoryOrganizations, OrganizationsApi};
use ap_provisioning::{create_router, AppState, Provisioner};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for local development)
    let _ = dotenvy::dotenv();

    ap_common::logging::init_logging("ap-server");

    let config = ConfigLoader::new().load()?;
    let mode = config.mode();
    info!(%mode, "Starting Account Provisioner");

    let org = build_provider(&config).await;
    info!(provider = org.name(), "Organizations provider ready");

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let provisioner = Arc::new(Provisioner::new(org, config));

    let app = create_router(AppState { provisioner }).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Account Provisioner stopped");
    Ok(())
}

async fn build_provider(config: &ProvisioningConfig) -> Arc<dyn OrganizationsApi> {
    if config.mode().is_production() {
        info!("Production mode, using AWS Organizations");
        let client = AwsOrganizationsClient::new(
            config.aws_region.clone(),
            config.assume_role_arn.clone(),
        )
        .await;
        Arc::new(client)
    } else {
        info!(
            root_id = %config.offline.root_id,
            account_name = %config.offline.account_name,
            "Non-production mode, using in-memory organization"
        );
        Arc::new(
            InMemoryOrganizations::new()
                .with_root(&config.offline.root_id)
                .with_fallback_account_name(&config.offline.account_name),
        )
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
