//! Account Provisioner HTTP API
//!
//! - `POST /accounts` - create flow
//! - `PUT /accounts?account-id=<id>` - update flow
//! - `GET /health` - liveness
//!
//! Status code and body come straight from the response formatter.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{Provisioner, ProvisioningResponse};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub provisioner: Arc<Provisioner>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateQuery {
    #[serde(rename = "account-id")]
    pub account_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub mode: String,
    pub provider: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/accounts", post(create_account).put(update_account))
        .route("/health", get(health))
        .with_state(state)
}

async fn create_account(State(state): State<AppState>, body: String) -> Response {
    state.provisioner.handle_create(&body).await.into_response()
}

async fn update_account(
    State(state): State<AppState>,
    Query(query): Query<UpdateQuery>,
    body: String,
) -> Response {
    state
        .provisioner
        .handle_update(query.account_id.as_deref(), &body)
        .await
        .into_response()
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: state.provisioner.mode().to_string(),
        provider: state.provisioner.provider_name().to_string(),
    })
}

impl IntoResponse for ProvisioningResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}
