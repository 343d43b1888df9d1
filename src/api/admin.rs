//! Admin-tier resources
//!
//! The middleware has already established the caller as an admin before
//! these handlers run; provisioning itself performs no authorization.

use axum::{extract::State, response::IntoResponse, Extension, Json};
use tracing::info;
use validator::Validate;

use crate::error::Result;
use crate::middleware::Principal;
use crate::server::AppState;
use crate::service::CreateUserRequest;

/// Admin greeting endpoint
pub async fn hello() -> &'static str {
    "Hello ADMIN"
}

/// Provision a new end-user identity in the IdP.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    info!(
        admin = %principal.subject,
        username = %payload.username,
        "provisioning user"
    );

    Ok(state.provisioning.provision(payload).await)
}
