//! Identity provisioning workflow
//!
//! Creates an end-user identity in the IdP and adds it to the default
//! group, as one strictly ordered workflow with explicit partial-failure
//! outcomes. There is no rollback: a user created before a later step
//! fails stays created, and the outcome says so.

use crate::keycloak::{
    CreateKeycloakUserInput, IdpError, KeycloakClient, KeycloakCredential,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use validator::Validate;

/// User provisioning request, passed through to the IdP unmodified.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Terminal outcome of one provisioning call.
///
/// User creation and group membership are not atomic: `GroupAssignmentFailed`
/// means the user exists without the default group and carries the id needed
/// for manual follow-up.
#[derive(Debug, Clone)]
pub enum ProvisioningOutcome {
    Created { user_id: String },
    IdpRejected { status: u16, reason: String },
    GroupAssignmentFailed { user_id: String, reason: String },
    TransportError { reason: String },
}

impl ProvisioningOutcome {
    /// HTTP status reported to the caller. A rejection carries the IdP's
    /// own status verbatim.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProvisioningOutcome::Created { .. } => StatusCode::CREATED,
            ProvisioningOutcome::IdpRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ProvisioningOutcome::GroupAssignmentFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProvisioningOutcome::TransportError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProvisioningOutcome {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ProvisioningOutcome::Created { user_id } => json!({
                "status": "created",
                "userId": user_id,
            }),
            ProvisioningOutcome::IdpRejected { reason, .. } => json!({
                "status": "rejected",
                "reason": reason,
            }),
            ProvisioningOutcome::GroupAssignmentFailed { user_id, reason } => json!({
                "status": "group_assignment_failed",
                "userId": user_id,
                "reason": reason,
            }),
            ProvisioningOutcome::TransportError { reason } => json!({
                "status": "transport_error",
                "reason": reason,
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Identity provisioning service.
///
/// Trusts its caller: admin authorization happens upstream in the
/// middleware, never here.
#[derive(Clone)]
pub struct ProvisioningService {
    client: KeycloakClient,
    default_group: String,
}

impl ProvisioningService {
    pub fn new(client: KeycloakClient, default_group: String) -> Self {
        Self {
            client,
            default_group,
        }
    }

    /// Run the create-then-join workflow. Every fault folds into an
    /// outcome variant; this function never fails past its signature.
    pub async fn provision(&self, request: CreateUserRequest) -> ProvisioningOutcome {
        // Fresh admin session per call, dropped on every exit path.
        let session = match self.client.authenticate().await {
            Ok(session) => session,
            Err(err) => {
                return ProvisioningOutcome::TransportError {
                    reason: err.to_string(),
                }
            }
        };

        let input = CreateKeycloakUserInput {
            username: request.username.clone(),
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            enabled: true,
            credentials: vec![KeycloakCredential::password(&request.password)],
        };

        let user_id = match self.client.create_user(&session, &input).await {
            Ok(user_id) => user_id,
            Err(IdpError::Rejected { status, reason }) => {
                return ProvisioningOutcome::IdpRejected { status, reason }
            }
            Err(IdpError::Transport(reason)) => {
                return ProvisioningOutcome::TransportError { reason }
            }
        };

        info!(user_id = %user_id, username = %request.username, "user created in realm");

        let group = match self
            .client
            .find_group_by_name(&session, &self.default_group)
            .await
        {
            Ok(group) => group,
            Err(err) => return self.group_assignment_failed(user_id, err),
        };

        if let Err(err) = self
            .client
            .add_user_to_group(&session, &user_id, &group.id)
            .await
        {
            return self.group_assignment_failed(user_id, err);
        }

        ProvisioningOutcome::Created { user_id }
    }

    /// Partial success: the user exists without its default group and
    /// needs manual follow-up.
    fn group_assignment_failed(&self, user_id: String, err: IdpError) -> ProvisioningOutcome {
        warn!(
            user_id = %user_id,
            group = %self.default_group,
            error = %err,
            "user created but group assignment failed; manual follow-up required"
        );
        ProvisioningOutcome::GroupAssignmentFailed {
            user_id,
            reason: err.to_string(),
        }
    }
}
