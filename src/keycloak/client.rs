//! Keycloak Admin API client
//!
//! Thin client over the Admin REST API: service-account authentication,
//! user creation, group lookup and group membership. Every provisioning
//! call opens its own admin session and drops it when done; sessions are
//! never pooled or shared between calls.

use crate::config::KeycloakConfig;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Failure talking to the Keycloak admin API
#[derive(Error, Debug, Clone)]
pub enum IdpError {
    /// The IdP answered and declined the request
    #[error("identity provider rejected the request ({status}): {reason}")]
    Rejected { status: u16, reason: String },
    /// The IdP could not be reached or answered unusably
    #[error("identity provider transport failure: {0}")]
    Transport(String),
}

/// One authenticated admin session, scoped to a single provisioning call.
#[derive(Debug)]
pub struct AdminSession {
    access_token: String,
}

/// Keycloak Admin API client
#[derive(Clone)]
pub struct KeycloakClient {
    config: KeycloakConfig,
    http_client: Client,
}

impl KeycloakClient {
    /// Create a new Keycloak client
    pub fn new(config: KeycloakConfig) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }

    /// Get the realm name
    pub fn realm(&self) -> &str {
        &self.config.realm
    }

    /// Authenticate the service account against the master realm.
    ///
    /// Any failure here, including a rejected credential, is a transport
    /// error to the caller: no admin session exists and nothing was done.
    pub async fn authenticate(&self) -> Result<AdminSession, IdpError> {
        let token_url = format!(
            "{}/realms/master/protocol/openid-connect/token",
            self.config.url
        );

        let params = [
            ("grant_type", "password"),
            ("client_id", &self.config.admin_client_id),
            ("username", &self.config.admin_username),
            ("password", &self.config.admin_password),
        ];

        let response = self
            .http_client
            .post(&token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| IdpError::Transport(format!("failed to reach token endpoint: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(IdpError::Transport(format!(
                "service account authentication failed: {}",
                status
            )));
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdpError::Transport(format!("failed to parse token response: {}", e)))?;

        Ok(AdminSession {
            access_token: token_response.access_token,
        })
    }

    /// Create a user in the realm and return its identifier.
    ///
    /// The IdP is the source of truth for uniqueness; a conflicting
    /// username surfaces as `Rejected` with the IdP's own status. The
    /// identifier is recovered from the `Location` header and must look
    /// like a Keycloak id; if it cannot be recovered the user record may
    /// still exist (documented limitation, not retried).
    pub async fn create_user(
        &self,
        session: &AdminSession,
        input: &super::CreateKeycloakUserInput,
    ) -> Result<String, IdpError> {
        let url = format!(
            "{}/admin/realms/{}/users",
            self.config.url, self.config.realm
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&session.access_token)
            .json(input)
            .send()
            .await
            .map_err(|e| IdpError::Transport(format!("failed to create user: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let reason = error_reason(response).await;
            return Err(IdpError::Rejected { status, reason });
        }

        let user_id = response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .and_then(|location| location.split('/').next_back())
            .filter(|segment| Uuid::parse_str(segment).is_ok())
            .map(|segment| segment.to_string());

        user_id.ok_or_else(|| IdpError::Rejected {
            status: 500,
            reason: "user record created but no identifier could be recovered from the response"
                .to_string(),
        })
    }

    /// Find a top-level group by exact name.
    pub async fn find_group_by_name(
        &self,
        session: &AdminSession,
        name: &str,
    ) -> Result<super::KeycloakGroup, IdpError> {
        let url = format!(
            "{}/admin/realms/{}/groups?search={}",
            self.config.url, self.config.realm, name
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| IdpError::Transport(format!("failed to look up group: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let reason = error_reason(response).await;
            return Err(IdpError::Rejected { status, reason });
        }

        let groups: Vec<super::KeycloakGroup> = response
            .json()
            .await
            .map_err(|e| IdpError::Transport(format!("failed to parse group list: {}", e)))?;

        groups
            .into_iter()
            .find(|group| group.name == name)
            .ok_or_else(|| IdpError::Rejected {
                status: StatusCode::NOT_FOUND.as_u16(),
                reason: format!("group '{}' not found", name),
            })
    }

    /// Add a user to a group.
    pub async fn add_user_to_group(
        &self,
        session: &AdminSession,
        user_id: &str,
        group_id: &str,
    ) -> Result<(), IdpError> {
        let url = format!(
            "{}/admin/realms/{}/users/{}/groups/{}",
            self.config.url, self.config.realm, user_id, group_id
        );

        let response = self
            .http_client
            .put(&url)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| IdpError::Transport(format!("failed to add user to group: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let reason = error_reason(response).await;
            return Err(IdpError::Rejected { status, reason });
        }

        Ok(())
    }
}

/// Surface the IdP's own error message verbatim when it sends one.
async fn error_reason(response: Response) -> String {
    let status = response.status();

    #[derive(Deserialize)]
    struct KeycloakError {
        #[serde(rename = "errorMessage")]
        error_message: Option<String>,
        error: Option<String>,
    }

    let body = response.text().await.unwrap_or_default();
    if let Ok(parsed) = serde_json::from_str::<KeycloakError>(&body) {
        if let Some(message) = parsed.error_message.or(parsed.error) {
            return message;
        }
    }

    if body.is_empty() {
        status.to_string()
    } else {
        body
    }
}
