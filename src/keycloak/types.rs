//! Keycloak type definitions
//!
//! Shared type definitions for interacting with the Keycloak Admin API.

use serde::{Deserialize, Serialize};

/// Input for creating a user in Keycloak
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeycloakUserInput {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub enabled: bool,
    pub credentials: Vec<KeycloakCredential>,
}

/// Keycloak credential for user creation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakCredential {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub value: String,
    pub temporary: bool,
}

impl KeycloakCredential {
    /// A permanent password credential.
    pub fn password(value: &str) -> Self {
        Self {
            credential_type: "password".to_string(),
            value: value.to_string(),
            temporary: false,
        }
    }
}

/// Keycloak group representation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
}
