//! Keycloak Admin API integration

mod client;
mod types;

pub use client::{AdminSession, IdpError, KeycloakClient};
pub use types::{CreateKeycloakUserInput, KeycloakCredential, KeycloakGroup};
