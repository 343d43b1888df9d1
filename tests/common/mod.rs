//! Common test utilities
#![allow(dead_code)]

use continental_gateway::config::{AuthConfig, Config, KeycloakConfig};
use continental_gateway::jwt::{JwtVerifier, TokenVerifier};
use continental_gateway::keycloak::KeycloakClient;
use continental_gateway::server::{build_router, AppState};
use continental_gateway::service::ProvisioningService;

use axum::Router;
use std::sync::Arc;

pub const TEST_SECRET: &str = "test-secret-key-for-jwt-signing-must-be-long";
pub const TEST_CLIENT_ID: &str = "backend-app";
pub const ADMIN_ROLE: &str = "CONTINENTAL_ROLE_ADMIN";
pub const DEFAULT_GROUP: &str = "CONTINENTAL_GROUP_USER";

/// Configuration pointing the IdP client at `keycloak_url`.
pub fn test_config(keycloak_url: &str) -> Config {
    Config {
        http_host: "127.0.0.1".to_string(),
        http_port: 0,
        auth: AuthConfig {
            secret: TEST_SECRET.to_string(),
            public_key_pem: None,
            client_id: TEST_CLIENT_ID.to_string(),
            admin_role: ADMIN_ROLE.to_string(),
        },
        keycloak: test_keycloak_config(keycloak_url),
    }
}

pub fn test_keycloak_config(keycloak_url: &str) -> KeycloakConfig {
    KeycloakConfig {
        url: keycloak_url.to_string(),
        realm: "continental".to_string(),
        admin_username: "svc-admin".to_string(),
        admin_password: "svc-password".to_string(),
        admin_client_id: "admin-cli".to_string(),
        default_group: DEFAULT_GROUP.to_string(),
        timeout_secs: 5,
    }
}

/// Build the full gateway router against `keycloak_url`.
pub fn test_app(keycloak_url: &str) -> Router {
    let config = Arc::new(test_config(keycloak_url));
    let keycloak_client = KeycloakClient::new(config.keycloak.clone());
    let provisioning =
        ProvisioningService::new(keycloak_client, config.keycloak.default_group.clone());
    let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtVerifier::new(&config.auth));

    build_router(
        AppState {
            config,
            provisioning,
        },
        verifier,
    )
}

/// Token minting helpers mirroring the shapes the IdP issues.
pub mod tokens {
    use super::TEST_SECRET;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};

    fn sign(claims: Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn timestamps() -> (i64, i64) {
        let now = Utc::now();
        (now.timestamp(), (now + Duration::hours(1)).timestamp())
    }

    /// Token carrying realm-level roles.
    pub fn with_realm_roles(subject: &str, roles: &[&str]) -> String {
        let (iat, exp) = timestamps();
        sign(json!({
            "sub": subject,
            "iat": iat,
            "exp": exp,
            "realm_access": {"roles": roles},
        }))
    }

    /// Token for an ordinary user.
    pub fn user() -> String {
        with_realm_roles("user", &["USER"])
    }

    /// Token carrying the admin role.
    pub fn admin() -> String {
        with_realm_roles("admin", &["CONTINENTAL_ROLE_ADMIN"])
    }

    /// Token carrying the admin role among others.
    pub fn multi_role() -> String {
        with_realm_roles("multi-role-user", &["USER", "CONTINENTAL_ROLE_ADMIN", "MANAGER"])
    }

    /// Token granting admin only through the client-level container.
    pub fn resource_admin() -> String {
        let (iat, exp) = timestamps();
        sign(json!({
            "sub": "resource-admin",
            "iat": iat,
            "exp": exp,
            "resource_access": {
                "backend-app": {"roles": ["CONTINENTAL_ROLE_ADMIN"]}
            },
        }))
    }

    /// Structurally valid token with no role containers at all.
    pub fn no_roles() -> String {
        let (iat, exp) = timestamps();
        sign(json!({
            "sub": "no-roles-user",
            "iat": iat,
            "exp": exp,
        }))
    }

    /// Token issued 90 minutes ago that expired 30 minutes ago.
    pub fn expired() -> String {
        let past = Utc::now() - Duration::minutes(90);
        sign(json!({
            "sub": "expired-user",
            "iat": past.timestamp(),
            "exp": (past + Duration::minutes(60)).timestamp(),
            "realm_access": {"roles": ["USER"]},
        }))
    }
}
