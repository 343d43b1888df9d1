//! Configuration management for the Continental Gateway

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Token verification and policy configuration
    pub auth: AuthConfig,
    /// Keycloak admin API configuration
    pub keycloak: KeycloakConfig,
}

/// Token verification and access policy configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 shared secret used when no RSA public key is configured
    pub secret: String,
    /// PEM-encoded RSA public key for RS256 verification
    pub public_key_pem: Option<String>,
    /// Client identifier whose `resource_access` entry contributes roles
    pub client_id: String,
    /// Role identifier that grants access to admin-tier resources
    pub admin_role: String,
}

/// Keycloak admin API configuration
#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    /// Base URL of the Keycloak server (e.g., http://keycloak:8080)
    pub url: String,
    /// Realm that holds the gateway's end users
    pub realm: String,
    /// Service-account username for the admin API
    pub admin_username: String,
    /// Service-account password for the admin API
    pub admin_password: String,
    /// Client id used for the service-account password grant
    pub admin_client_id: String,
    /// Pre-existing group every provisioned user joins
    pub default_group: String,
    /// Timeout applied to every admin API call, in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            auth: AuthConfig {
                secret: env::var("JWT_SECRET").context("JWT_SECRET is required")?,
                public_key_pem: env::var("JWT_PUBLIC_KEY")
                    .ok()
                    .map(|value| value.replace("\\n", "\n")),
                client_id: env::var("AUTH_CLIENT_ID")
                    .unwrap_or_else(|_| "backend-app".to_string()),
                admin_role: env::var("AUTH_ADMIN_ROLE")
                    .unwrap_or_else(|_| "CONTINENTAL_ROLE_ADMIN".to_string()),
            },
            keycloak: KeycloakConfig {
                url: env::var("KEYCLOAK_URL")
                    .unwrap_or_else(|_| "http://localhost:8081".to_string()),
                realm: env::var("KEYCLOAK_REALM").unwrap_or_else(|_| "continental".to_string()),
                admin_username: env::var("KEYCLOAK_ADMIN_USERNAME")
                    .context("KEYCLOAK_ADMIN_USERNAME is required")?,
                admin_password: env::var("KEYCLOAK_ADMIN_PASSWORD")
                    .context("KEYCLOAK_ADMIN_PASSWORD is required")?,
                admin_client_id: env::var("KEYCLOAK_ADMIN_CLIENT_ID")
                    .unwrap_or_else(|_| "admin-cli".to_string()),
                default_group: env::var("KEYCLOAK_DEFAULT_GROUP")
                    .unwrap_or_else(|_| "CONTINENTAL_GROUP_USER".to_string()),
                timeout_secs: env::var("KEYCLOAK_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
