//! Bearer token verification and claim extraction
//!
//! Verification is modeled as a capability trait so the concrete
//! signature backend can be swapped without touching policy logic.
//! The verifier returns a parsed claim set or fails closed; it never
//! inspects roles itself.

use crate::config::AuthConfig;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Token verification failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("token has expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
}

impl From<jsonwebtoken::errors::Error> for VerificationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => VerificationError::Expired,
            _ => VerificationError::Invalid(err.to_string()),
        }
    }
}

/// Verified claim set of an access token.
///
/// The role containers are kept as raw JSON so that a missing or
/// structurally malformed container degrades to an empty contribution
/// instead of failing verification.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    /// Subject (user identifier at the IdP)
    #[serde(default)]
    pub sub: String,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: Option<i64>,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Realm-level role container: `{"roles": [..]}`
    #[serde(default)]
    pub realm_access: Option<Value>,
    /// Client-level role containers keyed by client id
    #[serde(default)]
    pub resource_access: Option<Value>,
}

impl AccessClaims {
    /// Union of realm-level roles and the roles granted under `client_id`.
    ///
    /// Tokens without either container, without an entry for `client_id`,
    /// or with non-list role values yield an empty set, never an error.
    pub fn role_set(&self, client_id: &str) -> HashSet<String> {
        let mut roles = HashSet::new();

        if let Some(container) = &self.realm_access {
            collect_roles(container, &mut roles);
        }

        if let Some(Value::Object(clients)) = &self.resource_access {
            if let Some(container) = clients.get(client_id) {
                collect_roles(container, &mut roles);
            }
        }

        roles
    }
}

/// Pull string entries out of a `{"roles": [..]}` container.
fn collect_roles(container: &Value, out: &mut HashSet<String>) {
    if let Some(Value::Array(entries)) = container.get("roles") {
        for entry in entries {
            if let Value::String(role) = entry {
                out.insert(role.clone());
            }
        }
    }
}

/// Capability interface for bearer token verification.
///
/// Implementations must fail closed: any token that cannot be fully
/// verified (signature, expiry, structure) is an error, and the caller
/// treats every error uniformly as "not authenticated".
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<AccessClaims, VerificationError>;
}

/// JWT verifier backed by `jsonwebtoken`.
///
/// Uses RS256 when a PEM public key is configured, HS256 with the shared
/// secret otherwise.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let (decoding_key, algorithm) = match config.public_key_pem.as_ref() {
            Some(public_key) => (
                DecodingKey::from_rsa_pem(public_key.as_bytes())
                    .expect("Failed to load JWT public key"),
                Algorithm::RS256,
            ),
            None => (
                DecodingKey::from_secret(config.secret.as_bytes()),
                Algorithm::HS256,
            ),
        };
        Self {
            decoding_key,
            algorithm,
        }
    }

    /// Validation with a strict leeway (5 seconds) instead of the default
    /// 60 seconds, so expired tokens are rejected promptly while minor
    /// clock skew is still tolerated. Audience is not part of the policy.
    fn strict_validation(&self) -> Validation {
        let mut v = Validation::new(self.algorithm);
        v.leeway = 5;
        v.validate_aud = false;
        v
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<AccessClaims, VerificationError> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.strict_validation())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims_with(realm_access: Option<Value>, resource_access: Option<Value>) -> AccessClaims {
        AccessClaims {
            sub: "test-user".to_string(),
            iat: Some(1_000_000),
            exp: 9_999_999_999,
            realm_access,
            resource_access,
        }
    }

    #[test]
    fn test_role_set_from_realm_access() {
        let claims = claims_with(Some(json!({"roles": ["USER", "MANAGER"]})), None);

        let roles = claims.role_set("backend-app");
        assert!(roles.contains("USER"));
        assert!(roles.contains("MANAGER"));
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn test_role_set_from_resource_access() {
        let claims = claims_with(
            None,
            Some(json!({"backend-app": {"roles": ["CONTINENTAL_ROLE_ADMIN"]}})),
        );

        let roles = claims.role_set("backend-app");
        assert!(roles.contains("CONTINENTAL_ROLE_ADMIN"));
        assert_eq!(roles.len(), 1);
    }

    #[test]
    fn test_role_set_union_of_both_sources() {
        let claims = claims_with(
            Some(json!({"roles": ["USER"]})),
            Some(json!({"backend-app": {"roles": ["CONTINENTAL_ROLE_ADMIN"]}})),
        );

        let roles = claims.role_set("backend-app");
        assert!(roles.contains("USER"));
        assert!(roles.contains("CONTINENTAL_ROLE_ADMIN"));
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn test_role_set_ignores_other_clients() {
        let claims = claims_with(
            None,
            Some(json!({"other-app": {"roles": ["CONTINENTAL_ROLE_ADMIN"]}})),
        );

        let roles = claims.role_set("backend-app");
        assert!(roles.is_empty());
    }

    #[test]
    fn test_role_set_empty_without_containers() {
        let claims = claims_with(None, None);
        assert!(claims.role_set("backend-app").is_empty());
    }

    #[test]
    fn test_role_set_tolerates_non_list_roles() {
        let claims = claims_with(
            Some(json!({"roles": "USER"})),
            Some(json!({"backend-app": {"roles": 42}})),
        );

        assert!(claims.role_set("backend-app").is_empty());
    }

    #[test]
    fn test_role_set_tolerates_non_string_entries() {
        let claims = claims_with(Some(json!({"roles": ["USER", 7, null]})), None);

        let roles = claims.role_set("backend-app");
        assert_eq!(roles.len(), 1);
        assert!(roles.contains("USER"));
    }

    #[test]
    fn test_role_set_order_independent() {
        let first = claims_with(Some(json!({"roles": ["USER", "CONTINENTAL_ROLE_ADMIN"]})), None);
        let second = claims_with(Some(json!({"roles": ["CONTINENTAL_ROLE_ADMIN", "USER"]})), None);

        assert_eq!(
            first.role_set("backend-app"),
            second.role_set("backend-app")
        );
    }

    #[test]
    fn test_claims_deserialize_without_role_containers() {
        let json = r#"{"sub": "no-roles-user", "iat": 1000000, "exp": 9999999999}"#;
        let claims: AccessClaims = serde_json::from_str(json).unwrap();

        assert_eq!(claims.sub, "no-roles-user");
        assert!(claims.realm_access.is_none());
        assert!(claims.resource_access.is_none());
    }

    #[test]
    fn test_verification_error_from_expired() {
        let err = jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::ExpiredSignature,
        );
        assert_eq!(VerificationError::from(err), VerificationError::Expired);
    }

    #[test]
    fn test_verifier_rejects_garbage() {
        let config = AuthConfig {
            secret: "test-secret-key-for-jwt-signing-must-be-long".to_string(),
            public_key_pem: None,
            client_id: "backend-app".to_string(),
            admin_role: "CONTINENTAL_ROLE_ADMIN".to_string(),
        };
        let verifier = JwtVerifier::new(&config);

        let result = verifier.verify("not.a.token");
        assert!(matches!(result, Err(VerificationError::Invalid(_))));
    }
}
