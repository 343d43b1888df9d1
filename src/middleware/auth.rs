//! Authorization middleware
//!
//! Every inbound request passes through here: resolve the resource tier,
//! verify the bearer token, extract roles, apply the access policy, then
//! forward or reject. Verification failures fail soft to "unauthenticated"
//! and the policy step fails closed, so an unauthenticated request to a
//! protected resource is rejected with 401 and an authenticated request
//! lacking the required role with 403.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::error::AppError;
use crate::jwt::TokenVerifier;
use crate::policy::{decide, RouteTable, Tier};

/// Authenticated principal attached to admitted requests.
#[derive(Debug, Clone)]
pub struct Principal {
    /// Subject claim of the verified token
    pub subject: String,
    /// Effective role set derived from the token
    pub roles: HashSet<String>,
}

/// Shared state for the authorization middleware
#[derive(Clone)]
pub struct AuthState {
    verifier: Arc<dyn TokenVerifier>,
    routes: Arc<RouteTable>,
    client_id: String,
    admin_role: String,
}

impl AuthState {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        routes: RouteTable,
        client_id: String,
        admin_role: String,
    ) -> Self {
        Self {
            verifier,
            routes: Arc::new(routes),
            client_id,
            admin_role,
        }
    }
}

/// Authorization enforcement middleware.
///
/// Applied to the whole router, including requests that match no route,
/// so unknown paths get the default authenticated tier instead of
/// falling through unprotected.
pub async fn authorize(
    State(auth): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let tier = auth.routes.tier(&path);

    // Public resources never inspect the token, malformed or not.
    if tier == Tier::Public {
        return next.run(request).await;
    }

    let claims = bearer_token(request.headers())
        .and_then(|token| match auth.verifier.verify(token) {
            Ok(claims) => Some(claims),
            Err(err) => {
                debug!(path = %path, error = %err, "token verification failed");
                None
            }
        });

    let is_authenticated = claims.is_some();
    let (subject, roles) = match &claims {
        Some(claims) => (claims.sub.clone(), claims.role_set(&auth.client_id)),
        None => (String::new(), HashSet::new()),
    };

    let decision = decide(tier, &roles, is_authenticated, &auth.admin_role);

    if !decision.allowed {
        debug!(path = %path, reason = decision.reason, "request rejected");
        return if is_authenticated {
            AppError::Forbidden(decision.reason.to_string()).into_response()
        } else {
            AppError::Unauthorized(decision.reason.to_string()).into_response()
        };
    }

    request.extensions_mut().insert(Principal { subject, roles });
    next.run(request).await
}

/// Extract the bearer token from the Authorization header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}
