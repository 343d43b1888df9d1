//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::jwt::{JwtVerifier, TokenVerifier};
use crate::keycloak::KeycloakClient;
use crate::middleware::{authorize, AuthState};
use crate::policy::RouteTable;
use crate::service::ProvisioningService;
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub provisioning: ProvisioningService,
}

/// Build the gateway router.
///
/// The verifier is injected so tests can run the full pipeline against a
/// locally signed token. The authorization middleware wraps the whole
/// router; CORS sits outside it so browser preflights succeed without
/// credentials.
pub fn build_router(state: AppState, verifier: Arc<dyn TokenVerifier>) -> Router {
    let auth_state = AuthState::new(
        verifier,
        RouteTable::gateway(),
        state.config.auth.client_id.clone(),
        state.config.auth.admin_role.clone(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::health::health))
        .route("/public", get(api::public::hello))
        .route("/private", get(api::private::hello))
        .route("/admin", get(api::admin::hello))
        .route("/admin/user", post(api::admin::create_user))
        .layer(axum::middleware::from_fn_with_state(auth_state, authorize))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the gateway server.
pub async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);

    let keycloak_client = KeycloakClient::new(config.keycloak.clone());
    let provisioning = ProvisioningService::new(
        keycloak_client,
        config.keycloak.default_group.clone(),
    );

    let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtVerifier::new(&config.auth));

    let state = AppState {
        config: config.clone(),
        provisioning,
    };

    let app = build_router(state, verifier);

    let listener = TcpListener::bind(config.http_addr()).await?;
    info!("Gateway listening on {}", config.http_addr());
    axum::serve(listener, app).await?;

    Ok(())
}
