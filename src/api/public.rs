//! Public resource, reachable without a token

/// Public greeting endpoint
pub async fn hello() -> &'static str {
    "Hello PUBLIC"
}
