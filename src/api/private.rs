//! Authenticated-tier resource

/// Greeting endpoint for any authenticated principal
pub async fn hello() -> &'static str {
    "Hello PRIVATE"
}
