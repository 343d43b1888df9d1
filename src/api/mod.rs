//! HTTP handlers for the gateway's resources

pub mod admin;
pub mod health;
pub mod private;
pub mod public;
