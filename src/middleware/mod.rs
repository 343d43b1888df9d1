//! HTTP middleware for the Continental Gateway

pub mod auth;

pub use auth::{authorize, AuthState, Principal};
