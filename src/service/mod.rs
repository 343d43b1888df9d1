//! Business services

pub mod provision;

pub use provision::{CreateUserRequest, ProvisioningOutcome, ProvisioningService};
