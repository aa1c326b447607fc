//! Authentication
//!
//! Password hashing and credential verification.

pub mod password_service;
pub mod authenticator;

pub use password_service::{Argon2Config, PasswordService};
pub use authenticator::Authenticator;
