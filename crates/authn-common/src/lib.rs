//! Shared plumbing for the authentication backend crates.

pub mod logging;

pub use logging::{init_logging, LogFormat};
