//! Authentication Server
//!
//! HTTP surface over the authentication core. Requests carry HTTP Basic
//! credentials; the authenticated principal is attached to the request and
//! each resource group is gated by one authority.

pub mod api;
pub mod app;

pub use api::build_router;
pub use app::{build_state, AppState, RetryPolicy};
