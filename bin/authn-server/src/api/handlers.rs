//! Resource handlers

use axum::{http::Uri, response::Json, Extension};
use tracing::debug;

use authn_core::Principal;

use crate::api::error::ApiError;

pub const USER_GREETING: &str =
    "You have reached User Controller. Congratulations you have User Level Access !!!";
pub const ADMIN_GREETING: &str =
    "You have reached Admin Controller. Congratulations you have Admin Level Access !!!";

pub async fn user_controller(Extension(principal): Extension<Principal>) -> &'static str {
    debug!(identifier = %principal.identifier(), "Serving user resource");
    USER_GREETING
}

pub async fn admin_controller(Extension(principal): Extension<Principal>) -> &'static str {
    debug!(identifier = %principal.identifier(), "Serving admin resource");
    ADMIN_GREETING
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Authenticated request for a path with no resource
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No resource at {}", uri.path()))
}
