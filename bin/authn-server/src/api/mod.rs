//! REST API
//!
//! | Route | Access |
//! |-------|--------|
//! | `GET /health` | public |
//! | `GET /api/user/` | `USER` |
//! | `GET /api/admin/` | `ADMIN` |
//! | `/api/user/*` | `USER`, then 404 |
//! | `/api/admin/*` | `ADMIN`, then 404 |
//! | anything else | authenticated, then 404 |

pub mod auth;
pub mod error;
pub mod handlers;

use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use authn_core::authorities;

use crate::app::AppState;
use auth::{basic_auth, require_authority, AuthorityGate};

pub use error::{ApiError, ErrorResponse};

/// Assemble the full application router
pub fn build_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/api/user", get(handlers::user_controller))
        .route("/api/user/", get(handlers::user_controller))
        .route("/api/user/{*rest}", any(handlers::not_found))
        .route_layer(middleware::from_fn_with_state(
            AuthorityGate::new(&state, authorities::USER),
            require_authority,
        ));

    let admin_routes = Router::new()
        .route("/api/admin", get(handlers::admin_controller))
        .route("/api/admin/", get(handlers::admin_controller))
        .route("/api/admin/{*rest}", any(handlers::not_found))
        .route_layer(middleware::from_fn_with_state(
            AuthorityGate::new(&state, authorities::ADMIN),
            require_authority,
        ));

    // Authentication wraps the fallback too, so every path except /health
    // is challenged before anything is resolved.
    let protected = Router::new()
        .merge(user_routes)
        .merge(admin_routes)
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state, basic_auth));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}
