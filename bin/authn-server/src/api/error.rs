//! API error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Message used for every authentication rejection unless account state
/// disclosure is switched on
pub const ACCESS_DENIED: &str = "Access denied";

pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const FORBIDDEN: &str = "FORBIDDEN";
pub const NOT_FOUND: &str = "NOT_FOUND";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Unauthorized {
        code: &'static str,
        message: String,
        realm: Arc<str>,
    },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    NotFound { message: String },
}

impl ApiError {
    /// The uniform rejection: callers cannot tell which check failed
    pub fn unauthorized(realm: &Arc<str>) -> Self {
        Self::Unauthorized {
            code: UNAUTHORIZED,
            message: ACCESS_DENIED.to_string(),
            realm: realm.clone(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, challenge) = match &self {
            ApiError::Unauthorized { code, realm, .. } => {
                (StatusCode::UNAUTHORIZED, *code, Some(basic_challenge(realm)))
            }
            ApiError::Forbidden { .. } => (StatusCode::FORBIDDEN, FORBIDDEN, None),
            ApiError::NotFound { .. } => (StatusCode::NOT_FOUND, NOT_FOUND, None),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(challenge) = challenge {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, challenge);
        }
        response
    }
}

fn basic_challenge(realm: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm))
        .unwrap_or_else(|_| HeaderValue::from_static("Basic"))
}
