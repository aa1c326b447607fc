//! Authentication middleware
//!
//! `basic_auth` resolves `Authorization: Basic ...` into a [`Principal`]
//! stored in the request extensions. `require_authority` then gates a route
//! group on a single authority.
//!
//! Store outages are retried with exponential backoff; every other failure
//! is final for the request.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::{debug, error, warn};

use authn_core::{AuthFailure, AuthorizationPolicy, Principal};

use crate::api::error::ApiError;
use crate::app::AppState;

/// Extract `(identifier, secret)` from a Basic authorization header.
///
/// The secret is everything after the first `:`, so it may itself contain
/// colons.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Basic") {
        return None;
    }

    let decoded = match BASE64.decode(encoded.trim()) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(error = %e, "Invalid base64 in Authorization header");
            return None;
        }
    };

    let credentials = String::from_utf8(decoded).ok()?;
    let (identifier, secret) = credentials.split_once(':')?;
    Some((identifier.to_string(), secret.to_string()))
}

pub async fn basic_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some((identifier, secret)) = basic_credentials(request.headers()) else {
        debug!("No usable Basic credentials");
        return Err(ApiError::unauthorized(&state.realm));
    };

    match authenticate_with_retry(&state, &identifier, &secret).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        Err(failure) => Err(rejection(&state, failure)),
    }
}

async fn authenticate_with_retry(
    state: &AppState,
    identifier: &str,
    secret: &str,
) -> Result<Principal, AuthFailure> {
    let mut retry = 0;

    loop {
        match state.authenticator.authenticate(identifier, secret).await {
            Err(failure) if failure.is_retryable() && retry + 1 < state.retry.attempts => {
                let delay = state.retry.backoff(retry);
                warn!(
                    attempt = retry + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %failure,
                    "Credential store unavailable, retrying"
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            outcome => return outcome,
        }
    }
}

fn rejection(state: &AppState, failure: AuthFailure) -> ApiError {
    match failure {
        AuthFailure::AccountState(reason) if state.reveal_account_state => ApiError::Unauthorized {
            code: reason.code(),
            message: reason.to_string(),
            realm: state.realm.clone(),
        },
        AuthFailure::StoreUnavailable { message } => {
            error!(error = %message, attempts = state.retry.attempts, "Authentication failed, credential store unavailable");
            ApiError::unauthorized(&state.realm)
        }
        _ => ApiError::unauthorized(&state.realm),
    }
}

/// State for one authority gate
#[derive(Clone)]
pub struct AuthorityGate {
    policy: Arc<AuthorizationPolicy>,
    realm: Arc<str>,
    required: &'static str,
}

impl AuthorityGate {
    pub fn new(state: &AppState, required: &'static str) -> Self {
        Self {
            policy: state.policy.clone(),
            realm: state.realm.clone(),
            required,
        }
    }
}

pub async fn require_authority(
    State(gate): State<AuthorityGate>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(principal) = request.extensions().get::<Principal>() else {
        warn!(required = gate.required, "Authority check reached without a principal");
        return Err(ApiError::unauthorized(&gate.realm));
    };

    if !gate.policy.is_authorized(principal, gate.required) {
        return Err(ApiError::forbidden(format!(
            "Authority {} required",
            gate.required
        )));
    }

    Ok(next.run(request).await)
}
