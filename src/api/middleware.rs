//! Bearer token authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::state::AppState;
use super::types::{ApiError, error_codes};

const BEARER: &str = "bearer";

/// Verifies `Authorization: Bearer <token>` and injects the token payload
/// into request extensions for downstream handlers.
pub async fn bearer_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            ApiError::unauthorized(error_codes::MISSING_AUTH, "authorization header is not provided")
        })?;

    let mut fields = header_value.split_whitespace();
    let auth_type = fields.next().unwrap_or_default();
    let token = fields.next().ok_or_else(|| {
        ApiError::unauthorized(error_codes::AUTH_FAILED, "invalid authorization header format")
    })?;

    if !auth_type.eq_ignore_ascii_case(BEARER) {
        return Err(ApiError::unauthorized(
            error_codes::AUTH_FAILED,
            format!("unsupported authorization type {auth_type}"),
        ));
    }

    let payload = state.token_maker.verify_token(token)?;
    request.extensions_mut().insert(payload);
    Ok(next.run(request).await)
}
