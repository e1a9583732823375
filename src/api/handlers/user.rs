//! User registration and login.

use axum::{Json, extract::State};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResult, error_codes, ok};
use crate::db::{CreateUserParams, StoreError, User};
use crate::util::password;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 10))]
    pub password: String,
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
}

/// Sanitized user view: the password hash never leaves the server.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            password_changed_at: user.password_changed_at,
            created_at: user.created_at,
        }
    }
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<UserResponse> {
    req.validate()
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let hashed_password = password::hash_password(&req.password)
        .map_err(|err| ApiError::internal(err.to_string()))?;

    let user = state
        .store
        .create_user(CreateUserParams {
            username: req.username,
            hashed_password,
            full_name: req.full_name,
            email: req.email,
        })
        .await?;

    tracing::info!(username = %user.username, "user created");
    ok(UserResponse::from(user))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 10))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserResponse,
}

/// POST /users/login
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    req.validate()
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let user = match state.store.get_user(&req.username).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            return Err(ApiError::not_found("user not found"));
        }
        Err(err) => return Err(err.into()),
    };

    password::verify_password(&req.password, &user.hashed_password).map_err(|_| {
        ApiError::unauthorized(error_codes::AUTH_FAILED, "invalid username or password")
    })?;

    let (access_token, _) = state
        .token_maker
        .create_token(&user.username, Duration::minutes(state.access_token_minutes))
        .map_err(|err| ApiError::internal(err.to_string()))?;

    ok(LoginResponse {
        access_token,
        user: UserResponse::from(user),
    })
}
