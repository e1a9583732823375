//! API response envelope and error mapping.
//!
//! Every response follows `{code, msg, data}`: code 0 for success, a stable
//! non-zero code for errors. Store errors are translated here; the ledger
//! core itself never knows about status codes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::db::StoreError;
use crate::token::TokenError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// 0 for success, non-zero error code otherwise.
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }
}

/// Stable API error codes.
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    pub const CURRENCY_MISMATCH: i32 = 1003;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;
    pub const NOT_OWNER: i32 = 2003;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4001;
    pub const CONSTRAINT_VIOLATION: i32 = 4002;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: error_codes::INVALID_PARAMETER,
            msg: msg.into(),
        }
    }

    pub fn unauthorized(code: i32, msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code,
            msg: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: error_codes::NOT_FOUND,
            msg: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: error_codes::INTERNAL_ERROR,
            msg: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            code: self.code,
            msg: self.msg,
            data: None,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::not_found("record not found"),
            StoreError::InsufficientBalance => Self {
                status: StatusCode::BAD_REQUEST,
                code: error_codes::INSUFFICIENT_BALANCE,
                msg: err.to_string(),
            },
            StoreError::SelfTransfer(_) => ApiError::bad_request(err.to_string()),
            StoreError::UniqueViolation(_) | StoreError::ForeignKeyViolation(_) => Self {
                status: StatusCode::FORBIDDEN,
                code: error_codes::CONSTRAINT_VIOLATION,
                msg: err.to_string(),
            },
            StoreError::Cancelled => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                code: error_codes::SERVICE_UNAVAILABLE,
                msg: err.to_string(),
            },
            StoreError::RollbackFailed { .. } | StoreError::Database(_) => {
                tracing::error!(error = %err, "store error");
                ApiError::internal("internal error")
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::unauthorized(error_codes::AUTH_FAILED, err.to_string())
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}
