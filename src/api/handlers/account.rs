//! Account handlers. All routes here sit behind the bearer-auth layer; the
//! authenticated username arrives through request extensions.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResult, error_codes, ok};
use crate::db::{Account, CreateAccountParams};
use crate::token::Payload;
use crate::util::currency;

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub currency: String,
}

/// POST /accounts. The owner is always the authenticated user and the
/// initial balance is zero.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Payload>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<Account> {
    if !currency::is_supported(&req.currency) {
        return Err(ApiError::bad_request(format!(
            "unsupported currency {}",
            req.currency
        )));
    }

    let account = state
        .store
        .create_account(CreateAccountParams {
            owner: auth.username,
            currency: req.currency,
            balance: 0,
        })
        .await?;

    tracing::info!(account_id = account.id, owner = %account.owner, "account created");
    ok(account)
}

/// GET /accounts/{id}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Payload>,
    Path(id): Path<i64>,
) -> ApiResult<Account> {
    let account = state.store.get_account(id).await?;

    if account.owner != auth.username {
        return Err(ApiError::unauthorized(
            error_codes::NOT_OWNER,
            "account does not belong to the authenticated user",
        ));
    }

    ok(account)
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListAccountsQuery {
    #[validate(range(min = 1))]
    pub page_id: i64,
    #[validate(range(min = 1, max = 10))]
    pub page_size: i64,
}

/// GET /accounts?page_id=1&page_size=5, restricted to the caller's own
/// accounts.
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Payload>,
    Query(query): Query<ListAccountsQuery>,
) -> ApiResult<Vec<Account>> {
    query
        .validate()
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let accounts = state
        .store
        .list_accounts(
            &auth.username,
            query.page_size,
            (query.page_id - 1) * query.page_size,
        )
        .await?;

    ok(accounts)
}
