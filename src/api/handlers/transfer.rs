//! Transfer handler: the HTTP boundary in front of the transfer core.
//! Validation (positive amount, currency match, ownership) happens here;
//! the orchestrator only ever sees well-formed parameters.

use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResult, error_codes, ok};
use crate::db::{Account, TransferTxParams, TransferTxResult};
use crate::token::Payload;
use crate::util::currency;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransferRequest {
    pub from_account_id: i64,
    pub to_account_id: i64,
    #[validate(range(min = 1))]
    pub amount: i64,
    pub currency: String,
}

/// POST /transfers
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Payload>,
    Json(req): Json<CreateTransferRequest>,
) -> ApiResult<TransferTxResult> {
    req.validate()
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    if !currency::is_supported(&req.currency) {
        return Err(ApiError::bad_request(format!(
            "unsupported currency {}",
            req.currency
        )));
    }
    if req.from_account_id == req.to_account_id {
        return Err(ApiError::bad_request(
            "source and destination accounts must differ",
        ));
    }

    let from_account = valid_account(&state, req.from_account_id, &req.currency).await?;
    if from_account.owner != auth.username {
        return Err(ApiError::unauthorized(
            error_codes::NOT_OWNER,
            "source account does not belong to the authenticated user",
        ));
    }
    valid_account(&state, req.to_account_id, &req.currency).await?;

    // Child token: process shutdown aborts the transfer with rollback.
    let cancel = state.shutdown.child_token();
    let result = state
        .orchestrator
        .execute_transfer(
            TransferTxParams {
                from_account_id: req.from_account_id,
                to_account_id: req.to_account_id,
                amount: req.amount,
            },
            &cancel,
        )
        .await?;

    tracing::info!(
        transfer_id = result.transfer.id,
        from = result.transfer.from_account_id,
        to = result.transfer.to_account_id,
        amount = result.transfer.amount,
        "transfer committed"
    );
    ok(result)
}

/// The account must exist and carry the stated currency.
async fn valid_account(
    state: &AppState,
    account_id: i64,
    wanted_currency: &str,
) -> Result<Account, ApiError> {
    let account = state.store.get_account(account_id).await?;

    if account.currency != wanted_currency {
        return Err(ApiError {
            status: axum::http::StatusCode::BAD_REQUEST,
            code: error_codes::CURRENCY_MISMATCH,
            msg: format!(
                "account {} currency mismatch: {} vs {}",
                account_id, account.currency, wanted_currency
            ),
        });
    }

    Ok(account)
}
