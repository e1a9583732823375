//! The atomic transfer core.
//!
//! One call to [`TransferOrchestrator::execute_transfer`] creates a transfer
//! row, two offsetting entries, and updates both account balances inside a
//! single transaction scope. Balance updates always acquire the row lock of
//! the account with the smaller id first, so concurrent transfers over the
//! same pair of accounts in opposite directions cannot form a circular wait.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::error::StoreError;
use super::models::{Account, Entry, Transfer};
use super::store::{CreateEntryParams, CreateTransferParams, LedgerStore, LedgerTx};

/// Input of one transfer. Amount must be positive; the HTTP boundary
/// validates that before the core is reached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransferTxParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

/// Composite result of one committed transfer: the transfer row, both
/// entries, and both post-update account snapshots, labeled by logical
/// direction regardless of the lock-acquisition order used to compute them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferTxResult {
    pub transfer: Transfer,
    pub from_account: Account,
    pub to_account: Account,
    pub from_entry: Entry,
    pub to_entry: Entry,
}

/// Scoped acquisition of a transaction: begins, runs the unit of work,
/// commits on success, rolls back on failure or cancellation. A rollback
/// failure is reported together with the original cause. No transaction
/// outlives this call on any exit path.
pub async fn with_transaction<T, F>(
    store: &dyn LedgerStore,
    cancel: &CancellationToken,
    work: F,
) -> Result<T, StoreError>
where
    T: Send,
    F: for<'t> FnOnce(&'t mut dyn LedgerTx) -> BoxFuture<'t, Result<T, StoreError>> + Send,
{
    let mut tx = store.begin().await?;

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::Cancelled),
        res = work(tx.as_mut()) => res,
    };

    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(cause) => match tx.rollback().await {
            Ok(()) => Err(cause),
            Err(rollback) => {
                tracing::error!(cause = %cause, rollback = %rollback, "rollback failed");
                Err(StoreError::RollbackFailed {
                    cause: Box::new(cause),
                    rollback: Box::new(rollback),
                })
            }
        },
    }
}

/// Executes transfers against a [`LedgerStore`]. Safe for arbitrary
/// concurrent callers; the store's row locks are the only blocking point.
#[derive(Clone)]
pub struct TransferOrchestrator {
    store: Arc<dyn LedgerStore>,
}

impl TransferOrchestrator {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Run the full transfer as one all-or-nothing transaction. On failure
    /// no partial state (transfer row, entries, balance change) is visible
    /// to any observer and the triggering error is returned unchanged. If
    /// `cancel` fires before commit the transaction aborts with rollback.
    pub async fn execute_transfer(
        &self,
        arg: TransferTxParams,
        cancel: &CancellationToken,
    ) -> Result<TransferTxResult, StoreError> {
        // Rejected up front: a self-transfer would mint a transfer row and
        // two entries that net to zero on one account, and the ordering rule
        // below degenerates when both ids are equal.
        if arg.from_account_id == arg.to_account_id {
            return Err(StoreError::SelfTransfer(arg.from_account_id));
        }

        tracing::debug!(
            from = arg.from_account_id,
            to = arg.to_account_id,
            amount = arg.amount,
            "executing transfer"
        );

        with_transaction(self.store.as_ref(), cancel, move |tx| {
            apply_transfer(tx, arg).boxed()
        })
        .await
    }
}

/// The unit of work running inside one transaction scope.
async fn apply_transfer(
    tx: &mut dyn LedgerTx,
    arg: TransferTxParams,
) -> Result<TransferTxResult, StoreError> {
    let transfer = tx
        .create_transfer(CreateTransferParams {
            from_account_id: arg.from_account_id,
            to_account_id: arg.to_account_id,
            amount: arg.amount,
        })
        .await?;

    let from_entry = tx
        .create_entry(CreateEntryParams {
            account_id: arg.from_account_id,
            amount: -arg.amount,
        })
        .await?;

    let to_entry = tx
        .create_entry(CreateEntryParams {
            account_id: arg.to_account_id,
            amount: arg.amount,
        })
        .await?;

    // Deadlock avoidance: lock rows in ascending account-id order, a single
    // global total order shared by every concurrent transfer. The deltas are
    // fixed by direction; only the acquisition order varies.
    let (from_account, to_account) = if arg.from_account_id < arg.to_account_id {
        add_money(
            tx,
            arg.from_account_id,
            -arg.amount,
            arg.to_account_id,
            arg.amount,
        )
        .await?
    } else {
        let (to, from) = add_money(
            tx,
            arg.to_account_id,
            arg.amount,
            arg.from_account_id,
            -arg.amount,
        )
        .await?;
        (from, to)
    };

    Ok(TransferTxResult {
        transfer,
        from_account,
        to_account,
        from_entry,
        to_entry,
    })
}

/// Apply two balance deltas in the given order, returning the updated rows
/// in that same order.
async fn add_money(
    tx: &mut dyn LedgerTx,
    account_id1: i64,
    delta1: i64,
    account_id2: i64,
    delta2: i64,
) -> Result<(Account, Account), StoreError> {
    let account1 = tx.add_account_balance(account_id1, delta1).await?;
    let account2 = tx.add_account_balance(account_id2, delta2).await?;
    Ok((account1, account2))
}
