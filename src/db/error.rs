//! Store error taxonomy.
//!
//! The transfer core performs no recovery: every failure aborts the whole
//! transaction and propagates unchanged. The HTTP boundary translates these
//! into status codes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested row does not exist.
    #[error("record not found")]
    NotFound,

    /// A debit would have driven an account balance below zero.
    /// Enforced by the store constraint, not computed by the orchestrator.
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Unique constraint rejected an insert (duplicate username/email).
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint rejected an insert (unknown account id).
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// Source and destination of a transfer are the same account.
    #[error("transfer source and destination are the same account ({0})")]
    SelfTransfer(i64),

    /// The caller's cancellation signal fired before commit.
    #[error("operation cancelled before commit")]
    Cancelled,

    /// The transaction failed and the rollback failed too. Both errors are
    /// kept so no information is lost.
    #[error("transaction error: {cause}; rollback error: {rollback}")]
    RollbackFailed {
        cause: Box<StoreError>,
        rollback: Box<StoreError>,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Classify a sqlx error into the store taxonomy by SQLSTATE.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return StoreError::NotFound;
        }
        if let sqlx::Error::Database(ref db) = err {
            match db.code().as_deref() {
                Some("23505") => return StoreError::UniqueViolation(db.message().to_string()),
                Some("23503") => return StoreError::ForeignKeyViolation(db.message().to_string()),
                Some("23514") => return StoreError::InsufficientBalance,
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}
