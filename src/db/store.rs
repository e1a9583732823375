//! Capability traits for the ledger store.
//!
//! `LedgerStore` is the seam between the transfer core and the storage
//! backend: production uses PostgreSQL ([`super::pg::PgStore`]), tests use an
//! in-memory variant ([`super::mem::MemStore`]) that reproduces the same
//! locking contract. Accounts are the only shared mutable resource and are
//! mutated exclusively through a `LedgerTx`, never directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::StoreError;
use super::models::{Account, Entry, Transfer, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountParams {
    pub owner: String,
    pub currency: String,
    pub balance: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreateEntryParams {
    pub account_id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreateTransferParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserParams {
    pub username: String,
    pub hashed_password: String,
    pub full_name: String,
    pub email: String,
}

/// Operations bound to one open transaction. Row locks taken by
/// `add_account_balance` are held until `commit` or `rollback`; an
/// uncommitted transaction dropped on any path (including a panic in the
/// unit of work) rolls back.
#[async_trait]
pub trait LedgerTx: Send {
    /// Insert an immutable transfer row.
    async fn create_transfer(&mut self, arg: CreateTransferParams) -> Result<Transfer, StoreError>;

    /// Insert an immutable ledger entry.
    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, StoreError>;

    /// Atomically add `delta` (may be negative) to the stored balance and
    /// return the resulting row. Executes as a single storage-layer
    /// increment, never read-modify-write in application memory, and takes
    /// the account's row lock.
    async fn add_account_balance(
        &mut self,
        account_id: i64,
        delta: i64,
    ) -> Result<Account, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// The ledger store: transactional scope plus plain reads and inserts that
/// need no multi-step atomicity.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Open a transaction scope.
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError>;

    async fn create_account(&self, arg: CreateAccountParams) -> Result<Account, StoreError>;

    async fn get_account(&self, id: i64) -> Result<Account, StoreError>;

    /// Accounts owned by `owner`, ordered by id.
    async fn list_accounts(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, StoreError>;

    async fn get_transfer(&self, id: i64) -> Result<Transfer, StoreError>;

    /// Transfers where the account appears on either side, ordered by id.
    async fn list_transfers(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transfer>, StoreError>;

    /// Entries against one account, ordered by id.
    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError>;

    async fn create_user(&self, arg: CreateUserParams) -> Result<User, StoreError>;

    async fn get_user(&self, username: &str) -> Result<User, StoreError>;
}
