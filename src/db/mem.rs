//! In-memory ledger store.
//!
//! Test double for [`PgStore`](super::pg::PgStore) that keeps the same
//! contract: `add_account_balance` takes the account's row lock and holds it
//! until commit or rollback, writes are staged and invisible until commit,
//! and a debit below zero is rejected the way the Postgres CHECK constraint
//! rejects it. Because the locks are real, the orchestrator's ordering
//! protocol is exercised for real by concurrent tests.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::StoreError;
use super::models::{Account, Entry, Transfer, User};
use super::store::{
    CreateAccountParams, CreateEntryParams, CreateTransferParams, CreateUserParams, LedgerStore,
    LedgerTx,
};

#[derive(Debug)]
struct MemInner {
    accounts: DashMap<i64, Arc<Mutex<Account>>>,
    users: DashMap<String, User>,
    transfers: DashMap<i64, Transfer>,
    entries: DashMap<i64, Entry>,
    next_account_id: AtomicI64,
    next_transfer_id: AtomicI64,
    next_entry_id: AtomicI64,
}

#[derive(Debug, Clone)]
pub struct MemStore {
    inner: Arc<MemInner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemInner {
                accounts: DashMap::new(),
                users: DashMap::new(),
                transfers: DashMap::new(),
                entries: DashMap::new(),
                next_account_id: AtomicI64::new(1),
                next_transfer_id: AtomicI64::new(1),
                next_entry_id: AtomicI64::new(1),
            }),
        }
    }

    fn account_cell(&self, id: i64) -> Result<Arc<Mutex<Account>>, StoreError> {
        self.inner
            .accounts
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound)
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        Ok(Box::new(MemTx {
            inner: self.inner.clone(),
            locks: Vec::new(),
            transfers: Vec::new(),
            entries: Vec::new(),
        }))
    }

    async fn create_account(&self, arg: CreateAccountParams) -> Result<Account, StoreError> {
        let id = self.inner.next_account_id.fetch_add(1, Ordering::Relaxed);
        let account = Account {
            id,
            owner: arg.owner,
            currency: arg.currency,
            balance: arg.balance,
            created_at: Utc::now(),
        };
        self.inner
            .accounts
            .insert(id, Arc::new(Mutex::new(account.clone())));
        Ok(account)
    }

    async fn get_account(&self, id: i64) -> Result<Account, StoreError> {
        let cell = self.account_cell(id)?;
        let account = cell.lock().await;
        Ok(account.clone())
    }

    async fn list_accounts(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, StoreError> {
        // Clone the cells out first: a DashMap shard guard must not be held
        // across an await.
        let cells: Vec<Arc<Mutex<Account>>> = self
            .inner
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut accounts = Vec::new();
        for cell in cells {
            let account = cell.lock().await;
            if account.owner == owner {
                accounts.push(account.clone());
            }
        }
        accounts.sort_by_key(|a| a.id);
        Ok(page(accounts, limit, offset))
    }

    async fn get_transfer(&self, id: i64) -> Result<Transfer, StoreError> {
        self.inner
            .transfers
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn list_transfers(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transfer>, StoreError> {
        let mut transfers: Vec<Transfer> = self
            .inner
            .transfers
            .iter()
            .filter(|entry| {
                entry.value().from_account_id == account_id
                    || entry.value().to_account_id == account_id
            })
            .map(|entry| entry.value().clone())
            .collect();
        transfers.sort_by_key(|t| t.id);
        Ok(page(transfers, limit, offset))
    }

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError> {
        let mut entries: Vec<Entry> = self
            .inner
            .entries
            .iter()
            .filter(|entry| entry.value().account_id == account_id)
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by_key(|e| e.id);
        Ok(page(entries, limit, offset))
    }

    async fn create_user(&self, arg: CreateUserParams) -> Result<User, StoreError> {
        if self.inner.users.contains_key(&arg.username) {
            return Err(StoreError::UniqueViolation(format!(
                "username {} already exists",
                arg.username
            )));
        }
        if self
            .inner
            .users
            .iter()
            .any(|entry| entry.value().email == arg.email)
        {
            return Err(StoreError::UniqueViolation(format!(
                "email {} already exists",
                arg.email
            )));
        }
        let now = Utc::now();
        let user = User {
            username: arg.username.clone(),
            hashed_password: arg.hashed_password,
            full_name: arg.full_name,
            email: arg.email,
            password_changed_at: now,
            created_at: now,
        };
        self.inner.users.insert(arg.username, user.clone());
        Ok(user)
    }

    async fn get_user(&self, username: &str) -> Result<User, StoreError> {
        self.inner
            .users
            .get(username)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound)
    }
}

fn page<T>(rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

/// A held row lock plus the staged balance for that account.
struct RowLock {
    guard: OwnedMutexGuard<Account>,
    balance: i64,
}

/// One open transaction. Dropping it without commit releases every row lock
/// with nothing published, which is the rollback behavior.
struct MemTx {
    inner: Arc<MemInner>,
    locks: Vec<RowLock>,
    transfers: Vec<Transfer>,
    entries: Vec<Entry>,
}

impl MemTx {
    fn account_exists(&self, id: i64) -> bool {
        self.inner.accounts.contains_key(&id)
    }
}

#[async_trait]
impl LedgerTx for MemTx {
    async fn create_transfer(&mut self, arg: CreateTransferParams) -> Result<Transfer, StoreError> {
        for id in [arg.from_account_id, arg.to_account_id] {
            if !self.account_exists(id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "account {id} does not exist"
                )));
            }
        }
        let transfer = Transfer {
            id: self.inner.next_transfer_id.fetch_add(1, Ordering::Relaxed),
            from_account_id: arg.from_account_id,
            to_account_id: arg.to_account_id,
            amount: arg.amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, StoreError> {
        if !self.account_exists(arg.account_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "account {} does not exist",
                arg.account_id
            )));
        }
        let entry = Entry {
            id: self.inner.next_entry_id.fetch_add(1, Ordering::Relaxed),
            account_id: arg.account_id,
            amount: arg.amount,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    async fn add_account_balance(
        &mut self,
        account_id: i64,
        delta: i64,
    ) -> Result<Account, StoreError> {
        // Second touch of a row already locked by this transaction: apply
        // the delta to the staged balance instead of re-acquiring the lock.
        if let Some(lock) = self
            .locks
            .iter_mut()
            .find(|lock| lock.guard.id == account_id)
        {
            let balance = lock.balance + delta;
            if balance < 0 {
                return Err(StoreError::InsufficientBalance);
            }
            lock.balance = balance;
            let mut snapshot = lock.guard.clone();
            snapshot.balance = balance;
            return Ok(snapshot);
        }

        let cell = self
            .inner
            .accounts
            .get(&account_id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound)?;

        // Blocks until the current holder commits or rolls back; held until
        // this transaction finishes.
        let guard = cell.lock_owned().await;

        let balance = guard.balance + delta;
        if balance < 0 {
            // Keep the lock until rollback, matching an aborted Postgres
            // transaction that still holds the row lock. The staged balance
            // stays at the current value.
            let current = guard.balance;
            self.locks.push(RowLock {
                guard,
                balance: current,
            });
            return Err(StoreError::InsufficientBalance);
        }

        let mut snapshot = guard.clone();
        snapshot.balance = balance;
        self.locks.push(RowLock { guard, balance });
        Ok(snapshot)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        // Publish staged rows while the account locks are still held so the
        // whole transaction becomes visible atomically.
        for lock in &mut self.locks {
            lock.guard.balance = lock.balance;
        }
        for transfer in self.transfers.drain(..) {
            self.inner.transfers.insert(transfer.id, transfer);
        }
        for entry in self.entries.drain(..) {
            self.inner.entries.insert(entry.id, entry);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // Dropping the guards releases the row locks; staged rows vanish.
        Ok(())
    }
}
