//! Ledger storage: row types, the store capability traits, the transfer
//! core, and the two store implementations (PostgreSQL and in-memory).

pub mod error;
pub mod mem;
pub mod models;
pub mod pg;
pub mod store;
pub mod transfer;

pub use error::StoreError;
pub use mem::MemStore;
pub use models::{Account, Entry, Transfer, User};
pub use pg::PgStore;
pub use store::{
    CreateAccountParams, CreateEntryParams, CreateTransferParams, CreateUserParams, LedgerStore,
    LedgerTx,
};
pub use transfer::{TransferOrchestrator, TransferTxParams, TransferTxResult, with_transaction};
