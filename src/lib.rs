//! ironbank: a small bank ledger with atomic money transfers.
//!
//! The heart of the crate is [`db::TransferOrchestrator`]: a transfer writes
//! one transfer row, two offsetting entries and two balance updates as a
//! single all-or-nothing transaction. Concurrent transfers between the same
//! pair of accounts cannot deadlock because balance updates always touch the
//! account with the smaller id first.
//!
//! Storage is abstracted behind [`db::LedgerStore`]; [`db::PgStore`] backs
//! production on Postgres and [`db::MemStore`] backs tests with real
//! per-account row locks.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod token;
pub mod util;

pub use config::AppConfig;
pub use db::{
    LedgerStore, LedgerTx, MemStore, PgStore, StoreError, TransferOrchestrator, TransferTxParams,
    TransferTxResult,
};
