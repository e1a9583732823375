//! Shared handler state, constructed once at startup.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::db::{LedgerStore, TransferOrchestrator};
use crate::token::TokenMaker;

pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub orchestrator: TransferOrchestrator,
    pub token_maker: Arc<dyn TokenMaker>,
    /// Access token lifetime in minutes.
    pub access_token_minutes: i64,
    /// Root cancellation token; per-request children abort in-flight
    /// transfers when the process shuts down.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        token_maker: Arc<dyn TokenMaker>,
        access_token_minutes: i64,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            orchestrator: TransferOrchestrator::new(store.clone()),
            store,
            token_maker,
            access_token_minutes,
            shutdown,
        }
    }
}
