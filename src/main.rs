//! ironbank server entry point.
//!
//! ```text
//! config/{env}.yaml ──▶ AppConfig ──▶ PgStore ──▶ AppState ──▶ axum serve
//! ```
//!
//! Ctrl+C cancels the root shutdown token: the listener stops accepting and
//! in-flight transfers abort with rollback.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use ironbank::api::{self, AppState};
use ironbank::config::AppConfig;
use ironbank::db::PgStore;
use ironbank::logging;
use ironbank::token::JwtMaker;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Port override from the command line (--port argument).
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        config.server.port = port;
    }

    let _log_guard = logging::init_logging(&config);
    tracing::info!(%env, "starting ironbank");

    let store = PgStore::connect(&config.postgres_url).await?;
    store.init_schema().await?;
    store.health_check().await?;
    tracing::info!("database ready");

    let token_maker = JwtMaker::new(&config.token.secret)?;

    let shutdown = CancellationToken::new();
    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            ctrl_c_token.cancel();
        }
    });

    let state = Arc::new(AppState::new(
        Arc::new(store),
        Arc::new(token_maker),
        config.token.access_token_minutes,
        shutdown,
    ));

    api::serve(&config.server_address(), state).await
}
