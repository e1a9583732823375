//! Router assembly and the serve loop.

use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use super::handlers::{account, transfer, user};
use super::middleware::bearer_auth;
use super::state::AppState;
use super::types::ApiResponse;

/// Builds the full application router. Everything except registration,
/// login and the health probe requires a bearer token.
pub fn build_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/users", post(user::create_user))
        .route("/users/login", post(user::login_user))
        .route("/health", get(health));

    let private = Router::new()
        .route(
            "/accounts",
            post(account::create_account).get(account::list_accounts),
        )
        .route("/accounts/{id}", get(account::get_account))
        .route("/transfers", post(transfer::create_transfer))
        .route_layer(middleware::from_fn_with_state(state.clone(), bearer_auth));

    public.merge(private).with_state(state)
}

async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}

/// Binds the listener and serves until the shutdown token fires.
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let router = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("server stopped");
    Ok(())
}
