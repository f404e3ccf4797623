//! HTTP API over the wallet ledger, booking gate and session meter.
//!
//! All routes live under `/api/v1`. The calling user is identified per
//! request by the `x-user-id` header (see [`context::UserContext`]).

pub mod context;
pub mod error;
pub mod handlers;
pub mod types;

use crate::{config::settings::BillingConfig, errors::Result};
use axum::{
    Router,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use std::{future::Future, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Billing rules
    pub billing: Arc<BillingConfig>,
}

/// Build the axum router with all API routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/wallet", post(handlers::open_wallet))
        .route("/api/v1/wallet/balance", get(handlers::get_balance))
        .route("/api/v1/wallet/credit", post(handlers::credit))
        .route("/api/v1/wallet/debit", post(handlers::debit))
        .route(
            "/api/v1/wallet/transactions",
            get(handlers::list_transactions),
        )
        .route("/api/v1/mentors/{id}/rate", put(handlers::set_rate))
        .route("/api/v1/mentors/{id}/quote", get(handlers::quote))
        .route("/api/v1/bookings/confirm", post(handlers::confirm_booking))
        .route("/api/v1/sessions/{id}", get(handlers::get_session))
        .route("/api/v1/sessions/{id}/start", post(handlers::start_session))
        .route("/api/v1/sessions/{id}/end", post(handlers::end_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `addr` until `shutdown` resolves.
pub async fn serve<F>(addr: &str, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
