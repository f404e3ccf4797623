use dotenvy::dotenv;
use mentor_ledger::{
    api::{self, AppState},
    config::{database, settings},
    errors::Result,
    scheduler,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load billing and server settings
    let settings = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema ready"))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Start the session meter
    let billing = Arc::new(settings.billing);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let meter = scheduler::spawn_meter(db.clone(), Arc::clone(&billing), shutdown_rx);

    // 6. Serve the API until Ctrl+C
    let state = AppState { db, billing };
    let served = api::serve(&settings.server.bind_addr, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown requested");
    })
    .await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = meter.await {
        error!("Session meter task failed: {}", e);
    }

    served
}
