//! Background meter loop.
//!
//! Billing is driven from the server clock: every `tick_interval_secs` the
//! loop bills all active sessions, whether or not any client is connected.

use crate::{config::settings::BillingConfig, core::meter};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, error, info};

/// Spawns the meter loop. It exits once `shutdown` flips to `true` or its
/// sender is dropped.
#[must_use]
pub fn spawn_meter(
    db: DatabaseConnection,
    config: Arc<BillingConfig>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_secs(config.tick_interval_secs.max(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Session meter running every {:?}", period);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match meter::tick_all_active(&db, &config, Utc::now()).await {
                        Ok(outcomes) if !outcomes.is_empty() => {
                            debug!("Billed {} active session(s)", outcomes.len());
                        }
                        Ok(_) => {}
                        Err(e) => error!("Meter pass failed: {}", e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Session meter stopping");
                        break;
                    }
                }
            }
        }
    })
}
