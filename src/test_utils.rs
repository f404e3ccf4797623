//! Shared test utilities for the billing ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating wallets, mentors, and sessions with sensible defaults.

use crate::{
    config::settings::BillingConfig,
    core::{mentor, meter, money::Money, wallet},
    entities::{self, EntryKind},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

/// Owner of the wallet created by [`setup_with_wallet`].
pub const TEST_OWNER: &str = "student-1";

/// Mentor created by [`setup_with_wallet_and_mentor`], charging 600.00/hour.
pub const TEST_MENTOR: &str = "mentor-1";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Billing rules used by tests: the product defaults (100.00 signup bonus,
/// 50.00 low-balance floor, 100.00 join threshold, hard stop on exhaustion).
#[must_use]
pub fn test_billing_config() -> BillingConfig {
    BillingConfig::default()
}

/// Opens a wallet with the default 100.00 signup bonus.
pub async fn create_test_wallet(
    db: &DatabaseConnection,
    owner_id: &str,
) -> Result<entities::wallet::Model> {
    wallet::open_wallet(db, owner_id, Money::from_major(100)).await
}

/// Registers a mentor charging `hourly_major` whole currency units per hour.
pub async fn create_test_mentor(
    db: &DatabaseConnection,
    mentor_id: &str,
    hourly_major: i64,
) -> Result<entities::mentor_rate::Model> {
    mentor::set_hourly_rate(db, mentor_id, Money::from_major(hourly_major)).await
}

/// Sets up a database with one wallet for [`TEST_OWNER`].
pub async fn setup_with_wallet() -> Result<(DatabaseConnection, entities::wallet::Model)> {
    let db = setup_test_db().await?;
    let wallet = create_test_wallet(&db, TEST_OWNER).await?;
    Ok((db, wallet))
}

/// Sets up a wallet for [`TEST_OWNER`] and [`TEST_MENTOR`] at 600.00/hour
/// (10.00/minute).
pub async fn setup_with_wallet_and_mentor() -> Result<(DatabaseConnection, entities::wallet::Model)>
{
    let (db, wallet) = setup_with_wallet().await?;
    create_test_mentor(&db, TEST_MENTOR, 600).await?;
    Ok((db, wallet))
}

/// Starts a session paid by [`TEST_OWNER`] with [`TEST_MENTOR`].
pub async fn start_test_session(
    db: &DatabaseConnection,
    config: &BillingConfig,
    session_id: &str,
    started_at: DateTime<Utc>,
) -> Result<entities::billing_session::Model> {
    meter::start_session(db, config, session_id, TEST_OWNER, TEST_MENTOR, started_at).await
}

/// Counts the per-minute session charges recorded for `owner_id`.
pub async fn count_session_charges(db: &DatabaseConnection, owner_id: &str) -> Result<usize> {
    let entries = wallet::list_entries(db, owner_id, None).await?;
    Ok(entries
        .iter()
        .filter(|e| e.kind == EntryKind::SessionCharge)
        .count())
}
