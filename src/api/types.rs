//! Request and response bodies for the HTTP API.

use crate::{
    core::money::Money,
    entities::{EntryKind, ledger_entry, wallet},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /wallet/credit` and `POST /wallet/debit`.
#[derive(Debug, Clone, Deserialize)]
pub struct AmountRequest {
    /// Amount in major units
    pub amount: Money,
    /// Free-form note stored on the ledger entry
    #[serde(default)]
    pub description: Option<String>,
}

/// Query of `GET /wallet/transactions`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of entries to return
    #[serde(default)]
    pub limit: Option<u64>,
}

/// Body of `PUT /mentors/{id}/rate`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateRequest {
    /// Hourly rate in major units
    pub hourly_rate: Money,
}

/// Query of `GET /mentors/{id}/quote`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QuoteQuery {
    /// Booked duration in minutes
    pub minutes: f64,
}

/// Body of `POST /bookings/confirm`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmBookingRequest {
    /// Mentor being booked
    pub mentor_id: String,
    /// Booked duration in minutes
    pub duration_minutes: f64,
}

/// Body of `POST /sessions/{id}/start`.
#[derive(Debug, Clone, Deserialize)]
pub struct StartSessionRequest {
    /// Mentor running the session
    pub mentor_id: String,
}

/// A wallet and its balance.
#[derive(Debug, Clone, Serialize)]
pub struct WalletResponse {
    /// Owning user
    pub owner_id: String,
    /// Current balance
    pub balance: Money,
    /// When the wallet was opened
    pub created_at: DateTime<Utc>,
}

impl From<wallet::Model> for WalletResponse {
    fn from(model: wallet::Model) -> Self {
        Self {
            balance: model.balance(),
            owner_id: model.owner_id,
            created_at: model.created_at,
        }
    }
}

/// Balance after a read or a mutation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BalanceResponse {
    /// Current balance
    pub balance: Money,
}

/// One ledger entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    /// Ledger entry id
    pub id: i64,
    /// Signed amount: positive for credits, negative for debits
    pub amount: Money,
    /// Kind of movement
    pub kind: EntryKind,
    /// Free-form note
    pub description: String,
    /// Session that produced the charge, if any
    pub session_id: Option<String>,
    /// Balance right after this entry
    pub balance_after: Money,
    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
}

impl From<ledger_entry::Model> for EntryResponse {
    fn from(model: ledger_entry::Model) -> Self {
        Self {
            id: model.id,
            amount: model.amount(),
            kind: model.kind,
            balance_after: model.balance_after(),
            description: model.description,
            session_id: model.session_id,
            timestamp: model.timestamp,
        }
    }
}

/// A mentor's configured rate.
#[derive(Debug, Clone, Serialize)]
pub struct RateResponse {
    /// Mentor id
    pub mentor_id: String,
    /// Hourly rate
    pub hourly_rate: Money,
    /// Derived per-minute rate
    pub per_minute_rate: Money,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human readable message
    pub error: String,
    /// Balance at the time of an insufficient-funds rejection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<Money>,
    /// Amount an insufficient-funds rejection needed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Money>,
}
