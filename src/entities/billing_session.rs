//! Billing session entity - The billing-relevant state of one mentoring session.
//!
//! The mentor's hourly rate is frozen at start; the per-minute rate is derived
//! from it on demand. `minutes_billed` and `amount_charged` only grow while the
//! session is active and are frozen once it ends.

use crate::core::money::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Meter state of a session
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Accruing charges every minute
    #[sea_orm(string_value = "active")]
    Active,
    /// Terminal; no further charges
    #[sea_orm(string_value = "ended")]
    Ended,
}

/// Why a session ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Explicit end-session action
    #[sea_orm(string_value = "ended_by_user")]
    EndedByUser,
    /// The wallet could no longer cover the next minute
    #[sea_orm(string_value = "funds_exhausted")]
    FundsExhausted,
}

/// Billing session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "billing_sessions")]
pub struct Model {
    /// External session identifier (e.g. the booking reference)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Wallet of the paying party
    pub wallet_id: i64,
    /// Mentor providing the session
    pub mentor_id: String,
    /// Mentor's hourly rate at start, in minor units
    pub hourly_rate: i64,
    /// Number of completed minutes charged so far
    pub minutes_billed: i64,
    /// Total charged so far, in minor units
    pub amount_charged: i64,
    /// Meter state
    pub state: SessionState,
    /// Whether the low-balance event already fired for this session
    pub low_balance_notified: bool,
    /// When the meter started
    pub started_at: DateTimeUtc,
    /// When the meter stopped
    pub ended_at: Option<DateTimeUtc>,
    /// Why the meter stopped
    pub end_reason: Option<EndReason>,
}

impl Model {
    /// Total charged so far as [`Money`].
    #[must_use]
    pub const fn amount_charged(&self) -> Money {
        Money::from_minor(self.amount_charged)
    }

    /// Frozen hourly rate as [`Money`].
    #[must_use]
    pub const fn hourly_rate(&self) -> Money {
        Money::from_minor(self.hourly_rate)
    }
}

/// Defines relationships between BillingSession and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each session is paid from one wallet
    #[sea_orm(
        belongs_to = "super::wallet::Entity",
        from = "Column::WalletId",
        to = "super::wallet::Column::Id"
    )]
    Wallet,
}

impl Related<super::wallet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
