//! Ledger entry entity - One credit or debit applied to a wallet.
//!
//! Each entry has a `wallet_id`, signed amount, kind, description, optional
//! `session_id` for session charges, and the `balance_after` snapshot taken
//! inside the same database transaction as the balance update.
use crate::core::money::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What caused a ledger entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Bonus credited when the wallet is opened
    #[sea_orm(string_value = "signup_bonus")]
    SignupBonus,
    /// User-initiated top-up
    #[sea_orm(string_value = "top_up")]
    TopUp,
    /// Direct debit outside of a session
    #[sea_orm(string_value = "debit")]
    Debit,
    /// One billed minute of an active session
    #[sea_orm(string_value = "session_charge")]
    SessionCharge,
}

/// Ledger entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the wallet this entry belongs to
    pub wallet_id: i64,
    /// Signed amount in minor units (positive credits, negative debits)
    pub amount: i64,
    /// Entry kind
    pub kind: EntryKind,
    /// Human-readable description
    pub description: String,
    /// Billing session that produced this entry, for session charges
    pub session_id: Option<String>,
    /// Wallet balance immediately after this entry was applied
    pub balance_after: i64,
    /// When the entry was recorded
    pub timestamp: DateTimeUtc,
}

impl Model {
    /// Signed entry amount as [`Money`].
    #[must_use]
    pub const fn amount(&self) -> Money {
        Money::from_minor(self.amount)
    }

    /// Balance after this entry as [`Money`].
    #[must_use]
    pub const fn balance_after(&self) -> Money {
        Money::from_minor(self.balance_after)
    }
}

/// Defines relationships between LedgerEntry and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one wallet
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
