//! Wallet entity - A user's spendable balance record.
//!
//! One wallet exists per owner. The balance is only ever changed through ledger
//! entries, never assigned directly from request input.

use crate::core::money::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Wallet database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    /// Unique identifier for the wallet
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque identifier of the user who owns this wallet
    #[sea_orm(unique)]
    pub owner_id: String,
    /// Current balance in minor units (paise)
    pub balance: i64,
    /// When the wallet was opened
    pub created_at: DateTimeUtc,
    /// When the balance last changed
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Current balance as [`Money`].
    #[must_use]
    pub const fn balance(&self) -> Money {
        Money::from_minor(self.balance)
    }
}

/// Defines relationships between Wallet and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One wallet has many ledger entries
    #[sea_orm(has_many = "super::ledger_entry::Entity")]
    LedgerEntries,
    /// One wallet pays for many billing sessions
    #[sea_orm(has_many = "super::billing_session::Entity")]
    BillingSessions,
}

impl Related<super::ledger_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl Related<super::billing_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillingSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
