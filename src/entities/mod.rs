//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod billing_session;
pub mod ledger_entry;
pub mod mentor_rate;
pub mod wallet;

// Re-export specific types to avoid conflicts
pub use billing_session::{
    Column as BillingSessionColumn, EndReason, Entity as BillingSession,
    Model as BillingSessionModel, SessionState,
};
pub use ledger_entry::{
    Column as LedgerEntryColumn, Entity as LedgerEntry, EntryKind, Model as LedgerEntryModel,
};
pub use mentor_rate::{Column as MentorRateColumn, Entity as MentorRate, Model as MentorRateModel};
pub use wallet::{Column as WalletColumn, Entity as Wallet, Model as WalletModel};
