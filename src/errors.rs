//! Unified error type for the billing ledger.
//!
//! Every failure in this crate is a local, recoverable condition surfaced to the
//! caller that initiated the operation. The HTTP layer maps each variant to a
//! status code in [`crate::api::error`].

use crate::core::money::Money;
use thiserror::Error;

/// All errors produced by the ledger, meter, and configuration layers.
#[derive(Debug, Error)]
pub enum Error {
    /// A credit or debit was requested with a non-positive amount
    #[error("Invalid amount: {amount} (must be greater than zero)")]
    InvalidAmount {
        /// The rejected amount
        amount: Money,
    },

    /// A mentor rate was zero or negative
    #[error("Invalid hourly rate: {rate} (must be greater than zero)")]
    InvalidRate {
        /// The rejected hourly rate
        rate: Money,
    },

    /// A duration was negative or not a finite number
    #[error("Invalid duration: {minutes} minutes")]
    InvalidDuration {
        /// The rejected duration in minutes
        minutes: f64,
    },

    /// The wallet cannot cover the requested amount
    #[error("Insufficient funds: balance is {current}, but {required} is required")]
    InsufficientFunds {
        /// Balance at the time of the check
        current: Money,
        /// Amount the operation needed
        required: Money,
    },

    /// Request input failed validation
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// No wallet exists for the given owner
    #[error("Wallet not found for user '{owner_id}'")]
    WalletNotFound {
        /// Owner that was looked up
        owner_id: String,
    },

    /// The mentor has not configured an hourly rate
    #[error("No rate configured for mentor '{mentor_id}'")]
    MentorNotFound {
        /// Mentor that was looked up
        mentor_id: String,
    },

    /// No billing session exists with the given id
    #[error("Session '{session_id}' not found")]
    SessionNotFound {
        /// Session that was looked up
        session_id: String,
    },

    /// A session with this id was already started
    #[error("Session '{session_id}' already exists")]
    SessionAlreadyExists {
        /// Conflicting session id
        session_id: String,
    },

    /// The session has already ended
    #[error("Session '{session_id}' is not active")]
    SessionNotActive {
        /// Session that was not active
        session_id: String,
    },

    /// Another tick or end action modified the session first
    #[error("Session '{session_id}' was modified concurrently")]
    ConcurrentUpdate {
        /// Session that lost the race
        session_id: String,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure (socket bind, config file read)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Integer conversion overflow
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

/// Whether a database error is a unique or primary-key constraint violation.
pub(crate) fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}
