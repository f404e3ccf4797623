//! Core business logic - framework-agnostic billing operations.
//!
//! Everything here takes a database connection and plain values, so the HTTP
//! layer and the background meter share the same code paths.

/// Booking quotes, affordability checks and the join gate
pub mod booking;
/// Mentor hourly rates
pub mod mentor;
/// Session meter: per-minute accrual, exhaustion and end of session
pub mod meter;
/// Fixed-point currency amounts
pub mod money;
/// Hourly to per-minute conversion and cost arithmetic
pub mod rate;
/// Wallet ledger: balances, credits, debits and history
pub mod wallet;
