//! Booking gate - cost previews and affordability checks before a session.
//!
//! Confirming a booking never moves money. It only checks that the wallet
//! could pay for the whole booked duration; actual charges accrue minute by
//! minute once the session meter is running.

use crate::{
    core::{
        mentor,
        money::Money,
        rate::{self, Rate},
        wallet,
    },
    entities::wallet as wallet_entity,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, info};

/// Price of a prospective booking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BookingQuote {
    /// Mentor's advertised hourly rate
    pub hourly_rate: Money,
    /// Derived per-minute rate
    pub per_minute_rate: Money,
    /// Requested duration
    pub duration_minutes: f64,
    /// Cost of the full duration
    pub total_cost: Money,
}

/// A booking that passed the affordability check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BookingConfirmation {
    /// The priced booking
    #[serde(flatten)]
    pub quote: BookingQuote,
    /// Wallet balance at confirmation time
    pub balance: Money,
}

/// Prices `duration_minutes` at `rate`. The duration must be positive.
pub fn quote_for_rate(rate: Rate, duration_minutes: f64) -> Result<BookingQuote> {
    if !duration_minutes.is_finite() || duration_minutes <= 0.0 {
        return Err(Error::InvalidDuration {
            minutes: duration_minutes,
        });
    }

    let per_minute_rate = rate.per_minute();
    Ok(BookingQuote {
        hourly_rate: rate.hourly(),
        per_minute_rate,
        duration_minutes,
        total_cost: rate::session_cost(per_minute_rate, duration_minutes)?,
    })
}

/// Prices a booking with the mentor's current rate.
pub async fn quote(
    db: &DatabaseConnection,
    mentor_id: &str,
    duration_minutes: f64,
) -> Result<BookingQuote> {
    let rate = mentor::require_rate(db, mentor_id).await?;
    quote_for_rate(rate, duration_minutes)
}

/// Confirms that `owner_id` can pay for the booking in full.
///
/// # Errors
/// Returns [`Error::InsufficientFunds`] when the balance is below the total
/// cost, so the caller can send the user to top up.
pub async fn confirm_booking(
    db: &DatabaseConnection,
    owner_id: &str,
    mentor_id: &str,
    duration_minutes: f64,
) -> Result<BookingConfirmation> {
    let quote = quote(db, mentor_id, duration_minutes).await?;
    let wallet = wallet::require_wallet(db, owner_id).await?;

    if !wallet::can_afford(&wallet, quote.total_cost) {
        debug!(
            "Booking for {} rejected: balance {} below cost {}",
            owner_id,
            wallet.balance(),
            quote.total_cost
        );
        return Err(Error::InsufficientFunds {
            current: wallet.balance(),
            required: quote.total_cost,
        });
    }

    info!(
        "Booking confirmed for {} with {} ({} minutes, {})",
        owner_id, mentor_id, duration_minutes, quote.total_cost
    );
    Ok(BookingConfirmation {
        quote,
        balance: wallet.balance(),
    })
}

/// Checks whether a wallet may join a session.
///
/// The balance must reach the join threshold and also cover the first minute.
pub fn check_join(
    wallet: &wallet_entity::Model,
    per_minute_rate: Money,
    join_threshold: Money,
) -> Result<()> {
    let required = join_threshold.max(per_minute_rate);
    if wallet::can_afford(wallet, required) {
        Ok(())
    } else {
        Err(Error::InsufficientFunds {
            current: wallet.balance(),
            required,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_quote_for_rate() {
        let rate = Rate::from_hourly(Money::from_major(600)).unwrap();
        let quote = quote_for_rate(rate, 45.0).unwrap();
        assert_eq!(quote.per_minute_rate, Money::from_major(10));
        assert_eq!(quote.total_cost, Money::from_major(450));
        assert_eq!(quote.duration_minutes, 45.0);
    }

    #[test]
    fn test_quote_rejects_empty_duration() {
        let rate = Rate::from_hourly(Money::from_major(600)).unwrap();
        for minutes in [0.0, -30.0, f64::NAN] {
            assert!(matches!(
                quote_for_rate(rate, minutes),
                Err(Error::InvalidDuration { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_quote_unknown_mentor() -> Result<()> {
        let db = setup_test_db().await?;
        let result = quote(&db, "ghost", 30.0).await;
        assert!(matches!(result, Err(Error::MentorNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_booking_rejects_insufficient_balance() -> Result<()> {
        let (db, _wallet) = setup_with_wallet_and_mentor().await?;

        // 15 minutes at 10.00/min = 150.00 against a 100.00 balance
        let result = confirm_booking(&db, TEST_OWNER, TEST_MENTOR, 15.0).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientFunds { current, required })
                if current == Money::from_major(100) && required == Money::from_major(150)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_booking_within_balance() -> Result<()> {
        let (db, _wallet) = setup_with_wallet_and_mentor().await?;

        let confirmation = confirm_booking(&db, TEST_OWNER, TEST_MENTOR, 10.0).await?;
        assert_eq!(confirmation.quote.total_cost, Money::from_major(100));
        assert_eq!(confirmation.balance, Money::from_major(100));

        // Confirmation does not charge anything
        assert_eq!(
            wallet::get_balance(&db, TEST_OWNER).await?,
            Money::from_major(100)
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_check_join_threshold() -> Result<()> {
        let (db, _wallet) = setup_with_wallet().await?;
        let per_minute = Money::from_major(10);
        let threshold = Money::from_major(100);

        let wallet = wallet::require_wallet(&db, TEST_OWNER).await?;
        assert!(check_join(&wallet, per_minute, threshold).is_ok());

        wallet::debit(&db, TEST_OWNER, Money::from_major(1), "leave 99").await?;
        let wallet = wallet::require_wallet(&db, TEST_OWNER).await?;
        let result = check_join(&wallet, per_minute, threshold);
        assert!(matches!(
            result,
            Err(Error::InsufficientFunds { current, required })
                if current == Money::from_major(99) && required == threshold
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_check_join_requires_first_minute() -> Result<()> {
        let (db, wallet) = setup_with_wallet().await?;
        wallet::credit(&db, TEST_OWNER, Money::from_major(50), "top-up").await?;
        let wallet = wallet::require_wallet(&db, &wallet.owner_id).await?;

        // 150.00 clears the threshold but not a 200.00 minute
        let result = check_join(&wallet, Money::from_major(200), Money::from_major(100));
        assert!(matches!(
            result,
            Err(Error::InsufficientFunds { required, .. }) if required == Money::from_major(200)
        ));

        Ok(())
    }
}
