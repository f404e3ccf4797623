//! Rate conversion - hourly to per-minute pricing and session cost computation.
//!
//! The per-minute rate is always derived from the hourly rate and never stored on
//! its own. All results are rounded half-up to the nearest minor unit.

use crate::{
    core::money::{MINOR_PER_MAJOR, Money},
    errors::{Error, Result},
};
use serde::Serialize;

/// Minutes in one billing hour.
pub const MINUTES_PER_HOUR: i64 = 60;

/// Seconds in one billing minute.
pub const SECONDS_PER_MINUTE: i64 = 60;

/// A mentor's validated hourly rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rate {
    hourly: Money,
}

impl Rate {
    /// Validates an hourly rate. Zero and negative rates are rejected, as are
    /// rates too small to charge at least one minor unit per minute.
    pub fn from_hourly(hourly: Money) -> Result<Self> {
        let rate = Self { hourly };
        if !hourly.is_positive() || !rate.per_minute().is_positive() {
            return Err(Error::InvalidRate { rate: hourly });
        }
        Ok(rate)
    }

    /// The advertised hourly rate.
    #[must_use]
    pub const fn hourly(self) -> Money {
        self.hourly
    }

    /// The canonical billing unit: hourly rate divided by 60.
    #[must_use]
    pub const fn per_minute(self) -> Money {
        Money::from_minor(div_round(self.hourly.minor(), MINUTES_PER_HOUR))
    }
}

/// Converts an hourly rate into a per-minute rate.
pub fn per_minute_rate(hourly_rate: Money) -> Result<Money> {
    Rate::from_hourly(hourly_rate).map(Rate::per_minute)
}

/// Cost of a session lasting `duration_minutes` at `per_minute_rate`.
///
/// Fractional minutes are accepted. Negative or non-finite durations, and
/// durations whose cost exceeds the largest representable amount, fail with
/// [`Error::InvalidDuration`].
#[allow(clippy::cast_precision_loss)]
pub fn session_cost(per_minute_rate: Money, duration_minutes: f64) -> Result<Money> {
    if !duration_minutes.is_finite() || duration_minutes < 0.0 {
        return Err(Error::InvalidDuration {
            minutes: duration_minutes,
        });
    }

    let minor = (per_minute_rate.minor() as f64 * duration_minutes).round();
    Money::from_decimal(minor / MINOR_PER_MAJOR as f64).ok_or(Error::InvalidDuration {
        minutes: duration_minutes,
    })
}

/// Interpolated cost after `elapsed_seconds`, used for live display between
/// billing ticks. Computed in integer arithmetic.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn cost_for_elapsed(per_minute_rate: Money, elapsed_seconds: u64) -> Money {
    let numerator = i128::from(per_minute_rate.minor()) * i128::from(elapsed_seconds);
    let denominator = i128::from(SECONDS_PER_MINUTE);
    let rounded = if numerator >= 0 {
        (numerator + denominator / 2) / denominator
    } else {
        (numerator - denominator / 2) / denominator
    };
    Money::from_minor(rounded as i64)
}

/// Integer division rounding half away from zero.
const fn div_round(numerator: i64, denominator: i64) -> i64 {
    if numerator >= 0 {
        (numerator + denominator / 2) / denominator
    } else {
        (numerator - denominator / 2) / denominator
    }
}
