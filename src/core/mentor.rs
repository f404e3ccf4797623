//! Mentor rate business logic.
//!
//! Mentors set an hourly rate at profile-setup time. A change only affects
//! sessions started afterwards, because each session freezes the rate it began with.

use crate::{
    core::{money::Money, rate::Rate},
    entities::{MentorRate, mentor_rate},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Creates or replaces a mentor's hourly rate.
///
/// # Errors
/// Returns an error if:
/// - The mentor id is empty or whitespace-only
/// - The rate is zero or negative ([`Error::InvalidRate`])
/// - The database write fails
pub async fn set_hourly_rate(
    db: &DatabaseConnection,
    mentor_id: &str,
    hourly_rate: Money,
) -> Result<mentor_rate::Model> {
    let mentor_id = mentor_id.trim();
    if mentor_id.is_empty() {
        return Err(Error::Validation {
            message: "Mentor id cannot be empty".to_string(),
        });
    }
    let rate = Rate::from_hourly(hourly_rate)?;

    let now = Utc::now();
    let saved = match MentorRate::find_by_id(mentor_id.to_string()).one(db).await? {
        Some(existing) => {
            let mut active: mentor_rate::ActiveModel = existing.into();
            active.hourly_rate = Set(rate.hourly().minor());
            active.updated_at = Set(now);
            active.update(db).await?
        }
        None => {
            mentor_rate::ActiveModel {
                mentor_id: Set(mentor_id.to_string()),
                hourly_rate: Set(rate.hourly().minor()),
                updated_at: Set(now),
            }
            .insert(db)
            .await?
        }
    };

    info!(
        "Mentor {} rate set to {}/hour ({}/minute)",
        mentor_id,
        rate.hourly(),
        rate.per_minute()
    );
    Ok(saved)
}

/// Looks up a mentor's current rate.
pub async fn get_rate<C>(db: &C, mentor_id: &str) -> Result<Option<Rate>>
where
    C: ConnectionTrait,
{
    let Some(model) = MentorRate::find_by_id(mentor_id.to_string()).one(db).await? else {
        return Ok(None);
    };
    Rate::from_hourly(Money::from_minor(model.hourly_rate)).map(Some)
}

/// Looks up a mentor's current rate, failing with [`Error::MentorNotFound`].
pub async fn require_rate<C>(db: &C, mentor_id: &str) -> Result<Rate>
where
    C: ConnectionTrait,
{
    get_rate(db, mentor_id)
        .await?
        .ok_or_else(|| Error::MentorNotFound {
            mentor_id: mentor_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_set_hourly_rate_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = set_hourly_rate(&db, "mentor-1", Money::ZERO).await;
        assert!(matches!(result, Err(Error::InvalidRate { .. })));

        let result = set_hourly_rate(&db, "mentor-1", Money::from_major(-100)).await;
        assert!(matches!(result, Err(Error::InvalidRate { .. })));

        let result = set_hourly_rate(&db, "", Money::from_major(600)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        // Positive, but rounds to nothing per minute
        let result = set_hourly_rate(&db, "mentor-1", Money::from_minor(29)).await;
        assert!(matches!(result, Err(Error::InvalidRate { .. })));
        assert!(get_rate(&db, "mentor-1").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_set_and_get_rate() -> Result<()> {
        let db = setup_test_db().await?;

        set_hourly_rate(&db, "mentor-1", Money::from_major(600)).await?;
        let rate = get_rate(&db, "mentor-1").await?.unwrap();
        assert_eq!(rate.hourly(), Money::from_major(600));
        assert_eq!(rate.per_minute(), Money::from_major(10));

        Ok(())
    }

    #[tokio::test]
    async fn test_set_rate_replaces_previous() -> Result<()> {
        let db = setup_test_db().await?;

        set_hourly_rate(&db, "mentor-1", Money::from_major(600)).await?;
        let updated = set_hourly_rate(&db, "mentor-1", Money::from_major(900)).await?;
        assert_eq!(updated.hourly_rate, Money::from_major(900).minor());

        let rate = require_rate(&db, "mentor-1").await?;
        assert_eq!(rate.per_minute(), Money::from_major(15));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_mentor() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(get_rate(&db, "ghost").await?.is_none());
        let result = require_rate(&db, "ghost").await;
        assert!(matches!(result, Err(Error::MentorNotFound { mentor_id }) if mentor_id == "ghost"));

        Ok(())
    }
}
