//! Session meter - per-minute accrual for active billing sessions.
//!
//! State machine: a session is created `Active` by [`start_session`] and
//! becomes `Ended` either through [`end_session`] or when the wallet can no
//! longer pay for the next minute under the configured exhaustion policy.
//!
//! Elapsed time is always `now - started_at`, taken from the stored start time,
//! so billing never depends on a client staying connected. Each call to
//! [`tick`] charges every completed minute that has not been billed yet, one
//! discrete debit of the per-minute rate per minute. A partial minute is never
//! charged; the live cost shown between ticks is interpolated in
//! [`SessionStatus::accrued_cost`] only.
//!
//! Ticks and end actions for one session are serialized with a compare-and-set
//! on `(state, minutes_billed)`, executed in the same database transaction as
//! the wallet debits. The loser of a race rolls back with
//! [`Error::ConcurrentUpdate`].

use crate::{
    config::settings::BillingConfig,
    core::{
        booking, mentor,
        money::Money,
        rate::{self, Rate, SECONDS_PER_MINUTE},
        wallet,
    },
    entities::{BillingSession, EndReason, EntryKind, SessionState, billing_session},
    errors::{Error, Result, is_unique_violation},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Signals raised while billing a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MeterEvent {
    /// The balance dropped below the low-balance floor. The session continues.
    LowBalance {
        /// Session being billed
        session_id: String,
        /// Balance right after the charge that crossed the floor
        balance: Money,
    },
    /// The wallet cannot pay for another minute; the session was ended.
    FundsExhausted {
        /// Session that was stopped
        session_id: String,
        /// Balance when the session stopped
        balance: Money,
    },
}

/// Result of one billing pass over a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickOutcome {
    /// Session that was billed
    pub session_id: String,
    /// Minutes charged during this pass
    pub minutes_charged: i64,
    /// Total minutes charged since the session started
    pub minutes_billed: i64,
    /// Total amount charged since the session started
    pub amount_charged: Money,
    /// Wallet balance after this pass
    pub balance: Money,
    /// Session state after this pass
    pub state: SessionState,
    /// Events raised during this pass
    pub events: Vec<MeterEvent>,
}

/// Read model of a session for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    /// Session identifier
    pub session_id: String,
    /// Owner of the paying wallet
    pub owner_id: String,
    /// Mentor providing the session
    pub mentor_id: String,
    /// Meter state
    pub state: SessionState,
    /// Frozen hourly rate
    pub hourly_rate: Money,
    /// Derived per-minute rate
    pub per_minute_rate: Money,
    /// Seconds since start (until end, once ended)
    pub elapsed_seconds: u64,
    /// Completed minutes charged so far
    pub minutes_billed: i64,
    /// Amount actually charged to the wallet
    pub amount_charged: Money,
    /// Running cost. Interpolated per second while active, equal to
    /// `amount_charged` once ended.
    pub accrued_cost: Money,
    /// Current wallet balance
    pub balance: Money,
    /// Whether the low-balance event has fired
    pub low_balance: bool,
    /// When the meter started
    pub started_at: DateTime<Utc>,
    /// When the meter stopped
    pub ended_at: Option<DateTime<Utc>>,
    /// Why the meter stopped
    pub end_reason: Option<EndReason>,
}

/// Starts the meter for a new session.
///
/// The mentor's current hourly rate is frozen onto the session.
///
/// # Errors
/// - [`Error::SessionAlreadyExists`] if the id is taken
/// - [`Error::WalletNotFound`] / [`Error::MentorNotFound`] for unknown parties
/// - [`Error::InsufficientFunds`] if the balance is below the join threshold or
///   cannot cover the first minute
#[instrument(skip(db, config))]
pub async fn start_session(
    db: &DatabaseConnection,
    config: &BillingConfig,
    session_id: &str,
    owner_id: &str,
    mentor_id: &str,
    now: DateTime<Utc>,
) -> Result<billing_session::Model> {
    let session_id = session_id.trim();
    if session_id.is_empty() {
        return Err(Error::Validation {
            message: "Session id cannot be empty".to_string(),
        });
    }

    if BillingSession::find_by_id(session_id.to_string())
        .one(db)
        .await?
        .is_some()
    {
        return Err(Error::SessionAlreadyExists {
            session_id: session_id.to_string(),
        });
    }

    let wallet = wallet::require_wallet(db, owner_id).await?;
    let rate = mentor::require_rate(db, mentor_id).await?;
    booking::check_join(&wallet, rate.per_minute(), config.join_threshold)?;

    let session = insert_session(
        db,
        session_id,
        billing_session::ActiveModel {
            id: Set(session_id.to_string()),
            wallet_id: Set(wallet.id),
            mentor_id: Set(mentor_id.to_string()),
            hourly_rate: Set(rate.hourly().minor()),
            minutes_billed: Set(0),
            amount_charged: Set(0),
            state: Set(SessionState::Active),
            low_balance_notified: Set(false),
            started_at: Set(now),
            ended_at: Set(None),
            end_reason: Set(None),
        },
    )
    .await?;

    info!(
        "Session {} started: {} paying {} at {}/minute (balance {})",
        session_id,
        owner_id,
        mentor_id,
        rate.per_minute(),
        wallet.balance()
    );
    Ok(session)
}

/// Inserts a new session row. A concurrent start with the same id surfaces
/// as [`Error::SessionAlreadyExists`].
async fn insert_session<C>(
    db: &C,
    session_id: &str,
    session: billing_session::ActiveModel,
) -> Result<billing_session::Model>
where
    C: ConnectionTrait,
{
    session.insert(db).await.map_err(|e| {
        if is_unique_violation(&e) {
            Error::SessionAlreadyExists {
                session_id: session_id.to_string(),
            }
        } else {
            e.into()
        }
    })
}

/// Charges every completed, unbilled minute of an active session up to `now`.
#[instrument(skip(db, config))]
pub async fn tick(
    db: &DatabaseConnection,
    config: &BillingConfig,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<TickOutcome> {
    let txn = db.begin().await?;
    let session = require_active_session(&txn, session_id).await?;
    let outcome = bill_elapsed(&txn, config, &session, now).await?;
    txn.commit().await?;

    if outcome.minutes_charged > 0 {
        debug!(
            "Session {} charged {} minute(s); {} billed, balance {}",
            session_id, outcome.minutes_charged, outcome.minutes_billed, outcome.balance
        );
    }
    report_events(&outcome.events);
    Ok(outcome)
}

/// Ends an active session after charging its completed minutes.
///
/// The returned status carries the final `accrued_cost`, which equals the
/// total charged. A trailing partial minute is not billed.
#[instrument(skip(db, config))]
pub async fn end_session(
    db: &DatabaseConnection,
    config: &BillingConfig,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<SessionStatus> {
    let txn = db.begin().await?;
    let session = require_active_session(&txn, session_id).await?;
    let outcome = bill_elapsed(&txn, config, &session, now).await?;

    if outcome.state == SessionState::Active {
        let changes = billing_session::ActiveModel {
            state: Set(SessionState::Ended),
            ended_at: Set(Some(now)),
            end_reason: Set(Some(EndReason::EndedByUser)),
            ..Default::default()
        };
        let result = BillingSession::update_many()
            .set(changes)
            .filter(billing_session::Column::Id.eq(session_id))
            .filter(billing_session::Column::State.eq(SessionState::Active))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(Error::ConcurrentUpdate {
                session_id: session_id.to_string(),
            });
        }
    }

    let ended = require_session(&txn, session_id).await?;
    let status = build_status(&txn, ended, now).await?;
    txn.commit().await?;

    report_events(&outcome.events);
    info!(
        "Session {} ended after {} minute(s); total charged {}",
        session_id, status.minutes_billed, status.amount_charged
    );
    Ok(status)
}

/// Current read model of a session.
pub async fn get_session_status(
    db: &DatabaseConnection,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<SessionStatus> {
    let session = require_session(db, session_id).await?;
    build_status(db, session, now).await
}

/// Bills every active session. Failures on one session are logged and do
/// not stop the others.
pub async fn tick_all_active(
    db: &DatabaseConnection,
    config: &BillingConfig,
    now: DateTime<Utc>,
) -> Result<Vec<TickOutcome>> {
    let active = BillingSession::find()
        .filter(billing_session::Column::State.eq(SessionState::Active))
        .order_by_asc(billing_session::Column::StartedAt)
        .all(db)
        .await?;

    let mut outcomes = Vec::with_capacity(active.len());
    for session in active {
        match tick(db, config, &session.id, now).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e @ (Error::ConcurrentUpdate { .. } | Error::SessionNotActive { .. })) => {
                debug!("Skipping session {}: {}", session.id, e);
            }
            Err(e) => warn!("Failed to bill session {}: {}", session.id, e),
        }
    }
    Ok(outcomes)
}

/// Number of whole minutes between `started_at` and `now`.
#[must_use]
pub fn completed_minutes(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - started_at).num_seconds().max(0) / SECONDS_PER_MINUTE
}

async fn bill_elapsed<C>(
    db: &C,
    config: &BillingConfig,
    session: &billing_session::Model,
    now: DateTime<Utc>,
) -> Result<TickOutcome>
where
    C: ConnectionTrait,
{
    let per_minute = Rate::from_hourly(session.hourly_rate())?.per_minute();
    let floor = config.exhaustion.floor();
    let due = completed_minutes(session.started_at, now);

    let mut balance = wallet::find_wallet_by_id(db, session.wallet_id)
        .await?
        .balance();
    let mut minutes_billed = session.minutes_billed;
    let mut amount_charged = session.amount_charged();
    let mut low_balance_notified = session.low_balance_notified;
    let mut events = Vec::new();
    let mut exhausted = false;

    while minutes_billed < due {
        let minute = minutes_billed + 1;
        let charge = wallet::debit_with_floor(
            db,
            session.wallet_id,
            per_minute,
            floor,
            EntryKind::SessionCharge,
            format!("Session {} minute {minute}", session.id),
            Some(session.id.clone()),
        )
        .await;

        match charge {
            Ok(entry) => {
                minutes_billed = minute;
                amount_charged += per_minute;
                balance = entry.balance_after();
            }
            Err(Error::InsufficientFunds { current, .. }) => {
                balance = current;
                exhausted = true;
                break;
            }
            Err(e) => return Err(e),
        }

        if !low_balance_notified && balance < config.low_balance_floor {
            low_balance_notified = true;
            events.push(MeterEvent::LowBalance {
                session_id: session.id.clone(),
                balance,
            });
        }
    }

    // Stop as soon as the next minute cannot be paid for.
    if let Some(floor) = floor {
        exhausted |= balance - per_minute < floor;
    }

    let mut changes = billing_session::ActiveModel {
        minutes_billed: Set(minutes_billed),
        amount_charged: Set(amount_charged.minor()),
        low_balance_notified: Set(low_balance_notified),
        ..Default::default()
    };
    let state = if exhausted {
        changes.state = Set(SessionState::Ended);
        changes.ended_at = Set(Some(now));
        changes.end_reason = Set(Some(EndReason::FundsExhausted));
        events.push(MeterEvent::FundsExhausted {
            session_id: session.id.clone(),
            balance,
        });
        SessionState::Ended
    } else {
        SessionState::Active
    };

    let result = BillingSession::update_many()
        .set(changes)
        .filter(billing_session::Column::Id.eq(session.id.as_str()))
        .filter(billing_session::Column::State.eq(SessionState::Active))
        .filter(billing_session::Column::MinutesBilled.eq(session.minutes_billed))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::ConcurrentUpdate {
            session_id: session.id.clone(),
        });
    }

    Ok(TickOutcome {
        session_id: session.id.clone(),
        minutes_charged: minutes_billed - session.minutes_billed,
        minutes_billed,
        amount_charged,
        balance,
        state,
        events,
    })
}

async fn build_status<C>(
    db: &C,
    session: billing_session::Model,
    now: DateTime<Utc>,
) -> Result<SessionStatus>
where
    C: ConnectionTrait,
{
    let wallet = wallet::find_wallet_by_id(db, session.wallet_id).await?;
    let rate = Rate::from_hourly(session.hourly_rate())?;
    let per_minute_rate = rate.per_minute();

    let until = session.ended_at.unwrap_or(now);
    let elapsed_seconds = u64::try_from((until - session.started_at).num_seconds().max(0))?;
    let amount_charged = session.amount_charged();
    let accrued_cost = match session.state {
        SessionState::Active => {
            rate::cost_for_elapsed(per_minute_rate, elapsed_seconds).max(amount_charged)
        }
        SessionState::Ended => amount_charged,
    };

    Ok(SessionStatus {
        session_id: session.id,
        owner_id: wallet.owner_id,
        mentor_id: session.mentor_id,
        state: session.state,
        hourly_rate: rate.hourly(),
        per_minute_rate,
        elapsed_seconds,
        minutes_billed: session.minutes_billed,
        amount_charged,
        accrued_cost,
        balance: Money::from_minor(wallet.balance),
        low_balance: session.low_balance_notified,
        started_at: session.started_at,
        ended_at: session.ended_at,
        end_reason: session.end_reason,
    })
}

async fn require_session<C>(db: &C, session_id: &str) -> Result<billing_session::Model>
where
    C: ConnectionTrait,
{
    BillingSession::find_by_id(session_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::SessionNotFound {
            session_id: session_id.to_string(),
        })
}

async fn require_active_session<C>(db: &C, session_id: &str) -> Result<billing_session::Model>
where
    C: ConnectionTrait,
{
    let session = require_session(db, session_id).await?;
    if session.state != SessionState::Active {
        return Err(Error::SessionNotActive {
            session_id: session_id.to_string(),
        });
    }
    Ok(session)
}

fn report_events(events: &[MeterEvent]) {
    for event in events {
        match event {
            MeterEvent::LowBalance {
                session_id,
                balance,
            } => warn!(
                "Session {}: balance {} is below the low-balance floor, prompt a top-up",
                session_id, balance
            ),
            MeterEvent::FundsExhausted {
                session_id,
                balance,
            } => warn!(
                "Session {}: funds exhausted at balance {}, session ended",
                session_id, balance
            ),
        }
    }
}
