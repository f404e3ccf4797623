//! Route handlers. Each one resolves the caller, delegates to `core`, and
//! turns the result into JSON.

use crate::{
    api::{
        AppState,
        context::UserContext,
        error::ApiError,
        types::{
            AmountRequest, BalanceResponse, ConfirmBookingRequest, EntryResponse, HistoryQuery,
            QuoteQuery, RateRequest, RateResponse, StartSessionRequest, WalletResponse,
        },
    },
    core::{
        booking::{self, BookingConfirmation, BookingQuote},
        mentor,
        meter::{self, SessionStatus},
        wallet,
    },
    errors::Error,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;

type ApiResult<T> = Result<T, ApiError>;

/// GET /api/v1/health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /api/v1/wallet - open the caller's wallet with the signup bonus.
pub async fn open_wallet(
    State(state): State<AppState>,
    user: UserContext,
) -> ApiResult<(StatusCode, Json<WalletResponse>)> {
    let existed = wallet::get_wallet(&state.db, &user.user_id).await?.is_some();
    let opened = wallet::open_wallet(&state.db, &user.user_id, state.billing.signup_bonus).await?;
    let status = if existed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(opened.into())))
}

/// GET /api/v1/wallet/balance
pub async fn get_balance(
    State(state): State<AppState>,
    user: UserContext,
) -> ApiResult<Json<BalanceResponse>> {
    let balance = wallet::get_balance(&state.db, &user.user_id).await?;
    Ok(Json(BalanceResponse { balance }))
}

/// POST /api/v1/wallet/credit
pub async fn credit(
    State(state): State<AppState>,
    user: UserContext,
    Json(body): Json<AmountRequest>,
) -> ApiResult<Json<BalanceResponse>> {
    let description = body.description.as_deref().unwrap_or("Top-up");
    let entry = wallet::credit(&state.db, &user.user_id, body.amount, description).await?;
    Ok(Json(BalanceResponse {
        balance: entry.balance_after(),
    }))
}

/// POST /api/v1/wallet/debit
pub async fn debit(
    State(state): State<AppState>,
    user: UserContext,
    Json(body): Json<AmountRequest>,
) -> ApiResult<Json<BalanceResponse>> {
    let description = body.description.as_deref().unwrap_or("Debit");
    let entry = wallet::debit(&state.db, &user.user_id, body.amount, description).await?;
    Ok(Json(BalanceResponse {
        balance: entry.balance_after(),
    }))
}

/// GET /api/v1/wallet/transactions - newest first.
pub async fn list_transactions(
    State(state): State<AppState>,
    user: UserContext,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<EntryResponse>>> {
    let entries = wallet::list_entries(&state.db, &user.user_id, query.limit).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// PUT /api/v1/mentors/{id}/rate - a mentor may only set their own rate.
pub async fn set_rate(
    State(state): State<AppState>,
    user: UserContext,
    Path(mentor_id): Path<String>,
    Json(body): Json<RateRequest>,
) -> ApiResult<Json<RateResponse>> {
    if user.user_id != mentor_id {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "Mentors can only set their own rate",
        ));
    }

    mentor::set_hourly_rate(&state.db, &mentor_id, body.hourly_rate).await?;
    let rate = mentor::require_rate(&state.db, &mentor_id).await?;
    Ok(Json(RateResponse {
        mentor_id,
        hourly_rate: rate.hourly(),
        per_minute_rate: rate.per_minute(),
    }))
}

/// GET /api/v1/mentors/{id}/quote?minutes=N
pub async fn quote(
    State(state): State<AppState>,
    Path(mentor_id): Path<String>,
    Query(query): Query<QuoteQuery>,
) -> ApiResult<Json<BookingQuote>> {
    let quote = booking::quote(&state.db, &mentor_id, query.minutes).await?;
    Ok(Json(quote))
}

/// POST /api/v1/bookings/confirm
pub async fn confirm_booking(
    State(state): State<AppState>,
    user: UserContext,
    Json(body): Json<ConfirmBookingRequest>,
) -> ApiResult<Json<BookingConfirmation>> {
    let confirmation = booking::confirm_booking(
        &state.db,
        &user.user_id,
        &body.mentor_id,
        body.duration_minutes,
    )
    .await?;
    Ok(Json(confirmation))
}

/// POST /api/v1/sessions/{id}/start
pub async fn start_session(
    State(state): State<AppState>,
    user: UserContext,
    Path(session_id): Path<String>,
    Json(body): Json<StartSessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionStatus>)> {
    let now = Utc::now();
    let session = meter::start_session(
        &state.db,
        &state.billing,
        &session_id,
        &user.user_id,
        &body.mentor_id,
        now,
    )
    .await?;
    let status = meter::get_session_status(&state.db, &session.id, now).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

/// GET /api/v1/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    user: UserContext,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionStatus>> {
    let status = owned_session(&state, &user, &session_id).await?;
    Ok(Json(status))
}

/// POST /api/v1/sessions/{id}/end - returns the final accrued cost.
pub async fn end_session(
    State(state): State<AppState>,
    user: UserContext,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionStatus>> {
    owned_session(&state, &user, &session_id).await?;
    let status = meter::end_session(&state.db, &state.billing, &session_id, Utc::now()).await?;
    Ok(Json(status))
}

/// Loads a session, hiding sessions paid by other users.
async fn owned_session(
    state: &AppState,
    user: &UserContext,
    session_id: &str,
) -> ApiResult<SessionStatus> {
    let status = meter::get_session_status(&state.db, session_id, Utc::now()).await?;
    if status.owner_id != user.user_id {
        return Err(Error::SessionNotFound {
            session_id: session_id.to_string(),
        }
        .into());
    }
    Ok(status)
}
