//! Per-request caller identity.

use crate::api::error::ApiError;
use axum::{extract::FromRequestParts, http::StatusCode, http::request::Parts};

/// Header carrying the calling user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user a request acts for, taken from the `x-user-id` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    /// Calling user id
    pub user_id: String,
}

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ApiError::new(
                    StatusCode::UNAUTHORIZED,
                    format!("Missing {USER_ID_HEADER} header"),
                )
            })?;

        Ok(Self {
            user_id: user_id.to_string(),
        })
    }
}
