//! Mapping from ledger errors to HTTP responses.

use crate::{api::types::ErrorResponse, errors::Error};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    /// Builds an error with a plain message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: message.into(),
                current: None,
                required: None,
            },
        }
    }

    /// Status code this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::InvalidAmount { .. }
            | Error::InvalidRate { .. }
            | Error::InvalidDuration { .. }
            | Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::InsufficientFunds { current, required } => {
                return Self {
                    status: StatusCode::PAYMENT_REQUIRED,
                    body: ErrorResponse {
                        error: err.to_string(),
                        current: Some(*current),
                        required: Some(*required),
                    },
                };
            }
            Error::WalletNotFound { .. }
            | Error::MentorNotFound { .. }
            | Error::SessionNotFound { .. } => StatusCode::NOT_FOUND,
            Error::SessionAlreadyExists { .. }
            | Error::SessionNotActive { .. }
            | Error::ConcurrentUpdate { .. } => StatusCode::CONFLICT,
            Error::Config { .. }
            | Error::Database(_)
            | Error::Io(_)
            | Error::EnvVar(_)
            | Error::IntConversion(_) => {
                error!("Request failed: {}", err);
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::money::Money;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                Error::InvalidAmount {
                    amount: Money::ZERO,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::InvalidDuration { minutes: -1.0 },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::MentorNotFound {
                    mentor_id: "m".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                Error::SessionNotActive {
                    session_id: "s".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                Error::Config {
                    message: "bad".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_insufficient_funds_carries_amounts() {
        let api = ApiError::from(Error::InsufficientFunds {
            current: Money::from_major(99),
            required: Money::from_major(100),
        });
        assert_eq!(api.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(api.body.current, Some(Money::from_major(99)));
        assert_eq!(api.body.required, Some(Money::from_major(100)));
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let api = ApiError::from(Error::Config {
            message: "secret path".into(),
        });
        assert_eq!(api.body.error, "Internal server error");
    }
}
