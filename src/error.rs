//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type for the relay. Each variant
//! maps to a numeric code, an HTTP status, and a machine-readable reason
//! string carried in the JSON error response.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::SubscriberId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1003,
///     "reason": "queue-full",
///     "message": "action queue is full"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code, reason and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`RelayError`]).
    pub code: u32,
    /// Machine-readable reason, stable across releases.
    pub reason: String,
    /// Human-readable error message.
    pub message: String,
}

/// Relay error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status               |
/// |-----------|------------|---------------------------|
/// | 1000–1999 | Submission | 400 Bad Request           |
/// | 2000–2999 | Access     | 403 Forbidden / 429       |
/// | 3000–3999 | Server     | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Token outside the admissible alphabet.
    #[error("invalid action")]
    InvalidCommand,

    /// The special action lost its admission coin flip.
    #[error("action not added")]
    NotAdmitted,

    /// The command queue is at capacity.
    #[error("action queue is full")]
    QueueFull,

    /// Admin secret missing or wrong.
    #[error("unauthorized")]
    Unauthorized,

    /// Client exceeded the request rate limit.
    #[error("rate limit exceeded; retry after {retry_after_ms} ms")]
    RateLimited {
        /// Milliseconds until the client may retry.
        retry_after_ms: u64,
    },

    /// An observer's stream is gone. Swallowed by the broadcast and
    /// disconnect paths; never rendered to a client in practice.
    #[error("subscriber {0} sink closed")]
    SinkClosed(SubscriberId),

    /// An observer is not reading and its frame buffer is full. The frame
    /// is dropped for that observer only.
    #[error("subscriber {0} sink full")]
    SinkFull(SubscriberId),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidCommand => 1001,
            Self::NotAdmitted => 1002,
            Self::QueueFull => 1003,
            Self::Unauthorized => 2001,
            Self::RateLimited { .. } => 2002,
            Self::SinkClosed(_) => 3001,
            Self::SinkFull(_) => 3002,
        }
    }

    /// Returns the machine-readable reason for this variant.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidCommand => "invalid",
            Self::NotAdmitted => "not-admitted",
            Self::QueueFull => "queue-full",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited { .. } => "rate-limited",
            Self::SinkClosed(_) => "sink-closed",
            Self::SinkFull(_) => "sink-full",
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCommand | Self::NotAdmitted | Self::QueueFull => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::SinkClosed(_) | Self::SinkFull(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let retry_after = match &self {
            Self::RateLimited { retry_after_ms } => Some(retry_after_ms.div_ceil(1000)),
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                reason: self.reason().to_owned(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
