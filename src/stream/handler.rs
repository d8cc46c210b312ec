//! `GET /actions` handler.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use super::open_observer;
use crate::api::dto::KeyQuery;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};

/// `GET /actions` — Open a live command stream.
///
/// # Errors
///
/// Returns [`RelayError::Unauthorized`] on a missing or wrong key.
#[utoipa::path(
    get,
    path = "/actions",
    tag = "Stream",
    summary = "Subscribe to the command stream",
    description = "Long-lived text/plain stream. Writes the warm-up handshake (\" \", \"P\\n\", \"f\\n\"), \
        then one lower-cased command per line. A tab is written whenever another observer disconnects.",
    params(KeyQuery),
    responses(
        (status = 200, description = "Live command stream", content_type = "text/plain", body = String),
        (status = 403, description = "Bad or missing key", body = ErrorResponse),
    )
)]
pub async fn actions_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Response, RelayError> {
    state.relay_service.authorize(query.key.as_deref())?;

    let stream = open_observer(Arc::clone(&state.relay_service)).await;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
