//! Admin and introspection endpoints: status, reset, command listing.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{InfoResponse, KeyQuery, KillResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};

/// `GET /info` — Relay status.
#[utoipa::path(
    get,
    path = "/info",
    tag = "Admin",
    summary = "Relay status",
    description = "Memory usage, connected observers and pending commands. Unauthenticated.",
    responses(
        (status = 200, description = "Current status", body = InfoResponse),
    )
)]
pub async fn info_handler(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.relay_service.status().await;
    Json(InfoResponse::from(status))
}

/// `GET /kill` — Drop every observer and pending command.
///
/// # Errors
///
/// Returns [`RelayError::Unauthorized`] on a missing or wrong key.
#[utoipa::path(
    get,
    path = "/kill",
    tag = "Admin",
    summary = "Reset relay state",
    description = "Clears the subscriber registry and the command queue.",
    params(KeyQuery),
    responses(
        (status = 200, description = "State cleared", body = KillResponse),
        (status = 403, description = "Bad or missing key", body = ErrorResponse),
    )
)]
pub async fn kill_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<impl IntoResponse, RelayError> {
    let summary = state.relay_service.reset(query.key.as_deref()).await?;
    Ok(Json(KillResponse::from(summary)))
}

/// `GET /commands` — Pending commands as plain text, one per line.
///
/// # Errors
///
/// Returns [`RelayError::Unauthorized`] on a missing or wrong key.
#[utoipa::path(
    get,
    path = "/commands",
    tag = "Admin",
    summary = "List pending commands",
    description = "Plain-text listing of the queue, head first, one token per line.",
    params(KeyQuery),
    responses(
        (status = 200, description = "Pending commands", content_type = "text/plain", body = String),
        (status = 403, description = "Bad or missing key", body = ErrorResponse),
    )
)]
pub async fn list_commands_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<impl IntoResponse, RelayError> {
    let commands = state.relay_service.list_commands(query.key.as_deref()).await?;
    let body: String = commands.iter().map(|c| format!("{c}\n")).collect();
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body))
}

/// Admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/info", get(info_handler))
        .route("/kill", get(kill_handler))
        .route("/commands", get(list_commands_handler))
}
