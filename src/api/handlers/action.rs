//! Command submission handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{ActionRequest, ActionResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};

/// `POST /action` — Submit a robot command.
///
/// # Errors
///
/// Returns [`RelayError`] when the token is invalid, the special action was
/// not admitted, or the queue is full.
#[utoipa::path(
    post,
    path = "/action",
    tag = "Commands",
    summary = "Submit a command",
    description = "Queues one command for the robot. `T` is admitted only 5% of the time. \
        Rejections carry a machine-readable `reason`: `invalid`, `not-admitted` or `queue-full`.",
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Command queued", body = ActionResponse),
        (status = 400, description = "Command rejected", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
    )
)]
pub async fn submit_action(
    State(state): State<AppState>,
    Json(req): Json<ActionRequest>,
) -> Result<impl IntoResponse, RelayError> {
    let command = state.relay_service.submit(req.raw_token()).await?;
    let queued = state.relay_service.queue().len().await;

    Ok(Json(ActionResponse {
        status: "Action added".to_string(),
        action: command.to_string(),
        queued,
    }))
}

/// Command routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/action", post(submit_action))
}
