//! Command submission DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /action`.
///
/// `action` is kept as raw JSON so that a missing field or a non-string
/// value is reported as an invalid command rather than a body parse error.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ActionRequest {
    /// Single-character command token: one of `W A S D Q E T`.
    #[serde(default)]
    #[schema(value_type = String, example = "W")]
    pub action: serde_json::Value,
}

impl ActionRequest {
    /// The submitted token, or `""` when `action` is not a string.
    #[must_use]
    pub fn raw_token(&self) -> &str {
        self.action.as_str().unwrap_or_default()
    }
}

/// Response body for an admitted command.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Confirmation message.
    pub status: String,
    /// The admitted token.
    pub action: String,
    /// Queue length after admission.
    pub queued: usize,
}
