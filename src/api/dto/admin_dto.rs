//! Admin and introspection DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::service::{RelayStatus, ResetSummary};

/// `?key=` query parameter carrying the admin secret.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct KeyQuery {
    /// Shared admin secret.
    #[serde(default)]
    pub key: Option<String>,
}

/// Response body for `GET /info`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    /// Resident memory of the relay process, e.g. `"12.34 MB"`.
    pub memory_usage: String,
    /// Number of registered observers.
    pub clients_count: usize,
    /// Number of pending commands.
    pub actions_count: usize,
    /// Observer ids in connection order.
    pub clients: Vec<u64>,
    /// Pending command tokens, head first.
    pub actions: Vec<String>,
}

impl From<RelayStatus> for InfoResponse {
    fn from(status: RelayStatus) -> Self {
        Self {
            memory_usage: status.memory_usage_label(),
            clients_count: status.subscribers.len(),
            actions_count: status.commands.len(),
            clients: status.subscribers.iter().map(|id| id.get()).collect(),
            actions: status.commands.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Response body for `GET /kill`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KillResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Observers dropped from the registry.
    pub subscribers_removed: usize,
    /// Pending commands discarded.
    pub commands_removed: usize,
}

impl From<ResetSummary> for KillResponse {
    fn from(summary: ResetSummary) -> Self {
        Self {
            status: "ok".to_string(),
            subscribers_removed: summary.subscribers_removed,
            commands_removed: summary.commands_removed,
        }
    }
}
