//! HTTP endpoint handlers organized by concern.

pub mod action;
pub mod admin;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all REST routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(action::routes())
        .merge(admin::routes())
        .merge(system::routes())
}
