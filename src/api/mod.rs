//! HTTP layer: route handlers, DTOs, rate limiting and router composition.
//!
//! All endpoints are mounted at the root to match the paths robot clients
//! and dashboards already use.

pub mod dto;
pub mod handlers;
pub mod openapi;
pub mod rate_limit;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::stream::handler::actions_handler;

/// Builds the route table without state or middleware.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(handlers::routes())
        .route("/actions", get(actions_handler))
}

/// Builds the complete application: routes, API docs, rate limiting,
/// tracing and CORS, with `state` applied.
pub fn build_app(state: AppState) -> Router {
    let router = build_router();

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    router
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.rate_limiter),
            rate_limit::enforce_rate_limit,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
