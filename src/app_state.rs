//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::api::rate_limit::RateLimiter;
use crate::config::RelayConfig;
use crate::service::RelayService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Relay service holding the queue and the subscriber registry.
    pub relay_service: Arc<RelayService>,
    /// Per-client request limiter applied in front of every route.
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Builds state from configuration around an existing relay service.
    #[must_use]
    pub fn new(config: &RelayConfig, relay_service: Arc<RelayService>) -> Self {
        Self {
            relay_service,
            rate_limiter: Arc::new(RateLimiter::new(
                config.rate_limit_requests,
                config.rate_limit_window,
            )),
        }
    }
}
