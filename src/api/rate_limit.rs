//! Per-client fixed-window rate limiting.
//!
//! [`RateLimiter`] counts requests per client IP inside a fixed window and
//! [`enforce_rate_limit`] applies it as an Axum middleware in front of every
//! route, so rejected requests never reach the relay. Responses carry the
//! IETF draft-7 `RateLimit-Policy` and `RateLimit` headers.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::RelayError;

/// Request count for one client in the current window.
#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of an admitted request, used to render the rate-limit headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Time until the window resets.
    pub reset: Duration,
}

impl RateLimitDecision {
    fn apply_headers(&self, headers: &mut HeaderMap, window: Duration) {
        let policy = format!("{};w={}", self.limit, window.as_secs());
        let state = format!(
            "limit={}, remaining={}, reset={}",
            self.limit,
            self.remaining,
            self.reset.as_secs_f64().ceil()
        );
        if let Ok(value) = HeaderValue::from_str(&policy) {
            headers.insert(HeaderName::from_static("ratelimit-policy"), value);
        }
        if let Ok(value) = HeaderValue::from_str(&state) {
            headers.insert(HeaderName::from_static("ratelimit"), value);
        }
    }
}

/// Fixed-window request counter keyed by client IP.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    clients: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    /// Allows `limit` requests per client per `window`.
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Length of the counting window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Counts one request from `client`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RateLimited`] once the client has used up its
    /// window; the rejected request is not counted.
    pub async fn check(&self, client: IpAddr) -> Result<RateLimitDecision, RelayError> {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;

        if !clients.contains_key(&client) {
            clients.retain(|_, w| now.duration_since(w.started) < self.window);
        }

        let window = clients.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= self.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        let reset = self
            .window
            .saturating_sub(now.duration_since(window.started));
        if window.count >= self.limit {
            return Err(RelayError::RateLimited {
                retry_after_ms: u64::try_from(reset.as_millis()).unwrap_or(u64::MAX),
            });
        }

        window.count += 1;
        Ok(RateLimitDecision {
            limit: self.limit,
            remaining: self.limit - window.count,
            reset,
        })
    }
}

/// Axum middleware rejecting requests over the per-client limit.
///
/// Requests without connection info (e.g. in-process tests) share one
/// bucket.
pub async fn enforce_rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |info| info.0.ip());

    match limiter.check(client).await {
        Ok(decision) => {
            let mut response = next.run(req).await;
            decision.apply_headers(response.headers_mut(), limiter.window());
            response
        }
        Err(err) => {
            tracing::warn!(%client, "rate limit exceeded");
            let reset = match &err {
                RelayError::RateLimited { retry_after_ms } => Duration::from_millis(*retry_after_ms),
                _ => limiter.window(),
            };
            let decision = RateLimitDecision {
                limit: limiter.limit,
                remaining: 0,
                reset,
            };
            let mut response = err.into_response();
            decision.apply_headers(response.headers_mut(), limiter.window());
            response
        }
    }
}
