//! Fixed-window rate limiting for the admin login route.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::AppError;

/// Login attempts allowed per client per window.
pub const LOGIN_MAX_ATTEMPTS: u32 = 10;
pub const LOGIN_WINDOW_SECS: u64 = 60;

/// Attempt counters keyed by client.
#[derive(Debug)]
pub struct RateLimiter {
    /// key -> (attempts in window, window start)
    windows: Mutex<HashMap<String, (u32, Instant)>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn for_login() -> Self {
        Self::new(LOGIN_MAX_ATTEMPTS, LOGIN_WINDOW_SECS)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Record one attempt for `key`.
    ///
    /// `Ok(remaining)` when allowed, `Err(retry_after_secs)` when the window is exhausted.
    pub async fn check(&self, key: &str) -> Result<u32, u64> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        // Drop stale windows so the map only holds recently active clients.
        windows.retain(|_, (_, started)| now.duration_since(*started) < self.window);

        let (count, started) = windows.entry(key.to_string()).or_insert((0, now));
        if *count >= self.max_requests {
            let elapsed = now.duration_since(*started);
            let retry_after = self.window.saturating_sub(elapsed).as_secs();
            return Err(retry_after.max(1));
        }

        *count += 1;
        Ok(self.max_requests - *count)
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.windows.lock().await.len()
    }
}

/// Client key from the TCP peer address. Forwarding headers are not trusted.
pub fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|ConnectInfo(addr)| format!("ip:{}", addr.ip()))
        .unwrap_or_else(|| "ip:unknown".to_string())
}

/// Reject requests once a client exhausts its window with 429 and `Retry-After`.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);

    match limiter.check(&key).await {
        Ok(remaining) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", HeaderValue::from(limiter.max_requests()));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
            response
        }
        Err(retry_after) => {
            tracing::warn!(client = %key, retry_after, "Login rate limit exceeded");
            let mut response = AppError::RateLimited(retry_after).into_response();
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", HeaderValue::from(limiter.max_requests()));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(0u32));
            response
        }
    }
}
