//! Per-client request budgets for the credential routes
//!
//! Each [`RateRule`] gives one route a fixed window per client address.
//! Counters live in memory and are swept by a periodic task in `main`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::HeaderMap;
use shared::error::{AppError, ErrorCode};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::state::AppState;

/// Request budget for one route
#[derive(Debug, Clone, Copy)]
pub struct RateRule {
    pub route: &'static str,
    pub max_requests: u32,
    pub window: Duration,
}

pub const LOGIN: RateRule = RateRule {
    route: "login",
    max_requests: 5,
    window: Duration::from_secs(60),
};

pub const REGISTER: RateRule = RateRule {
    route: "register",
    max_requests: 3,
    window: Duration::from_secs(60),
};

/// Counters whose window opened longer ago than this are swept
const IDLE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
struct Window {
    opened: Instant,
    hits: u32,
}

impl Window {
    /// Count one hit. `Err` carries the time until the window reopens.
    fn hit(&mut self, rule: &RateRule, now: Instant) -> Result<(), Duration> {
        if now.saturating_duration_since(self.opened) >= rule.window {
            *self = Window {
                opened: now,
                hits: 0,
            };
        }
        if self.hits >= rule.max_requests {
            let elapsed = now.saturating_duration_since(self.opened);
            return Err(rule.window.saturating_sub(elapsed));
        }
        self.hits += 1;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// (route, client address) -> current window
    windows: Arc<Mutex<HashMap<(&'static str, String), Window>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn admit(&self, rule: &RateRule, client: &str) -> Result<(), Duration> {
        self.admit_at(rule, client, Instant::now()).await
    }

    async fn admit_at(&self, rule: &RateRule, client: &str, now: Instant) -> Result<(), Duration> {
        let mut windows = self.windows.lock().await;
        windows
            .entry((rule.route, client.to_owned()))
            .or_insert(Window {
                opened: now,
                hits: 0,
            })
            .hit(rule, now)
    }

    pub async fn cleanup(&self) {
        self.cleanup_at(Instant::now()).await;
    }

    async fn cleanup_at(&self, now: Instant) {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, w| now.saturating_duration_since(w.opened) < IDLE_TTL);
        tracing::debug!(dropped = before - windows.len(), "Rate limiter swept");
    }
}

/// First X-Forwarded-For hop when behind a proxy, else the socket peer
fn client_addr(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_owned)
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn enforce(
    state: &AppState,
    rule: &RateRule,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);
    let client = client_addr(request.headers(), peer);

    if let Err(retry_in) = state.rate_limiter.admit(rule, &client).await {
        let secs = retry_in.as_secs().max(1);
        tracing::warn!(route = rule.route, client = %client, retry_in_secs = secs, "Rate limit exceeded");
        return Err(AppError::with_message(
            ErrorCode::TooManyRequests,
            format!("Too many requests, retry in {secs}s"),
        ));
    }
    Ok(next.run(request).await)
}

pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, &LOGIN, request, next).await
}

pub async fn register_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, &REGISTER, request, next).await
}
