//! Per-client-IP rate limiting.

use super::AppState;
use crate::config::ForwardedTrust;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::DefaultKeyedRateLimiter;
use governor::clock::{Clock, DefaultClock};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-rate-limit-limit");

/// The limiter key: first `X-Forwarded-For` hop when the peer is a trusted
/// proxy, else the peer IP.
pub fn client_key(req: &Request, trust: &ForwardedTrust) -> String {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let Some(peer) = peer else {
        return "unknown".to_string();
    };
    if trust.trusts(peer) {
        let forwarded = req
            .headers()
            .get(X_FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    peer.to_string()
}

/// Drop limiter keys whose budget has fully refilled. Returns the keys left.
pub fn prune(limiter: &DefaultKeyedRateLimiter<String>) -> usize {
    limiter.retain_recent();
    limiter.shrink_to_fit();
    limiter.len()
}

/// Prune `limiter` every `period` until the runtime shuts down.
pub fn spawn_pruner(
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(period);
        loop {
            ticks.tick().await;
            let remaining = prune(&limiter);
            tracing::debug!(remaining, "rate limiter pruned");
        }
    })
}

pub async fn limit_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let key = client_key(&req, &state.config.forwarded);
    let Err(not_until) = state.limiter.check_key(&key) else {
        return next.run(req).await;
    };

    let wait = not_until.wait_time_from(DefaultClock::default().now());
    let retry_after = (wait.as_secs() + u64::from(wait.subsec_nanos() > 0)).max(1);
    let limit = state.config.rate_limit_per_minute;
    tracing::warn!(client = %key, limit = limit.get(), "rate limit exceeded");

    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        format!("API calls quota exceeded! maximum admitted {limit} per 1m."),
    )
        .into_response();
    let headers = response.headers_mut();
    headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    headers.insert(X_RATE_LIMIT_LIMIT, HeaderValue::from_static("1m"));
    response
}
