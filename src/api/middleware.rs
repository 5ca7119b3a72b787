use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::routes::ApiState;
use crate::error::AppError;
use crate::state::Admission;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Rate-limit key for a request: the peer IP, or `unknown` when the server was
/// not started with connect info.
pub fn client_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(State(state): State<ApiState>, req: Request, next: Next) -> Response {
    let client = client_key(&req);
    match state.limiter.check(&client) {
        Admission::Allowed => next.run(req).await,
        Admission::Limited { retry_after } => {
            warn!(client = %client, path = %req.uri().path(), "Rate limit exceeded");
            AppError::RateLimited {
                retry_after_secs: ceil_secs(retry_after),
            }
            .into_response()
        }
    }
}

pub async fn record_latency(State(state): State<ApiState>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let response = next.run(req).await;
    state.latency.record(start.elapsed());
    response
}

/// `X-Admin-Key` must match the configured key. With no key configured every request is refused.
pub async fn admin_auth(State(state): State<ApiState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.admin_key.as_deref() else {
        return AppError::Unauthorized.into_response();
    };

    let provided = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if constant_time_eq(key.as_bytes(), expected.as_bytes()) => next.run(req).await,
        _ => {
            warn!(client = %client_key(&req), "Rejected admin request");
            AppError::Unauthorized.into_response()
        }
    }
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    secs.max(1)
}
