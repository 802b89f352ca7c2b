use crate::error::PaymentError;
use crate::ratelimit::RateLimitStore;
use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

const WINDOW_MS: i64 = 60_000;

#[derive(Clone)]
pub struct RateLimitState {
    pub store: Arc<dyn RateLimitStore>,
    pub max_per_minute: i64,
}

pub async fn enforce(
    State(state): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .split(',')
        .next()
        .unwrap_or("unknown")
        .trim()
        .to_string();

    let key = format!("ip:{ip}");
    match state.store.allow(&key, state.max_per_minute, WINDOW_MS).await {
        Ok(true) => {}
        Ok(false) => return PaymentError::RateLimitExceeded.into_response(),
        // A lost guard counter must not block payments.
        Err(e) => tracing::warn!(error = %e, "rate-limit store unavailable, allowing request"),
    }

    next.run(request).await
}
