use std::time::Duration;

use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use linkhop_ratelimit::Quota;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// `X-RateLimit-*` headers for `quota`, empty when the limiter failed open.
pub fn quota_headers(quota: Option<&Quota>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let Some(quota) = quota else {
        return headers;
    };
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(quota.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(quota.remaining));
    if let Ok(reset) = HeaderValue::from_str(&quota.reset_at.to_string()) {
        headers.insert(X_RATELIMIT_RESET, reset);
    }
    headers
}

/// `Retry-After` in whole seconds, rounded up.
pub fn retry_after(delay: Duration) -> (HeaderName, HeaderValue) {
    let secs = delay.as_secs() + u64::from(delay.subsec_nanos() > 0);
    (RETRY_AFTER, HeaderValue::from(secs))
}
