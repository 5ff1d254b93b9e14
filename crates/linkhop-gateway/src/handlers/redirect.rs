use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::instrument;
use url::Url;

use crate::error::Result;
use crate::extract::Client;
use crate::headers::quota_headers;
use crate::state::AppState;

#[instrument(skip_all, fields(code = %code))]
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Client(client): Client,
) -> Result<Response> {
    let resolution = state.resolver().resolve(&code, &client).await?;
    let location = location(&resolution.target);

    Ok((
        StatusCode::MOVED_PERMANENTLY,
        quota_headers(resolution.quota.as_ref()),
        [(LOCATION, location)],
    )
        .into_response())
}

/// Non-ASCII targets are sent percent-encoded.
fn location(target: &str) -> HeaderValue {
    HeaderValue::from_str(target)
        .ok()
        .or_else(|| {
            Url::parse(target)
                .ok()
                .and_then(|url| HeaderValue::from_str(url.as_str()).ok())
        })
        .unwrap_or_else(|| HeaderValue::from_static("/"))
}
