use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use linkhop_service::CreateLink;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::Client;
use crate::headers::quota_headers;
use crate::model::{CreateLinkRequest, LinkDetailResponse, LinkResponse, UpdateLinkRequest};
use crate::state::AppState;

#[instrument(skip_all)]
pub async fn create_link_handler(
    State(state): State<AppState>,
    Client(client): Client,
    request: std::result::Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = request.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let created = state
        .resolver()
        .create(
            CreateLink {
                target: request.target,
                alias: request.alias,
                expires_at: request.expires_at,
            },
            &client,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        quota_headers(created.quota.as_ref()),
        Json(LinkResponse::new(created.record, state.base_url())),
    )
        .into_response())
}

#[instrument(skip_all, fields(code = %code))]
pub async fn link_detail_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkDetailResponse>> {
    let record = state.resolver().lookup(&code).await?;
    Ok(Json(LinkDetailResponse::new(record, state.base_url())))
}

#[instrument(skip_all, fields(code = %code))]
pub async fn update_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    request: std::result::Result<Json<UpdateLinkRequest>, JsonRejection>,
) -> Result<Json<LinkResponse>> {
    let Json(request) = request.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let record = state
        .resolver()
        .set_expiry(&code, request.expires_at)
        .await?;
    Ok(Json(LinkResponse::new(record, state.base_url())))
}

#[instrument(skip_all, fields(code = %code))]
pub async fn delete_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    state.resolver().deactivate(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}
