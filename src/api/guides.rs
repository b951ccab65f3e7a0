use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use super::middleware::{AuthUser, CurrentUser};
use super::OkResponse;
use crate::db::{
    CreateGuideRequest, GuideListResponse, GuideResponse, GuideSummary, ListQuery,
    UpdateGuideRequest,
};
use crate::AppState;

/// Query parameters for listing. Numbers are taken leniently: anything that
/// does not parse falls back to the default.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub tag: Option<String>,
    pub q: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

fn parse_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse().ok())
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(format!("Invalid JSON: {}", rejection.body_text())))
}

/// List published guides
pub async fn list_guides(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<GuideListResponse>, ApiError> {
    let query = ListQuery::new(
        params.tag.as_deref(),
        params.q.as_deref(),
        parse_number(params.limit.as_deref()),
        parse_number(params.offset.as_deref()),
    );

    let guides = state
        .guides
        .list_published(&query)
        .await
        .map_err(|e| state.error(e))?;

    Ok(Json(GuideListResponse {
        items: guides.into_iter().map(GuideSummary::from).collect(),
        limit: query.limit,
        offset: query.offset,
    }))
}

/// Get a guide by ID
pub async fn get_guide(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<GuideResponse>, ApiError> {
    let guide = state
        .guides
        .get(current.user(), &id)
        .await
        .map_err(|e| state.error(e))?;
    Ok(Json(GuideResponse::from(guide)))
}

/// Create a new draft guide
pub async fn create_guide(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateGuideRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let req = json_body(payload)?;

    let id = state
        .guides
        .create(Some(&user), &req.title, &req.content, &req.tags)
        .await
        .map_err(|e| state.error(e))?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// Update title, content and optionally tags
pub async fn update_guide(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateGuideRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let req = json_body(payload)?;

    state
        .guides
        .update(Some(&user), &id, &req.title, &req.content, req.tags.as_deref())
        .await
        .map_err(|e| state.error(e))?;

    Ok(Json(OkResponse::ok()))
}

pub async fn publish_guide(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    state
        .guides
        .publish(Some(&user), &id)
        .await
        .map_err(|e| state.error(e))?;
    Ok(Json(OkResponse::ok()))
}

pub async fn unpublish_guide(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    state
        .guides
        .unpublish(Some(&user), &id)
        .await
        .map_err(|e| state.error(e))?;
    Ok(Json(OkResponse::ok()))
}

pub async fn delete_guide(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    state
        .guides
        .delete(Some(&user), &id)
        .await
        .map_err(|e| state.error(e))?;
    Ok(Json(OkResponse::ok()))
}
