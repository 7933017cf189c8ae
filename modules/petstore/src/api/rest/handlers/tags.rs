use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::api::rest::dto::{EmptyResponse, ListQuery, PageResponse};
use crate::api::rest::error::ApiResult;
use crate::api::rest::routes::AppState;
use crate::domain::model::{Tag, TagCreate};

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<TagCreate>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    let tag = state.tags.create(payload).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<PageResponse<Tag>>> {
    let query = query.validate()?;
    let (items, total) = state.tags.list(query.page, query.size).await?;
    Ok(Json(PageResponse::new(items, total, query)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(tag_id): Path<String>,
) -> ApiResult<Json<Tag>> {
    Ok(Json(state.tags.get(&tag_id).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(tag_id): Path<String>,
) -> ApiResult<Json<EmptyResponse>> {
    state.tags.delete(&tag_id).await?;
    Ok(Json(EmptyResponse {}))
}
