use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::api::rest::dto::{EmptyResponse, ListQuery, PageResponse};
use crate::api::rest::error::ApiResult;
use crate::api::rest::routes::AppState;
use crate::domain::model::{Category, CategoryCreate};

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CategoryCreate>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state.categories.create(payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<PageResponse<Category>>> {
    let query = query.validate()?;
    let (items, total) = state.categories.list(query.page, query.size).await?;
    Ok(Json(PageResponse::new(items, total, query)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> ApiResult<Json<Category>> {
    Ok(Json(state.categories.get(&category_id).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> ApiResult<Json<EmptyResponse>> {
    state.categories.delete(&category_id).await?;
    Ok(Json(EmptyResponse {}))
}
