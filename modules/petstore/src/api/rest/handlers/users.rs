use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::api::rest::dto::{EmptyResponse, ListQuery, PageResponse};
use crate::api::rest::error::ApiResult;
use crate::api::rest::routes::AppState;
use crate::domain::model::{User, UserCreate};

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.users.create(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<PageResponse<User>>> {
    let query = query.validate()?;
    let (items, total) = state.users.list(query.page, query.size).await?;
    Ok(Json(PageResponse::new(items, total, query)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get(&user_id).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<EmptyResponse>> {
    state.users.delete(&user_id).await?;
    Ok(Json(EmptyResponse {}))
}
