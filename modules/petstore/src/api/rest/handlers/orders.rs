use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::api::rest::dto::{EmptyResponse, ListQuery, PageResponse};
use crate::api::rest::error::ApiResult;
use crate::api::rest::routes::AppState;
use crate::domain::model::{Order, OrderCreate};

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<OrderCreate>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = state.orders.create(payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<PageResponse<Order>>> {
    let query = query.validate()?;
    let (items, total) = state.orders.list(query.page, query.size).await?;
    Ok(Json(PageResponse::new(items, total, query)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.orders.get(&order_id).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<EmptyResponse>> {
    state.orders.delete(&order_id).await?;
    Ok(Json(EmptyResponse {}))
}
