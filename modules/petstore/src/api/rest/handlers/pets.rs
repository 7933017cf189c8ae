use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::api::rest::dto::{EmptyResponse, ListQuery, PageResponse};
use crate::api::rest::error::ApiResult;
use crate::api::rest::routes::AppState;
use crate::domain::model::{Pet, PetCreate, PetUpdate};

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<PetCreate>,
) -> ApiResult<(StatusCode, Json<Pet>)> {
    let pet = state.pets.create(payload).await?;
    Ok((StatusCode::CREATED, Json(pet)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<PageResponse<Pet>>> {
    let query = query.validate()?;
    let (items, total) = state.pets.list(query.page, query.size).await?;
    Ok(Json(PageResponse::new(items, total, query)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(pet_id): Path<String>,
) -> ApiResult<Json<Pet>> {
    Ok(Json(state.pets.get(&pet_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(pet_id): Path<String>,
    Json(payload): Json<PetUpdate>,
) -> ApiResult<Json<Pet>> {
    Ok(Json(state.pets.update(&pet_id, payload).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(pet_id): Path<String>,
) -> ApiResult<Json<EmptyResponse>> {
    state.pets.delete(&pet_id).await?;
    Ok(Json(EmptyResponse {}))
}
