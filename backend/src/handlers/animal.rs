//! Animal HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::middleware::{check_permission, CurrentUser};
use crate::models::AnimalStatus;
use crate::services::animal::{AnimalService, CreateAnimalInput, UpdateAnimalInput};
use crate::AppState;

/// Query parameters for listing animals
#[derive(Debug, Deserialize)]
pub struct AnimalListQuery {
    pub status: Option<AnimalStatus>,
}

/// List animals, optionally filtered by status
pub async fn list_animals(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<AnimalListQuery>,
) -> impl IntoResponse {
    let service = AnimalService::new(state.db.clone());

    match service.list(query.status).await {
        Ok(animals) => {
            (StatusCode::OK, Json(serde_json::json!({ "animals": animals }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Get a specific animal
pub async fn get_animal(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(animal_id): Path<i64>,
) -> impl IntoResponse {
    let service = AnimalService::new(state.db.clone());

    match service.get(animal_id).await {
        Ok(animal) => (StatusCode::OK, Json(animal)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Register a new animal
pub async fn create_animal(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<CreateAnimalInput>,
) -> impl IntoResponse {
    if let Err(e) = check_permission(&user.0, "animals", "write") {
        return e.into_response();
    }

    let service = AnimalService::new(state.db.clone());

    match service.create(&user.0, input).await {
        Ok(animal) => (StatusCode::CREATED, Json(animal)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Edit an animal record
pub async fn update_animal(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(animal_id): Path<i64>,
    Json(input): Json<UpdateAnimalInput>,
) -> impl IntoResponse {
    if let Err(e) = check_permission(&user.0, "animals", "write") {
        return e.into_response();
    }

    let service = AnimalService::new(state.db.clone());

    match service.update(&user.0, animal_id, input).await {
        Ok(animal) => (StatusCode::OK, Json(animal)).into_response(),
        Err(e) => e.into_response(),
    }
}
