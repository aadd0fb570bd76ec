//! Holding lot ("stabulation") HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::middleware::CurrentUser;
use crate::services::stabulation::{
    AddAnimalInput, CancelStabulationInput, CreateStabulationInput, FinalizeStabulationInput,
    StabulationService,
};
use crate::AppState;

/// List all holding lots
pub async fn list_stabulations(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> impl IntoResponse {
    let service = StabulationService::new(state.db.clone());

    match service.list().await {
        Ok(lots) => (StatusCode::OK, Json(serde_json::json!({ "lots": lots }))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a specific holding lot with its ordered members
pub async fn get_stabulation(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(lot_id): Path<i64>,
) -> impl IntoResponse {
    let service = StabulationService::new(state.db.clone());

    match service.get(lot_id).await {
        Ok(lot) => (StatusCode::OK, Json(lot)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a new holding lot with its initial animals
pub async fn create_stabulation(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<CreateStabulationInput>,
) -> impl IntoResponse {
    let service = StabulationService::new(state.db.clone());

    match service.create(&user.0, input).await {
        Ok(lot) => (StatusCode::CREATED, Json(lot)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Add an animal to an active lot
pub async fn add_lot_animal(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(lot_id): Path<i64>,
    Json(input): Json<AddAnimalInput>,
) -> impl IntoResponse {
    let service = StabulationService::new(state.db.clone());

    match service.add_animal(&user.0, lot_id, input).await {
        Ok(lot) => (StatusCode::OK, Json(lot)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Remove an animal from an active lot
pub async fn remove_lot_animal(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((lot_id, animal_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    let service = StabulationService::new(state.db.clone());

    match service.remove_animal(&user.0, lot_id, animal_id).await {
        Ok(lot) => (StatusCode::OK, Json(lot)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Finalize an active lot with per-animal slaughter data
pub async fn finalize_stabulation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(lot_id): Path<i64>,
    Json(input): Json<FinalizeStabulationInput>,
) -> impl IntoResponse {
    let service = StabulationService::new(state.db.clone());

    match service.finalize(&user.0, lot_id, input).await {
        Ok(lot) => (StatusCode::OK, Json(lot)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Cancel an active lot, reverting its animals to alive
pub async fn cancel_stabulation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(lot_id): Path<i64>,
    Json(input): Json<CancelStabulationInput>,
) -> impl IntoResponse {
    let service = StabulationService::new(state.db.clone());

    match service.cancel(&user.0, lot_id, input).await {
        Ok(lot) => (StatusCode::OK, Json(lot)).into_response(),
        Err(e) => e.into_response(),
    }
}
