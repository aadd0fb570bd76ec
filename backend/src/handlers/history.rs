//! Audit history HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::models::HistoryEntityType;
use crate::services::history::HistoryService;
use crate::AppState;
use shared::Pagination;

/// Get history for one entity, newest first, paginated
pub async fn get_history(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path((entity_type, entity_id)): Path<(String, i64)>,
    Query(pagination): Query<Pagination>,
) -> impl IntoResponse {
    let entity_type = match HistoryEntityType::from_str(&entity_type) {
        Some(entity_type) => entity_type,
        None => {
            return AppError::Validation {
                field: "entity_type".to_string(),
                message: format!("Unknown entity type {:?}", entity_type),
                message_fr: format!("Type d'entité inconnu : {:?}", entity_type),
            }
            .into_response();
        }
    };

    let service = HistoryService::new(state.db.clone());

    match service.query(entity_type, entity_id, pagination).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => e.into_response(),
    }
}
