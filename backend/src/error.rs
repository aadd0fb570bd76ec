//! Error handling for the Abattoir Management Platform
//!
//! Provides consistent error responses in French and English

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::FinalizationViolation;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        message_fr: String,
    },

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_fr: String,
    },

    // Workflow errors
    #[error("{operation} is not permitted on {entity} in status {status}")]
    InvalidTransition {
        entity: String,
        operation: String,
        status: String,
    },

    #[error("Order {0} is not in draft and cannot be deleted")]
    NotDeletable(String),

    #[error("Finalization data missing for animals {missing:?}")]
    IncompleteSubmission { missing: Vec<i64> },

    #[error("Hot weight for animal {animal_id} must be positive")]
    InvalidWeight { animal_id: i64 },

    #[error("Hot weight {hot_weight_kg} kg exceeds live weight {live_weight_kg} kg for animal {animal_id}")]
    WeightExceedsLiveWeight {
        animal_id: i64,
        hot_weight_kg: Decimal,
        live_weight_kg: Decimal,
    },

    #[error("Post-slaughter tag missing for animal {animal_id}")]
    MissingTag { animal_id: i64 },

    #[error("Post-slaughter tag {0} is already in use")]
    DuplicateTag(String),

    #[error("Invalid cancellation reason: {0}")]
    InvalidReason(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Concurrent modification detected on {0}")]
    ConcurrencyConflict(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<FinalizationViolation> for AppError {
    fn from(violation: FinalizationViolation) -> Self {
        match violation {
            FinalizationViolation::IncompleteSubmission { missing } => {
                AppError::IncompleteSubmission { missing }
            }
            FinalizationViolation::UnknownAnimal { animal_id } => AppError::Validation {
                field: "entries".to_string(),
                message: format!("Animal {} is not a member of the lot", animal_id),
                message_fr: format!("La bête {} ne fait pas partie du lot", animal_id),
            },
            FinalizationViolation::InvalidWeight { animal_id } => {
                AppError::InvalidWeight { animal_id }
            }
            FinalizationViolation::WeightExceedsLiveWeight {
                animal_id,
                hot_weight_kg,
                live_weight_kg,
            } => AppError::WeightExceedsLiveWeight {
                animal_id,
                hot_weight_kg,
                live_weight_kg,
            },
            FinalizationViolation::MissingTag { animal_id } => AppError::MissingTag { animal_id },
            FinalizationViolation::DuplicateTag { tag } => AppError::DuplicateTag(tag),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_fr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Unauthorized { message, message_fr } => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "UNAUTHORIZED".to_string(),
                    message_en: message.clone(),
                    message_fr: message_fr.clone(),
                    field: None,
                },
            ),
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                ErrorDetail {
                    code: "INSUFFICIENT_PERMISSIONS".to_string(),
                    message_en: "You do not have permission to perform this action".to_string(),
                    message_fr: "Vous n'avez pas la permission d'effectuer cette action".to_string(),
                    field: None,
                },
            ),
            AppError::Validation { field, message, message_fr } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_fr: message_fr.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::InvalidTransition { entity, operation, status } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_TRANSITION".to_string(),
                    message_en: format!(
                        "{} is not permitted on {} in status {}",
                        operation, entity, status
                    ),
                    message_fr: format!(
                        "L'opération {} n'est pas permise sur {} au statut {}",
                        operation, entity, status
                    ),
                    field: None,
                },
            ),
            AppError::NotDeletable(order_number) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "NOT_DELETABLE".to_string(),
                    message_en: format!(
                        "Order {} is not in draft and cannot be deleted",
                        order_number
                    ),
                    message_fr: format!(
                        "La commande {} n'est plus en brouillon et ne peut pas être supprimée",
                        order_number
                    ),
                    field: None,
                },
            ),
            AppError::IncompleteSubmission { missing } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INCOMPLETE_SUBMISSION".to_string(),
                    message_en: format!("Finalization data missing for animals {:?}", missing),
                    message_fr: format!(
                        "Données d'abattage manquantes pour les bêtes {:?}",
                        missing
                    ),
                    field: Some("entries".to_string()),
                },
            ),
            AppError::InvalidWeight { animal_id } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_WEIGHT".to_string(),
                    message_en: format!("Hot weight for animal {} must be positive", animal_id),
                    message_fr: format!(
                        "Le poids à chaud de la bête {} doit être positif",
                        animal_id
                    ),
                    field: Some("hot_weight_kg".to_string()),
                },
            ),
            AppError::WeightExceedsLiveWeight { animal_id, hot_weight_kg, live_weight_kg } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "WEIGHT_EXCEEDS_LIVE_WEIGHT".to_string(),
                    message_en: format!(
                        "Hot weight {} kg exceeds live weight {} kg for animal {}",
                        hot_weight_kg, live_weight_kg, animal_id
                    ),
                    message_fr: format!(
                        "Le poids à chaud {} kg dépasse le poids vif {} kg pour la bête {}",
                        hot_weight_kg, live_weight_kg, animal_id
                    ),
                    field: Some("hot_weight_kg".to_string()),
                },
            ),
            AppError::MissingTag { animal_id } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "MISSING_TAG".to_string(),
                    message_en: format!("Post-slaughter tag missing for animal {}", animal_id),
                    message_fr: format!(
                        "Numéro d'abattage manquant pour la bête {}",
                        animal_id
                    ),
                    field: Some("slaughter_tag_number".to_string()),
                },
            ),
            AppError::DuplicateTag(tag) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_TAG".to_string(),
                    message_en: format!("Post-slaughter tag {} is already in use", tag),
                    message_fr: format!("Le numéro d'abattage {} est déjà utilisé", tag),
                    field: Some("slaughter_tag_number".to_string()),
                },
            ),
            AppError::InvalidReason(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_REASON".to_string(),
                    message_en: format!("Invalid cancellation reason: {}", msg),
                    message_fr: "Le motif d'annulation doit contenir entre 10 et 500 caractères"
                        .to_string(),
                    field: Some("reason".to_string()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_fr: format!("{} introuvable", resource),
                    field: None,
                },
            ),
            AppError::ConcurrencyConflict(entity) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONCURRENCY_CONFLICT".to_string(),
                    message_en: format!(
                        "{} was modified by a concurrent operation, please retry",
                        entity
                    ),
                    message_fr: format!(
                        "{} a été modifié par une opération concurrente, veuillez réessayer",
                        entity
                    ),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_fr: "Une erreur de base de données s'est produite".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_fr: "Une erreur interne s'est produite".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
