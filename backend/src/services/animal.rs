//! Animal ("bête") service
//!
//! Direct CRUD over the herd. Status, hot weight, and the post-slaughter
//! tag are not editable here: they change only through the holding-lot
//! workflow.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::history::HistoryService;
use shared::validation::validate_live_weight;
use shared::{
    Animal, AnimalStatus, AnimalType, FieldChange, HealthState, HistoryAction, HistoryEntityType,
    Sex,
};

/// Animal service for managing the herd
#[derive(Clone)]
pub struct AnimalService {
    db: PgPool,
}

/// Database row for an animal
#[derive(Debug, sqlx::FromRow)]
struct AnimalRow {
    id: i64,
    tag_number: String,
    slaughter_tag_number: Option<String>,
    species: String,
    sex: String,
    live_weight_kg: Decimal,
    hot_weight_kg: Option<Decimal>,
    cold_weight_kg: Option<Decimal>,
    health_state: String,
    status: String,
    urgent_slaughter: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AnimalRow {
    fn into_animal(self) -> AppResult<Animal> {
        Ok(Animal {
            id: self.id,
            tag_number: self.tag_number,
            slaughter_tag_number: self.slaughter_tag_number,
            species: AnimalType::from_str(&self.species).ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!("unknown species {:?}", self.species))
            })?,
            sex: Sex::from_str(&self.sex).ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!("unknown sex {:?}", self.sex))
            })?,
            live_weight_kg: self.live_weight_kg,
            hot_weight_kg: self.hot_weight_kg,
            cold_weight_kg: self.cold_weight_kg,
            health_state: HealthState::from_str(&self.health_state).ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "unknown health state {:?}",
                    self.health_state
                ))
            })?,
            status: AnimalStatus::from_str(&self.status).ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!("unknown animal status {:?}", self.status))
            })?,
            urgent_slaughter: self.urgent_slaughter,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ANIMAL_COLUMNS: &str = "id, tag_number, slaughter_tag_number, species, sex, live_weight_kg, \
     hot_weight_kg, cold_weight_kg, health_state, status, urgent_slaughter, created_at, updated_at";

/// Input for registering an animal at reception
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAnimalInput {
    pub tag_number: String,
    pub species: AnimalType,
    pub sex: Sex,
    pub live_weight_kg: Decimal,
    pub health_state: Option<HealthState>,
    pub urgent_slaughter: Option<bool>,
}

/// Input for editing an animal record.
/// Status and slaughter data are driven by the holding-lot workflow and
/// cannot be edited directly.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAnimalInput {
    pub tag_number: Option<String>,
    pub sex: Option<Sex>,
    pub live_weight_kg: Option<Decimal>,
    pub cold_weight_kg: Option<Decimal>,
    pub health_state: Option<HealthState>,
    pub urgent_slaughter: Option<bool>,
}

impl AnimalService {
    /// Create a new AnimalService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a new animal, entering the herd alive
    pub async fn create(&self, actor: &AuthUser, input: CreateAnimalInput) -> AppResult<Animal> {
        let tag_number = input.tag_number.trim().to_string();
        if tag_number.is_empty() {
            return Err(AppError::Validation {
                field: "tag_number".to_string(),
                message: "Tag number cannot be empty".to_string(),
                message_fr: "Le numéro de boucle ne peut pas être vide".to_string(),
            });
        }
        if let Err(msg) = validate_live_weight(input.live_weight_kg) {
            return Err(AppError::Validation {
                field: "live_weight_kg".to_string(),
                message: msg.to_string(),
                message_fr: "Le poids vif doit être positif".to_string(),
            });
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM animals WHERE tag_number = $1)")
                .bind(&tag_number)
                .fetch_one(&self.db)
                .await?;
        if exists {
            return Err(AppError::Validation {
                field: "tag_number".to_string(),
                message: format!("An animal with tag {} already exists", tag_number),
                message_fr: format!("Une bête avec la boucle {} existe déjà", tag_number),
            });
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, AnimalRow>(&format!(
            r#"
            INSERT INTO animals (tag_number, species, sex, live_weight_kg, health_state, status, urgent_slaughter)
            VALUES ($1, $2, $3, $4, $5, 'alive', $6)
            RETURNING {ANIMAL_COLUMNS}
            "#
        ))
        .bind(&tag_number)
        .bind(input.species.as_str())
        .bind(input.sex.as_str())
        .bind(input.live_weight_kg)
        .bind(input.health_state.unwrap_or(HealthState::Good).as_str())
        .bind(input.urgent_slaughter.unwrap_or(false))
        .fetch_one(&mut *tx)
        .await?;

        HistoryService::record_event(
            &mut tx,
            HistoryEntityType::Animal,
            row.id,
            HistoryAction::Create,
            None,
            Some(tag_number),
            actor,
        )
        .await?;

        tx.commit().await?;

        row.into_animal()
    }

    /// Get an animal by ID
    pub async fn get(&self, animal_id: i64) -> AppResult<Animal> {
        let row = sqlx::query_as::<_, AnimalRow>(&format!(
            "SELECT {ANIMAL_COLUMNS} FROM animals WHERE id = $1"
        ))
        .bind(animal_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Animal".to_string()))?;

        row.into_animal()
    }

    /// List animals, optionally filtered by status, newest first
    pub async fn list(&self, status: Option<AnimalStatus>) -> AppResult<Vec<Animal>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, AnimalRow>(&format!(
                    "SELECT {ANIMAL_COLUMNS} FROM animals WHERE status = $1 ORDER BY created_at DESC"
                ))
                .bind(status.as_str())
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, AnimalRow>(&format!(
                    "SELECT {ANIMAL_COLUMNS} FROM animals ORDER BY created_at DESC"
                ))
                .fetch_all(&self.db)
                .await?
            }
        };

        rows.into_iter().map(|r| r.into_animal()).collect()
    }

    /// Edit an animal record, recording one history entry per changed field
    pub async fn update(
        &self,
        actor: &AuthUser,
        animal_id: i64,
        input: UpdateAnimalInput,
    ) -> AppResult<Animal> {
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, AnimalRow>(&format!(
            "SELECT {ANIMAL_COLUMNS} FROM animals WHERE id = $1"
        ))
        .bind(animal_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Animal".to_string()))?;

        let tag_number = match input.tag_number {
            Some(t) => {
                let t = t.trim().to_string();
                if t.is_empty() {
                    return Err(AppError::Validation {
                        field: "tag_number".to_string(),
                        message: "Tag number cannot be empty".to_string(),
                        message_fr: "Le numéro de boucle ne peut pas être vide".to_string(),
                    });
                }
                t
            }
            None => existing.tag_number.clone(),
        };
        let sex = input
            .sex
            .map(|v| v.as_str().to_string())
            .unwrap_or_else(|| existing.sex.clone());
        let live_weight_kg = input.live_weight_kg.unwrap_or(existing.live_weight_kg);
        let cold_weight_kg = input.cold_weight_kg.or(existing.cold_weight_kg);
        let health_state = input
            .health_state
            .map(|v| v.as_str().to_string())
            .unwrap_or_else(|| existing.health_state.clone());
        let urgent_slaughter = input.urgent_slaughter.unwrap_or(existing.urgent_slaughter);

        if let Err(msg) = validate_live_weight(live_weight_kg) {
            return Err(AppError::Validation {
                field: "live_weight_kg".to_string(),
                message: msg.to_string(),
                message_fr: "Le poids vif doit être positif".to_string(),
            });
        }
        // Hot weight never exceeds live weight; a correction of the live
        // weight must not break that invariant retroactively
        if let Some(hot) = existing.hot_weight_kg {
            if live_weight_kg < hot {
                return Err(AppError::Validation {
                    field: "live_weight_kg".to_string(),
                    message: format!(
                        "Live weight {} kg cannot be below the recorded hot weight {} kg",
                        live_weight_kg, hot
                    ),
                    message_fr: format!(
                        "Le poids vif {} kg ne peut pas être inférieur au poids à chaud {} kg",
                        live_weight_kg, hot
                    ),
                });
            }
        }

        let mut changes: Vec<FieldChange> = Vec::new();
        if tag_number != existing.tag_number {
            changes.push(FieldChange::new(
                "tag_number",
                Some(existing.tag_number.clone()),
                Some(tag_number.clone()),
            ));
        }
        if sex != existing.sex {
            changes.push(FieldChange::new(
                "sex",
                Some(existing.sex.clone()),
                Some(sex.clone()),
            ));
        }
        if live_weight_kg != existing.live_weight_kg {
            changes.push(FieldChange::new(
                "live_weight_kg",
                Some(existing.live_weight_kg.to_string()),
                Some(live_weight_kg.to_string()),
            ));
        }
        if cold_weight_kg != existing.cold_weight_kg {
            changes.push(FieldChange::new(
                "cold_weight_kg",
                existing.cold_weight_kg.map(|w| w.to_string()),
                cold_weight_kg.map(|w| w.to_string()),
            ));
        }
        if health_state != existing.health_state {
            changes.push(FieldChange::new(
                "health_state",
                Some(existing.health_state.clone()),
                Some(health_state.clone()),
            ));
        }
        if urgent_slaughter != existing.urgent_slaughter {
            changes.push(FieldChange::new(
                "urgent_slaughter",
                Some(existing.urgent_slaughter.to_string()),
                Some(urgent_slaughter.to_string()),
            ));
        }

        if changes.is_empty() {
            return existing.into_animal();
        }

        let row = sqlx::query_as::<_, AnimalRow>(&format!(
            r#"
            UPDATE animals
            SET tag_number = $1, sex = $2, live_weight_kg = $3, cold_weight_kg = $4,
                health_state = $5, urgent_slaughter = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING {ANIMAL_COLUMNS}
            "#
        ))
        .bind(&tag_number)
        .bind(&sex)
        .bind(live_weight_kg)
        .bind(cold_weight_kg)
        .bind(&health_state)
        .bind(urgent_slaughter)
        .bind(animal_id)
        .fetch_one(&mut *tx)
        .await?;

        HistoryService::record(
            &mut tx,
            HistoryEntityType::Animal,
            animal_id,
            HistoryAction::Update,
            &changes,
            actor,
        )
        .await?;

        tx.commit().await?;

        row.into_animal()
    }
}
