//! Holding lot ("stabulation") service
//!
//! Manages lot membership while a lot is active, and the two terminal
//! transitions: finalization (slaughter) and cancellation. Both are
//! all-or-nothing: a validation failure leaves the lot active and every
//! member animal untouched.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::history::HistoryService;
use shared::validation::{
    check_finalization, validate_cancellation_reason, validate_lot_capacity, MemberLiveWeight,
};
use shared::{
    generate_lot_number, AnimalStatus, AnimalType, FieldChange, FinalizeEntry, HistoryAction,
    HistoryEntityType, HoldingLot, StabulationStatus,
};

/// Stabulation service for managing holding lots
#[derive(Clone)]
pub struct StabulationService {
    db: PgPool,
}

/// Database row for a holding lot
#[derive(Debug, sqlx::FromRow)]
struct LotRow {
    id: i64,
    lot_number: String,
    facility_id: i64,
    animal_type: String,
    status: String,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    max_capacity: i32,
    cancellation_reason: Option<String>,
    finalized_by: Option<Uuid>,
    cancelled_by: Option<Uuid>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LotRow {
    fn into_lot(self, animal_ids: Vec<i64>) -> AppResult<HoldingLot> {
        Ok(HoldingLot {
            id: self.id,
            lot_number: self.lot_number,
            facility_id: self.facility_id,
            animal_type: AnimalType::from_str(&self.animal_type).ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "unknown animal type {:?}",
                    self.animal_type
                ))
            })?,
            status: parse_lot_status(&self.status)?,
            started_at: self.started_at,
            ended_at: self.ended_at,
            notes: self.notes,
            animal_ids,
            max_capacity: self.max_capacity,
            cancellation_reason: self.cancellation_reason,
            finalized_by: self.finalized_by,
            cancelled_by: self.cancelled_by,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn parse_lot_status(s: &str) -> AppResult<StabulationStatus> {
    StabulationStatus::from_str(s)
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("unknown lot status {:?}", s)))
}

const LOT_COLUMNS: &str = "id, lot_number, facility_id, animal_type, status, started_at, ended_at, \
     notes, max_capacity, cancellation_reason, finalized_by, cancelled_by, version, \
     created_at, updated_at";

/// Input for creating a holding lot
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateStabulationInput {
    pub facility_id: i64,
    pub animal_type: AnimalType,
    pub max_capacity: i32,
    pub notes: Option<String>,
    /// Initial member animals, in pen order
    pub animal_ids: Vec<i64>,
}

/// Input for adding an animal to an active lot
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddAnimalInput {
    pub animal_id: i64,
}

/// Input for finalizing a lot
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinalizeStabulationInput {
    pub entries: Vec<FinalizeEntry>,
}

/// Input for cancelling a lot
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CancelStabulationInput {
    pub reason: String,
}

impl StabulationService {
    /// Create a new StabulationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a new active lot with its initial member animals
    pub async fn create(
        &self,
        actor: &AuthUser,
        input: CreateStabulationInput,
    ) -> AppResult<HoldingLot> {
        if let Err(msg) = validate_lot_capacity(input.animal_ids.len(), input.max_capacity) {
            return Err(AppError::Validation {
                field: "max_capacity".to_string(),
                message: msg.to_string(),
                message_fr: "Capacité du lot invalide ou dépassée".to_string(),
            });
        }

        let unique: HashSet<i64> = input.animal_ids.iter().copied().collect();
        if unique.len() != input.animal_ids.len() {
            return Err(AppError::Validation {
                field: "animal_ids".to_string(),
                message: "Duplicate animal ids in initial member set".to_string(),
                message_fr: "Le lot contient des bêtes en double".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let year = Utc::now().year();
        let sequence: i32 = sqlx::query_scalar("SELECT get_next_document_sequence($1, $2)")
            .bind("stabulation")
            .bind(year)
            .fetch_one(&mut *tx)
            .await?;
        let lot_number = generate_lot_number(year, sequence);

        let row = sqlx::query_as::<_, LotRow>(&format!(
            r#"
            INSERT INTO holding_lots (lot_number, facility_id, animal_type, max_capacity, notes, status)
            VALUES ($1, $2, $3, $4, $5, 'active')
            RETURNING {LOT_COLUMNS}
            "#
        ))
        .bind(&lot_number)
        .bind(input.facility_id)
        .bind(input.animal_type.as_str())
        .bind(input.max_capacity)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        for (position, animal_id) in input.animal_ids.iter().enumerate() {
            self.admit_animal(&mut tx, row.id, *animal_id, position as i32, input.animal_type, actor)
                .await?;
        }

        HistoryService::record_event(
            &mut tx,
            HistoryEntityType::Stabulation,
            row.id,
            HistoryAction::Create,
            None,
            Some(lot_number),
            actor,
        )
        .await?;

        tx.commit().await?;

        row.into_lot(input.animal_ids)
    }

    /// Get a lot by ID with its ordered members
    pub async fn get(&self, lot_id: i64) -> AppResult<HoldingLot> {
        let row = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {LOT_COLUMNS} FROM holding_lots WHERE id = $1"
        ))
        .bind(lot_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Holding lot".to_string()))?;

        let animal_ids: Vec<i64> = sqlx::query_scalar(
            "SELECT animal_id FROM lot_animals WHERE lot_id = $1 ORDER BY position",
        )
        .bind(lot_id)
        .fetch_all(&self.db)
        .await?;

        row.into_lot(animal_ids)
    }

    /// List all lots, newest first
    pub async fn list(&self) -> AppResult<Vec<HoldingLot>> {
        let rows = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {LOT_COLUMNS} FROM holding_lots ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await?;

        let memberships = sqlx::query_as::<_, (i64, i64)>(
            "SELECT lot_id, animal_id FROM lot_animals ORDER BY lot_id, position",
        )
        .fetch_all(&self.db)
        .await?;

        let mut by_lot: HashMap<i64, Vec<i64>> = HashMap::new();
        for (lot_id, animal_id) in memberships {
            by_lot.entry(lot_id).or_default().push(animal_id);
        }

        rows.into_iter()
            .map(|r| {
                let ids = by_lot.remove(&r.id).unwrap_or_default();
                r.into_lot(ids)
            })
            .collect()
    }

    /// Add an animal to an active lot
    pub async fn add_animal(
        &self,
        actor: &AuthUser,
        lot_id: i64,
        input: AddAnimalInput,
    ) -> AppResult<HoldingLot> {
        let mut tx = self.db.begin().await?;

        let lot = self.fetch_active_lot(&mut tx, lot_id, "add animal").await?;

        let member_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM lot_animals WHERE lot_id = $1")
                .bind(lot_id)
                .fetch_one(&mut *tx)
                .await?;
        if let Err(msg) = validate_lot_capacity(member_count as usize + 1, lot.max_capacity) {
            return Err(AppError::Validation {
                field: "animal_id".to_string(),
                message: msg.to_string(),
                message_fr: "La capacité du lot est dépassée".to_string(),
            });
        }

        let already_member: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM lot_animals WHERE lot_id = $1 AND animal_id = $2)",
        )
        .bind(lot_id)
        .bind(input.animal_id)
        .fetch_one(&mut *tx)
        .await?;
        if already_member {
            return Err(AppError::Validation {
                field: "animal_id".to_string(),
                message: format!("Animal {} is already in the lot", input.animal_id),
                message_fr: format!("La bête {} est déjà dans le lot", input.animal_id),
            });
        }

        let animal_type = AnimalType::from_str(&lot.animal_type).ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("unknown animal type {:?}", lot.animal_type))
        })?;
        let next_position: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM lot_animals WHERE lot_id = $1",
        )
        .bind(lot_id)
        .fetch_one(&mut *tx)
        .await?;
        self.admit_animal(&mut tx, lot_id, input.animal_id, next_position, animal_type, actor)
            .await?;

        self.bump_version(&mut tx, &lot).await?;
        HistoryService::record(
            &mut tx,
            HistoryEntityType::Stabulation,
            lot_id,
            HistoryAction::Update,
            &[FieldChange::new(
                "animal_ids",
                None,
                Some(input.animal_id.to_string()),
            )],
            actor,
        )
        .await?;

        tx.commit().await?;

        self.get(lot_id).await
    }

    /// Remove an animal from an active lot; the animal reverts to alive
    pub async fn remove_animal(
        &self,
        actor: &AuthUser,
        lot_id: i64,
        animal_id: i64,
    ) -> AppResult<HoldingLot> {
        let mut tx = self.db.begin().await?;

        let lot = self.fetch_active_lot(&mut tx, lot_id, "remove animal").await?;

        let result = sqlx::query("DELETE FROM lot_animals WHERE lot_id = $1 AND animal_id = $2")
            .bind(lot_id)
            .bind(animal_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Lot member".to_string()));
        }

        sqlx::query("UPDATE animals SET status = 'alive', updated_at = NOW() WHERE id = $1")
            .bind(animal_id)
            .execute(&mut *tx)
            .await?;
        HistoryService::record(
            &mut tx,
            HistoryEntityType::Animal,
            animal_id,
            HistoryAction::StatusChange,
            &[FieldChange::new(
                "status",
                Some(AnimalStatus::InHolding.as_str().to_string()),
                Some(AnimalStatus::Alive.as_str().to_string()),
            )],
            actor,
        )
        .await?;

        self.bump_version(&mut tx, &lot).await?;
        HistoryService::record(
            &mut tx,
            HistoryEntityType::Stabulation,
            lot_id,
            HistoryAction::Update,
            &[FieldChange::new(
                "animal_ids",
                Some(animal_id.to_string()),
                None,
            )],
            actor,
        )
        .await?;

        tx.commit().await?;

        self.get(lot_id).await
    }

    /// Finalize an active lot: validate the per-animal submission, then
    /// slaughter every member and close the lot in one transaction.
    pub async fn finalize(
        &self,
        actor: &AuthUser,
        lot_id: i64,
        input: FinalizeStabulationInput,
    ) -> AppResult<HoldingLot> {
        let mut tx = self.db.begin().await?;

        let lot = self.fetch_active_lot(&mut tx, lot_id, "finalize").await?;

        let members = sqlx::query_as::<_, (i64, String, Decimal)>(
            r#"
            SELECT a.id, a.status, a.live_weight_kg
            FROM lot_animals la
            JOIN animals a ON a.id = la.animal_id
            WHERE la.lot_id = $1
            ORDER BY la.position
            "#,
        )
        .bind(lot_id)
        .fetch_all(&mut *tx)
        .await?;

        // Tag uniqueness is checked against the full animal population,
        // inside the same transaction as the writes. The unique index on
        // animals.slaughter_tag_number backstops this at the storage layer.
        let taken: HashSet<String> = sqlx::query_scalar::<_, String>(
            "SELECT slaughter_tag_number FROM animals WHERE slaughter_tag_number IS NOT NULL",
        )
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        let member_weights: Vec<MemberLiveWeight> = members
            .iter()
            .map(|(id, _, live)| MemberLiveWeight {
                animal_id: *id,
                live_weight_kg: *live,
            })
            .collect();

        check_finalization(&member_weights, &input.entries, |tag| taken.contains(tag))?;

        let entries_by_id: HashMap<i64, &FinalizeEntry> = input
            .entries
            .iter()
            .map(|e| (e.animal_id, e))
            .collect();

        for (animal_id, old_status, _) in &members {
            let entry = entries_by_id[animal_id];
            let tag = entry.slaughter_tag_number.trim();

            sqlx::query(
                r#"
                UPDATE animals
                SET status = 'slaughtered', hot_weight_kg = $1, slaughter_tag_number = $2,
                    updated_at = NOW()
                WHERE id = $3
                "#,
            )
            .bind(entry.hot_weight_kg)
            .bind(tag)
            .bind(*animal_id)
            .execute(&mut *tx)
            .await?;

            HistoryService::record(
                &mut tx,
                HistoryEntityType::Animal,
                *animal_id,
                HistoryAction::Finalize,
                &[FieldChange::new(
                    "status",
                    Some(old_status.clone()),
                    Some(AnimalStatus::Slaughtered.as_str().to_string()),
                )],
                actor,
            )
            .await?;
        }

        let row = sqlx::query_as::<_, LotRow>(&format!(
            r#"
            UPDATE holding_lots
            SET status = 'finalized', ended_at = NOW(), finalized_by = $1,
                version = version + 1, updated_at = NOW()
            WHERE id = $2 AND version = $3
            RETURNING {LOT_COLUMNS}
            "#
        ))
        .bind(actor.actor_id)
        .bind(lot_id)
        .bind(lot.version)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::ConcurrencyConflict(format!("Holding lot {}", lot.lot_number)))?;

        HistoryService::record(
            &mut tx,
            HistoryEntityType::Stabulation,
            lot_id,
            HistoryAction::Finalize,
            &[FieldChange::new(
                "status",
                Some(StabulationStatus::Active.as_str().to_string()),
                Some(StabulationStatus::Finalized.as_str().to_string()),
            )],
            actor,
        )
        .await?;

        tx.commit().await?;

        row.into_lot(members.iter().map(|(id, _, _)| *id).collect())
    }

    /// Cancel an active lot: member animals still held revert to alive
    pub async fn cancel(
        &self,
        actor: &AuthUser,
        lot_id: i64,
        input: CancelStabulationInput,
    ) -> AppResult<HoldingLot> {
        let mut tx = self.db.begin().await?;

        let lot = self.fetch_active_lot(&mut tx, lot_id, "cancel").await?;

        if let Err(msg) = validate_cancellation_reason(&input.reason) {
            return Err(AppError::InvalidReason(msg.to_string()));
        }
        let reason = input.reason.trim().to_string();

        let members = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT a.id, a.status
            FROM lot_animals la
            JOIN animals a ON a.id = la.animal_id
            WHERE la.lot_id = $1
            ORDER BY la.position
            "#,
        )
        .bind(lot_id)
        .fetch_all(&mut *tx)
        .await?;

        for (animal_id, old_status) in &members {
            let status = AnimalStatus::from_str(old_status).ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!("unknown animal status {:?}", old_status))
            })?;
            // Only animals still held revert; slaughtered or dead animals
            // and animals already alive are left as they are
            if status != AnimalStatus::InHolding {
                continue;
            }
            sqlx::query("UPDATE animals SET status = 'alive', updated_at = NOW() WHERE id = $1")
                .bind(*animal_id)
                .execute(&mut *tx)
                .await?;
            HistoryService::record(
                &mut tx,
                HistoryEntityType::Animal,
                *animal_id,
                HistoryAction::Update,
                &[FieldChange::new(
                    "status",
                    Some(old_status.clone()),
                    Some(AnimalStatus::Alive.as_str().to_string()),
                )],
                actor,
            )
            .await?;
        }

        let row = sqlx::query_as::<_, LotRow>(&format!(
            r#"
            UPDATE holding_lots
            SET status = 'cancelled', ended_at = NOW(), cancellation_reason = $1,
                cancelled_by = $2, version = version + 1, updated_at = NOW()
            WHERE id = $3 AND version = $4
            RETURNING {LOT_COLUMNS}
            "#
        ))
        .bind(&reason)
        .bind(actor.actor_id)
        .bind(lot_id)
        .bind(lot.version)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::ConcurrencyConflict(format!("Holding lot {}", lot.lot_number)))?;

        HistoryService::record(
            &mut tx,
            HistoryEntityType::Stabulation,
            lot_id,
            HistoryAction::Cancel,
            &[FieldChange::new(
                "status",
                Some(StabulationStatus::Active.as_str().to_string()),
                Some(StabulationStatus::Cancelled.as_str().to_string()),
            )],
            actor,
        )
        .await?;

        tx.commit().await?;

        row.into_lot(members.iter().map(|(id, _)| *id).collect())
    }

    /// Fetch a lot and require it to be active for the given operation
    async fn fetch_active_lot(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        lot_id: i64,
        operation: &'static str,
    ) -> AppResult<LotRow> {
        let lot = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {LOT_COLUMNS} FROM holding_lots WHERE id = $1"
        ))
        .bind(lot_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Holding lot".to_string()))?;

        let status = parse_lot_status(&lot.status)?;
        if status != StabulationStatus::Active {
            return Err(AppError::InvalidTransition {
                entity: format!("lot {}", lot.lot_number),
                operation: operation.to_string(),
                status: status.as_str().to_string(),
            });
        }

        Ok(lot)
    }

    /// Admit one animal into a lot: availability and species checks,
    /// membership insert, status move to in-holding, audit entry
    async fn admit_animal(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        lot_id: i64,
        animal_id: i64,
        position: i32,
        lot_animal_type: AnimalType,
        actor: &AuthUser,
    ) -> AppResult<()> {
        let animal = sqlx::query_as::<_, (String, String)>(
            "SELECT species, status FROM animals WHERE id = $1",
        )
        .bind(animal_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Animal {}", animal_id)))?;

        if animal.0 != lot_animal_type.as_str() {
            return Err(AppError::Validation {
                field: "animal_ids".to_string(),
                message: format!(
                    "Animal {} is not of the lot species {}",
                    animal_id,
                    lot_animal_type.as_str()
                ),
                message_fr: format!("La bête {} n'est pas de l'espèce du lot", animal_id),
            });
        }

        let status = AnimalStatus::from_str(&animal.1).ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("unknown animal status {:?}", animal.1))
        })?;
        if !status.is_available_for_holding() {
            return Err(AppError::Validation {
                field: "animal_ids".to_string(),
                message: format!("Animal {} is not available for holding", animal_id),
                message_fr: format!(
                    "La bête {} n'est pas disponible pour la stabulation",
                    animal_id
                ),
            });
        }

        sqlx::query("UPDATE animals SET status = 'in_holding', updated_at = NOW() WHERE id = $1")
            .bind(animal_id)
            .execute(&mut **tx)
            .await?;

        sqlx::query("INSERT INTO lot_animals (lot_id, animal_id, position) VALUES ($1, $2, $3)")
            .bind(lot_id)
            .bind(animal_id)
            .bind(position)
            .execute(&mut **tx)
            .await?;

        HistoryService::record(
            tx,
            HistoryEntityType::Animal,
            animal_id,
            HistoryAction::StatusChange,
            &[FieldChange::new(
                "status",
                Some(AnimalStatus::Alive.as_str().to_string()),
                Some(AnimalStatus::InHolding.as_str().to_string()),
            )],
            actor,
        )
        .await?;

        Ok(())
    }

    /// Version-guarded no-op write serializing membership edits against
    /// the terminal transitions
    async fn bump_version(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        lot: &LotRow,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE holding_lots SET version = version + 1, updated_at = NOW() WHERE id = $1 AND version = $2",
        )
        .bind(lot.id)
        .bind(lot.version)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ConcurrencyConflict(format!(
                "Holding lot {}",
                lot.lot_number
            )));
        }

        Ok(())
    }
}
