//! Audit trail service
//!
//! Appends immutable history rows for every mutation performed by the
//! other services. Records are written on the caller's open transaction
//! so that state change and audit entry commit atomically: a mutation
//! without its history entry is a correctness bug.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use shared::{
    FieldChange, HistoryAction, HistoryEntityType, HistoryRecord, PaginatedResponse, Pagination,
    PaginationMeta,
};

/// History service for recording and querying audit entries
#[derive(Clone)]
pub struct HistoryService {
    db: PgPool,
}

/// Database row for a history record
#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: i64,
    entity_type: String,
    entity_id: i64,
    action: String,
    field: Option<String>,
    old_value: Option<String>,
    new_value: Option<String>,
    actor_id: Uuid,
    actor_name: String,
    recorded_at: DateTime<Utc>,
}

impl HistoryRow {
    fn into_record(self) -> AppResult<HistoryRecord> {
        let entity_type = HistoryEntityType::from_str(&self.entity_type).ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "unknown history entity type {:?}",
                self.entity_type
            ))
        })?;
        let action = HistoryAction::from_str(&self.action).ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("unknown history action {:?}", self.action))
        })?;

        Ok(HistoryRecord {
            id: self.id,
            entity_type,
            entity_id: self.entity_id,
            action,
            field: self.field,
            old_value: self.old_value,
            new_value: self.new_value,
            actor_id: self.actor_id,
            actor_name: self.actor_name,
            recorded_at: self.recorded_at,
        })
    }
}

impl HistoryService {
    /// Create a new HistoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append one record per field change, sharing a single timestamp and
    /// actor, on the caller's open transaction.
    pub async fn record(
        tx: &mut Transaction<'_, Postgres>,
        entity_type: HistoryEntityType,
        entity_id: i64,
        action: HistoryAction,
        changes: &[FieldChange],
        actor: &AuthUser,
    ) -> AppResult<()> {
        let recorded_at = Utc::now();
        for change in changes {
            sqlx::query(
                r#"
                INSERT INTO history_records
                    (entity_type, entity_id, action, field, old_value, new_value, actor_id, actor_name, recorded_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(entity_type.as_str())
            .bind(entity_id)
            .bind(action.as_str())
            .bind(&change.field)
            .bind(&change.old_value)
            .bind(&change.new_value)
            .bind(actor.actor_id)
            .bind(&actor.display_name)
            .bind(recorded_at)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Append a single whole-entity record with no field name
    pub async fn record_event(
        tx: &mut Transaction<'_, Postgres>,
        entity_type: HistoryEntityType,
        entity_id: i64,
        action: HistoryAction,
        old_value: Option<String>,
        new_value: Option<String>,
        actor: &AuthUser,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO history_records
                (entity_type, entity_id, action, field, old_value, new_value, actor_id, actor_name, recorded_at)
            VALUES ($1, $2, $3, NULL, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entity_type.as_str())
        .bind(entity_id)
        .bind(action.as_str())
        .bind(old_value)
        .bind(new_value)
        .bind(actor.actor_id)
        .bind(&actor.display_name)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Query history for one entity, newest first, paginated.
    /// Read-only: no side effects.
    pub async fn query(
        &self,
        entity_type: HistoryEntityType,
        entity_id: i64,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<HistoryRecord>> {
        let pagination = pagination.clamped();

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM history_records WHERE entity_type = $1 AND entity_id = $2",
        )
        .bind(entity_type.as_str())
        .bind(entity_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, entity_type, entity_id, action, field, old_value, new_value,
                   actor_id, actor_name, recorded_at
            FROM history_records
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY recorded_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(entity_type.as_str())
        .bind(entity_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let data = rows
            .into_iter()
            .map(|r| r.into_record())
            .collect::<AppResult<Vec<_>>>()?;

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(pagination, total as u64),
        })
    }
}
