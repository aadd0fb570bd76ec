//! Purchase order service
//!
//! Owns the order status lifecycle and field-level edit rules. Every
//! mutation runs in one transaction together with its audit entries, and
//! every write is guarded by the order's version column.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::history::HistoryService;
use shared::validation::{validate_deposit, validate_order_quantity};
use shared::{
    generate_order_number, AnimalType, FieldChange, HistoryAction, HistoryEntityType, OrderSource,
    OrderStatus, ProductType, PurchaseOrder, QuantityType,
};

/// Order service for managing purchase orders ("bons de commande")
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Database row for a purchase order
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    quantity_type: String,
    quantity: Decimal,
    animal_type: String,
    product_type: String,
    includes_offal: bool,
    source: String,
    slaughterhouse_id: i64,
    client_id: i64,
    notes: Option<String>,
    deposit: Option<Decimal>,
    planned_delivery_date: Option<NaiveDate>,
    actual_delivery_date: Option<NaiveDate>,
    status: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> AppResult<PurchaseOrder> {
        Ok(PurchaseOrder {
            id: self.id,
            order_number: self.order_number,
            quantity_type: QuantityType::from_str(&self.quantity_type).ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "unknown quantity type {:?}",
                    self.quantity_type
                ))
            })?,
            quantity: self.quantity,
            animal_type: AnimalType::from_str(&self.animal_type).ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "unknown animal type {:?}",
                    self.animal_type
                ))
            })?,
            product_type: ProductType::from_str(&self.product_type).ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "unknown product type {:?}",
                    self.product_type
                ))
            })?,
            includes_offal: self.includes_offal,
            source: OrderSource::from_str(&self.source).ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!("unknown order source {:?}", self.source))
            })?,
            slaughterhouse_id: self.slaughterhouse_id,
            client_id: self.client_id,
            notes: self.notes,
            deposit: self.deposit,
            planned_delivery_date: self.planned_delivery_date,
            actual_delivery_date: self.actual_delivery_date,
            status: parse_order_status(&self.status)?,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn parse_order_status(s: &str) -> AppResult<OrderStatus> {
    OrderStatus::from_str(s)
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("unknown order status {:?}", s)))
}

const ORDER_COLUMNS: &str = "id, order_number, quantity_type, quantity, animal_type, product_type, \
     includes_offal, source, slaughterhouse_id, client_id, notes, deposit, \
     planned_delivery_date, actual_delivery_date, status, version, created_at, updated_at";

/// Input for creating a purchase order
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderInput {
    pub quantity_type: QuantityType,
    pub quantity: Decimal,
    pub animal_type: AnimalType,
    pub product_type: ProductType,
    pub includes_offal: bool,
    pub source: OrderSource,
    pub slaughterhouse_id: i64,
    pub client_id: i64,
    pub notes: Option<String>,
    pub deposit: Option<Decimal>,
    pub planned_delivery_date: Option<NaiveDate>,
}

/// Input for updating an editable purchase order.
/// Status is deliberately absent: it only changes through the
/// transition operations.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrderInput {
    pub quantity_type: Option<QuantityType>,
    pub quantity: Option<Decimal>,
    pub animal_type: Option<AnimalType>,
    pub product_type: Option<ProductType>,
    pub includes_offal: Option<bool>,
    pub source: Option<OrderSource>,
    pub slaughterhouse_id: Option<i64>,
    pub client_id: Option<i64>,
    pub notes: Option<String>,
    pub deposit: Option<Decimal>,
    pub planned_delivery_date: Option<NaiveDate>,
}

/// Input for delivering an order
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DeliverOrderInput {
    pub actual_delivery_date: Option<NaiveDate>,
}

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a new order in Draft status
    pub async fn create(&self, actor: &AuthUser, input: CreateOrderInput) -> AppResult<PurchaseOrder> {
        if let Err(msg) = validate_order_quantity(input.quantity) {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
                message_fr: "La quantité doit être positive".to_string(),
            });
        }
        if let Some(deposit) = input.deposit {
            if let Err(msg) = validate_deposit(deposit) {
                return Err(AppError::Validation {
                    field: "deposit".to_string(),
                    message: msg.to_string(),
                    message_fr: "Le dépôt ne peut pas être négatif".to_string(),
                });
            }
        }

        let mut tx = self.db.begin().await?;

        let year = Utc::now().year();
        let sequence: i32 = sqlx::query_scalar("SELECT get_next_document_sequence($1, $2)")
            .bind("order")
            .bind(year)
            .fetch_one(&mut *tx)
            .await?;
        let order_number = generate_order_number(year, sequence);

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO purchase_orders
                (order_number, quantity_type, quantity, animal_type, product_type, includes_offal,
                 source, slaughterhouse_id, client_id, notes, deposit, planned_delivery_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'draft')
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&order_number)
        .bind(input.quantity_type.as_str())
        .bind(input.quantity)
        .bind(input.animal_type.as_str())
        .bind(input.product_type.as_str())
        .bind(input.includes_offal)
        .bind(input.source.as_str())
        .bind(input.slaughterhouse_id)
        .bind(input.client_id)
        .bind(&input.notes)
        .bind(input.deposit)
        .bind(input.planned_delivery_date)
        .fetch_one(&mut *tx)
        .await?;

        HistoryService::record_event(
            &mut tx,
            HistoryEntityType::Order,
            row.id,
            HistoryAction::Create,
            None,
            Some(order_number),
            actor,
        )
        .await?;

        tx.commit().await?;

        row.into_order()
    }

    /// Get an order by ID
    pub async fn get(&self, order_id: i64) -> AppResult<PurchaseOrder> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM purchase_orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        row.into_order()
    }

    /// List all orders, newest first
    pub async fn list(&self) -> AppResult<Vec<PurchaseOrder>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM purchase_orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.into_order()).collect()
    }

    /// Confirm a draft order
    pub async fn confirm(&self, actor: &AuthUser, order_id: i64) -> AppResult<PurchaseOrder> {
        self.transition(actor, order_id, OrderStatus::Confirmed, "confirm", None)
            .await
    }

    /// Start execution of a confirmed order
    pub async fn start(&self, actor: &AuthUser, order_id: i64) -> AppResult<PurchaseOrder> {
        self.transition(actor, order_id, OrderStatus::InProgress, "start", None)
            .await
    }

    /// Mark an in-progress order as delivered, stamping the actual
    /// delivery date (today when omitted)
    pub async fn deliver(
        &self,
        actor: &AuthUser,
        order_id: i64,
        input: DeliverOrderInput,
    ) -> AppResult<PurchaseOrder> {
        self.transition(
            actor,
            order_id,
            OrderStatus::Delivered,
            "deliver",
            input.actual_delivery_date,
        )
        .await
    }

    /// Cancel an order that has not been delivered yet
    pub async fn cancel(&self, actor: &AuthUser, order_id: i64) -> AppResult<PurchaseOrder> {
        self.transition(actor, order_id, OrderStatus::Cancelled, "cancel", None)
            .await
    }

    /// Update an editable order, recording one history entry per changed field
    pub async fn update(
        &self,
        actor: &AuthUser,
        order_id: i64,
        input: UpdateOrderInput,
    ) -> AppResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM purchase_orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let status = parse_order_status(&existing.status)?;
        if !status.is_editable() {
            return Err(AppError::InvalidTransition {
                entity: format!("order {}", existing.order_number),
                operation: "update".to_string(),
                status: status.as_str().to_string(),
            });
        }

        // Merge submitted fields over prior values
        let quantity_type = input
            .quantity_type
            .map(|v| v.as_str().to_string())
            .unwrap_or_else(|| existing.quantity_type.clone());
        let quantity = input.quantity.unwrap_or(existing.quantity);
        let animal_type = input
            .animal_type
            .map(|v| v.as_str().to_string())
            .unwrap_or_else(|| existing.animal_type.clone());
        let product_type = input
            .product_type
            .map(|v| v.as_str().to_string())
            .unwrap_or_else(|| existing.product_type.clone());
        let includes_offal = input.includes_offal.unwrap_or(existing.includes_offal);
        let source = input
            .source
            .map(|v| v.as_str().to_string())
            .unwrap_or_else(|| existing.source.clone());
        let slaughterhouse_id = input.slaughterhouse_id.unwrap_or(existing.slaughterhouse_id);
        let client_id = input.client_id.unwrap_or(existing.client_id);
        let notes = input.notes.clone().or_else(|| existing.notes.clone());
        let deposit = input.deposit.or(existing.deposit);
        let planned_delivery_date = input
            .planned_delivery_date
            .or(existing.planned_delivery_date);

        if let Err(msg) = validate_order_quantity(quantity) {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
                message_fr: "La quantité doit être positive".to_string(),
            });
        }
        if let Some(d) = deposit {
            if let Err(msg) = validate_deposit(d) {
                return Err(AppError::Validation {
                    field: "deposit".to_string(),
                    message: msg.to_string(),
                    message_fr: "Le dépôt ne peut pas être négatif".to_string(),
                });
            }
        }

        // Diff against prior values; only changed fields are audited
        let mut changes: Vec<FieldChange> = Vec::new();
        if quantity_type != existing.quantity_type {
            changes.push(FieldChange::new(
                "quantity_type",
                Some(existing.quantity_type.clone()),
                Some(quantity_type.clone()),
            ));
        }
        if quantity != existing.quantity {
            changes.push(FieldChange::new(
                "quantity",
                Some(existing.quantity.to_string()),
                Some(quantity.to_string()),
            ));
        }
        if animal_type != existing.animal_type {
            changes.push(FieldChange::new(
                "animal_type",
                Some(existing.animal_type.clone()),
                Some(animal_type.clone()),
            ));
        }
        if product_type != existing.product_type {
            changes.push(FieldChange::new(
                "product_type",
                Some(existing.product_type.clone()),
                Some(product_type.clone()),
            ));
        }
        if includes_offal != existing.includes_offal {
            changes.push(FieldChange::new(
                "includes_offal",
                Some(existing.includes_offal.to_string()),
                Some(includes_offal.to_string()),
            ));
        }
        if source != existing.source {
            changes.push(FieldChange::new(
                "source",
                Some(existing.source.clone()),
                Some(source.clone()),
            ));
        }
        if slaughterhouse_id != existing.slaughterhouse_id {
            changes.push(FieldChange::new(
                "slaughterhouse_id",
                Some(existing.slaughterhouse_id.to_string()),
                Some(slaughterhouse_id.to_string()),
            ));
        }
        if client_id != existing.client_id {
            changes.push(FieldChange::new(
                "client_id",
                Some(existing.client_id.to_string()),
                Some(client_id.to_string()),
            ));
        }
        if notes != existing.notes {
            changes.push(FieldChange::new(
                "notes",
                existing.notes.clone(),
                notes.clone(),
            ));
        }
        if deposit != existing.deposit {
            changes.push(FieldChange::new(
                "deposit",
                existing.deposit.map(|d| d.to_string()),
                deposit.map(|d| d.to_string()),
            ));
        }
        if planned_delivery_date != existing.planned_delivery_date {
            changes.push(FieldChange::new(
                "planned_delivery_date",
                existing.planned_delivery_date.map(|d| d.to_string()),
                planned_delivery_date.map(|d| d.to_string()),
            ));
        }

        if changes.is_empty() {
            return existing.into_order();
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE purchase_orders
            SET quantity_type = $1, quantity = $2, animal_type = $3, product_type = $4,
                includes_offal = $5, source = $6, slaughterhouse_id = $7, client_id = $8,
                notes = $9, deposit = $10, planned_delivery_date = $11,
                version = version + 1, updated_at = NOW()
            WHERE id = $12 AND version = $13
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&quantity_type)
        .bind(quantity)
        .bind(&animal_type)
        .bind(&product_type)
        .bind(includes_offal)
        .bind(&source)
        .bind(slaughterhouse_id)
        .bind(client_id)
        .bind(&notes)
        .bind(deposit)
        .bind(planned_delivery_date)
        .bind(order_id)
        .bind(existing.version)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::ConcurrencyConflict(format!("Order {}", existing.order_number))
        })?;

        HistoryService::record(
            &mut tx,
            HistoryEntityType::Order,
            order_id,
            HistoryAction::Update,
            &changes,
            actor,
        )
        .await?;

        tx.commit().await?;

        row.into_order()
    }

    /// Delete a draft order. Orders past Draft are never physically deleted.
    pub async fn delete(&self, order_id: i64) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM purchase_orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let status = parse_order_status(&existing.status)?;
        if !status.is_deletable() {
            return Err(AppError::NotDeletable(existing.order_number));
        }

        let result = sqlx::query("DELETE FROM purchase_orders WHERE id = $1 AND version = $2")
            .bind(order_id)
            .bind(existing.version)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ConcurrencyConflict(format!(
                "Order {}",
                existing.order_number
            )));
        }

        tx.commit().await?;

        Ok(())
    }

    /// Apply one status transition with a version-guarded write
    async fn transition(
        &self,
        actor: &AuthUser,
        order_id: i64,
        target: OrderStatus,
        operation: &'static str,
        delivery_date: Option<NaiveDate>,
    ) -> AppResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM purchase_orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let status = parse_order_status(&existing.status)?;
        if !status.can_transition_to(target) {
            return Err(AppError::InvalidTransition {
                entity: format!("order {}", existing.order_number),
                operation: operation.to_string(),
                status: status.as_str().to_string(),
            });
        }

        // Delivery stamps the actual date; other transitions leave it untouched
        let actual_delivery_date = if target == OrderStatus::Delivered {
            Some(delivery_date.unwrap_or_else(|| Utc::now().date_naive()))
        } else {
            None
        };

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE purchase_orders
            SET status = $1, actual_delivery_date = COALESCE($2, actual_delivery_date),
                version = version + 1, updated_at = NOW()
            WHERE id = $3 AND version = $4
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(target.as_str())
        .bind(actual_delivery_date)
        .bind(order_id)
        .bind(existing.version)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::ConcurrencyConflict(format!("Order {}", existing.order_number))
        })?;

        let action = if target == OrderStatus::Cancelled {
            HistoryAction::Cancel
        } else {
            HistoryAction::StatusChange
        };
        let mut changes = vec![FieldChange::new(
            "status",
            Some(status.as_str().to_string()),
            Some(target.as_str().to_string()),
        )];
        if let Some(date) = actual_delivery_date {
            changes.push(FieldChange::new(
                "actual_delivery_date",
                None,
                Some(date.to_string()),
            ));
        }
        HistoryService::record(
            &mut tx,
            HistoryEntityType::Order,
            order_id,
            action,
            &changes,
            actor,
        )
        .await?;

        tx.commit().await?;

        row.into_order()
    }
}
