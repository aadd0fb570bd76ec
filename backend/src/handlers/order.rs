//! Purchase order HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::middleware::CurrentUser;
use crate::services::order::{
    CreateOrderInput, DeliverOrderInput, OrderService, UpdateOrderInput,
};
use crate::AppState;

/// List all purchase orders
pub async fn list_orders(State(state): State<AppState>, _user: CurrentUser) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.list().await {
        Ok(orders) => {
            (StatusCode::OK, Json(serde_json::json!({ "orders": orders }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Get a specific purchase order
pub async fn get_order(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(order_id): Path<i64>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.get(order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a new purchase order in draft status
pub async fn create_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.create(&user.0, input).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update an editable purchase order
pub async fn update_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<i64>,
    Json(input): Json<UpdateOrderInput>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.update(&user.0, order_id, input).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a draft purchase order
pub async fn delete_order(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(order_id): Path<i64>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.delete(order_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Confirm a draft order
pub async fn confirm_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<i64>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.confirm(&user.0, order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Start execution of a confirmed order
pub async fn start_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<i64>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.start(&user.0, order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Mark an in-progress order as delivered
pub async fn deliver_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<i64>,
    Json(input): Json<DeliverOrderInput>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.deliver(&user.0, order_id, input).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Cancel an order that has not been delivered
pub async fn cancel_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<i64>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.cancel(&user.0, order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}
