//! Route definitions for the Abattoir Management Platform

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - purchase orders
        .nest("/orders", order_routes())
        // Protected routes - holding lots
        .nest("/stabulations", stabulation_routes())
        // Protected routes - animals
        .nest("/animals", animal_routes())
        // Protected routes - audit history
        .nest("/history", history_routes())
}

/// Purchase order routes (protected)
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route(
            "/:order_id",
            get(handlers::get_order)
                .put(handlers::update_order)
                .delete(handlers::delete_order),
        )
        .route("/:order_id/confirm", post(handlers::confirm_order))
        .route("/:order_id/start", post(handlers::start_order))
        .route("/:order_id/deliver", post(handlers::deliver_order))
        .route("/:order_id/cancel", post(handlers::cancel_order))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Holding lot routes (protected)
fn stabulation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_stabulations).post(handlers::create_stabulation),
        )
        .route("/:lot_id", get(handlers::get_stabulation))
        .route("/:lot_id/animals", post(handlers::add_lot_animal))
        .route(
            "/:lot_id/animals/:animal_id",
            delete(handlers::remove_lot_animal),
        )
        .route("/:lot_id/finalize", post(handlers::finalize_stabulation))
        .route("/:lot_id/cancel", post(handlers::cancel_stabulation))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Animal routes (protected)
fn animal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_animals).post(handlers::create_animal))
        .route(
            "/:animal_id",
            get(handlers::get_animal).put(handlers::update_animal),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Audit history routes (protected)
fn history_routes() -> Router<AppState> {
    Router::new()
        .route("/:entity_type/:entity_id", get(handlers::get_history))
        .route_layer(middleware::from_fn(auth_middleware))
}
