//! Route definitions for the grocery order-fulfillment engine

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Order creation, lookup and lifecycle
        .nest("/orders", order_routes())
        // Customer order history
        .route(
            "/customers/:customer_id/orders",
            get(handlers::list_customer_orders),
        )
        // Branch packing queue
        .route(
            "/branches/:branch_id/orders/pending",
            get(handlers::list_branch_pending_orders),
        )
        // Delivery partner pools and workload
        .nest("/partners", partner_routes())
        // Delivery slot availability
        .route("/slots", get(handlers::available_slots))
}

/// Order lifecycle routes
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_order))
        .route("/:order_id", get(handlers::get_order))
        .route("/number/:order_number", get(handlers::get_order_by_number))
        // Fulfillment
        .route("/:order_id/confirm", post(handlers::confirm_order))
        .route(
            "/:order_id/items/:item_id/status",
            put(handlers::update_item_status),
        )
        .route(
            "/:order_id/items/:item_id/cancel",
            post(handlers::cancel_item),
        )
        .route("/:order_id/ready", post(handlers::mark_ready))
        // Dispatch and delivery
        .route("/:order_id/assign", post(handlers::assign_order))
        .route(
            "/:order_id/delivery-status",
            put(handlers::update_delivery_status),
        )
}

/// Delivery partner routes
fn partner_routes() -> Router<AppState> {
    Router::new()
        .route("/:partner_id/orders", get(handlers::partner_orders))
        .route(
            "/:partner_id/orders/pending",
            get(handlers::partner_pending_orders),
        )
        .route(
            "/:partner_id/delivered-count",
            get(handlers::partner_delivered_count),
        )
}
