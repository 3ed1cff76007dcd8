//! Order creation and lookup HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::services::order::{CreateOrderInput, OrderService};
use crate::AppState;

/// Create a new order at checkout
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.create_order(input).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get one order by id
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.get_order(order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get one order by its human-readable order number
pub async fn get_order_by_number(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.get_order_by_number(&order_number).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// List a customer's orders, newest first
pub async fn list_customer_orders(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.get_orders_for_customer(customer_id).await {
        Ok(orders) => {
            (StatusCode::OK, Json(serde_json::json!({ "orders": orders }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// List the orders a branch still has packing work in, with the items
/// filtered to that branch
pub async fn list_branch_pending_orders(
    State(state): State<AppState>,
    Path(branch_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.pending_orders_for_branch(branch_id).await {
        Ok(orders) => {
            (StatusCode::OK, Json(serde_json::json!({ "orders": orders }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}
