//! Dispatch HTTP handlers: partner assignment and order pools

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::services::DispatchService;
use crate::AppState;

/// Request body for accepting an order
#[derive(Debug, Deserialize)]
pub struct AssignOrderRequest {
    pub delivery_partner_id: Uuid,
}

/// Accept an order for delivery. First acceptor wins; later acceptors get a
/// conflict response.
pub async fn assign_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<AssignOrderRequest>,
) -> impl IntoResponse {
    let service = DispatchService::new(state.db.clone(), state.push.clone());

    match service
        .assign_delivery_partner(order_id, input.delivery_partner_id)
        .await
    {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// The three pools a delivery partner works from
pub async fn partner_orders(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = DispatchService::new(state.db.clone(), state.push.clone());

    match service.orders_for_partner(partner_id).await {
        Ok(pools) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "available": pools.available,
                "assigned": pools.assigned,
                "delivered": pools.delivered,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// How many orders a partner has delivered in total
pub async fn partner_delivered_count(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = DispatchService::new(state.db.clone(), state.push.clone());

    match service.delivered_count(partner_id).await {
        Ok(count) => (
            StatusCode::OK,
            Json(serde_json::json!({ "delivered_count": count })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
