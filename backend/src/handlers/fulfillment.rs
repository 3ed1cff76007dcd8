//! Fulfillment HTTP handlers: confirmation, packing updates, item cancellation

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::ItemStatus;

use crate::error::AppError;
use crate::services::FulfillmentService;
use crate::AppState;

/// Request body for updating an item's packing status
#[derive(Debug, Deserialize)]
pub struct UpdateItemStatusRequest {
    /// The branch the acting staff member belongs to
    pub branch_id: Uuid,
    /// One of "packing", "packed", "cancelled"
    pub status: String,
}

/// Request body for cancelling an item
#[derive(Debug, Deserialize)]
pub struct CancelItemRequest {
    pub reason: Option<String>,
}

/// Confirm a pending order
pub async fn confirm_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = FulfillmentService::new(state.db.clone(), state.push.clone());

    match service.confirm_order(order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Branch staff update of one item's packing status
pub async fn update_item_status(
    State(state): State<AppState>,
    Path((order_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateItemStatusRequest>,
) -> impl IntoResponse {
    let new_status = match ItemStatus::from_str(&input.status) {
        Some(status) => status,
        None => {
            return AppError::Validation {
                field: "status".to_string(),
                message: format!("'{}' is not a valid item status", input.status),
            }
            .into_response()
        }
    };

    let service = FulfillmentService::new(state.db.clone(), state.push.clone());

    match service
        .update_item_status(order_id, item_id, input.branch_id, new_status)
        .await
    {
        Ok((order, update)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "order": order,
                "branch_packed": update.branch_packed,
                "order_packed": update.order_packed,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Cancel one line item and reprice the order
pub async fn cancel_item(
    State(state): State<AppState>,
    Path((order_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<CancelItemRequest>,
) -> impl IntoResponse {
    let service = FulfillmentService::new(state.db.clone(), state.push.clone());

    match service.cancel_item(order_id, item_id, input.reason).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Mark a fully packed order as ready for dispatch
pub async fn mark_ready(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = FulfillmentService::new(state.db.clone(), state.push.clone());

    match service.mark_ready(order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}
