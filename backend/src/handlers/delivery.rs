//! Delivery HTTP handlers: partner status updates and workload

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{OrderStatus, PaymentMethod, PaymentStatus};

use crate::error::AppError;
use crate::services::DeliveryService;
use crate::AppState;

/// Request body for a partner-driven delivery status update
#[derive(Debug, Deserialize)]
pub struct DeliveryStatusRequest {
    pub delivery_partner_id: Uuid,
    /// One of "arriving", "delivered", "cancelled"
    pub status: String,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
}

/// Update the delivery status of an assigned order
pub async fn update_delivery_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<DeliveryStatusRequest>,
) -> impl IntoResponse {
    let new_status = match OrderStatus::from_str(&input.status) {
        Some(status) => status,
        None => {
            return AppError::Validation {
                field: "status".to_string(),
                message: format!("'{}' is not a valid order status", input.status),
            }
            .into_response()
        }
    };
    let payment_method = match input.payment_method.as_deref() {
        Some(s) => match PaymentMethod::from_str(s) {
            Some(method) => Some(method),
            None => {
                return AppError::Validation {
                    field: "payment_method".to_string(),
                    message: format!("'{}' is not a valid payment method", s),
                }
                .into_response()
            }
        },
        None => None,
    };
    let payment_status = match input.payment_status.as_deref() {
        Some(s) => match PaymentStatus::from_str(s) {
            Some(status) => Some(status),
            None => {
                return AppError::Validation {
                    field: "payment_status".to_string(),
                    message: format!("'{}' is not a valid payment status", s),
                }
                .into_response()
            }
        },
        None => None,
    };

    let service = DeliveryService::new(state.db.clone(), state.push.clone());

    match service
        .update_status(
            order_id,
            input.delivery_partner_id,
            new_status,
            payment_method,
            payment_status,
        )
        .await
    {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// A partner's open workload: assigned but not yet delivered orders
pub async fn partner_pending_orders(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = DeliveryService::new(state.db.clone(), state.push.clone());

    match service.assigned_pending_orders(partner_id).await {
        Ok(orders) => {
            (StatusCode::OK, Json(serde_json::json!({ "orders": orders }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}
