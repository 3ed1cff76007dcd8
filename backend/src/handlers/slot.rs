//! Delivery slot HTTP handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::services::SlotService;
use crate::AppState;

/// Query parameters for the slot availability endpoint
#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    /// How many days to offer, starting today
    pub days: Option<u32>,
}

/// Valid delivery slots for the coming days
pub async fn available_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> impl IntoResponse {
    let service = SlotService::new(state.db.clone(), state.config.slots.default_days);

    match service.available_slots(query.days).await {
        Ok(days) => (StatusCode::OK, Json(serde_json::json!({ "days": days }))).into_response(),
        Err(e) => e.into_response(),
    }
}
