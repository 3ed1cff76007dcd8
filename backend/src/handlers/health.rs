//! Service liveness endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub service: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub database: DatabaseStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Reachable,
    Unreachable,
}

/// Build metadata plus one database round trip. Always answers 200; a broken
/// pool shows up in the body, not as a 5xx, so probes can tell the two apart.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => DatabaseStatus::Reachable,
        Err(e) => {
            tracing::warn!(error = %e, "Database unreachable during health check");
            DatabaseStatus::Unreachable
        }
    };

    Json(HealthStatus {
        service: "grocery-fulfillment",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        database,
    })
}
