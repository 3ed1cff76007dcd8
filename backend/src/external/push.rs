//! Push notification client for order-status updates
//!
//! Best-effort and fire-and-forget: delivery of a notification is never
//! required for correctness, so failures are logged and swallowed.

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::Order;
use uuid::Uuid;

use crate::config::PushConfig;

/// Push gateway client
#[derive(Clone)]
pub struct PushClient {
    client: Client,
    endpoint: String,
    api_key: String,
    enabled: bool,
}

/// Payload pushed to the gateway on every order-status change
#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusPush {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub status: String,
    pub total_price: Decimal,
}

impl PushClient {
    pub fn new(config: &PushConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            enabled: config.enabled && !config.endpoint.is_empty(),
        }
    }

    /// Notify the gateway of an order-status change. Spawns a detached task;
    /// the triggering operation never waits on or observes the outcome.
    pub fn notify_order_update(&self, order: &Order) {
        if !self.enabled {
            return;
        }
        let payload = OrderStatusPush {
            order_id: order.id,
            order_number: order.order_number.clone(),
            customer_id: order.customer_id,
            status: order.status.to_string(),
            total_price: order.total_price,
        };
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();

        tokio::spawn(async move {
            let result = client
                .post(&endpoint)
                .bearer_auth(&api_key)
                .json(&payload)
                .send()
                .await;

            match result {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!(
                        order_id = %payload.order_id,
                        status = %response.status(),
                        "Push gateway rejected order-status notification"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        order_id = %payload.order_id,
                        error = %err,
                        "Failed to send order-status notification"
                    );
                }
                Ok(_) => {}
            }
        });
    }
}
