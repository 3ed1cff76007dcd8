//! Fulfillment service: confirmation, packing updates, item cancellation
//!
//! Every mutation follows the same shape: open a transaction, load the order
//! with a row lock, apply the domain transition on the aggregate, write it
//! back and commit. Status-change notifications go out only after commit.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{ItemStatus, ItemStatusUpdate, Order};
use shared::validation;

use crate::error::{AppError, AppResult};
use crate::external::PushClient;
use crate::services::order::{load_order_for_update, store_order};

/// Fulfillment service for the packing phase of the order lifecycle
#[derive(Clone)]
pub struct FulfillmentService {
    db: PgPool,
    push: PushClient,
}

impl FulfillmentService {
    /// Create a new FulfillmentService instance
    pub fn new(db: PgPool, push: PushClient) -> Self {
        Self { db, push }
    }

    /// Confirm a pending order. Confirming an already confirmed (or further
    /// progressed, non-terminal) order is a no-op rather than an error.
    pub async fn confirm_order(&self, order_id: Uuid) -> AppResult<Order> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let mut order = load_order_for_update(&mut *tx, order_id).await?;

        let changed = order.confirm(now)?;
        if changed {
            store_order(&mut *tx, &order).await?;
        }
        tx.commit().await?;

        if changed {
            tracing::info!(order_number = %order.order_number, "Order confirmed");
            self.push.notify_order_update(&order);
        }
        Ok(order)
    }

    /// Branch staff update of a single item's packing status. Returns the
    /// updated order together with the recomputed packed flags so the caller
    /// can tell whether this update completed the branch or the whole order.
    pub async fn update_item_status(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        branch_id: Uuid,
        new_status: ItemStatus,
    ) -> AppResult<(Order, ItemStatusUpdate)> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let mut order = load_order_for_update(&mut *tx, order_id).await?;

        let previous_status = order.status;
        let update = order.set_item_status(item_id, branch_id, new_status, now)?;
        store_order(&mut *tx, &order).await?;
        tx.commit().await?;

        if order.status != previous_status {
            tracing::info!(
                order_number = %order.order_number,
                status = %order.status,
                "Order status advanced by packing update"
            );
            self.push.notify_order_update(&order);
        }
        Ok((order, update))
    }

    /// Cancel one line item and reprice the order
    pub async fn cancel_item(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        reason: Option<String>,
    ) -> AppResult<Order> {
        if let Some(reason) = reason.as_deref() {
            validation::validate_cancellation_reason(reason)
                .map_err(|e| AppError::ValidationError(e.to_string()))?;
        }

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let mut order = load_order_for_update(&mut *tx, order_id).await?;

        let previous_status = order.status;
        order.cancel_item(item_id, reason, now)?;
        store_order(&mut *tx, &order).await?;
        tx.commit().await?;

        tracing::info!(
            order_number = %order.order_number,
            item_id = %item_id,
            total = %order.total_price,
            "Item cancelled, order repriced"
        );
        if order.status != previous_status {
            self.push.notify_order_update(&order);
        }
        Ok(order)
    }

    /// Mark a fully packed order as ready for dispatch
    pub async fn mark_ready(&self, order_id: Uuid) -> AppResult<Order> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let mut order = load_order_for_update(&mut *tx, order_id).await?;

        order.mark_ready(now)?;
        store_order(&mut *tx, &order).await?;
        tx.commit().await?;

        tracing::info!(order_number = %order.order_number, "Order ready for dispatch");
        self.push.notify_order_update(&order);
        Ok(order)
    }
}
