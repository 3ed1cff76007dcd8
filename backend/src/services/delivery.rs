//! Delivery service: partner-driven status updates on assigned orders

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{Order, OrderStatus, PaymentMethod, PaymentStatus};

use crate::error::AppResult;
use crate::external::PushClient;
use crate::services::order::{load_order, load_order_for_update, store_order};

/// Delivery service for the last leg of the order lifecycle
#[derive(Clone)]
pub struct DeliveryService {
    db: PgPool,
    push: PushClient,
}

impl DeliveryService {
    /// Create a new DeliveryService instance
    pub fn new(db: PgPool, push: PushClient) -> Self {
        Self { db, push }
    }

    /// Partner status update: arriving, delivered or cancelled, optionally
    /// settling payment on the doorstep. Only the assigned partner may act.
    pub async fn update_status(
        &self,
        order_id: Uuid,
        partner_id: Uuid,
        new_status: OrderStatus,
        payment_method: Option<PaymentMethod>,
        payment_status: Option<PaymentStatus>,
    ) -> AppResult<Order> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let mut order = load_order_for_update(&mut *tx, order_id).await?;

        order.update_delivery_status(partner_id, new_status, payment_method, payment_status, now)?;
        store_order(&mut *tx, &order).await?;
        tx.commit().await?;

        tracing::info!(
            order_number = %order.order_number,
            partner_id = %partner_id,
            status = %order.status,
            "Delivery status updated"
        );
        self.push.notify_order_update(&order);
        Ok(order)
    }

    /// A partner's open workload: every order assigned to them that has not
    /// yet been delivered
    pub async fn assigned_pending_orders(&self, partner_id: Uuid) -> AppResult<Vec<Order>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM orders
            WHERE delivery_partner_id = $1 AND status <> $2
            ORDER BY assigned_at
            "#,
        )
        .bind(partner_id)
        .bind(OrderStatus::Delivered.as_str())
        .fetch_all(&self.db)
        .await?;

        let mut conn = self.db.acquire().await?;
        let mut orders = Vec::with_capacity(ids.len());
        for id in ids {
            orders.push(load_order(&mut *conn, id).await?);
        }
        Ok(orders)
    }
}
