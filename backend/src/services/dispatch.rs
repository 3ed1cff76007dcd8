//! Dispatch service: first-acceptor-wins partner assignment and order pools
//!
//! Assignment is a single conditional UPDATE so that concurrent acceptors
//! race on one atomic statement instead of a read-then-write window. Exactly
//! one acceptor matches the unassigned row; everyone else gets zero rows and
//! a diagnosis of why.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{DeliveryPartner, Order, OrderStatus};

use crate::error::{AppError, AppResult};
use crate::external::PushClient;
use crate::services::order::load_order;

/// Dispatch service for the handoff from packing to delivery
#[derive(Clone)]
pub struct DispatchService {
    db: PgPool,
    push: PushClient,
}

#[derive(sqlx::FromRow)]
struct PartnerRow {
    id: Uuid,
    name: String,
    phone: String,
}

impl PartnerRow {
    fn into_partner(self) -> DeliveryPartner {
        DeliveryPartner {
            id: self.id,
            name: self.name,
            phone: self.phone,
        }
    }
}

/// A delivery partner's view of the order pools
#[derive(Debug)]
pub struct PartnerOrders {
    /// Unassigned orders in an assignable status, visible to every partner
    pub available: Vec<Order>,
    /// Orders this partner has accepted and not yet delivered
    pub assigned: Vec<Order>,
    /// Orders this partner has delivered
    pub delivered: Vec<Order>,
}

impl DispatchService {
    /// Create a new DispatchService instance
    pub fn new(db: PgPool, push: PushClient) -> Self {
        Self { db, push }
    }

    /// Accept an order for delivery. Of any number of concurrent acceptors
    /// exactly one wins; the rest are told the order is already taken.
    pub async fn assign_delivery_partner(
        &self,
        order_id: Uuid,
        partner_id: Uuid,
    ) -> AppResult<Order> {
        let partner = sqlx::query_as::<_, PartnerRow>(
            "SELECT id, name, phone FROM delivery_partners WHERE id = $1",
        )
        .bind(partner_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Delivery partner".to_string()))?
        .into_partner();

        let now = Utc::now();
        let assignable: Vec<String> = [OrderStatus::Packed, OrderStatus::Ready]
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        let claimed: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET delivery_partner_id = $1,
                status = $2,
                assigned_at = $3,
                updated_at = $3
            WHERE id = $4
              AND delivery_partner_id IS NULL
              AND status = ANY($5)
            RETURNING id
            "#,
        )
        .bind(partner_id)
        .bind(OrderStatus::Assigned.as_str())
        .bind(now)
        .bind(order_id)
        .bind(&assignable)
        .fetch_optional(&self.db)
        .await?;

        let mut conn = self.db.acquire().await?;
        if claimed.is_none() {
            // Lost the race or never eligible; read the row to say which.
            let order = load_order(&mut *conn, order_id).await?;
            if order.delivery_partner_id.is_some() {
                return Err(AppError::Conflict {
                    resource: "order".to_string(),
                    message: format!(
                        "order {} is already assigned to a delivery partner",
                        order.order_number
                    ),
                });
            }
            return Err(AppError::PreconditionFailed(format!(
                "order {} is not ready for dispatch, current status is '{}'",
                order.order_number, order.status
            )));
        }

        let order = load_order(&mut *conn, order_id).await?;
        tracing::info!(
            order_number = %order.order_number,
            partner_id = %partner.id,
            partner = %partner.name,
            "Order assigned to delivery partner"
        );
        self.push.notify_order_update(&order);
        Ok(order)
    }

    /// The three pools a delivery partner works from
    pub async fn orders_for_partner(&self, partner_id: Uuid) -> AppResult<PartnerOrders> {
        let assignable: Vec<String> = [OrderStatus::Packed, OrderStatus::Ready]
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        let in_flight: Vec<String> = [OrderStatus::Assigned, OrderStatus::Arriving]
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let available_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM orders
            WHERE delivery_partner_id IS NULL AND status = ANY($1)
            ORDER BY created_at
            "#,
        )
        .bind(&assignable)
        .fetch_all(&self.db)
        .await?;

        let assigned_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM orders
            WHERE delivery_partner_id = $1 AND status = ANY($2)
            ORDER BY assigned_at
            "#,
        )
        .bind(partner_id)
        .bind(&in_flight)
        .fetch_all(&self.db)
        .await?;

        let delivered_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM orders
            WHERE delivery_partner_id = $1 AND status = $2
            ORDER BY delivered_at DESC
            "#,
        )
        .bind(partner_id)
        .bind(OrderStatus::Delivered.as_str())
        .fetch_all(&self.db)
        .await?;

        let mut conn = self.db.acquire().await?;
        let mut pools = PartnerOrders {
            available: Vec::with_capacity(available_ids.len()),
            assigned: Vec::with_capacity(assigned_ids.len()),
            delivered: Vec::with_capacity(delivered_ids.len()),
        };
        for id in available_ids {
            pools.available.push(load_order(&mut *conn, id).await?);
        }
        for id in assigned_ids {
            pools.assigned.push(load_order(&mut *conn, id).await?);
        }
        for id in delivered_ids {
            pools.delivered.push(load_order(&mut *conn, id).await?);
        }
        Ok(pools)
    }

    /// How many orders a partner has delivered in total
    pub async fn delivered_count(&self, partner_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE delivery_partner_id = $1 AND status = $2",
        )
        .bind(partner_id)
        .bind(OrderStatus::Delivered.as_str())
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }
}
