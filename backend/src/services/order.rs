//! Order service: creation, lookups, and aggregate persistence
//!
//! The order aggregate spans three tables (orders, order_items,
//! order_pickup_locations). Loading always reads the full aggregate;
//! mutations in other services lock the order row with `FOR UPDATE`, apply
//! the domain logic from the shared crate, and write the aggregate back in
//! the same transaction so no partial update is ever observable.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::models::{
    resolve_pickup_locations, Branch, Customer, DeliveryAddress, DiscountSnapshot, ItemStatus,
    LineItem, Order, OrderStatus, Payment, PaymentMethod, PaymentStatus, PickupLocation,
    SlotSnapshot, StatusTimestamps,
};
use shared::types::GeoPoint;
use shared::validation;

use crate::error::{AppError, AppResult};

/// Order service for creating and reading orders
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Input for creating an order at checkout
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderInput {
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<CreateOrderItem>,
    pub slot: SlotSelection,
    pub delivery_charge: Decimal,
    pub handling_charge: Decimal,
    #[serde(default)]
    pub savings: Decimal,
    pub discount: Option<DiscountInput>,
    pub coupon_code: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

/// One line item at checkout
#[derive(Debug, Deserialize, serde::Serialize)]
pub struct CreateOrderItem {
    pub product_id: Uuid,
    pub variant: String,
    /// Variant unit label, e.g. "1kg"
    #[serde(default)]
    pub unit: String,
    pub branch_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// The slot chosen at checkout, snapshotted onto the order
#[derive(Debug, Deserialize)]
pub struct SlotSelection {
    pub slot_id: Option<Uuid>,
    pub label: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Discount applied at checkout
#[derive(Debug, Deserialize)]
pub struct DiscountInput {
    pub kind: Option<String>,
    pub amount: Decimal,
}

/// Order statuses a branch still has packing work (or oversight) in
const BRANCH_PENDING_STATUSES: &[&str] = &["pending", "confirmed", "packing", "packed", "ready"];

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an order at checkout. All items start pending; pickup
    /// locations are derived from the distinct branch set; the total is
    /// recomputed server-side and the sequential order number is allocated
    /// from the database sequence. Everything happens in one transaction.
    pub async fn create_order(&self, input: CreateOrderInput) -> AppResult<Order> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        for item in &input.items {
            validation::validate_quantity(item.quantity)
                .map_err(|e| AppError::ValidationError(e.to_string()))?;
            validation::validate_unit_price(item.unit_price)
                .map_err(|e| AppError::ValidationError(e.to_string()))?;
        }
        validation::validate_charge(input.delivery_charge)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        validation::validate_charge(input.handling_charge)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        // Snapshot the customer's delivery address
        let customer = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT id, name, phone, latitude, longitude, house_no, street_address,
                   landmark, city, state, pin_code, country
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(input.customer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?
        .into_customer();

        // Load the distinct branches referenced by the items
        let branch_ids: Vec<Uuid> = {
            let mut ids: Vec<Uuid> = input.items.iter().map(|i| i.branch_id).collect();
            ids.sort();
            ids.dedup();
            ids
        };
        let branches = sqlx::query_as::<_, BranchRow>(
            r#"
            SELECT id, name, latitude, longitude, address, is_active
            FROM branches
            WHERE id = ANY($1)
            "#,
        )
        .bind(&branch_ids)
        .fetch_all(&mut *tx)
        .await?;
        let branches: Vec<Branch> = branches.into_iter().map(BranchRow::into_branch).collect();
        for id in &branch_ids {
            if !branches.iter().any(|b| b.id == *id) {
                return Err(AppError::NotFound(format!("Branch {}", id)));
            }
        }

        let items: Vec<LineItem> = input
            .items
            .iter()
            .map(|i| {
                let mut item = LineItem {
                    id: Uuid::new_v4(),
                    product_id: i.product_id,
                    variant: i.variant.clone(),
                    unit: i.unit.clone(),
                    branch_id: i.branch_id,
                    name: i.name.clone(),
                    image_url: i.image_url.clone(),
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    item_total: Decimal::ZERO,
                    status: ItemStatus::Pending,
                    cancellation_reason: None,
                };
                item.item_total = item.line_total();
                item
            })
            .collect();

        let items_subtotal: Decimal = items.iter().map(|i| i.item_total).sum();
        let discount = match input.discount {
            Some(d) => {
                validation::validate_discount(d.amount, items_subtotal)
                    .map_err(|e| AppError::ValidationError(e.to_string()))?;
                DiscountSnapshot {
                    kind: d.kind,
                    amount: d.amount,
                }
            }
            None => DiscountSnapshot::default(),
        };

        let pickup_locations = resolve_pickup_locations(&items, &branches)?;

        // Sequential, human-readable, never reused
        let sequence: i64 = sqlx::query_scalar("SELECT nextval('order_number_seq')")
            .fetch_one(&mut *tx)
            .await?;
        let order_number = shared::models::format_order_number(sequence);

        let mut order = Order {
            id: Uuid::new_v4(),
            order_number,
            customer_id: input.customer_id,
            delivery_partner_id: None,
            status: OrderStatus::Pending,
            items,
            pickup_locations,
            delivery_address: customer.address,
            slot: SlotSnapshot {
                slot_id: input.slot.slot_id,
                label: input.slot.label,
                date: input.slot.date,
                start_time: input.slot.start_time,
                end_time: input.slot.end_time,
            },
            payment: Payment {
                method: input.payment_method.unwrap_or(PaymentMethod::Cod),
                status: PaymentStatus::Pending,
            },
            discount,
            coupon_code: input.coupon_code,
            delivery_charge: input.delivery_charge,
            handling_charge: input.handling_charge,
            savings: input.savings,
            total_price: Decimal::ZERO,
            timestamps: StatusTimestamps::default(),
            created_at: now,
            updated_at: now,
        };
        order.recompute_total();

        insert_order(&mut tx, &order).await?;
        tx.commit().await?;

        tracing::info!(order_number = %order.order_number, "Order created");
        Ok(order)
    }

    /// Get one order with its full aggregate
    pub async fn get_order(&self, order_id: Uuid) -> AppResult<Order> {
        let mut conn = self.db.acquire().await?;
        load_order(&mut *conn, order_id).await
    }

    /// Get one order by its human-readable order number
    pub async fn get_order_by_number(&self, order_number: &str) -> AppResult<Order> {
        validation::validate_order_number(order_number)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        let order_id: Uuid =
            sqlx::query_scalar("SELECT id FROM orders WHERE order_number = $1")
                .bind(order_number)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
        let mut conn = self.db.acquire().await?;
        load_order(&mut *conn, order_id).await
    }

    /// All orders of one customer, newest first
    pub async fn get_orders_for_customer(&self, customer_id: Uuid) -> AppResult<Vec<Order>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM orders WHERE customer_id = $1 ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.db)
        .await?;

        let mut conn = self.db.acquire().await?;
        let mut orders = Vec::with_capacity(ids.len());
        for id in ids {
            orders.push(load_order(&mut *conn, id).await?);
        }
        Ok(orders)
    }

    /// Orders in pre-dispatch statuses containing items of the branch,
    /// with the item list filtered down to that branch
    pub async fn pending_orders_for_branch(&self, branch_id: Uuid) -> AppResult<Vec<Order>> {
        let statuses: Vec<String> = BRANCH_PENDING_STATUSES
            .iter()
            .map(|s| s.to_string())
            .collect();
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT o.id
            FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            WHERE o.status = ANY($1) AND oi.branch_id = $2
            "#,
        )
        .bind(&statuses)
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        let mut conn = self.db.acquire().await?;
        let mut orders = Vec::with_capacity(ids.len());
        for id in ids {
            let mut order = load_order(&mut *conn, id).await?;
            order.items.retain(|i| i.branch_id == branch_id);
            orders.push(order);
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

// ============================================================================
// Aggregate loading and storing (shared by the mutating services)
// ============================================================================

#[derive(FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    customer_id: Uuid,
    delivery_partner_id: Option<Uuid>,
    status: String,
    latitude: Decimal,
    longitude: Decimal,
    house_no: String,
    street_address: String,
    landmark: String,
    city: String,
    state: String,
    pin_code: String,
    country: String,
    slot_id: Option<Uuid>,
    slot_label: String,
    slot_date: NaiveDate,
    slot_start_time: NaiveTime,
    slot_end_time: NaiveTime,
    payment_method: String,
    payment_status: String,
    discount_kind: Option<String>,
    discount_amount: Decimal,
    coupon_code: Option<String>,
    delivery_charge: Decimal,
    handling_charge: Decimal,
    savings: Decimal,
    total_price: Decimal,
    confirmed_at: Option<DateTime<Utc>>,
    packed_at: Option<DateTime<Utc>>,
    ready_at: Option<DateTime<Utc>>,
    assigned_at: Option<DateTime<Utc>>,
    arriving_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct ItemRow {
    id: Uuid,
    product_id: Uuid,
    variant: String,
    unit: String,
    branch_id: Uuid,
    name: String,
    image_url: Option<String>,
    quantity: i32,
    unit_price: Decimal,
    item_total: Decimal,
    status: String,
    cancellation_reason: Option<String>,
}

#[derive(FromRow)]
struct PickupRow {
    branch_id: Uuid,
    latitude: Decimal,
    longitude: Decimal,
    address: String,
}

#[derive(FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    phone: String,
    latitude: Decimal,
    longitude: Decimal,
    house_no: String,
    street_address: String,
    landmark: String,
    city: String,
    state: String,
    pin_code: String,
    country: String,
}

#[derive(FromRow)]
struct BranchRow {
    id: Uuid,
    name: String,
    latitude: Decimal,
    longitude: Decimal,
    address: String,
    is_active: bool,
}

impl CustomerRow {
    fn into_customer(self) -> Customer {
        Customer {
            id: self.id,
            name: self.name,
            phone: self.phone,
            address: DeliveryAddress {
                location: GeoPoint::new(self.latitude, self.longitude),
                house_no: self.house_no,
                street_address: self.street_address,
                landmark: self.landmark,
                city: self.city,
                state: self.state,
                pin_code: self.pin_code,
                country: self.country,
            },
        }
    }
}

impl BranchRow {
    fn into_branch(self) -> Branch {
        Branch {
            id: self.id,
            name: self.name,
            location: GeoPoint::new(self.latitude, self.longitude),
            address: self.address,
            is_active: self.is_active,
        }
    }
}

fn parse_order_status(s: &str) -> AppResult<OrderStatus> {
    OrderStatus::from_str(s)
        .ok_or_else(|| AppError::Internal(format!("Unknown order status '{}' in storage", s)))
}

fn parse_item_status(s: &str) -> AppResult<ItemStatus> {
    ItemStatus::from_str(s)
        .ok_or_else(|| AppError::Internal(format!("Unknown item status '{}' in storage", s)))
}

const ORDER_COLUMNS: &str = r#"
    id, order_number, customer_id, delivery_partner_id, status,
    latitude, longitude, house_no, street_address, landmark, city, state, pin_code, country,
    slot_id, slot_label, slot_date, slot_start_time, slot_end_time,
    payment_method, payment_status, discount_kind, discount_amount, coupon_code,
    delivery_charge, handling_charge, savings, total_price,
    confirmed_at, packed_at, ready_at, assigned_at, arriving_at, delivered_at, cancelled_at,
    created_at, updated_at
"#;

async fn load_order_impl(
    conn: &mut PgConnection,
    order_id: Uuid,
    for_update: bool,
) -> AppResult<Order> {
    let lock_clause = if for_update { "FOR UPDATE" } else { "" };
    let header = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 {lock_clause}"
    ))
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

    let item_rows = sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT id, product_id, variant, unit, branch_id, name, image_url,
               quantity, unit_price, item_total, status, cancellation_reason
        FROM order_items
        WHERE order_id = $1
        ORDER BY position
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let pickup_rows = sqlx::query_as::<_, PickupRow>(
        r#"
        SELECT branch_id, latitude, longitude, address
        FROM order_pickup_locations
        WHERE order_id = $1
        ORDER BY position
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut items = Vec::with_capacity(item_rows.len());
    for row in item_rows {
        items.push(LineItem {
            id: row.id,
            product_id: row.product_id,
            variant: row.variant,
            unit: row.unit,
            branch_id: row.branch_id,
            name: row.name,
            image_url: row.image_url,
            quantity: row.quantity,
            unit_price: row.unit_price,
            item_total: row.item_total,
            status: parse_item_status(&row.status)?,
            cancellation_reason: row.cancellation_reason,
        });
    }

    let pickup_locations = pickup_rows
        .into_iter()
        .map(|row| PickupLocation {
            branch_id: row.branch_id,
            location: GeoPoint::new(row.latitude, row.longitude),
            address: row.address,
        })
        .collect();

    let payment = Payment {
        method: PaymentMethod::from_str(&header.payment_method).ok_or_else(|| {
            AppError::Internal(format!(
                "Unknown payment method '{}' in storage",
                header.payment_method
            ))
        })?,
        status: PaymentStatus::from_str(&header.payment_status).ok_or_else(|| {
            AppError::Internal(format!(
                "Unknown payment status '{}' in storage",
                header.payment_status
            ))
        })?,
    };

    Ok(Order {
        id: header.id,
        order_number: header.order_number,
        customer_id: header.customer_id,
        delivery_partner_id: header.delivery_partner_id,
        status: parse_order_status(&header.status)?,
        items,
        pickup_locations,
        delivery_address: DeliveryAddress {
            location: GeoPoint::new(header.latitude, header.longitude),
            house_no: header.house_no,
            street_address: header.street_address,
            landmark: header.landmark,
            city: header.city,
            state: header.state,
            pin_code: header.pin_code,
            country: header.country,
        },
        slot: SlotSnapshot {
            slot_id: header.slot_id,
            label: header.slot_label,
            date: header.slot_date,
            start_time: header.slot_start_time,
            end_time: header.slot_end_time,
        },
        payment,
        discount: DiscountSnapshot {
            kind: header.discount_kind,
            amount: header.discount_amount,
        },
        coupon_code: header.coupon_code,
        delivery_charge: header.delivery_charge,
        handling_charge: header.handling_charge,
        savings: header.savings,
        total_price: header.total_price,
        timestamps: StatusTimestamps {
            confirmed_at: header.confirmed_at,
            packed_at: header.packed_at,
            ready_at: header.ready_at,
            assigned_at: header.assigned_at,
            arriving_at: header.arriving_at,
            delivered_at: header.delivered_at,
            cancelled_at: header.cancelled_at,
        },
        created_at: header.created_at,
        updated_at: header.updated_at,
    })
}

/// Load the full order aggregate
pub(crate) async fn load_order(conn: &mut PgConnection, order_id: Uuid) -> AppResult<Order> {
    load_order_impl(conn, order_id, false).await
}

/// Load the full order aggregate, locking the order row for the duration of
/// the surrounding transaction. The row lock is what serializes concurrent
/// writers on the same order.
pub(crate) async fn load_order_for_update(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> AppResult<Order> {
    load_order_impl(conn, order_id, true).await
}

/// Write back the mutable part of the aggregate: order header and per-item
/// status fields. Must run inside the transaction that locked the row.
pub(crate) async fn store_order(conn: &mut PgConnection, order: &Order) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE orders
        SET delivery_partner_id = $1,
            status = $2,
            payment_method = $3,
            payment_status = $4,
            total_price = $5,
            confirmed_at = $6,
            packed_at = $7,
            ready_at = $8,
            assigned_at = $9,
            arriving_at = $10,
            delivered_at = $11,
            cancelled_at = $12,
            updated_at = $13
        WHERE id = $14
        "#,
    )
    .bind(order.delivery_partner_id)
    .bind(order.status.as_str())
    .bind(order.payment.method.as_str())
    .bind(order.payment.status.as_str())
    .bind(order.total_price)
    .bind(order.timestamps.confirmed_at)
    .bind(order.timestamps.packed_at)
    .bind(order.timestamps.ready_at)
    .bind(order.timestamps.assigned_at)
    .bind(order.timestamps.arriving_at)
    .bind(order.timestamps.delivered_at)
    .bind(order.timestamps.cancelled_at)
    .bind(order.updated_at)
    .bind(order.id)
    .execute(&mut *conn)
    .await?;

    for item in &order.items {
        sqlx::query(
            r#"
            UPDATE order_items
            SET status = $1, item_total = $2, cancellation_reason = $3
            WHERE id = $4 AND order_id = $5
            "#,
        )
        .bind(item.status.as_str())
        .bind(item.item_total)
        .bind(&item.cancellation_reason)
        .bind(item.id)
        .bind(order.id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn insert_order(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order: &Order,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, customer_id, delivery_partner_id, status,
            latitude, longitude, house_no, street_address, landmark, city, state, pin_code, country,
            slot_id, slot_label, slot_date, slot_start_time, slot_end_time,
            payment_method, payment_status, discount_kind, discount_amount, coupon_code,
            delivery_charge, handling_charge, savings, total_price,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30)
        "#,
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.customer_id)
    .bind(order.delivery_partner_id)
    .bind(order.status.as_str())
    .bind(order.delivery_address.location.latitude)
    .bind(order.delivery_address.location.longitude)
    .bind(&order.delivery_address.house_no)
    .bind(&order.delivery_address.street_address)
    .bind(&order.delivery_address.landmark)
    .bind(&order.delivery_address.city)
    .bind(&order.delivery_address.state)
    .bind(&order.delivery_address.pin_code)
    .bind(&order.delivery_address.country)
    .bind(order.slot.slot_id)
    .bind(&order.slot.label)
    .bind(order.slot.date)
    .bind(order.slot.start_time)
    .bind(order.slot.end_time)
    .bind(order.payment.method.as_str())
    .bind(order.payment.status.as_str())
    .bind(&order.discount.kind)
    .bind(order.discount.amount)
    .bind(&order.coupon_code)
    .bind(order.delivery_charge)
    .bind(order.handling_charge)
    .bind(order.savings)
    .bind(order.total_price)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await?;

    for (position, item) in order.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, position, product_id, variant, unit, branch_id,
                name, image_url, quantity, unit_price, item_total, status, cancellation_reason
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(item.id)
        .bind(order.id)
        .bind(position as i32)
        .bind(item.product_id)
        .bind(&item.variant)
        .bind(&item.unit)
        .bind(item.branch_id)
        .bind(&item.name)
        .bind(&item.image_url)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.item_total)
        .bind(item.status.as_str())
        .bind(&item.cancellation_reason)
        .execute(&mut **tx)
        .await?;
    }

    for (position, pickup) in order.pickup_locations.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_pickup_locations (order_id, position, branch_id, latitude, longitude, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id)
        .bind(position as i32)
        .bind(pickup.branch_id)
        .bind(pickup.location.latitude)
        .bind(pickup.location.longitude)
        .bind(&pickup.address)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
