//! Order aggregate and the fulfillment / delivery state machines
//!
//! All legal status transitions are centralized in [`OrderStatus::allowed_next`];
//! mutating operations go through [`Order::transition_to`] so an unlisted
//! transition is rejected by construction. The order-level status is derived
//! from line-item statuses plus the explicit confirm / ready actions and
//! never regresses to an earlier stage.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::GeoPoint;

/// Domain failures raised by order mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("item {0} not found in order")]
    ItemNotFound(Uuid),

    #[error("item {item_id} belongs to branch {owning_branch_id}, not to the acting branch")]
    OwnershipViolation { item_id: Uuid, owning_branch_id: Uuid },

    #[error("order is not assigned to delivery partner {0}")]
    NotAssignedPartner(Uuid),

    #[error("illegal transition from '{from}' to '{to}'")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("order is already assigned to a delivery partner")]
    AlreadyAssigned,

    #[error("order is in terminal status '{0}'")]
    Terminal(OrderStatus),

    #[error("'{0}' is not a valid packing status for an item")]
    InvalidItemStatus(ItemStatus),

    #[error("branch {0} is not referenced by any line item")]
    UnknownBranch(Uuid),
}

/// Order-level lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Packing,
    Packed,
    Ready,
    Assigned,
    Arriving,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Packing => "packing",
            OrderStatus::Packed => "packed",
            OrderStatus::Ready => "ready",
            OrderStatus::Assigned => "assigned",
            OrderStatus::Arriving => "arriving",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "packing" => Some(OrderStatus::Packing),
            "packed" => Some(OrderStatus::Packed),
            "ready" => Some(OrderStatus::Ready),
            "assigned" => Some(OrderStatus::Assigned),
            "arriving" => Some(OrderStatus::Arriving),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// The transition table: every legal next status for the current one.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Packing, Packed, Cancelled],
            Confirmed => &[Packing, Packed, Cancelled],
            Packing => &[Packed, Cancelled],
            Packed => &[Ready, Assigned, Cancelled],
            Ready => &[Assigned, Cancelled],
            Assigned => &[Arriving, Delivered, Cancelled],
            Arriving => &[Delivered, Cancelled],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.allowed_next().contains(&to)
    }

    /// Delivered and cancelled orders accept no further mutation
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Statuses from which a delivery partner may claim the order.
    /// Both packed and ready are assignable.
    pub fn is_assignable(&self) -> bool {
        matches!(self, OrderStatus::Packed | OrderStatus::Ready)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Packing status of a single line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Confirmed,
    Packing,
    Packed,
    Cancelled,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Confirmed => "confirmed",
            ItemStatus::Packing => "packing",
            ItemStatus::Packed => "packed",
            ItemStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ItemStatus::Pending),
            "confirmed" => Some(ItemStatus::Confirmed),
            "packing" => Some(ItemStatus::Packing),
            "packed" => Some(ItemStatus::Packed),
            "cancelled" => Some(ItemStatus::Cancelled),
            _ => None,
        }
    }

    /// Statuses branch staff may set through the packing endpoint
    pub fn is_packing_update(&self) -> bool {
        matches!(
            self,
            ItemStatus::Packing | ItemStatus::Packed | ItemStatus::Cancelled
        )
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment method chosen at checkout or collected on delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    Online,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Online => "online",
            PaymentMethod::Cash => "cash",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cod" => Some(PaymentMethod::Cod),
            "online" => Some(PaymentMethod::Online),
            "cash" => Some(PaymentMethod::Cash),
            _ => None,
        }
    }
}

/// Payment settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// Payment details on an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

impl Default for Payment {
    fn default() -> Self {
        Self {
            method: PaymentMethod::Cod,
            status: PaymentStatus::Pending,
        }
    }
}

/// Discount applied at checkout, stored as a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DiscountSnapshot {
    pub kind: Option<String>,
    pub amount: Decimal,
}

/// Delivery slot chosen at checkout, stored as a snapshot so later slot
/// edits never retroactively alter placed orders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub slot_id: Option<Uuid>,
    pub label: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Customer delivery address, snapshotted onto the order at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeliveryAddress {
    pub location: GeoPoint,
    pub house_no: String,
    pub street_address: String,
    pub landmark: String,
    pub city: String,
    pub state: String,
    pub pin_code: String,
    pub country: String,
}

/// One pickup location per distinct fulfillment branch on the order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupLocation {
    pub branch_id: Uuid,
    pub location: GeoPoint,
    pub address: String,
}

/// Timestamps stamped exactly once per reached status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatusTimestamps {
    pub confirmed_at: Option<DateTime<Utc>>,
    pub packed_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub arriving_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl StatusTimestamps {
    /// Record when a status was first reached; later transitions through the
    /// same status never overwrite the original timestamp.
    pub fn stamp(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        let slot = match status {
            OrderStatus::Confirmed => &mut self.confirmed_at,
            OrderStatus::Packed => &mut self.packed_at,
            OrderStatus::Ready => &mut self.ready_at,
            OrderStatus::Assigned => &mut self.assigned_at,
            OrderStatus::Arriving => &mut self.arriving_at,
            OrderStatus::Delivered => &mut self.delivered_at,
            OrderStatus::Cancelled => &mut self.cancelled_at,
            OrderStatus::Pending | OrderStatus::Packing => return,
        };
        if slot.is_none() {
            *slot = Some(at);
        }
    }
}

/// One product/variant/quantity entry, owned by exactly one branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant: String,
    /// Variant unit label, e.g. "1kg" or "500g"
    pub unit: String,
    pub branch_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub item_total: Decimal,
    pub status: ItemStatus,
    pub cancellation_reason: Option<String>,
}

impl LineItem {
    /// Line total is always quantity x unit price, never persisted stale
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Outcome of a packing-status update, reported back to branch staff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemStatusUpdate {
    /// All non-cancelled items of the acting branch are packed
    pub branch_packed: bool,
    /// All non-cancelled items across all branches are packed
    pub order_packed: bool,
}

/// A customer's checkout transaction, possibly spanning multiple branches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Sequential human-readable identifier, e.g. "ORD00042"
    pub order_number: String,
    pub customer_id: Uuid,
    pub delivery_partner_id: Option<Uuid>,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    pub pickup_locations: Vec<PickupLocation>,
    pub delivery_address: DeliveryAddress,
    pub slot: SlotSnapshot,
    pub payment: Payment,
    pub discount: DiscountSnapshot,
    pub coupon_code: Option<String>,
    pub delivery_charge: Decimal,
    pub handling_charge: Decimal,
    pub savings: Decimal,
    pub total_price: Decimal,
    pub timestamps: StatusTimestamps,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Items that still count towards packing and pricing
    pub fn active_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items
            .iter()
            .filter(|i| i.status != ItemStatus::Cancelled)
    }

    /// True when every non-cancelled item of the branch is packed.
    /// Vacuously true when the branch has no active items left.
    pub fn branch_packed(&self, branch_id: Uuid) -> bool {
        self.active_items()
            .filter(|i| i.branch_id == branch_id)
            .all(|i| i.status == ItemStatus::Packed)
    }

    /// True when at least one item is active and every active item is packed
    pub fn all_items_packed(&self) -> bool {
        let mut any = false;
        for item in self.active_items() {
            if item.status != ItemStatus::Packed {
                return false;
            }
            any = true;
        }
        any
    }

    /// Full recompute of the order total. Incremental adjustment is
    /// deliberately not offered: the recomputed value is the sole source of
    /// truth.
    pub fn recompute_total(&mut self) {
        let items_total: Decimal = self.active_items().map(|i| i.item_total).sum();
        self.total_price =
            items_total + self.delivery_charge + self.handling_charge - self.discount.amount;
    }

    fn transition_to(&mut self, to: OrderStatus, now: DateTime<Utc>) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::Terminal(self.status));
        }
        if !self.status.can_transition_to(to) {
            return Err(OrderError::IllegalTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.timestamps.stamp(to, now);
        self.updated_at = now;
        Ok(())
    }

    /// Confirm the order. Idempotent: confirming an already-confirmed (or
    /// further progressed) order is a no-op; only terminal orders reject.
    /// Returns whether the status actually changed.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<bool, OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::Terminal(self.status));
        }
        if self.status != OrderStatus::Pending {
            return Ok(false);
        }
        self.transition_to(OrderStatus::Confirmed, now)?;
        Ok(true)
    }

    /// Branch staff update of one item's packing status.
    ///
    /// The acting branch must own the item. Afterwards the per-branch and
    /// order-wide packed flags are recomputed from the aggregate; the first
    /// time the order-wide flag becomes true the order transitions to packed
    /// and `packed_at` is stamped exactly once.
    ///
    /// The order status never regresses: reopening an item (packed back to
    /// packing) is recorded on the item and clears the branch flag, but a
    /// packed order stays packed.
    pub fn set_item_status(
        &mut self,
        item_id: Uuid,
        branch_id: Uuid,
        new_status: ItemStatus,
        now: DateTime<Utc>,
    ) -> Result<ItemStatusUpdate, OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::Terminal(self.status));
        }
        if !new_status.is_packing_update() {
            return Err(OrderError::InvalidItemStatus(new_status));
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(OrderError::ItemNotFound(item_id))?;
        if item.branch_id != branch_id {
            return Err(OrderError::OwnershipViolation {
                item_id,
                owning_branch_id: item.branch_id,
            });
        }
        if item.status == ItemStatus::Cancelled {
            return Err(OrderError::PreconditionFailed(format!(
                "item {} is already cancelled",
                item_id
            )));
        }

        item.status = new_status;
        item.item_total = item.line_total();
        if new_status == ItemStatus::Cancelled {
            self.recompute_total();
        }
        self.derive_status_from_items(now);
        self.updated_at = now;

        Ok(ItemStatusUpdate {
            branch_packed: self.branch_packed(branch_id),
            order_packed: self.status == OrderStatus::Packed,
        })
    }

    /// Cancel one line item, storing the reason and recomputing the total in
    /// the same mutation. A second cancel of the same item is rejected and
    /// leaves the total unchanged.
    pub fn cancel_item(
        &mut self,
        item_id: Uuid,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::Terminal(self.status));
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(OrderError::ItemNotFound(item_id))?;
        if item.status == ItemStatus::Cancelled {
            return Err(OrderError::PreconditionFailed(format!(
                "item {} is already cancelled",
                item_id
            )));
        }

        item.status = ItemStatus::Cancelled;
        item.cancellation_reason = Some(reason.unwrap_or_else(|| "Not specified".to_string()));
        self.recompute_total();
        self.derive_status_from_items(now);
        self.updated_at = now;
        Ok(())
    }

    /// The single gate preventing dispatch of a partially packed order
    pub fn mark_ready(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::Terminal(self.status));
        }
        if self.status != OrderStatus::Packed {
            return Err(OrderError::PreconditionFailed(format!(
                "order must be packed before it can be marked ready, current status is '{}'",
                self.status
            )));
        }
        self.transition_to(OrderStatus::Ready, now)
    }

    /// First-acceptor-wins assignment. In storage this runs as a single
    /// conditional update; this method carries the same semantics for the
    /// in-memory aggregate.
    pub fn assign_partner(
        &mut self,
        partner_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if self.delivery_partner_id.is_some() {
            return Err(OrderError::AlreadyAssigned);
        }
        if !self.status.is_assignable() {
            return Err(OrderError::PreconditionFailed(format!(
                "order is not in an assignable state, current status is '{}'",
                self.status
            )));
        }
        self.delivery_partner_id = Some(partner_id);
        self.transition_to(OrderStatus::Assigned, now)
    }

    /// Delivery-partner-driven transition (arriving, delivered or cancelled),
    /// with optional payment updates collected on the doorstep. Only the
    /// assigned partner may act.
    pub fn update_delivery_status(
        &mut self,
        partner_id: Uuid,
        new_status: OrderStatus,
        payment_method: Option<PaymentMethod>,
        payment_status: Option<PaymentStatus>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::Terminal(self.status));
        }
        if self.delivery_partner_id != Some(partner_id) {
            return Err(OrderError::NotAssignedPartner(partner_id));
        }
        if !matches!(
            new_status,
            OrderStatus::Arriving | OrderStatus::Delivered | OrderStatus::Cancelled
        ) {
            return Err(OrderError::PreconditionFailed(format!(
                "delivery partners may not set status '{}'",
                new_status
            )));
        }
        self.transition_to(new_status, now)?;
        if let Some(method) = payment_method {
            self.payment.method = method;
        }
        if let Some(status) = payment_status {
            self.payment.status = status;
        }
        Ok(())
    }

    /// Re-derive the order-level status from item statuses after an item
    /// mutation. Forward-only: packed is entered at most once, and an order
    /// whose items are all cancelled is itself cancelled.
    fn derive_status_from_items(&mut self, now: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        if self.active_items().next().is_none() {
            // Last active item was cancelled; nothing left to fulfill.
            let _ = self.transition_to(OrderStatus::Cancelled, now);
            return;
        }
        if self.all_items_packed() {
            if self.status.can_transition_to(OrderStatus::Packed) {
                let _ = self.transition_to(OrderStatus::Packed, now);
            }
            return;
        }
        let any_in_progress = self
            .active_items()
            .any(|i| matches!(i.status, ItemStatus::Packing | ItemStatus::Packed));
        if any_in_progress
            && matches!(self.status, OrderStatus::Pending | OrderStatus::Confirmed)
        {
            // No timestamp slot for packing; it is a purely derived stage.
            let _ = self.transition_to(OrderStatus::Packing, now);
        }
    }
}

/// Format a sequential order number, e.g. `format_order_number(42)` -> "ORD00042"
pub fn format_order_number(sequence: i64) -> String {
    format!("ORD{:05}", sequence)
}
