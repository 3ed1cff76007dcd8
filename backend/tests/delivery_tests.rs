//! Delivery tests
//!
//! Tests for partner-driven status updates including:
//! - Assigned-partner-only access
//! - The arriving/delivered/cancelled vocabulary
//! - Doorstep payment settlement

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{
    DeliveryAddress, DiscountSnapshot, ItemStatus, LineItem, Order, OrderError, OrderStatus,
    Payment, PaymentMethod, PaymentStatus, SlotSnapshot, StatusTimestamps,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap()
}

/// An order already assigned to the returned partner
fn assigned_order() -> (Order, Uuid) {
    let branch = Uuid::new_v4();
    let mut item = LineItem {
        id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        variant: "Standard".to_string(),
        unit: "1kg".to_string(),
        branch_id: branch,
        name: "Onions".to_string(),
        image_url: None,
        quantity: 1,
        unit_price: dec("35.00"),
        item_total: Decimal::ZERO,
        status: ItemStatus::Packed,
        cancellation_reason: None,
    };
    item.item_total = item.line_total();

    let now = ts();
    let mut order = Order {
        id: Uuid::new_v4(),
        order_number: "ORD00004".to_string(),
        customer_id: Uuid::new_v4(),
        delivery_partner_id: None,
        status: OrderStatus::Packed,
        items: vec![item],
        pickup_locations: vec![],
        delivery_address: DeliveryAddress::default(),
        slot: SlotSnapshot {
            slot_id: None,
            label: "Morning".to_string(),
            date: "2025-06-03".parse().unwrap(),
            start_time: "09:00:00".parse().unwrap(),
            end_time: "11:00:00".parse().unwrap(),
        },
        payment: Payment::default(),
        discount: DiscountSnapshot::default(),
        coupon_code: None,
        delivery_charge: dec("30"),
        handling_charge: dec("10"),
        savings: Decimal::ZERO,
        total_price: Decimal::ZERO,
        timestamps: StatusTimestamps::default(),
        created_at: now,
        updated_at: now,
    };
    order.recompute_total();

    let partner = Uuid::new_v4();
    order.assign_partner(partner, now).unwrap();
    (order, partner)
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Only the assigned partner may update delivery status
    #[test]
    fn test_other_partner_rejected() {
        let (mut order, _partner) = assigned_order();
        let imposter = Uuid::new_v4();

        let err = order
            .update_delivery_status(imposter, OrderStatus::Arriving, None, None, ts())
            .unwrap_err();
        assert!(matches!(err, OrderError::NotAssignedPartner(p) if p == imposter));
        assert_eq!(order.status, OrderStatus::Assigned);
    }

    /// Arriving then delivered, each stamped once
    #[test]
    fn test_arriving_then_delivered() {
        let (mut order, partner) = assigned_order();
        let t1 = ts() + Duration::minutes(15);
        let t2 = t1 + Duration::minutes(10);

        order
            .update_delivery_status(partner, OrderStatus::Arriving, None, None, t1)
            .unwrap();
        assert_eq!(order.status, OrderStatus::Arriving);
        assert_eq!(order.timestamps.arriving_at, Some(t1));

        order
            .update_delivery_status(partner, OrderStatus::Delivered, None, None, t2)
            .unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.timestamps.delivered_at, Some(t2));
    }

    /// Direct assigned-to-delivered is allowed
    #[test]
    fn test_delivered_without_arriving() {
        let (mut order, partner) = assigned_order();

        order
            .update_delivery_status(partner, OrderStatus::Delivered, None, None, ts())
            .unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    /// Partners are limited to the delivery vocabulary
    #[test]
    fn test_partner_cannot_set_packing_statuses() {
        let (mut order, partner) = assigned_order();

        for status in [OrderStatus::Packed, OrderStatus::Ready, OrderStatus::Confirmed] {
            let err = order
                .update_delivery_status(partner, status, None, None, ts())
                .unwrap_err();
            assert!(matches!(err, OrderError::PreconditionFailed(_)));
        }
        assert_eq!(order.status, OrderStatus::Assigned);
    }

    /// Cash collected on the doorstep settles the payment
    #[test]
    fn test_doorstep_payment_settlement() {
        let (mut order, partner) = assigned_order();

        order
            .update_delivery_status(
                partner,
                OrderStatus::Delivered,
                Some(PaymentMethod::Cash),
                Some(PaymentStatus::Paid),
                ts(),
            )
            .unwrap();
        assert_eq!(order.payment.method, PaymentMethod::Cash);
        assert_eq!(order.payment.status, PaymentStatus::Paid);
    }

    /// Payment fields stay untouched when the update omits them
    #[test]
    fn test_payment_untouched_when_omitted() {
        let (mut order, partner) = assigned_order();

        order
            .update_delivery_status(partner, OrderStatus::Arriving, None, None, ts())
            .unwrap();
        assert_eq!(order.payment.method, PaymentMethod::Cod);
        assert_eq!(order.payment.status, PaymentStatus::Pending);
    }

    /// A delivered order rejects every further partner update
    #[test]
    fn test_delivered_is_terminal() {
        let (mut order, partner) = assigned_order();
        order
            .update_delivery_status(partner, OrderStatus::Delivered, None, None, ts())
            .unwrap();

        let err = order
            .update_delivery_status(partner, OrderStatus::Cancelled, None, None, ts())
            .unwrap_err();
        assert!(matches!(err, OrderError::Terminal(OrderStatus::Delivered)));
    }

    /// The partner can cancel a delivery that fails at the door
    #[test]
    fn test_partner_cancellation() {
        let (mut order, partner) = assigned_order();

        order
            .update_delivery_status(partner, OrderStatus::Cancelled, None, None, ts())
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.timestamps.cancelled_at, Some(ts()));
    }
}
