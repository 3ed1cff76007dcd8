//! Pricing tests
//!
//! Tests for order totals including:
//! - Line totals as quantity x unit price
//! - Recompute-on-cancellation semantics
//! - Idempotence of rejected double cancellations
//! - Property: the total always equals the active-item subtotal plus charges
//!   minus discount, after any sequence of cancellations

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{
    DeliveryAddress, DiscountSnapshot, ItemStatus, LineItem, Order, OrderError, OrderStatus,
    Payment, SlotSnapshot, StatusTimestamps,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap()
}

fn item(price: &str, quantity: i32) -> LineItem {
    let mut item = LineItem {
        id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        variant: "Standard".to_string(),
        unit: "500g".to_string(),
        branch_id: Uuid::new_v4(),
        name: "Toor Dal".to_string(),
        image_url: None,
        quantity,
        unit_price: dec(price),
        item_total: Decimal::ZERO,
        status: ItemStatus::Pending,
        cancellation_reason: None,
    };
    item.item_total = item.line_total();
    item
}

fn order_with(items: Vec<LineItem>, discount: Decimal) -> Order {
    let now = ts();
    let mut order = Order {
        id: Uuid::new_v4(),
        order_number: "ORD00002".to_string(),
        customer_id: Uuid::new_v4(),
        delivery_partner_id: None,
        status: OrderStatus::Pending,
        items,
        pickup_locations: vec![],
        delivery_address: DeliveryAddress::default(),
        slot: SlotSnapshot {
            slot_id: None,
            label: "Evening".to_string(),
            date: "2025-06-03".parse().unwrap(),
            start_time: "17:00:00".parse().unwrap(),
            end_time: "19:00:00".parse().unwrap(),
        },
        payment: Payment::default(),
        discount: DiscountSnapshot {
            kind: if discount.is_zero() {
                None
            } else {
                Some("flat".to_string())
            },
            amount: discount,
        },
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
    order
}

/// The pricing formula every total must satisfy
fn expected_total(order: &Order) -> Decimal {
    let subtotal: Decimal = order
        .items
        .iter()
        .filter(|i| i.status != ItemStatus::Cancelled)
        .map(|i| i.item_total)
        .sum();
    subtotal + order.delivery_charge + order.handling_charge - order.discount.amount
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_line_total_is_quantity_times_unit_price() {
        let item = item("45.50", 3);
        assert_eq!(item.line_total(), dec("136.50"));
        assert_eq!(item.item_total, dec("136.50"));
    }

    #[test]
    fn test_initial_total_includes_charges() {
        let order = order_with(vec![item("100.00", 2), item("50.00", 1)], Decimal::ZERO);
        // 200 + 50 + 30 + 10
        assert_eq!(order.total_price, dec("290.00"));
    }

    #[test]
    fn test_discount_reduces_total() {
        let order = order_with(vec![item("100.00", 1)], dec("25"));
        // 100 + 30 + 10 - 25
        assert_eq!(order.total_price, dec("115.00"));
    }

    #[test]
    fn test_cancelling_item_removes_its_total() {
        let mut order = order_with(vec![item("100.00", 2), item("50.00", 1)], Decimal::ZERO);
        let first = order.items[0].id;

        order.cancel_item(first, None, ts()).unwrap();
        // 50 + 30 + 10
        assert_eq!(order.total_price, dec("90.00"));
        assert_eq!(order.total_price, expected_total(&order));
    }

    #[test]
    fn test_second_cancel_rejected_and_total_unchanged() {
        let mut order = order_with(vec![item("100.00", 2), item("50.00", 1)], Decimal::ZERO);
        let first = order.items[0].id;

        order.cancel_item(first, None, ts()).unwrap();
        let total_after_first = order.total_price;

        let err = order.cancel_item(first, None, ts()).unwrap_err();
        assert!(matches!(err, OrderError::PreconditionFailed(_)));
        assert_eq!(order.total_price, total_after_first);
    }

    #[test]
    fn test_cancellation_reason_defaults() {
        let mut order = order_with(vec![item("100.00", 1), item("50.00", 1)], Decimal::ZERO);
        let (first, second) = (order.items[0].id, order.items[1].id);

        order.cancel_item(first, None, ts()).unwrap();
        assert_eq!(
            order.items[0].cancellation_reason.as_deref(),
            Some("Not specified")
        );

        order
            .cancel_item(second, Some("Out of stock".to_string()), ts())
            .unwrap();
        assert_eq!(
            order.items[1].cancellation_reason.as_deref(),
            Some("Out of stock")
        );
    }

    #[test]
    fn test_cancelling_unknown_item_is_not_found() {
        let mut order = order_with(vec![item("100.00", 1)], Decimal::ZERO);
        let err = order.cancel_item(Uuid::new_v4(), None, ts()).unwrap_err();
        assert!(matches!(err, OrderError::ItemNotFound(_)));
        assert_eq!(order.total_price, expected_total(&order));
    }

    #[test]
    fn test_cancelling_via_packing_update_also_reprices() {
        let mut order = order_with(vec![item("100.00", 2), item("50.00", 1)], Decimal::ZERO);
        let first = order.items[0].id;
        let branch = order.items[0].branch_id;

        order
            .set_item_status(first, branch, ItemStatus::Cancelled, ts())
            .unwrap();
        assert_eq!(order.total_price, dec("90.00"));
        assert_eq!(order.total_price, expected_total(&order));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating valid unit prices (0.01 to 1000.00)
    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Strategy for generating an order's worth of items
    fn items_strategy() -> impl Strategy<Value = Vec<(Decimal, i32)>> {
        prop::collection::vec((price_strategy(), 1i32..=20i32), 1..6)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// After any sequence of cancellations the total obeys the formula
        #[test]
        fn prop_total_tracks_active_items(
            specs in items_strategy(),
            cancel_order in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
            discount_cents in 0i64..=2000i64,
        ) {
            let items: Vec<LineItem> = specs
                .iter()
                .map(|(price, qty)| {
                    let mut i = item("1.00", *qty);
                    i.unit_price = *price;
                    i.item_total = i.line_total();
                    i
                })
                .collect();
            let mut order = order_with(items, Decimal::new(discount_cents, 2));
            prop_assert_eq!(order.total_price, expected_total(&order));

            for index in cancel_order {
                let target = order.items[index.index(order.items.len())].id;
                let previous_total = order.total_price;
                match order.cancel_item(target, None, ts()) {
                    Ok(()) => {
                        // Cancellation never increases the total
                        prop_assert!(order.total_price <= previous_total);
                    }
                    Err(OrderError::PreconditionFailed(_)) | Err(OrderError::Terminal(_)) => {
                        // Double cancel or fully cancelled order; total untouched
                        prop_assert_eq!(order.total_price, previous_total);
                    }
                    Err(e) => return Err(TestCaseError::fail(format!("unexpected error {e}"))),
                }
                prop_assert_eq!(order.total_price, expected_total(&order));
            }
        }

        /// Line totals always follow quantity x unit price
        #[test]
        fn prop_line_total_formula(price in price_strategy(), qty in 1i32..=50i32) {
            let mut i = item("1.00", qty);
            i.unit_price = price;
            prop_assert_eq!(i.line_total(), price * Decimal::from(qty));
        }
    }
}
