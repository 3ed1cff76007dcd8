//! Fulfillment branches and the pickup-location resolver

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{LineItem, OrderError, PickupLocation};
use crate::types::GeoPoint;

/// A fulfillment location that packs the line items assigned to it.
/// Referenced, never owned, by orders and line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: Uuid,
    pub name: String,
    pub location: GeoPoint,
    pub address: String,
    pub is_active: bool,
}

/// Derive one pickup location per distinct branch referenced by the items,
/// in order of first appearance. The number of locations always equals the
/// number of distinct branches, no matter how many items each contributes.
pub fn resolve_pickup_locations(
    items: &[LineItem],
    branches: &[Branch],
) -> Result<Vec<PickupLocation>, OrderError> {
    let mut seen: Vec<Uuid> = Vec::new();
    let mut locations = Vec::new();
    for item in items {
        if seen.contains(&item.branch_id) {
            continue;
        }
        seen.push(item.branch_id);
        let branch = branches
            .iter()
            .find(|b| b.id == item.branch_id)
            .ok_or(OrderError::UnknownBranch(item.branch_id))?;
        locations.push(PickupLocation {
            branch_id: branch.id,
            location: branch.location.clone(),
            address: branch.address.clone(),
        });
    }
    Ok(locations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemStatus;
    use rust_decimal::Decimal;

    fn branch(name: &str) -> Branch {
        Branch {
            id: Uuid::new_v4(),
            name: name.to_string(),
            location: GeoPoint::default(),
            address: format!("{} Road", name),
            is_active: true,
        }
    }

    fn item_for(branch_id: Uuid) -> LineItem {
        LineItem {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            variant: "Standard".to_string(),
            unit: "1kg".to_string(),
            branch_id,
            name: "Sugar".to_string(),
            image_url: None,
            quantity: 1,
            unit_price: Decimal::from(40),
            item_total: Decimal::from(40),
            status: ItemStatus::Pending,
            cancellation_reason: None,
        }
    }

    #[test]
    fn one_location_per_distinct_branch() {
        let a = branch("Adajan");
        let b = branch("Vesu");
        let items = vec![item_for(a.id), item_for(a.id), item_for(b.id)];

        let locations =
            resolve_pickup_locations(&items, &[a.clone(), b.clone()]).unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].branch_id, a.id);
        assert_eq!(locations[1].branch_id, b.id);
        assert_eq!(locations[1].address, b.address);
    }

    #[test]
    fn order_of_first_appearance_is_kept() {
        let a = branch("Adajan");
        let b = branch("Vesu");
        let items = vec![item_for(b.id), item_for(a.id), item_for(b.id)];

        let locations = resolve_pickup_locations(&items, &[a.clone(), b.clone()]).unwrap();
        assert_eq!(locations[0].branch_id, b.id);
        assert_eq!(locations[1].branch_id, a.id);
    }

    #[test]
    fn unknown_branch_is_an_error() {
        let a = branch("Adajan");
        let items = vec![item_for(a.id), item_for(Uuid::new_v4())];

        let err = resolve_pickup_locations(&items, &[a]).unwrap_err();
        assert!(matches!(err, OrderError::UnknownBranch(_)));
    }
}
