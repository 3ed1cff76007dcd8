//! Customer and delivery-partner references
//!
//! Identity management lives outside the engine; these are the lookup
//! shapes the engine consumes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::DeliveryAddress;

/// A customer, with the address snapshotted onto orders at checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: DeliveryAddress,
}

/// A delivery partner eligible to claim ready orders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPartner {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
}
