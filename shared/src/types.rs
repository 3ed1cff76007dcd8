//! Common types used across the engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// GPS coordinates for branches and delivery addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GeoPoint {
    pub latitude: Decimal,
    pub longitude: Decimal,
}

impl GeoPoint {
    pub fn new(latitude: Decimal, longitude: Decimal) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}
