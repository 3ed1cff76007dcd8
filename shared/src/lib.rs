//! Shared types and models for the grocery order-fulfillment engine
//!
//! This crate contains the order aggregate, the fulfillment and delivery
//! state machines, the pricing recalculator, the slot availability
//! calculator and the branch resolver. Everything here is pure: no I/O,
//! no database access, callers pass the clock in explicitly.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
