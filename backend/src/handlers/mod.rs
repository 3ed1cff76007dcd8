//! HTTP request handlers

pub mod delivery;
pub mod dispatch;
pub mod fulfillment;
pub mod health;
pub mod order;
pub mod slot;

pub use delivery::*;
pub use dispatch::*;
pub use fulfillment::*;
pub use health::*;
pub use order::*;
pub use slot::*;
