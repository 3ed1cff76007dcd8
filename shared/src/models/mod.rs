//! Domain models for the grocery order-fulfillment engine

mod branch;
mod order;
mod slot;
mod user;

pub use branch::*;
pub use order::*;
pub use slot::*;
pub use user::*;
