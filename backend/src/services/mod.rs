//! Business logic services for the grocery order-fulfillment engine

pub mod delivery;
pub mod dispatch;
pub mod fulfillment;
pub mod order;
pub mod slot;

pub use delivery::DeliveryService;
pub use dispatch::DispatchService;
pub use fulfillment::FulfillmentService;
pub use order::OrderService;
pub use slot::SlotService;
