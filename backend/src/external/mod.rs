//! External API integrations

pub mod push;

pub use push::PushClient;
