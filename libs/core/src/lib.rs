//! Relay core contracts and value types.
//!
//! This crate holds the WhatsApp webhook payload shape, the normalized events
//! extracted from it, the sink abstraction events are handed to, and the
//! environment-driven relay configuration.
pub mod config;
pub mod extract;
pub mod sink;
pub mod types;

pub use config::*;
pub use extract::*;
pub use sink::*;
pub use types::*;

/// `object` value WhatsApp Business Platform sets on every webhook delivery.
pub const WHATSAPP_OBJECT: &str = "whatsapp_business_account";
