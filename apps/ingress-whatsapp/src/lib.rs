//! HTTP surface of the relay: the Meta subscription handshake, the webhook
//! receiver, and a health check.

pub mod http;
pub mod reqid;

pub use http::{AppState, build_router, process_delivery};
