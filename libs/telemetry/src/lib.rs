//! Telemetry helpers for the relay: installs the tracing subscriber and
//! exposes the counters the ingress and forwarding paths record.

use anyhow::Result;

mod config;
mod counters;
mod tracing_init;

pub use config::{LogFormat, TelemetryConfig};
pub use counters::{
    FORWARD_COUNTER, FORWARD_FAILURE_COUNTER, TOKEN_FETCH_COUNTER, WEBHOOK_COUNTER,
    record_forward, record_forward_failure, record_token_fetch, record_webhook_delivery,
};
pub use tracing_init::init_telemetry;

/// Installs the shared subscriber configured from `RUST_LOG` and `LOG_FORMAT`.
pub fn install(service_name: &str) -> Result<()> {
    init_telemetry(TelemetryConfig::from_env(
        service_name,
        env!("CARGO_PKG_VERSION"),
    ))
}
