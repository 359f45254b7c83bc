use metrics::counter;

pub const WEBHOOK_COUNTER: &str = "relay_webhook_deliveries_total";
pub const FORWARD_COUNTER: &str = "relay_events_forwarded_total";
pub const FORWARD_FAILURE_COUNTER: &str = "relay_forward_failures_total";
pub const TOKEN_FETCH_COUNTER: &str = "relay_token_fetches_total";

/// Counts an inbound webhook delivery, labelled `accepted` or `rejected`.
pub fn record_webhook_delivery(accepted: bool) {
    let outcome = if accepted { "accepted" } else { "rejected" };
    counter!(WEBHOOK_COUNTER, "outcome" => outcome).increment(1);
}

/// Counts an event written to the data extension.
pub fn record_forward(event_type: &'static str) {
    counter!(FORWARD_COUNTER, "event_type" => event_type).increment(1);
}

/// Counts a dropped event by failure kind (`auth`, `stale_token`, `not_found`, ...).
pub fn record_forward_failure(kind: &'static str, event_type: &'static str) {
    counter!(FORWARD_FAILURE_COUNTER, "kind" => kind, "event_type" => event_type).increment(1);
}

pub fn record_token_fetch(outcome: &'static str) {
    counter!(TOKEN_FETCH_COUNTER, "outcome" => outcome).increment(1);
}
