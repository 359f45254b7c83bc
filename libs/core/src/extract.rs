//! Lenient walk over `entry[].changes[].value` of a webhook delivery.
//!
//! Every nesting level that is missing or has the wrong JSON type is treated
//! as empty, so extraction never fails.

use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::types::{EventType, NormalizedEvent, StatusEvent, WebhookBody};

/// Flattens all messages of a delivery, in document order, into forwardable
/// events. Message types other than `text` and `reaction` are skipped.
pub fn extract(payload: &WebhookBody) -> Vec<NormalizedEvent> {
    change_values(payload)
        .flat_map(|value| array(value, "messages"))
        .filter_map(event_from_message)
        .collect()
}

/// Collects the delivery receipts of a delivery for diagnostic logging.
pub fn extract_statuses(payload: &WebhookBody) -> Vec<StatusEvent> {
    change_values(payload)
        .flat_map(|value| array(value, "statuses"))
        .map(|status| StatusEvent {
            message_id: str_field(status, "id").to_string(),
            delivery_state: str_field(status, "status").to_string(),
            recipient: str_field(status, "recipient_id").to_string(),
            timestamp: iso_timestamp(status.get("timestamp")),
        })
        .collect()
}

fn change_values(payload: &WebhookBody) -> impl Iterator<Item = &Value> {
    payload
        .entry
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .flat_map(|entry| array(entry, "changes"))
        .filter_map(|change| change.get("value"))
}

fn event_from_message(message: &Value) -> Option<NormalizedEvent> {
    let own_id = str_field(message, "id");
    let (event_type, content, message_id) = match message.get("type").and_then(Value::as_str) {
        Some("text") => (
            EventType::Text,
            nested_str(message, "text", "body"),
            own_id.to_string(),
        ),
        Some("reaction") => {
            // Rows are keyed to the message that was reacted to.
            let target = message
                .get("reaction")
                .and_then(|reaction| reaction.get("message_id"))
                .and_then(Value::as_str)
                .unwrap_or(own_id);
            (
                EventType::Reaction,
                nested_str(message, "reaction", "emoji"),
                target.to_string(),
            )
        }
        other => {
            tracing::debug!(
                message_type = other.unwrap_or("<missing>"),
                message_id = own_id,
                "unsupported whatsapp message type skipped"
            );
            return None;
        }
    };

    Some(NormalizedEvent {
        from: str_field(message, "from").to_string(),
        event_type,
        content,
        message_id,
        timestamp: iso_timestamp(message.get("timestamp")),
    })
}

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn nested_str(value: &Value, outer: &str, inner: &str) -> String {
    value
        .get(outer)
        .and_then(|v| v.get(inner))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// WhatsApp timestamps are epoch seconds, sent as a string or a number.
/// Missing, unparseable or out-of-range values fall back to the time of
/// processing. Output is RFC 3339 without fractional seconds.
fn iso_timestamp(raw: Option<&Value>) -> String {
    let seconds = raw.and_then(|value| match value {
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    });
    seconds
        .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        .unwrap_or_else(|| {
            let now = OffsetDateTime::now_utc();
            now - time::Duration::nanoseconds(i64::from(now.nanosecond()))
        })
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".into())
}
