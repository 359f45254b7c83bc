use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw webhook delivery as posted by the WhatsApp Business Platform.
///
/// `object` and `entry` are kept as untyped JSON values so that any
/// well-formed JSON body deserializes; the extractor walks `entry` leniently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub object: Option<Value>,
    #[serde(default)]
    pub entry: Value,
}

impl WebhookBody {
    pub fn is_whatsapp(&self) -> bool {
        self.object.as_ref().and_then(Value::as_str) == Some(crate::WHATSAPP_OBJECT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Text,
    Reaction,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Text => "text",
            EventType::Reaction => "reaction",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message or reaction pulled out of a webhook delivery, ready to forward.
///
/// `message_id` is the downstream upsert key. For reactions it is the id of
/// the message being reacted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    pub from: String,
    pub event_type: EventType,
    pub content: String,
    pub message_id: String,
    /// RFC 3339 instant in UTC.
    pub timestamp: String,
}

/// Delivery receipt for an outbound message. Logged, never forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub message_id: String,
    pub delivery_state: String,
    pub recipient: String,
    pub timestamp: String,
}
