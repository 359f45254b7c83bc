use relay_core::NormalizedEvent;
use serde::Serialize;

/// One row of the `rowset` upsert, keyed by `MessageId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataExtensionRow {
    pub keys: RowKeys,
    pub values: RowValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RowKeys {
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RowValues {
    pub phone_number: String,
    pub event_type: String,
    pub content: String,
    pub message_id: String,
    pub timestamp: String,
}

impl From<&NormalizedEvent> for DataExtensionRow {
    fn from(event: &NormalizedEvent) -> Self {
        Self {
            keys: RowKeys {
                message_id: event.message_id.clone(),
            },
            values: RowValues {
                phone_number: event.from.clone(),
                event_type: event.event_type.as_str().to_string(),
                content: event.content.clone(),
                message_id: event.message_id.clone(),
                timestamp: event.timestamp.clone(),
            },
        }
    }
}
