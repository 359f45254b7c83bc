use async_trait::async_trait;

use crate::types::NormalizedEvent;

/// Destination for normalized events.
///
/// Implementations own their failure handling: `forward` is best effort and
/// never reports an error back to the caller.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn forward(&self, event: &NormalizedEvent);
}

/// Sink that keeps every event in memory so tests can inspect what was forwarded.
#[derive(Default)]
pub struct InMemoryEventSink {
    events: tokio::sync::Mutex<Vec<NormalizedEvent>>,
}

impl InMemoryEventSink {
    pub async fn take(&self) -> Vec<NormalizedEvent> {
        std::mem::take(&mut *self.events.lock().await)
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn forward(&self, event: &NormalizedEvent) {
        self.events.lock().await.push(event.clone());
    }
}
