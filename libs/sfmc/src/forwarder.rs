use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{EventSink, NormalizedEvent, SfmcSettings};
use relay_telemetry::{record_forward, record_forward_failure};
use reqwest::Client;

use crate::error::ForwardError;
use crate::rows::DataExtensionRow;
use crate::token::TokenCache;

/// Writes normalized events into the configured Data Extension.
///
/// Each event gets exactly one upsert attempt. Failures are classified and
/// logged, then dropped.
pub struct Forwarder {
    http: Client,
    tokens: Arc<TokenCache>,
    rowset_url: String,
}

impl Forwarder {
    pub fn new(http: Client, tokens: Arc<TokenCache>, settings: &SfmcSettings) -> Self {
        Self {
            http,
            tokens,
            rowset_url: settings.rowset_url(),
        }
    }

    pub fn tokens(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    pub async fn try_forward(&self, event: &NormalizedEvent) -> Result<(), ForwardError> {
        let token = self.tokens.get_token().await?;
        let rows = [DataExtensionRow::from(event)];

        let response = self
            .http
            .post(&self.rowset_url)
            .bearer_auth(&token)
            .json(&rows)
            .send()
            .await
            .map_err(ForwardError::transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable>".into());
        let err = ForwardError::from_status(status, body);
        if matches!(err, ForwardError::StaleToken { .. }) {
            self.tokens.invalidate().await;
        }
        Err(err)
    }
}

#[async_trait]
impl EventSink for Forwarder {
    async fn forward(&self, event: &NormalizedEvent) {
        let event_type = event.event_type.as_str();
        match self.try_forward(event).await {
            Ok(()) => {
                record_forward(event_type);
                tracing::info!(
                    message_id = %event.message_id,
                    event_type,
                    "event written to data extension"
                );
            }
            Err(err) => {
                record_forward_failure(err.kind(), event_type);
                match &err {
                    ForwardError::Auth(source) => tracing::error!(
                        message_id = %event.message_id,
                        error = %source,
                        "sfmc token exchange failed; event dropped"
                    ),
                    ForwardError::StaleToken { .. } => tracing::warn!(
                        message_id = %event.message_id,
                        error = %err,
                        "sfmc token rejected; cache cleared, event dropped"
                    ),
                    ForwardError::NotFound { .. } => tracing::error!(
                        message_id = %event.message_id,
                        error = %err,
                        "data extension key not found; check SFMC_DE_KEY"
                    ),
                    ForwardError::Schema { .. } => tracing::error!(
                        message_id = %event.message_id,
                        error = %err,
                        "row does not match data extension columns"
                    ),
                    ForwardError::Unclassified { .. } => tracing::error!(
                        message_id = %event.message_id,
                        error = %err,
                        "failed to forward event"
                    ),
                }
            }
        }
    }
}
