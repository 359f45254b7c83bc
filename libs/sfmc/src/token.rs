use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use relay_core::SfmcSettings;
use relay_telemetry::record_token_fetch;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::{TokenError, truncate};

/// Tokens are refreshed this long before the provider-declared expiry.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Token as returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_in: Duration,
}

#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch(&self) -> Result<AccessToken, TokenError>;
}

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub value: String,
    pub expires_at: Instant,
}

impl CachedToken {
    pub fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }
}

/// In-memory holder for the bearer token used on row upserts.
///
/// Concurrent callers that find the cache stale each fetch a new token; the
/// lock is only held to read or swap the slot, never across the exchange.
pub struct TokenCache {
    fetcher: Arc<dyn TokenFetcher>,
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(fetcher: Arc<dyn TokenFetcher>) -> Self {
        Self {
            fetcher,
            slot: RwLock::new(None),
        }
    }

    pub async fn get_token(&self) -> Result<String, TokenError> {
        if let Some(cached) = self.slot.read().await.as_ref() {
            if cached.is_fresh(Instant::now()) {
                return Ok(cached.value.clone());
            }
        }

        let token = self.fetcher.fetch().await?;
        let cached = CachedToken {
            expires_at: Instant::now() + token.expires_in,
            value: token.value,
        };
        tracing::debug!(
            expires_in_secs = token.expires_in.as_secs(),
            "sfmc access token refreshed"
        );
        let value = cached.value.clone();
        *self.slot.write().await = Some(cached);
        Ok(value)
    }

    /// Drops the cached token so the next call fetches a fresh one.
    pub async fn invalidate(&self) {
        self.slot.write().await.take();
    }

    pub async fn cached(&self) -> Option<CachedToken> {
        self.slot.read().await.clone()
    }
}

/// Client-credentials exchange against `{auth_base}/v2/token`.
pub struct HttpTokenFetcher {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    account_id: Option<String>,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct RawTokenResponse {
    access_token: String,
    expires_in: u64,
}

impl HttpTokenFetcher {
    pub fn new(http: Client, settings: &SfmcSettings) -> Self {
        Self {
            http,
            token_url: settings.token_url(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            account_id: settings.account_id.clone(),
        }
    }
}

#[async_trait]
impl TokenFetcher for HttpTokenFetcher {
    async fn fetch(&self) -> Result<AccessToken, TokenError> {
        let request = TokenRequest {
            grant_type: "client_credentials",
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            account_id: self.account_id.as_deref(),
        };
        let response = self
            .http
            .post(&self.token_url)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                record_token_fetch("transport");
                TokenError::Transport(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            record_token_fetch("rejected");
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".into());
            return Err(TokenError::Rejected {
                status,
                body: truncate(body),
            });
        }

        let raw: RawTokenResponse = response.json().await.map_err(|err| {
            record_token_fetch("decode");
            TokenError::Decode(err)
        })?;
        record_token_fetch("ok");
        Ok(AccessToken {
            value: raw.access_token,
            expires_in: Duration::from_secs(raw.expires_in),
        })
    }
}
