//! WhatsApp → SFMC relay: verifies the Meta webhook subscription, extracts
//! message and reaction events, and upserts each as a Data Extension row.
//!
//! ```text
//! Meta calls `GET|POST /webhook`; events land in the Data Extension named by
//! `SFMC_DE_KEY`, keyed by `MessageId`.
//! ```

use std::sync::Arc;

use anyhow::Result;
use relay_core::RelayConfig;
use relay_ingress_whatsapp::{AppState, build_router};
use relay_sfmc::{Forwarder, HttpTokenFetcher, TokenCache};
use relay_telemetry::install as init_telemetry;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_telemetry("whatsapp-sfmc-relay")?;

    let config = RelayConfig::from_env()?;
    tracing::debug!(?config, "relay configuration loaded");

    let http = reqwest::Client::new();
    let fetcher = HttpTokenFetcher::new(http.clone(), &config.sfmc);
    let tokens = Arc::new(TokenCache::new(Arc::new(fetcher)));
    let forwarder = Forwarder::new(http, tokens, &config.sfmc);

    let state = AppState::new(config.verify_token.clone(), Arc::new(forwarder));
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(
        de_key = %config.sfmc.de_key,
        "whatsapp-sfmc-relay listening on {}",
        config.bind
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
