use std::fmt;
use std::net::SocketAddr;

use anyhow::{Context, Result, anyhow};

pub const SFMC_DOMAIN: &str = "marketingcloudapis.com";
pub const DEFAULT_PORT: u16 = 3000;

/// Runtime configuration of the relay, read from the process environment.
#[derive(Clone)]
pub struct RelayConfig {
    /// Shared secret echoed back by Meta during the subscription handshake.
    pub verify_token: String,
    pub bind: SocketAddr,
    pub sfmc: SfmcSettings,
}

/// Credentials and endpoints of the Marketing Cloud tenant rows are written to.
#[derive(Clone)]
pub struct SfmcSettings {
    pub client_id: String,
    pub client_secret: String,
    pub subdomain: String,
    /// External key of the destination Data Extension.
    pub de_key: String,
    /// Business unit MID, sent as `account_id` on the token request when set.
    pub account_id: Option<String>,
    pub auth_base: String,
    pub rest_base: String,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("{key} must be set"));

        let subdomain = required("SFMC_SUBDOMAIN")?;
        let auth_base = get("SFMC_AUTH_BASE")
            .unwrap_or_else(|| format!("https://{subdomain}.auth.{SFMC_DOMAIN}"));
        let rest_base = get("SFMC_REST_BASE")
            .unwrap_or_else(|| format!("https://{subdomain}.rest.{SFMC_DOMAIN}"));

        let bind = match get("BIND") {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .with_context(|| format!("invalid BIND address {raw:?}"))?,
            None => {
                let port = match get("PORT") {
                    Some(raw) => raw
                        .parse::<u16>()
                        .with_context(|| format!("invalid PORT {raw:?}"))?,
                    None => DEFAULT_PORT,
                };
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        Ok(Self {
            verify_token: required("WHATSAPP_VERIFY_TOKEN")?,
            bind,
            sfmc: SfmcSettings {
                client_id: required("SFMC_CLIENT_ID")?,
                client_secret: required("SFMC_CLIENT_SECRET")?,
                de_key: required("SFMC_DE_KEY")?,
                account_id: get("SFMC_ACCOUNT_ID"),
                subdomain,
                auth_base,
                rest_base,
            },
        })
    }
}

impl SfmcSettings {
    pub fn token_url(&self) -> String {
        format!("{}/v2/token", self.auth_base.trim_end_matches('/'))
    }

    pub fn rowset_url(&self) -> String {
        format!(
            "{}/hub/v1/dataevents/key:{}/rowset",
            self.rest_base.trim_end_matches('/'),
            self.de_key
        )
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("verify_token", &"<redacted>")
            .field("bind", &self.bind)
            .field("sfmc", &self.sfmc)
            .finish()
    }
}

impl fmt::Debug for SfmcSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SfmcSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("subdomain", &self.subdomain)
            .field("de_key", &self.de_key)
            .field("account_id", &self.account_id)
            .field("auth_base", &self.auth_base)
            .field("rest_base", &self.rest_base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("WHATSAPP_VERIFY_TOKEN", "verify-me"),
        ("SFMC_CLIENT_ID", "client"),
        ("SFMC_CLIENT_SECRET", "s3cret"),
        ("SFMC_SUBDOMAIN", "mc123"),
        ("SFMC_DE_KEY", "WA_EVENTS"),
    ];

    #[test]
    fn defaults_derive_endpoints_from_subdomain() {
        let cfg = RelayConfig::from_lookup(env(BASE)).unwrap();
        assert_eq!(
            cfg.sfmc.token_url(),
            "https://mc123.auth.marketingcloudapis.com/v2/token"
        );
        assert_eq!(
            cfg.sfmc.rowset_url(),
            "https://mc123.rest.marketingcloudapis.com/hub/v1/dataevents/key:WA_EVENTS/rowset"
        );
        assert_eq!(cfg.bind, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(cfg.sfmc.account_id, None);
    }

    #[test]
    fn overrides_are_honoured() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("SFMC_AUTH_BASE", "http://127.0.0.1:9000/"),
            ("SFMC_REST_BASE", "http://127.0.0.1:9001"),
            ("SFMC_ACCOUNT_ID", "5100"),
            ("PORT", "8087"),
        ]);
        let cfg = RelayConfig::from_lookup(env(&pairs)).unwrap();
        assert_eq!(cfg.sfmc.token_url(), "http://127.0.0.1:9000/v2/token");
        assert!(cfg.sfmc.rowset_url().starts_with("http://127.0.0.1:9001/hub/"));
        assert_eq!(cfg.sfmc.account_id.as_deref(), Some("5100"));
        assert_eq!(cfg.bind.port(), 8087);
    }

    #[test]
    fn bind_takes_precedence_over_port() {
        let mut pairs = BASE.to_vec();
        pairs.extend([("BIND", "127.0.0.1:4000"), ("PORT", "5000")]);
        let cfg = RelayConfig::from_lookup(env(&pairs)).unwrap();
        assert_eq!(cfg.bind, "127.0.0.1:4000".parse().unwrap());
    }

    #[test]
    fn missing_or_blank_required_values_are_reported() {
        let pairs: Vec<_> = BASE
            .iter()
            .copied()
            .filter(|(k, _)| *k != "SFMC_DE_KEY")
            .collect();
        let err = RelayConfig::from_lookup(env(&pairs)).unwrap_err();
        assert!(err.to_string().contains("SFMC_DE_KEY"));

        let mut pairs = BASE.to_vec();
        pairs.push(("WHATSAPP_VERIFY_TOKEN", "  "));
        let lookup = env(&pairs);
        let err = RelayConfig::from_lookup(lookup).unwrap_err();
        assert!(err.to_string().contains("WHATSAPP_VERIFY_TOKEN"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut pairs = BASE.to_vec();
        pairs.push(("PORT", "http"));
        assert!(RelayConfig::from_lookup(env(&pairs)).is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = RelayConfig::from_lookup(env(BASE)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("verify-me"));
        assert!(rendered.contains("<redacted>"));
    }
}
