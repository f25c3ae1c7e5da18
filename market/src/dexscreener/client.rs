use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::dexscreener::types::PairsEnvelope;
use crate::errors::UpstreamError;
use crate::source::PriceSource;

pub const DEFAULT_BASE_URL: &str = "https://api.dexscreener.com";
pub const DEFAULT_CHAIN: &str = "worldchain";
pub const DEFAULT_PAIR_ADDRESS: &str = "0x84c7cc9107afad860db12dfadf49c1dac2e0723b";

/// Which DexScreener pair to price.
#[derive(Clone, Debug)]
pub struct DexScreenerConfig {
    pub base_url: String,
    pub chain: String,
    pub pair_address: String,
    pub timeout: Duration,
}

impl Default for DexScreenerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chain: DEFAULT_CHAIN.to_string(),
            pair_address: DEFAULT_PAIR_ADDRESS.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Price source backed by the public DexScreener pairs endpoint.
#[derive(Clone)]
pub struct DexScreenerClient {
    http: Client,
    url: String,
}

impl DexScreenerClient {
    pub fn new(cfg: DexScreenerConfig) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(cfg.timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        let url = format!(
            "{}/latest/dex/pairs/{}/{}",
            cfg.base_url.trim_end_matches('/'),
            cfg.chain,
            cfg.pair_address
        );

        Ok(Self { http, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PriceSource for DexScreenerClient {
    #[instrument(skip(self), fields(url = %self.url), level = "debug")]
    async fn fetch_price(&self) -> Result<f64, UpstreamError> {
        let resp = self.http.get(&self.url).send().await?.error_for_status()?;

        let envelope: PairsEnvelope = resp.json().await?;
        let price = envelope.price_usd()?;

        debug!(price, "dexscreener price fetched");

        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_pair_url_without_double_slash() {
        let client = DexScreenerClient::new(DexScreenerConfig {
            base_url: "https://api.dexscreener.com/".into(),
            chain: "worldchain".into(),
            pair_address: "0xpair".into(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        assert_eq!(
            client.url(),
            "https://api.dexscreener.com/latest/dex/pairs/worldchain/0xpair"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_upstream_http_error() {
        let client = DexScreenerClient::new(DexScreenerConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_millis(500),
            ..Default::default()
        })
        .unwrap();

        let err = client.fetch_price().await.unwrap_err();
        assert!(matches!(err, UpstreamError::Http(_)));
    }
}
