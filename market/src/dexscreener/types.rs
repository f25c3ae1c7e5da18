use serde::Deserialize;

use crate::errors::UpstreamError;

/// Body of `GET /latest/dex/pairs/{chain}/{pair}`.
#[derive(Debug, Deserialize)]
pub struct PairsEnvelope {
    #[serde(default)]
    pub pairs: Option<Vec<PairEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairEntry {
    #[serde(default)]
    pub price_usd: Option<String>,
}

impl PairsEnvelope {
    /// USD price of the first pair entry.
    pub fn price_usd(&self) -> Result<f64, UpstreamError> {
        let first = self
            .pairs
            .as_deref()
            .and_then(|p| p.first())
            .ok_or(UpstreamError::NoPairs)?;

        let raw = first
            .price_usd
            .as_deref()
            .ok_or(UpstreamError::MissingPrice)?;

        let price: f64 = raw
            .trim()
            .parse()
            .map_err(|_| UpstreamError::InvalidPrice(raw.to_string()))?;

        if !price.is_finite() || price <= 0.0 {
            return Err(UpstreamError::InvalidPrice(raw.to_string()));
        }

        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<f64, UpstreamError> {
        let env: PairsEnvelope = serde_json::from_str(body).expect("valid json");
        env.price_usd()
    }

    #[test]
    fn reads_first_pair_price() {
        let body = r#"{
            "schemaVersion": "1.0.0",
            "pairs": [
                {"chainId": "worldchain", "pairAddress": "0xabc", "priceUsd": "3312.45"},
                {"pairAddress": "0xdef", "priceUsd": "1.00"}
            ]
        }"#;

        let price = parse(body).unwrap();
        assert!((price - 3312.45).abs() < 1e-9);
    }

    #[test]
    fn null_or_empty_pairs_is_no_pairs() {
        assert!(matches!(parse(r#"{"pairs": null}"#), Err(UpstreamError::NoPairs)));
        assert!(matches!(parse(r#"{"pairs": []}"#), Err(UpstreamError::NoPairs)));
        assert!(matches!(parse(r#"{}"#), Err(UpstreamError::NoPairs)));
    }

    #[test]
    fn missing_price_field() {
        let body = r#"{"pairs": [{"pairAddress": "0xabc"}]}"#;
        assert!(matches!(parse(body), Err(UpstreamError::MissingPrice)));
    }

    #[test]
    fn unparseable_or_non_positive_price() {
        let garbage = r#"{"pairs": [{"priceUsd": "n/a"}]}"#;
        let zero = r#"{"pairs": [{"priceUsd": "0"}]}"#;
        let negative = r#"{"pairs": [{"priceUsd": "-4.2"}]}"#;

        assert!(matches!(parse(garbage), Err(UpstreamError::InvalidPrice(_))));
        assert!(matches!(parse(zero), Err(UpstreamError::InvalidPrice(_))));
        assert!(matches!(parse(negative), Err(UpstreamError::InvalidPrice(_))));
    }
}
