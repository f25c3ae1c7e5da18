use thiserror::Error;

/// Failure to obtain a price from the upstream market-data endpoint.
///
/// Always recoverable: the caller logs it and skips the sample.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no trading pairs in upstream response")]
    NoPairs,

    #[error("upstream response has no priceUsd field")]
    MissingPrice,

    #[error("invalid price {0:?}")]
    InvalidPrice(String),
}
