use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::UpstreamError;

/// Anything that can produce the current USD price of the watched asset.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_price(&self) -> Result<f64, UpstreamError>;
}

#[async_trait]
impl<T: PriceSource + ?Sized> PriceSource for Arc<T> {
    async fn fetch_price(&self) -> Result<f64, UpstreamError> {
        (**self).fetch_price().await
    }
}
