use chrono::{DateTime, Utc};

/// One successful price observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub at: DateTime<Utc>,
    /// USD price, always finite and > 0 when produced by a `PriceSource`.
    pub price: f64,
}

impl Sample {
    pub fn new(at: DateTime<Utc>, price: f64) -> Self {
        Self { at, price }
    }

    /// Sample stamped with the current wall-clock time.
    pub fn now(price: f64) -> Self {
        Self::new(Utc::now(), price)
    }
}
