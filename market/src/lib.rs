//! Market-side building blocks of the watchdog: the price sample model,
//! the rolling sample history and the upstream price source.

pub mod dexscreener;
pub mod errors;
pub mod history;
pub mod source;
pub mod types;

pub use dexscreener::DexScreenerClient;
pub use errors::UpstreamError;
pub use history::History;
pub use source::PriceSource;
pub use types::Sample;
