pub mod client;
pub mod types;

pub use client::{DexScreenerClient, DexScreenerConfig};
pub use types::*;
