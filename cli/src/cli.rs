use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[clap(name = "price-watchdog", version)]
pub struct Cli {
    /// Policy file (threshold, interval, windows); overrides WATCHDOG_CONFIG_FILE
    #[clap(long)]
    pub config_file: Option<PathBuf>,

    /// Price log file; overrides PRICE_LOG_FILE
    #[clap(long)]
    pub price_log: Option<PathBuf>,

    /// Do not write the price log
    #[clap(long)]
    pub no_price_log: bool,

    /// Drop threshold in percent, replacing the persisted value
    #[clap(long)]
    pub threshold: Option<f64>,

    /// Sampling interval in seconds, replacing the persisted value
    #[clap(long)]
    pub interval: Option<u64>,

    /// Successful samples between heartbeat messages (0 disables)
    #[clap(long, default_value = "30")]
    pub heartbeat_every: u64,

    /// Start monitoring right after boot
    #[clap(long)]
    pub start: bool,
}

impl Cli {
    /// Apply path overrides on top of the environment.
    pub(crate) fn merge_into(&self, mut cfg: AppConfig) -> AppConfig {
        if let Some(path) = &self.config_file {
            cfg.policy_file = path.clone();
        }
        if let Some(path) = &self.price_log {
            cfg.price_log_file = path.clone();
        }
        cfg
    }
}
