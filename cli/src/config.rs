use std::path::{Path, PathBuf};

use anyhow::Context;
use market::dexscreener::DexScreenerConfig;
use market::dexscreener::client::{DEFAULT_BASE_URL, DEFAULT_CHAIN, DEFAULT_PAIR_ADDRESS};
use watchdog::PolicyStore;

pub const DEFAULT_PRICE_LOG_FILE: &str = "prices.log";
pub const DEFAULT_POLICY_FILE: &str = "watchdog_config.json";

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// DexScreener API root.
    pub dexscreener_url: String,
    pub chain: String,
    pub pair_address: String,

    /// Label used in replies and notifications.
    pub asset: String,

    /// Append-only `timestamp,price` file.
    pub price_log_file: PathBuf,

    /// JSON file holding threshold, interval and windows across restarts.
    pub policy_file: PathBuf,

    // =========================
    // Delivery
    // =========================
    /// Bot token. With it commands arrive over Telegram; without it the
    /// console front end is used.
    pub telegram_token: Option<String>,

    /// When set, the only chat whose commands are served, and the chat
    /// alerted by `--start`.
    pub telegram_chat_id: Option<String>,

    /// `production` switches logs to JSON.
    pub app_env: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            dexscreener_url: get("DEXSCREENER_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            chain: get("WATCHDOG_CHAIN").unwrap_or_else(|| DEFAULT_CHAIN.to_string()),
            pair_address: get("WATCHDOG_PAIR").unwrap_or_else(|| DEFAULT_PAIR_ADDRESS.to_string()),
            asset: get("WATCHDOG_ASSET").unwrap_or_else(|| "oXAUT".to_string()),

            price_log_file: get("PRICE_LOG_FILE")
                .unwrap_or_else(|| DEFAULT_PRICE_LOG_FILE.to_string())
                .into(),
            policy_file: get("WATCHDOG_CONFIG_FILE")
                .unwrap_or_else(|| DEFAULT_POLICY_FILE.to_string())
                .into(),

            telegram_token: get("TELEGRAM_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),
            app_env: get("APP_ENV").unwrap_or_default(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    pub fn dexscreener(&self) -> DexScreenerConfig {
        DexScreenerConfig {
            base_url: self.dexscreener_url.clone(),
            chain: self.chain.clone(),
            pair_address: self.pair_address.clone(),
            ..DexScreenerConfig::default()
        }
    }
}

/// Load the persisted policy. A missing file yields the defaults; a file
/// that exists but does not parse or validate is an error.
pub fn load_policy(path: &Path) -> anyhow::Result<PolicyStore> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PolicyStore::default()),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };

    let policy: PolicyStore =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

    policy
        .validated()
        .with_context(|| format!("invalid policy in {}", path.display()))
}

pub fn save_policy(path: &Path, policy: &PolicyStore) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(policy)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = AppConfig::from_lookup(lookup(&[]));

        assert_eq!(cfg.dexscreener_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.chain, "worldchain");
        assert_eq!(cfg.asset, "oXAUT");
        assert_eq!(cfg.price_log_file, PathBuf::from("prices.log"));
        assert_eq!(cfg.policy_file, PathBuf::from("watchdog_config.json"));
        assert!(cfg.telegram_token.is_none());
        assert!(!cfg.is_production());
    }

    #[test]
    fn env_values_override_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("WATCHDOG_CHAIN", "base"),
            ("WATCHDOG_PAIR", "0xabc"),
            ("TELEGRAM_TOKEN", "123:xyz"),
            ("TELEGRAM_CHAT_ID", ""),
            ("APP_ENV", "production"),
        ]));

        let dex = cfg.dexscreener();
        assert_eq!(dex.chain, "base");
        assert_eq!(dex.pair_address, "0xabc");
        assert_eq!(cfg.telegram_token.as_deref(), Some("123:xyz"));
        assert!(cfg.telegram_chat_id.is_none());
        assert!(cfg.is_production());
    }

    #[test]
    fn missing_policy_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let policy = load_policy(&dir.path().join("absent.json")).unwrap();

        assert_eq!(policy, PolicyStore::default());
    }

    #[test]
    fn saved_policy_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");

        let mut policy = PolicyStore::default();
        policy.set_threshold(0.1).unwrap();
        policy.set_interval(30).unwrap();
        policy.set_window_enabled("5min", false).unwrap();
        policy.add_window("15min", 90).unwrap();

        save_policy(&path, &policy).unwrap();
        assert_eq!(load_policy(&path).unwrap(), policy);
    }

    #[test]
    fn invalid_policy_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");

        std::fs::write(&path, r#"{"threshold": 2.0, "interval_seconds": 10, "windows": []}"#).unwrap();
        assert!(load_policy(&path).is_err());

        std::fs::write(&path, "not json").unwrap();
        assert!(load_policy(&path).is_err());
    }
}
