pub mod cli;
pub mod config;
pub mod frontend;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use common::logger::init_logger;
use market::DexScreenerClient;
use watchdog::alert::{ConsoleSink, TelegramSink};
use watchdog::commands::HELP;
use watchdog::{
    AlertSink, Command, Destination, PolicyStore, PriceLog, Severity, TelegramUpdates, Watchdog,
    WatchdogOptions,
};

use cli::Cli;
use config::AppConfig;

type App = Watchdog<DexScreenerClient, Arc<dyn AlertSink>>;

fn apply_overrides(cli: &Cli, policy: &mut PolicyStore) -> anyhow::Result<()> {
    if let Some(percent) = cli.threshold {
        policy
            .set_threshold(percent / 100.0)
            .context("--threshold")?;
    }
    if let Some(seconds) = cli.interval {
        policy.set_interval(seconds).context("--interval")?;
    }
    Ok(())
}

/// Commands and alerts over Telegram. Monitoring alerts the chat that started it.
async fn serve_telegram(
    cli: &Cli,
    cfg: &AppConfig,
    token: &str,
    source: DexScreenerClient,
    policy: PolicyStore,
    options: WatchdogOptions,
) -> anyhow::Result<()> {
    let sink = TelegramSink::new(token).context("building telegram client")?;
    let updates = TelegramUpdates::new(token).context("building telegram poller")?;

    let allowed = cfg.telegram_chat_id.as_deref().map(Destination::new);
    if let Some(chat) = &allowed {
        TelegramSink::chat_id(chat)?;
    }

    let shared: Arc<dyn AlertSink> = Arc::new(sink.clone());
    let app: App = Watchdog::new(source, shared, policy, options);

    if cli.start {
        let chat = allowed
            .as_ref()
            .context("--start with telegram needs TELEGRAM_CHAT_ID")?;
        let reply = app.handle(Command::Start, chat).await;
        if let Err(e) = sink.deliver(chat, &reply, Severity::Info).await {
            warn!(error = %e, "start notice not delivered");
        }
    }

    frontend::run_telegram(&app, updates, &sink, allowed.as_ref(), &cfg.policy_file).await?;

    app.stop().await;
    Ok(())
}

/// Commands on stdin, alerts on stdout.
async fn serve_console(
    cli: &Cli,
    cfg: &AppConfig,
    source: DexScreenerClient,
    policy: PolicyStore,
    options: WatchdogOptions,
) -> anyhow::Result<()> {
    let sink: Arc<dyn AlertSink> = Arc::new(ConsoleSink);
    let app: App = Watchdog::new(source, sink, policy, options);
    let console = Destination::new("console");

    ConsoleSink::print(HELP).await?;

    if cli.start {
        let reply = app.handle(Command::Start, &console).await;
        ConsoleSink::print(&reply).await?;
    }

    frontend::run_console(&app, &console, &cfg.policy_file).await?;

    app.stop().await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = cli.merge_into(AppConfig::from_env());

    init_logger("price-watchdog", cfg.is_production());

    info!(
        chain = %cfg.chain,
        pair = %cfg.pair_address,
        asset = %cfg.asset,
        "starting price watchdog"
    );

    let mut policy = config::load_policy(&cfg.policy_file)?;
    apply_overrides(&cli, &mut policy)?;

    let source = DexScreenerClient::new(cfg.dexscreener()).context("building dexscreener client")?;

    let options = WatchdogOptions {
        asset: cfg.asset.clone(),
        price_log: (!cli.no_price_log).then(|| PriceLog::new(&cfg.price_log_file)),
        heartbeat_every: cli.heartbeat_every,
    };

    match cfg.telegram_token.clone() {
        Some(token) => {
            info!("commands and alerts over telegram");
            serve_telegram(&cli, &cfg, &token, source, policy, options).await?;
        }
        None => {
            info!("commands on stdin, alerts on stdout");
            serve_console(&cli, &cfg, source, policy, options).await?;
        }
    }

    info!("price watchdog shut down");
    Ok(())
}
