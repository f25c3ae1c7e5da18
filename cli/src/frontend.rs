use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use market::PriceSource;
use watchdog::alert::{ConsoleSink, TelegramSink};
use watchdog::{AlertSink, Command, Destination, Severity, TelegramUpdates, Watchdog};

use crate::config;

/// Pause after a failed `getUpdates` call before polling again.
const POLL_RETRY: Duration = Duration::from_secs(5);

/// Run one line of operator input and return the reply. Policy changes are
/// written to `policy_file`.
pub async fn respond<P, S>(app: &Watchdog<P, S>, line: &str, from: &Destination, policy_file: &Path) -> String
where
    P: PriceSource + 'static,
    S: AlertSink + 'static,
{
    let cmd = match line.parse::<Command>() {
        Ok(cmd) => cmd,
        Err(e) => {
            warn!(input = %line.trim(), %from, error = %e, "command rejected");
            return e.to_string();
        }
    };

    let persist = cmd.mutates_policy();
    let before = app.policy().await;
    let reply = app.handle(cmd, from).await;

    if persist {
        let after = app.policy().await;
        if after != before {
            match config::save_policy(policy_file, &after) {
                Ok(()) => info!(path = %policy_file.display(), "policy saved"),
                Err(e) => error!(error = ?e, "policy save failed"),
            }
        }
    }

    reply
}

/// Reads one command per line from stdin until EOF or Ctrl-C.
pub async fn run_console<P, S>(app: &Watchdog<P, S>, from: &Destination, policy_file: &Path) -> anyhow::Result<()>
where
    P: PriceSource + 'static,
    S: AlertSink + 'static,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("reading stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
        };

        let Some(line) = line else {
            info!("stdin closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = respond(app, &line, from, policy_file).await;
        ConsoleSink::print(&reply).await.context("writing reply")?;
    }

    Ok(())
}

/// Serves commands sent to the bot until Ctrl-C. Each reply goes back to the
/// chat that sent the command, and monitoring started from a chat alerts
/// that chat. With `allowed` set, messages from any other chat are ignored.
pub async fn run_telegram<P, S>(
    app: &Watchdog<P, S>,
    mut updates: TelegramUpdates,
    replies: &TelegramSink,
    allowed: Option<&Destination>,
    policy_file: &Path,
) -> anyhow::Result<()>
where
    P: PriceSource + 'static,
    S: AlertSink + 'static,
{
    info!(restricted = allowed.is_some(), "listening for telegram commands");

    loop {
        let batch = tokio::select! {
            batch = updates.next_batch() => batch,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
        };

        let batch = match batch {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, retry_s = POLL_RETRY.as_secs(), "telegram polling failed");
                tokio::time::sleep(POLL_RETRY).await;
                continue;
            }
        };

        for inbound in batch {
            if allowed.is_some_and(|chat| *chat != inbound.from) {
                warn!(chat = %inbound.from, "command from unknown chat ignored");
                continue;
            }

            let reply = respond(app, &inbound.text, &inbound.from, policy_file).await;
            if let Err(e) = replies.deliver(&inbound.from, &reply, Severity::Info).await {
                error!(error = %e, chat = %inbound.from, "reply delivery failed");
            }
        }
    }

    Ok(())
}
