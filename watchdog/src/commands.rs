//! Operator command surface.
//!
//! Front ends turn raw text into a [`Command`] and hand it to
//! [`Watchdog::handle`], which returns the reply for the issuer.

use std::fmt;
use std::str::FromStr;

use common::logger::child_span;
use market::{PriceSource, Sample};
use tracing::{Instrument, info};

use crate::alert::{AlertSink, Destination};
use crate::error::ValidationError;
use crate::messages::timestamp;
use crate::monitor::{DEFAULT_HISTORY_MINUTES, StartOutcome, StatusReport, StopOutcome, Watchdog};
use crate::policy::format_span;
use crate::session::MonitorState;

pub const HELP: &str = "\
Commands:
  start monitoring          start sampling and alerting
  stop monitoring           stop sampling
  status                    monitoring state and last price
  price now                 fetch the current price
  set threshold <percent>   alert when the price falls by at least this much
  set interval <seconds>    sampling interval
  history [minutes]         recent samples (default 5 minutes)
  windows                   list look-back windows
  enable window <name>      include a window in drop checks
  disable window <name>     exclude a window from drop checks
  add window <name> <steps> add a custom window
  help                      this list";

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Start,
    Stop,
    Status,
    PriceNow,
    /// Percentage, e.g. `25` for a 25% fall.
    SetThreshold(f64),
    SetInterval(u64),
    History(Option<u32>),
    Windows,
    EnableWindow(String),
    DisableWindow(String),
    AddWindow { name: String, steps: usize },
    Help,
}

impl Command {
    /// Commands whose success changes the persisted policy.
    pub fn mutates_policy(&self) -> bool {
        matches!(
            self,
            Command::SetThreshold(_)
                | Command::SetInterval(_)
                | Command::EnableWindow(_)
                | Command::DisableWindow(_)
                | Command::AddWindow { .. }
        )
    }
}

fn parse_arg<T: FromStr>(command: &'static str, value: &str) -> Result<T, ValidationError> {
    value
        .trim_end_matches('%')
        .parse()
        .map_err(|_| ValidationError::InvalidArgument {
            command,
            value: value.to_string(),
        })
}

impl FromStr for Command {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim().trim_start_matches('/').to_lowercase();
        let words: Vec<&str> = line.split_whitespace().collect();

        let cmd = match words.as_slice() {
            ["start"] | ["start", "monitoring"] | ["logon"] => Command::Start,
            ["stop"] | ["stop", "monitoring"] | ["logoff"] => Command::Stop,
            ["status"] | ["get", "status"] => Command::Status,
            ["price"] | ["price", "now"] | ["get", "price", "now"] => Command::PriceNow,
            ["threshold", v] | ["set", "threshold", v] => {
                Command::SetThreshold(parse_arg("threshold", v)?)
            }
            ["interval", v] | ["set", "interval", v] => {
                Command::SetInterval(parse_arg("interval", v)?)
            }
            ["history"] | ["get", "history"] => Command::History(None),
            ["history", m] | ["get", "history", m] => Command::History(Some(parse_arg("history", m)?)),
            ["windows"] => Command::Windows,
            ["enable", name] | ["enable", "window", name] => Command::EnableWindow(name.to_string()),
            ["disable", name] | ["disable", "window", name] => Command::DisableWindow(name.to_string()),
            ["add", "window", name, steps] => Command::AddWindow {
                name: name.to_string(),
                steps: parse_arg("add window", steps)?,
            },
            ["help"] => Command::Help,
            _ => return Err(ValidationError::UnknownCommand(s.trim().to_string())),
        };

        Ok(cmd)
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            MonitorState::Running => "active",
            MonitorState::Stopped => "inactive",
        };
        writeln!(f, "Monitoring: {state}")?;

        match self.last_price {
            Some(p) => writeln!(f, "Last price: {p:.2} USD")?,
            None => writeln!(f, "Last price: no data yet")?,
        }

        write!(
            f,
            "Threshold: {:.2}% every {}s, windows: {}",
            self.threshold * 100.0,
            self.interval_seconds,
            if self.active_windows.is_empty() {
                "none".to_string()
            } else {
                self.active_windows.join(", ")
            }
        )
    }
}

fn format_history(samples: &[Sample]) -> String {
    if samples.is_empty() {
        return "No data for that period.".to_string();
    }

    let mut out = format!("Last {} samples:", samples.len());
    for s in samples {
        out.push_str(&format!("\n{} {:.2}", timestamp(&s.at), s.price));
    }
    out
}

impl<P, S> Watchdog<P, S>
where
    P: PriceSource + 'static,
    S: AlertSink + 'static,
{
    /// Execute a command on behalf of `from` and return the reply text.
    ///
    /// Never fails: invalid input and upstream errors become replies.
    pub async fn handle(&self, cmd: Command, from: &Destination) -> String {
        let span = child_span("command");
        async {
            info!(command = ?cmd, %from, "command received");
            self.dispatch(cmd, from).await
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, cmd: Command, from: &Destination) -> String {
        match cmd {
            Command::Start => match self.start(from.clone()).await {
                Ok(StartOutcome::Started { price }) => {
                    format!("Monitoring enabled. Current price: {price:.2} USD")
                }
                Ok(StartOutcome::AlreadyActive) => "Monitoring is already active.".to_string(),
                Err(e) => format!("Could not start monitoring: {e}"),
            },

            Command::Stop => match self.stop().await {
                StopOutcome::Stopped => "Monitoring disabled.".to_string(),
                StopOutcome::NotActive => "Monitoring is not active.".to_string(),
            },

            Command::Status => self.status().await.to_string(),

            Command::PriceNow => match self.price_now().await {
                Ok(price) => format!("{} price: {price:.2} USD", self.asset()),
                Err(e) => format!("Could not fetch price: {e}"),
            },

            Command::SetThreshold(percent) => match self.set_threshold(percent / 100.0).await {
                Ok(_) => format!("Threshold set to {percent:.2}%."),
                Err(e) => format!("Invalid threshold: {e}"),
            },

            Command::SetInterval(seconds) => match self.set_interval(seconds).await {
                Ok(_) => format!("Sampling every {seconds}s."),
                Err(e) => format!("Invalid interval: {e}"),
            },

            Command::History(minutes) => {
                let samples = self.history(minutes.unwrap_or(DEFAULT_HISTORY_MINUTES)).await;
                format_history(&samples)
            }

            Command::Windows => {
                let policy = self.policy().await;
                let mut out = String::from("Windows:");
                for w in policy.windows() {
                    out.push_str(&format!(
                        "\n{} = {} steps (~{}){}",
                        w.name,
                        w.steps,
                        format_span(w.span(policy.interval_seconds())),
                        if w.enabled { "" } else { " [disabled]" }
                    ));
                }
                out
            }

            Command::EnableWindow(name) => match self.set_window_enabled(&name, true).await {
                Ok(()) => format!("Window {name} enabled."),
                Err(e) => e.to_string(),
            },

            Command::DisableWindow(name) => match self.set_window_enabled(&name, false).await {
                Ok(()) => format!("Window {name} disabled."),
                Err(e) => e.to_string(),
            },

            Command::AddWindow { name, steps } => match self.add_window(&name, steps).await {
                Ok(()) => format!("Window {name} added ({steps} steps)."),
                Err(e) => e.to_string(),
            },

            Command::Help => HELP.to_string(),
        }
    }
}
