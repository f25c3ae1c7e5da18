use std::borrow::Cow;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{AlertSink, Destination, Severity};
use crate::error::DeliveryError;

/// Serializes every write to stdout so alerts and replies never interleave.
static STDOUT: Mutex<()> = Mutex::const_new(());

/// Writes messages to stdout. Used when no chat transport is configured.
#[derive(Clone, Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn render(text: &str, severity: Severity) -> String {
        match severity {
            Severity::Alert => format!("[ALERT] {text}\n"),
            Severity::Info => format!("{text}\n"),
        }
    }

    /// Write one complete block to stdout. Shared with the console front end.
    pub async fn print(text: &str) -> std::io::Result<()> {
        let _guard = STDOUT.lock().await;

        let mut out = tokio::io::stdout();
        out.write_all(Self::terminated(text).as_bytes()).await?;
        out.flush().await
    }

    fn terminated(text: &str) -> Cow<'_, str> {
        if text.ends_with('\n') {
            Cow::Borrowed(text)
        } else {
            Cow::Owned(format!("{text}\n"))
        }
    }
}

#[async_trait]
impl AlertSink for ConsoleSink {
    async fn deliver(
        &self,
        destination: &Destination,
        text: &str,
        severity: Severity,
    ) -> Result<(), DeliveryError> {
        match severity {
            Severity::Alert => warn!(%destination, "alert delivered to console"),
            Severity::Info => info!(%destination, "notification delivered to console"),
        }

        Self::print(&Self::render(text, severity)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alerts_are_prefixed() {
        assert_eq!(ConsoleSink::render("drop", Severity::Alert), "[ALERT] drop\n");
        assert_eq!(ConsoleSink::render("ok", Severity::Info), "ok\n");
    }

    #[test]
    fn blocks_end_with_exactly_one_newline() {
        assert_eq!(ConsoleSink::terminated("reply"), "reply\n");
        assert_eq!(ConsoleSink::terminated("[ALERT] drop\n"), "[ALERT] drop\n");
    }

    #[tokio::test]
    async fn concurrent_replies_and_alerts_all_get_written() {
        let writers: Vec<_> = (0..16)
            .map(|i| {
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        ConsoleSink::print(&format!("reply {i}")).await.map_err(DeliveryError::from)
                    } else {
                        ConsoleSink
                            .deliver(&Destination::new("console"), "drop", Severity::Alert)
                            .await
                    }
                })
            })
            .collect();

        for w in writers {
            assert!(w.await.unwrap().is_ok());
        }
    }
}
