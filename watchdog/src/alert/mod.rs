//! Outbound message delivery.
//!
//! The core only talks to [`AlertSink`]; transports live behind it.

pub mod console;
pub mod telegram;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DeliveryError;

pub use console::ConsoleSink;
pub use telegram::TelegramSink;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Alert,
}

/// Opaque channel address understood by the sink (chat id, "console", ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Destination(String);

impl Destination {
    pub fn new(v: impl Into<String>) -> Self {
        Self(v.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Delivers a formatted message. Best effort: callers log failures and move on.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(
        &self,
        destination: &Destination,
        text: &str,
        severity: Severity,
    ) -> Result<(), DeliveryError>;
}

#[async_trait]
impl<T: AlertSink + ?Sized> AlertSink for Arc<T> {
    async fn deliver(
        &self,
        destination: &Destination,
        text: &str,
        severity: Severity,
    ) -> Result<(), DeliveryError> {
        (**self).deliver(destination, text, severity).await
    }
}
