use std::path::PathBuf;

use thiserror::Error;

/// A user-supplied parameter was rejected. State is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("threshold must be above 0% and at most 100% (got {percent}%)")]
    ThresholdOutOfRange { percent: f64 },

    #[error("interval must be between 1 and 3600 seconds (got {0})")]
    IntervalOutOfRange(u64),

    #[error("unknown window '{0}'")]
    UnknownWindow(String),

    #[error("window '{0}' already exists")]
    DuplicateWindow(String),

    #[error("window steps must be at least 1 (got {0})")]
    InvalidSteps(usize),

    #[error("window name must not be empty")]
    EmptyWindowName,

    #[error("unknown command '{0}', try 'help'")]
    UnknownCommand(String),

    #[error("invalid value '{value}' for {command}")]
    InvalidArgument { command: &'static str, value: String },
}

/// A message could not be handed to the delivery channel.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("delivery rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid destination '{0}'")]
    InvalidDestination(String),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum PriceLogError {
    #[error("failed to append to price log {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Incoming commands could not be fetched from the chat transport.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bot api refused the request: {0}")]
    Api(String),
}
