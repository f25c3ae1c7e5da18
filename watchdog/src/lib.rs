//! Price-drop watchdog core: rolling-history drop detection driven by a
//! repeating sampling timer, with an operator command surface.

pub mod alert;
pub mod commands;
pub mod detector;
pub mod error;
pub mod messages;
pub mod monitor;
pub mod policy;
pub mod price_log;
pub mod session;
pub mod timer;
pub mod updates;

pub use alert::{AlertSink, Destination, Severity};
pub use commands::Command;
pub use detector::{TriggeredWindow, evaluate};
pub use error::{DeliveryError, PollError, PriceLogError, ValidationError};
pub use monitor::{StartOutcome, StatusReport, StopOutcome, TickOutcome, Watchdog, WatchdogOptions};
pub use policy::{PolicyStore, Window};
pub use price_log::PriceLog;
pub use session::{MonitorState, MonitoringSession};
pub use updates::{Inbound, TelegramUpdates};
