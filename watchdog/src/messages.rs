//! Text rendering for outbound notifications.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::detector::TriggeredWindow;

pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// One alert listing every window that triggered on this tick.
pub fn drop_alert(asset: &str, at: &DateTime<Utc>, price: f64, triggered: &[TriggeredWindow]) -> String {
    let mut msg = format!(
        "Price drop on {asset} at {}.\nCurrent price: {price:.2} USD.",
        timestamp(at)
    );
    for t in triggered {
        msg.push_str(&format!(
            "\n{}: from {:.2} to {price:.2} ({:.2}%)",
            t.name,
            t.past_price,
            t.percent_change()
        ));
    }
    msg
}

pub fn heartbeat(asset: &str, price: f64) -> String {
    format!("Still online. {asset} price: {price:.2} USD")
}
