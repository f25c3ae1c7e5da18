//! Multi-window percentage-drop detection.
//!
//! Side-effect free: reads the history and the policy, never mutates them.

use market::History;

use crate::policy::PolicyStore;

/// A window whose drop condition held on this evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggeredWindow {
    pub name: String,
    pub past_price: f64,
    /// `(current - past) / past`, negative for a fall.
    pub relative_change: f64,
}

impl TriggeredWindow {
    pub fn percent_change(&self) -> f64 {
        self.relative_change * 100.0
    }
}

/// Compare `current_price` against the sample each enabled window looks back to.
///
/// A window triggers when the price fell by at least the policy threshold
/// (`change <= -threshold`, boundary inclusive). Windows without enough
/// history, or whose past price is not positive, are skipped. Results keep
/// the policy's canonical window order and every window is judged
/// independently.
pub fn evaluate(history: &History, current_price: f64, policy: &PolicyStore) -> Vec<TriggeredWindow> {
    let threshold = policy.threshold();

    policy
        .active_windows()
        .filter_map(|window| {
            let past = history.lookback(window.steps)?;
            if past.price <= 0.0 {
                return None;
            }

            let relative_change = (current_price - past.price) / past.price;
            (relative_change <= -threshold).then(|| TriggeredWindow {
                name: window.name.clone(),
                past_price: past.price,
                relative_change,
            })
        })
        .collect()
}
