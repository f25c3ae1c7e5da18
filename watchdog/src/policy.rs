//! Runtime alerting policy: drop threshold, sampling interval and the set
//! of look-back windows.
//!
//! Windows are measured in sampling steps, not wall-clock time, so a
//! window's duration scales with the configured interval.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_THRESHOLD: f64 = 0.25;
pub const DEFAULT_INTERVAL_SECONDS: u64 = 10;
pub const MAX_INTERVAL_SECONDS: u64 = 3_600;

/// Built-in windows in canonical evaluation order.
pub const DEFAULT_WINDOWS: [(&str, usize); 4] = [("10s", 1), ("30s", 3), ("1min", 6), ("5min", 30)];

/// A named look-back distance, expressed in sampling steps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub name: String,
    pub steps: usize,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Window {
    pub fn new(name: impl Into<String>, steps: usize) -> Self {
        Self {
            name: name.into(),
            steps,
            enabled: true,
        }
    }

    /// Built-in windows come first in their fixed order; custom ones follow
    /// by ascending step count, ties broken by name.
    fn canonical_key(&self) -> (usize, usize, &str) {
        let rank = DEFAULT_WINDOWS
            .iter()
            .position(|(name, _)| *name == self.name)
            .unwrap_or(DEFAULT_WINDOWS.len());
        (rank, self.steps, self.name.as_str())
    }

    /// Wall-clock span covered by this window at the given interval.
    pub fn span(&self, interval_seconds: u64) -> Duration {
        Duration::from_secs(self.steps as u64 * interval_seconds)
    }
}

/// Mutable runtime configuration read by the detector and the monitor loop.
///
/// Every setter validates first and leaves the store untouched on error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyStore {
    threshold: f64,
    interval_seconds: u64,
    windows: Vec<Window>,
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            windows: DEFAULT_WINDOWS
                .iter()
                .map(|(name, steps)| Window::new(*name, *steps))
                .collect(),
        }
    }
}

impl PolicyStore {
    pub fn new(
        threshold: f64,
        interval_seconds: u64,
        windows: Vec<Window>,
    ) -> Result<Self, ValidationError> {
        let mut policy = Self {
            threshold: DEFAULT_THRESHOLD,
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            windows: Vec::with_capacity(windows.len()),
        };

        policy.set_threshold(threshold)?;
        policy.set_interval(interval_seconds)?;
        for w in windows {
            let enabled = w.enabled;
            policy.add_window(w.name.clone(), w.steps)?;
            if !enabled {
                policy.set_window_enabled(&w.name, false)?;
            }
        }

        Ok(policy)
    }

    /// Re-run all checks, e.g. after deserializing from disk.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Self::new(self.threshold, self.interval_seconds, self.windows)
    }

    /// Drop fraction in `(0, 1]`.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn interval_seconds(&self) -> u64 {
        self.interval_seconds
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// All windows in canonical order.
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// Enabled windows in canonical order.
    pub fn active_windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.iter().filter(|w| w.enabled)
    }

    /// Longest look-back over every window, enabled or not, so toggling a
    /// window never needs a history resize.
    pub fn max_steps(&self) -> usize {
        self.windows.iter().map(|w| w.steps).max().unwrap_or(0)
    }

    /// Replace the threshold. Returns the previous value.
    pub fn set_threshold(&mut self, fraction: f64) -> Result<f64, ValidationError> {
        // written so that NaN is rejected too
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ValidationError::ThresholdOutOfRange {
                percent: fraction * 100.0,
            });
        }
        Ok(std::mem::replace(&mut self.threshold, fraction))
    }

    pub fn set_interval(&mut self, seconds: u64) -> Result<u64, ValidationError> {
        if !(1..=MAX_INTERVAL_SECONDS).contains(&seconds) {
            return Err(ValidationError::IntervalOutOfRange(seconds));
        }
        Ok(std::mem::replace(&mut self.interval_seconds, seconds))
    }

    pub fn set_window_enabled(&mut self, name: &str, enabled: bool) -> Result<(), ValidationError> {
        let window = self
            .windows
            .iter_mut()
            .find(|w| w.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ValidationError::UnknownWindow(name.to_string()))?;

        window.enabled = enabled;
        Ok(())
    }

    pub fn add_window(&mut self, name: impl Into<String>, steps: usize) -> Result<(), ValidationError> {
        let name = name.into();
        let name = name.trim();

        if name.is_empty() {
            return Err(ValidationError::EmptyWindowName);
        }
        if steps == 0 {
            return Err(ValidationError::InvalidSteps(steps));
        }
        if self.windows.iter().any(|w| w.name.eq_ignore_ascii_case(name)) {
            return Err(ValidationError::DuplicateWindow(name.to_string()));
        }

        self.windows.push(Window::new(name, steps));
        self.windows
            .sort_by(|a, b| a.canonical_key().cmp(&b.canonical_key()));
        Ok(())
    }
}

/// Compact human duration, e.g. `10s`, `1m`, `5m30s`, `2h`.
pub fn format_span(span: Duration) -> String {
    let secs = span.as_secs();
    let (h, m, s) = (secs / 3_600, (secs % 3_600) / 60, secs % 60);

    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{h}h"));
    }
    if m > 0 {
        out.push_str(&format!("{m}m"));
    }
    if s > 0 || out.is_empty() {
        out.push_str(&format!("{s}s"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(p: &PolicyStore) -> Vec<&str> {
        p.active_windows().map(|w| w.name.as_str()).collect()
    }

    #[test]
    fn defaults_match_ten_second_base() {
        let p = PolicyStore::default();

        assert_eq!(p.threshold(), 0.25);
        assert_eq!(p.interval_seconds(), 10);
        assert_eq!(names(&p), vec!["10s", "30s", "1min", "5min"]);
        assert_eq!(p.max_steps(), 30);
    }

    #[test]
    fn threshold_bounds_are_exclusive_zero_inclusive_one() {
        let mut p = PolicyStore::default();

        assert!(p.set_threshold(0.0).is_err());
        assert!(p.set_threshold(1.5).is_err());
        assert!(p.set_threshold(-0.1).is_err());
        assert!(p.set_threshold(f64::NAN).is_err());
        assert_eq!(p.threshold(), 0.25);

        assert_eq!(p.set_threshold(1.0), Ok(0.25));
        assert_eq!(p.set_threshold(0.2), Ok(1.0));
        assert_eq!(p.threshold(), 0.2);
    }

    #[test]
    fn rejected_threshold_reports_percent() {
        let mut p = PolicyStore::default();
        let err = p.set_threshold(1.5).unwrap_err();

        assert_eq!(err, ValidationError::ThresholdOutOfRange { percent: 150.0 });
    }

    #[test]
    fn interval_must_be_positive_and_bounded() {
        let mut p = PolicyStore::default();

        assert!(p.set_interval(0).is_err());
        assert!(p.set_interval(MAX_INTERVAL_SECONDS + 1).is_err());
        assert_eq!(p.interval_seconds(), 10);

        assert_eq!(p.set_interval(5), Ok(10));
        assert_eq!(p.interval(), Duration::from_secs(5));
    }

    #[test]
    fn custom_windows_follow_builtins_by_steps() {
        let mut p = PolicyStore::default();
        p.add_window("2s", 2).unwrap();
        p.add_window("15min", 90).unwrap();
        p.add_window("20s", 2).unwrap();

        assert_eq!(
            names(&p),
            vec!["10s", "30s", "1min", "5min", "20s", "2s", "15min"]
        );
        assert_eq!(p.max_steps(), 90);
    }

    #[test]
    fn add_window_validates() {
        let mut p = PolicyStore::default();

        assert_eq!(p.add_window("  ", 3), Err(ValidationError::EmptyWindowName));
        assert_eq!(p.add_window("x", 0), Err(ValidationError::InvalidSteps(0)));
        assert_eq!(
            p.add_window("5MIN", 12),
            Err(ValidationError::DuplicateWindow("5MIN".into()))
        );
        assert_eq!(p.windows().len(), 4);
    }

    #[test]
    fn disabling_hides_window_but_keeps_capacity() {
        let mut p = PolicyStore::default();
        p.set_window_enabled("5min", false).unwrap();

        assert_eq!(names(&p), vec!["10s", "30s", "1min"]);
        assert_eq!(p.max_steps(), 30);

        assert_eq!(
            p.set_window_enabled("2h", false),
            Err(ValidationError::UnknownWindow("2h".into()))
        );
    }

    #[test]
    fn serde_round_trip_keeps_disabled_flag() {
        let mut p = PolicyStore::default();
        p.set_window_enabled("30s", false).unwrap();

        let json = serde_json::to_string(&p).unwrap();
        let back: PolicyStore = serde_json::from_str(&json).unwrap();

        assert_eq!(back.validated().unwrap(), p);
    }

    #[test]
    fn validated_rejects_bad_file_values() {
        let json = r#"{"threshold": 0.0, "interval_seconds": 10, "windows": []}"#;
        let p: PolicyStore = serde_json::from_str(json).unwrap();

        assert!(p.validated().is_err());
    }

    #[test]
    fn spans_scale_with_interval() {
        let w = Window::new("5min", 30);

        assert_eq!(format_span(w.span(10)), "5m");
        assert_eq!(format_span(w.span(11)), "5m30s");
        assert_eq!(format_span(Window::new("x", 400).span(10)), "1h6m40s");
        assert_eq!(format_span(Duration::ZERO), "0s");
    }
}
