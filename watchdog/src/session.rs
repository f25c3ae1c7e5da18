use market::{History, Sample};

use crate::alert::Destination;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
}

/// The single monitoring session of the process.
///
/// `epoch` is bumped on every start so a tick that was in flight across a
/// stop/start can tell it belongs to an older session.
#[derive(Debug)]
pub struct MonitoringSession {
    state: MonitorState,
    history: History,
    last_price: Option<f64>,
    tick_count: u64,
    epoch: u64,
    destination: Option<Destination>,
}

impl MonitoringSession {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            state: MonitorState::Stopped,
            history: History::with_capacity(history_capacity),
            last_price: None,
            tick_count: 0,
            epoch: 0,
            destination: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == MonitorState::Running
    }

    /// True when a tick armed for `epoch` may still mutate this session.
    pub fn accepts(&self, epoch: u64) -> bool {
        self.is_running() && self.epoch == epoch
    }

    /// Stopped → Running. Clears history and the tick counter, returns the new epoch.
    pub fn begin(&mut self, price: f64, destination: Destination) -> u64 {
        self.history.clear();
        self.tick_count = 0;
        self.last_price = Some(price);
        self.destination = Some(destination);
        self.epoch += 1;
        self.state = MonitorState::Running;
        self.epoch
    }

    /// Running → Stopped. History is kept but goes stale. Returns false if already stopped.
    pub fn end(&mut self) -> bool {
        let was_running = self.is_running();
        self.state = MonitorState::Stopped;
        was_running
    }

    /// Record one successful tick. Returns the updated tick count.
    pub fn record(&mut self, sample: Sample) -> u64 {
        self.last_price = Some(sample.price);
        self.history.append(sample);
        self.tick_count += 1;
        self.tick_count
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn resize_history(&mut self, capacity: usize) {
        self.history.set_capacity(capacity);
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_resets_history_and_counter() {
        let mut s = MonitoringSession::new(8);
        let first = s.begin(100.0, Destination::new("chat"));
        s.record(Sample::now(100.0));
        s.record(Sample::now(90.0));
        assert_eq!(s.tick_count(), 2);

        s.end();
        assert_eq!(s.history().len(), 2);

        let second = s.begin(95.0, Destination::new("chat"));
        assert!(s.history().is_empty());
        assert_eq!(s.tick_count(), 0);
        assert_eq!(s.last_price(), Some(95.0));
        assert_ne!(first, second);
    }

    #[test]
    fn stale_epochs_are_not_accepted() {
        let mut s = MonitoringSession::new(8);
        assert!(!s.accepts(0));

        let e1 = s.begin(1.0, Destination::new("a"));
        assert!(s.accepts(e1));

        s.end();
        assert!(!s.accepts(e1));

        let e2 = s.begin(1.0, Destination::new("a"));
        assert!(!s.accepts(e1));
        assert!(s.accepts(e2));
    }

    #[test]
    fn end_reports_whether_it_was_running() {
        let mut s = MonitoringSession::new(4);
        assert!(!s.end());

        s.begin(1.0, Destination::new("a"));
        assert!(s.end());
        assert_eq!(s.state(), MonitorState::Stopped);
    }
}
