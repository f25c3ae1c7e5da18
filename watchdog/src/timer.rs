use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// A cancellable repeating timer backed by a tokio task.
///
/// The handler returns `false` to stop the timer from the inside. Dropping
/// or disarming the timer aborts the task, including a tick in progress.
#[derive(Debug)]
pub struct RepeatingTimer {
    handle: JoinHandle<()>,
}

impl RepeatingTimer {
    /// Fire `on_tick` after `first_after`, then every `period`. `period` must be non-zero.
    pub fn arm<F, Fut>(period: Duration, first_after: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + first_after, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if !on_tick().await {
                    break;
                }
            }
        });

        Self { handle }
    }

    pub fn is_armed(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn disarm(self) {
        self.handle.abort();
    }
}

impl Drop for RepeatingTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
