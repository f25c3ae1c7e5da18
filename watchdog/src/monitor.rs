//! The monitor loop: one session, one repeating timer, one price source.
//!
//! Session and policy live behind a single async mutex, so ticks and
//! operator commands never interleave their mutations. A tick releases the
//! lock while it waits on the upstream fetch and while it delivers
//! messages; everything in between runs under the lock without awaiting.

use std::sync::{Arc, Weak};
use std::time::Duration;

use common::logger::{TraceId, tick_span};
use market::{History, PriceSource, Sample, UpstreamError};
use tokio::sync::Mutex;
use tracing::{Instrument, debug, error, info, warn};

use crate::alert::{AlertSink, Destination, Severity};
use crate::detector::{self, TriggeredWindow};
use crate::error::ValidationError;
use crate::messages;
use crate::policy::PolicyStore;
use crate::price_log::PriceLog;
use crate::session::{MonitorState, MonitoringSession};
use crate::timer::RepeatingTimer;

/// Successful ticks between two "still online" notifications.
pub const HEARTBEAT_EVERY_TICKS: u64 = 30;

/// Samples shown by `history` when no length is given.
pub const DEFAULT_HISTORY_MINUTES: u32 = 5;

#[derive(Clone, Debug)]
pub struct WatchdogOptions {
    /// Label used in notifications, e.g. `oXAUT`.
    pub asset: String,
    pub price_log: Option<PriceLog>,
    /// 0 disables the heartbeat.
    pub heartbeat_every: u64,
}

impl Default for WatchdogOptions {
    fn default() -> Self {
        Self {
            asset: "oXAUT".to_string(),
            price_log: None,
            heartbeat_every: HEARTBEAT_EVERY_TICKS,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StartOutcome {
    Started { price: f64 },
    AlreadyActive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotActive,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// Monitoring was stopped or restarted since this tick was armed.
    Stale,
    FetchFailed,
    Sampled {
        tick_count: u64,
        triggered: Vec<TriggeredWindow>,
        heartbeat: bool,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatusReport {
    pub state: MonitorState,
    pub last_price: Option<f64>,
    pub threshold: f64,
    pub interval_seconds: u64,
    pub active_windows: Vec<String>,
    pub samples: usize,
}

struct WatchState {
    session: MonitoringSession,
    policy: PolicyStore,
    timer: Option<RepeatingTimer>,
}

struct Inner<P, S> {
    source: P,
    sink: S,
    options: WatchdogOptions,
    state: Mutex<WatchState>,
}

/// Cheap-to-clone handle shared by the front end and the timer task.
pub struct Watchdog<P, S> {
    inner: Arc<Inner<P, S>>,
}

impl<P, S> Clone for Watchdog<P, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn history_capacity(policy: &PolicyStore) -> usize {
    let history_request = (DEFAULT_HISTORY_MINUTES as usize * 60).div_ceil(policy.interval_seconds() as usize);
    History::for_lookback(policy.max_steps().max(history_request)).capacity()
}

impl<P, S> Watchdog<P, S>
where
    P: PriceSource + 'static,
    S: AlertSink + 'static,
{
    pub fn new(source: P, sink: S, policy: PolicyStore, options: WatchdogOptions) -> Self {
        let session = MonitoringSession::new(history_capacity(&policy));

        Self {
            inner: Arc::new(Inner {
                source,
                sink,
                options,
                state: Mutex::new(WatchState {
                    session,
                    policy,
                    timer: None,
                }),
            }),
        }
    }

    pub fn asset(&self) -> &str {
        &self.inner.options.asset
    }

    /// Stopped → Running.
    ///
    /// Fetches a starting price first; if that fails the watchdog stays
    /// stopped and the error is returned. Starting twice is a no-op.
    pub async fn start(&self, destination: Destination) -> Result<StartOutcome, UpstreamError> {
        let mut st = self.inner.state.lock().await;
        if st.session.is_running() {
            return Ok(StartOutcome::AlreadyActive);
        }

        // held across the fetch so a concurrent start can't double-arm
        let price = self.inner.source.fetch_price().await?;

        let epoch = st.session.begin(price, destination.clone());
        let period = st.policy.interval();
        st.timer = Some(self.arm_timer(period, Duration::ZERO, epoch));

        info!(
            price,
            epoch,
            %destination,
            every_s = period.as_secs(),
            "monitoring started"
        );

        Ok(StartOutcome::Started { price })
    }

    /// Running → Stopped. History is kept until the next start.
    pub async fn stop(&self) -> StopOutcome {
        let mut st = self.inner.state.lock().await;
        if !st.session.end() {
            return StopOutcome::NotActive;
        }

        if let Some(timer) = st.timer.take() {
            timer.disarm();
        }

        info!(epoch = st.session.epoch(), "monitoring stopped");
        StopOutcome::Stopped
    }

    fn arm_timer(&self, period: Duration, first_after: Duration, epoch: u64) -> RepeatingTimer {
        let weak: Weak<Inner<P, S>> = Arc::downgrade(&self.inner);

        RepeatingTimer::arm(period, first_after, move || {
            let weak = weak.clone();
            async move {
                let Some(inner) = weak.upgrade() else {
                    return false;
                };
                let watchdog = Watchdog { inner };
                let outcome = watchdog.tick(epoch).await;
                outcome != TickOutcome::Stale
            }
        })
    }

    /// One sampling cycle for the session armed at `epoch`.
    ///
    /// Fetch failures are logged and skipped; delivery and price-log
    /// failures are logged and never stop the loop.
    pub async fn tick(&self, epoch: u64) -> TickOutcome {
        let trace_id = TraceId::new();
        let span = tick_span(&trace_id, epoch);
        self.tick_inner(epoch).instrument(span).await
    }

    async fn tick_inner(&self, epoch: u64) -> TickOutcome {
        if !self.inner.state.lock().await.session.accepts(epoch) {
            return TickOutcome::Stale;
        }

        let price = match self.inner.source.fetch_price().await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "price fetch failed, skipping tick");
                return TickOutcome::FetchFailed;
            }
        };
        tracing::Span::current().record("price", price);

        let sample = Sample::now(price);
        let asset = self.inner.options.asset.as_str();

        let (tick_count, triggered, heartbeat, outbox, destination) = {
            let mut st = self.inner.state.lock().await;
            if !st.session.accepts(epoch) {
                debug!("monitoring stopped while fetching, sample discarded");
                return TickOutcome::Stale;
            }

            let tick_count = st.session.record(sample);
            let triggered = detector::evaluate(st.session.history(), price, &st.policy);
            let every = self.inner.options.heartbeat_every;
            let heartbeat = every != 0 && tick_count % every == 0;

            let mut outbox = Vec::new();
            if !triggered.is_empty() {
                outbox.push((
                    messages::drop_alert(asset, &sample.at, price, &triggered),
                    Severity::Alert,
                ));
            }
            if heartbeat {
                outbox.push((messages::heartbeat(asset, price), Severity::Info));
            }

            (
                tick_count,
                triggered,
                heartbeat,
                outbox,
                st.session.destination().cloned(),
            )
        };

        info!(price, tick_count, triggered = triggered.len(), "price sampled");

        if let Some(log) = &self.inner.options.price_log {
            if let Err(e) = log.append(&sample).await {
                error!(error = %e, "price log append failed");
            }
        }

        if !triggered.is_empty() {
            let windows: Vec<&str> = triggered.iter().map(|t| t.name.as_str()).collect();
            warn!(?windows, price, "price drop detected");
        }

        if let Some(destination) = destination {
            for (text, severity) in outbox {
                self.deliver(&destination, &text, severity).await;
            }
        }

        TickOutcome::Sampled {
            tick_count,
            triggered,
            heartbeat,
        }
    }

    async fn deliver(&self, destination: &Destination, text: &str, severity: Severity) {
        if let Err(e) = self.inner.sink.deliver(destination, text, severity).await {
            error!(error = %e, %destination, ?severity, "message delivery failed");
        }
    }

    pub async fn status(&self) -> StatusReport {
        let st = self.inner.state.lock().await;

        StatusReport {
            state: st.session.state(),
            last_price: st.session.last_price(),
            threshold: st.policy.threshold(),
            interval_seconds: st.policy.interval_seconds(),
            active_windows: st.policy.active_windows().map(|w| w.name.clone()).collect(),
            samples: st.session.history().len(),
        }
    }

    /// Independent fetch. Leaves history, last price and the on/off state alone.
    pub async fn price_now(&self) -> Result<f64, UpstreamError> {
        self.inner.source.fetch_price().await
    }

    /// Most recent samples covering roughly `minutes` at the current interval,
    /// oldest first.
    pub async fn history(&self, minutes: u32) -> Vec<Sample> {
        let st = self.inner.state.lock().await;

        let interval = st.policy.interval_seconds();
        let seconds = u64::from(minutes) * 60;
        let steps = ((seconds + interval / 2) / interval) as usize;

        st.session.history().recent(steps).copied().collect()
    }

    pub async fn policy(&self) -> PolicyStore {
        self.inner.state.lock().await.policy.clone()
    }

    /// Returns the previous threshold.
    pub async fn set_threshold(&self, fraction: f64) -> Result<f64, ValidationError> {
        let mut st = self.inner.state.lock().await;
        let previous = st.policy.set_threshold(fraction)?;

        info!(previous, threshold = fraction, "drop threshold updated");
        Ok(previous)
    }

    /// Change the sampling period. A running timer is re-armed at the new
    /// period; history is kept.
    pub async fn set_interval(&self, seconds: u64) -> Result<u64, ValidationError> {
        let mut st = self.inner.state.lock().await;
        let previous = st.policy.set_interval(seconds)?;

        let capacity = history_capacity(&st.policy);
        st.session.resize_history(capacity);

        if st.session.is_running() {
            let period = st.policy.interval();
            let epoch = st.session.epoch();
            if let Some(old) = st.timer.take() {
                old.disarm();
            }
            st.timer = Some(self.arm_timer(period, period, epoch));
        }

        info!(previous, interval_s = seconds, "sampling interval updated");
        Ok(previous)
    }

    pub async fn set_window_enabled(&self, name: &str, enabled: bool) -> Result<(), ValidationError> {
        let mut st = self.inner.state.lock().await;
        st.policy.set_window_enabled(name, enabled)?;

        info!(window = name, enabled, "window toggled");
        Ok(())
    }

    pub async fn add_window(&self, name: &str, steps: usize) -> Result<(), ValidationError> {
        let mut st = self.inner.state.lock().await;
        st.policy.add_window(name, steps)?;

        let capacity = history_capacity(&st.policy);
        st.session.resize_history(capacity);

        info!(window = name, steps, capacity, "window added");
        Ok(())
    }

    /// Epoch of the current (or last) session; ticks armed for other epochs are stale.
    pub async fn epoch(&self) -> u64 {
        self.inner.state.lock().await.session.epoch()
    }
}
