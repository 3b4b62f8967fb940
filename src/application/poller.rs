// Polling data source - fetch on an interval, keep the last good snapshot
use crate::application::lock;
use crate::application::sentinel_api::ApiError;
use crate::domain::dashboard::{ChannelStatus, ChannelView, MetricSummary};
use crate::domain::rolling_buffer::RollingBuffer;
use crate::domain::telemetry::Sampled;
use chrono::Utc;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_BUFFER_CAPACITY: usize = 30;

type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;
type Fetcher<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
    pub capacity: usize,
}

impl PollSettings {
    /// Timeout defaults to twice the interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timeout: interval * 2,
            capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

struct ChannelState<T> {
    snapshot: T,
    buffers: BTreeMap<&'static str, RollingBuffer>,
    status: ChannelStatus,
    /// Bumped on every activation and cancellation; fetches from an older epoch are ignored
    epoch: u64,
    next_seq: u64,
    applied_seq: u64,
}

/// One telemetry channel. Owns its snapshot and rolling buffers; clones share them.
pub struct PollingSource<T> {
    name: &'static str,
    settings: PollSettings,
    fetcher: Fetcher<T>,
    state: Arc<Mutex<ChannelState<T>>>,
}

impl<T> Clone for PollingSource<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            settings: self.settings,
            fetcher: self.fetcher.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T> PollingSource<T>
where
    T: Sampled + Default + Clone + Send + 'static,
{
    pub fn new<F, Fut>(name: &'static str, settings: PollSettings, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let initial = T::default();
        let buffers = initial
            .samples()
            .into_iter()
            .map(|(metric, _)| (metric, RollingBuffer::new(settings.capacity)))
            .collect();

        let fetcher: Fetcher<T> = Arc::new(move || Box::pin(fetch()) as FetchFuture<T>);

        Self {
            name,
            settings,
            fetcher,
            state: Arc::new(Mutex::new(ChannelState {
                snapshot: initial,
                buffers,
                status: ChannelStatus {
                    stale: true,
                    ..ChannelStatus::default()
                },
                epoch: 0,
                next_seq: 0,
                applied_seq: 0,
            })),
        }
    }

    /// Fetch now, then every interval, until the returned handle is cancelled or dropped.
    /// Activating again supersedes any earlier subscription.
    pub fn activate(&self) -> Subscription {
        let epoch = {
            let mut state = lock(&self.state);
            state.epoch += 1;
            state.epoch
        };

        tracing::info!(
            "Polling {} every {:?} (timeout {:?})",
            self.name,
            self.settings.interval,
            self.settings.timeout
        );

        let source = self.clone();
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(source.settings.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(seq) = source.begin_fetch(epoch) else {
                    break;
                };
                let source = source.clone();
                // Fetches are not coalesced; a slow response may overlap the next tick
                tokio::spawn(async move { source.run_fetch(epoch, seq).await });
            }
        });

        let state = self.state.clone();
        let name = self.name;
        Subscription {
            name,
            cancel: Some(Box::new(move || {
                let mut state = lock(&state);
                if state.epoch == epoch {
                    state.epoch += 1;
                }
                drop(state);
                ticker.abort();
                tracing::info!("Stopped polling {}", name);
            })),
        }
    }

    fn begin_fetch(&self, epoch: u64) -> Option<u64> {
        let mut state = lock(&self.state);
        if state.epoch != epoch {
            return None;
        }
        state.next_seq += 1;
        state.status.fetches_issued += 1;
        Some(state.next_seq)
    }

    async fn run_fetch(&self, epoch: u64, seq: u64) {
        let outcome = match tokio::time::timeout(self.settings.timeout, (self.fetcher)()).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(self.settings.timeout)),
        };

        let mut state = lock(&self.state);
        if state.epoch != epoch {
            tracing::debug!("Discarding {} response #{} after cancellation", self.name, seq);
            return;
        }

        // Applies to failures too: a late timeout must not mark a fresher snapshot stale
        if seq <= state.applied_seq {
            tracing::debug!(
                "Discarding out-of-order {} response #{} (have #{})",
                self.name,
                seq,
                state.applied_seq
            );
            return;
        }
        state.applied_seq = seq;

        match outcome {
            Ok(snapshot) => {
                let capacity = self.settings.capacity;
                for (metric, value) in snapshot.samples() {
                    if !value.is_finite() {
                        continue;
                    }
                    state
                        .buffers
                        .entry(metric)
                        .or_insert_with(|| RollingBuffer::new(capacity))
                        .push(value);
                }
                state.snapshot = snapshot;
                state.status.last_success = Some(Utc::now());
                state.status.last_error = None;
                state.status.consecutive_failures = 0;
                state.status.stale = false;
                tracing::debug!("Updated {} snapshot (#{})", self.name, seq);
            }
            Err(e) => {
                state.status.consecutive_failures += 1;
                state.status.last_error = Some(e.to_string());
                state.status.stale = true;
                tracing::warn!(
                    "Polling {} failed ({} in a row), keeping last snapshot: {}",
                    self.name,
                    state.status.consecutive_failures,
                    e
                );
            }
        }
    }

    pub fn snapshot(&self) -> T {
        lock(&self.state).snapshot.clone()
    }

    pub fn status(&self) -> ChannelStatus {
        lock(&self.state).status.clone()
    }

    pub fn view(&self) -> ChannelView<T> {
        let state = lock(&self.state);
        ChannelView {
            snapshot: state.snapshot.clone(),
            status: state.status.clone(),
        }
    }

    /// Samples for `metric`, oldest first; `None` if this source doesn't record it
    pub fn series(&self, metric: &str) -> Option<Vec<f64>> {
        lock(&self.state).buffers.get(metric).map(RollingBuffer::values)
    }

    pub fn has_metric(&self, metric: &str) -> bool {
        lock(&self.state).buffers.contains_key(metric)
    }

    pub fn metrics(&self) -> Vec<MetricSummary> {
        lock(&self.state)
            .buffers
            .iter()
            .map(|(name, buffer)| MetricSummary {
                name: name.to_string(),
                latest: buffer.latest(),
                samples: buffer.len(),
                capacity: buffer.capacity(),
            })
            .collect()
    }
}

/// Owned handle to an active polling schedule.
/// Cancelling is synchronous and idempotent; dropping the handle cancels too.
pub struct Subscription {
    name: &'static str,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::telemetry::HealthData;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use tokio::time::sleep;

    fn health(cpu: f64) -> HealthData {
        HealthData {
            cpu,
            ..HealthData::default()
        }
    }

    fn counting_source(
        interval_ms: u64,
        script: impl Fn(usize) -> Result<HealthData, ApiError> + Send + Sync + 'static,
    ) -> (PollingSource<HealthData>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let script = Arc::new(script);
        let settings = PollSettings::new(Duration::from_millis(interval_ms));
        let source = PollingSource::new("health", settings, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let script = script.clone();
            async move { script(n) }
        });
        (source, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_immediately_then_on_interval() {
        let (source, calls) = counting_source(1000, |n| Ok(health(n as f64)));
        let _subscription = source.activate();

        sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!source.status().stale);

        sleep(Duration::from_millis(1000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        sleep(Duration::from_millis(2000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(source.series("cpu").unwrap(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(source.status().fetches_issued, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_keep_last_snapshot() {
        let (source, _calls) = counting_source(1000, |n| {
            if n == 0 {
                Ok(health(42.0))
            } else {
                Err(ApiError::Status {
                    status: 503,
                    body: "unavailable".into(),
                })
            }
        });
        let _subscription = source.activate();

        sleep(Duration::from_millis(5010)).await;

        assert_eq!(source.snapshot(), health(42.0));
        assert_eq!(source.series("cpu").unwrap(), vec![42.0]);
        let status = source.status();
        assert_eq!(status.consecutive_failures, 5);
        assert!(status.stale);
        assert!(status.last_success.is_some());
        assert!(status.last_error.unwrap().contains("503"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_snapshot_before_any_success() {
        let (source, _calls) =
            counting_source(1000, |_| Err(ApiError::Transport("connection refused".into())));
        let _subscription = source.activate();

        sleep(Duration::from_millis(10)).await;
        assert_eq!(source.snapshot(), HealthData::default());
        assert!(source.status().stale);
        assert!(source.status().last_success.is_none());
        assert!(source.has_metric("cpu"));
        assert!(source.series("memory").unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_finite_samples_are_dropped() {
        // memory total is zero, so the memory percentage is NaN
        let (source, _calls) = counting_source(1000, |_| Ok(health(5.0)));
        let _subscription = source.activate();

        sleep(Duration::from_millis(10)).await;
        assert_eq!(source.series("cpu").unwrap(), vec![5.0]);
        assert!(source.series("memory").unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() {
        let (source, calls) = counting_source(1000, |n| Ok(health(n as f64)));
        let mut subscription = source.activate();

        sleep(Duration::from_millis(1500)).await;
        subscription.cancel();
        subscription.cancel();
        assert!(!subscription.is_active());
        let after_cancel = calls.load(Ordering::SeqCst);

        sleep(Duration::from_millis(5000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_cancel);
        assert_eq!(source.series("cpu").unwrap().len(), after_cancel);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_response_after_cancel_is_discarded() {
        let gate = Arc::new(Notify::new());
        let release = gate.clone();
        let settings = PollSettings::new(Duration::from_secs(10));
        let source = PollingSource::new("health", settings, move || {
            let gate = gate.clone();
            async move {
                gate.notified().await;
                Ok(health(99.0))
            }
        });

        let mut subscription = source.activate();
        sleep(Duration::from_millis(10)).await;
        subscription.cancel();

        release.notify_waiters();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(source.snapshot(), HealthData::default());
        assert!(source.status().last_success.is_none());
        assert!(source.series("cpu").unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_subscription_cancels() {
        let (source, calls) = counting_source(1000, |n| Ok(health(n as f64)));
        {
            let _subscription = source.activate();
            sleep(Duration::from_millis(10)).await;
        }
        sleep(Duration::from_millis(3000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_overlapping_response_is_discarded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let settings =
            PollSettings::new(Duration::from_millis(1000)).with_timeout(Duration::from_secs(5));
        let source = PollingSource::new("health", settings, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => {
                        sleep(Duration::from_millis(1500)).await;
                        Ok(health(1.0))
                    }
                    1 => Ok(health(2.0)),
                    _ => std::future::pending().await,
                }
            }
        });
        let _subscription = source.activate();

        sleep(Duration::from_millis(1600)).await;
        assert_eq!(source.snapshot(), health(2.0));
        assert_eq!(source.series("cpu").unwrap(), vec![2.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let source: PollingSource<HealthData> =
            PollingSource::new("health", PollSettings::new(Duration::from_millis(1000)), || async {
                std::future::pending().await
            });
        let _subscription = source.activate();

        sleep(Duration::from_millis(2010)).await;
        let status = source.status();
        assert_eq!(status.consecutive_failures, 1);
        assert!(status.last_error.unwrap().contains("no response"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_timeout_does_not_mark_fresh_snapshot_stale() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let settings = PollSettings::new(Duration::from_millis(1000))
            .with_timeout(Duration::from_millis(2500));
        let source = PollingSource::new("health", settings, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    std::future::pending().await
                } else {
                    Ok(health(n as f64))
                }
            }
        });
        let _subscription = source.activate();

        sleep(Duration::from_millis(2600)).await;
        let status = source.status();
        assert!(!status.stale);
        assert_eq!(status.consecutive_failures, 0);
        assert!(status.last_error.is_none());
        assert_eq!(source.snapshot(), health(2.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sources_are_independent() {
        let (healthy, _) = counting_source(1000, |n| Ok(health(n as f64)));
        let (failing, _) = counting_source(500, |_| Err(ApiError::Decode("expected value".into())));
        let _a = healthy.activate();
        let _b = failing.activate();

        sleep(Duration::from_millis(2010)).await;
        assert_eq!(healthy.status().consecutive_failures, 0);
        assert_eq!(healthy.series("cpu").unwrap(), vec![0.0, 1.0, 2.0]);
        assert_eq!(failing.status().consecutive_failures, 5);
    }
}
