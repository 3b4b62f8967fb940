// Dashboard service - Owns the polling channels and composes the dashboard view
use crate::application::control_service::ControlService;
use crate::application::lock;
use crate::application::poller::{PollSettings, PollingSource, Subscription};
use crate::application::sentinel_api::{ApiError, SentinelApi};
use crate::domain::catalog::Catalog;
use crate::domain::dashboard::{DashboardView, Widget};
use crate::domain::sparkline::{self, SparklineGeometry, SparklineOptions};
use crate::domain::telemetry::{
    DeviceList, HealthData, Sampled, SentinelState, StreamStats, StreamTelemetry,
};
use crate::domain::viewport::{Viewport, ViewportTracker};
use crate::infrastructure::config::PollingConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DashboardError {
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
}

/// Per-request sparkline overrides; anything missing falls back to the
/// configured defaults and the metric's settled viewport
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SparklineRequest {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub color: Option<String>,
    pub grid: Option<bool>,
    pub threshold: Option<f64>,
}

fn channel<T, F, Fut>(
    api: &Arc<dyn SentinelApi>,
    name: &'static str,
    settings: PollSettings,
    fetch: F,
) -> PollingSource<T>
where
    T: Sampled + Default + Clone + Send + 'static,
    F: Fn(Arc<dyn SentinelApi>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    let api = api.clone();
    PollingSource::new(name, settings, move || fetch(api.clone()))
}

#[derive(Clone)]
pub struct DashboardService {
    health: PollingSource<HealthData>,
    stats: PollingSource<StreamStats>,
    telemetry: PollingSource<StreamTelemetry>,
    devices: PollingSource<DeviceList>,
    catalog: PollingSource<Catalog>,
    state: PollingSource<SentinelState>,
    control: ControlService,
    sparkline_defaults: SparklineOptions,
    viewports: Arc<Mutex<HashMap<String, ViewportTracker>>>,
    subscriptions: Arc<Mutex<Vec<Subscription>>>,
}

impl DashboardService {
    pub fn new(
        api: Arc<dyn SentinelApi>,
        polling: &PollingConfig,
        sparkline_defaults: SparklineOptions,
    ) -> Self {
        let capacity = polling.buffer_capacity;

        let health = channel(&api, "health", polling.health.settings(capacity), |api| async move {
            api.health().await
        });
        let stats = channel(&api, "stats", polling.stats.settings(capacity), |api| async move {
            api.stream_stats().await
        });
        let telemetry = channel(
            &api,
            "telemetry",
            polling.telemetry.settings(capacity),
            |api| async move { api.stream_telemetry().await },
        );
        let devices = channel(
            &api,
            "devices",
            polling.devices.settings(capacity),
            |api| async move { api.devices().await },
        );
        let catalog = channel(
            &api,
            "options",
            polling.options.settings(capacity),
            |api| async move { api.catalog().await },
        );
        let state = channel(&api, "state", polling.state.settings(capacity), |api| async move {
            api.sentinel_state().await
        });

        let control = ControlService::new(api, catalog.clone());

        Self {
            health,
            stats,
            telemetry,
            devices,
            catalog,
            state,
            control,
            sparkline_defaults,
            viewports: Arc::new(Mutex::new(HashMap::new())),
            subscriptions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Activate every channel. Calling this again restarts them.
    pub fn start(&self) {
        let subscriptions = vec![
            self.health.activate(),
            self.stats.activate(),
            self.telemetry.activate(),
            self.devices.activate(),
            self.catalog.activate(),
            self.state.activate(),
        ];
        let previous = std::mem::replace(&mut *lock(&self.subscriptions), subscriptions);
        drop(previous);
    }

    pub fn shutdown(&self) {
        let mut subscriptions = lock(&self.subscriptions);
        for subscription in subscriptions.iter_mut() {
            tracing::debug!("Cancelling {} subscription", subscription.name());
            subscription.cancel();
        }
        subscriptions.clear();
    }

    pub fn control(&self) -> &ControlService {
        &self.control
    }

    pub fn view(&self) -> DashboardView {
        let control = self.control.snapshot();
        let devices = self.devices.view();
        let stats = self.stats.view();
        let telemetry = self.telemetry.view();
        let catalog = self.catalog.view();

        let mut widgets = Widget::signal_tiles(&devices.snapshot);
        widgets.push(Widget::bitrate("Bitrate", stats.snapshot.bitrate));
        if telemetry.snapshot.is_streaming() {
            widgets.push(Widget::uptime(telemetry.snapshot.stream_duration));
        }
        if let Some(channel_id) = control.selection.channel_id.as_deref() {
            widgets.extend(Widget::selected_input(&catalog.snapshot, channel_id));
        }
        if let Some(stream_id) = control.selection.stream_id.as_deref() {
            widgets.extend(Widget::destination_description(&catalog.snapshot, stream_id));
        }
        if let Some(variant_id) = control.selection.variant_id.as_deref() {
            widgets.extend(Widget::variant_description(&catalog.snapshot, variant_id));
        }

        let mut metrics = self.health.metrics();
        metrics.extend(self.stats.metrics());
        metrics.extend(self.telemetry.metrics());

        DashboardView {
            health: self.health.view(),
            stats,
            telemetry,
            devices,
            catalog,
            state: self.state.view(),
            control,
            metrics,
            widgets,
        }
    }

    fn series(&self, metric: &str) -> Option<Vec<f64>> {
        self.health
            .series(metric)
            .or_else(|| self.stats.series(metric))
            .or_else(|| self.telemetry.series(metric))
    }

    fn has_metric(&self, metric: &str) -> bool {
        self.health.has_metric(metric)
            || self.stats.has_metric(metric)
            || self.telemetry.has_metric(metric)
    }

    /// Geometry for `metric`'s rolling window; `Ok(None)` until there are two samples
    pub fn sparkline(
        &self,
        metric: &str,
        request: &SparklineRequest,
    ) -> Result<Option<SparklineGeometry>, DashboardError> {
        let data = self
            .series(metric)
            .ok_or_else(|| DashboardError::UnknownMetric(metric.to_string()))?;

        let viewport = self.viewport(metric);
        let width = request.width.unwrap_or(viewport.width as f64);
        let height = request.height.unwrap_or(viewport.height as f64);

        let mut options = self.sparkline_defaults.clone();
        if let Some(color) = &request.color {
            options.color = color.clone();
        }
        if let Some(grid) = request.grid {
            options.show_grid = grid;
        }
        if let Some(threshold) = request.threshold.filter(|t| t.is_finite()) {
            options.show_threshold = true;
            options.threshold_value = threshold;
        }

        Ok(sparkline::render(&data, width, height, &options))
    }

    /// Feed a container resize for `metric` through the debounce window
    pub fn observe_viewport(
        &self,
        metric: &str,
        width: f64,
        height: f64,
    ) -> Result<(), DashboardError> {
        if !self.has_metric(metric) {
            return Err(DashboardError::UnknownMetric(metric.to_string()));
        }
        let now = tokio::time::Instant::now().into_std();
        lock(&self.viewports)
            .entry(metric.to_string())
            .or_default()
            .observe(width, height, now);
        Ok(())
    }

    fn viewport(&self, metric: &str) -> Viewport {
        let now = tokio::time::Instant::now().into_std();
        lock(&self.viewports)
            .get_mut(metric)
            .map(|tracker| tracker.settle(now))
            .unwrap_or_default()
    }
}
