// In-memory backend for service and handler tests
use crate::application::sentinel_api::{ApiError, SentinelApi};
use crate::domain::catalog::Catalog;
use crate::domain::selection::{ConfigPayload, Intent};
use crate::domain::telemetry::{DeviceList, HealthData, SentinelState, StreamStats, StreamTelemetry};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Intent(Intent),
    Config(ConfigPayload),
}

pub(crate) struct FakeApi {
    pub health: Mutex<HealthData>,
    pub stats: Mutex<StreamStats>,
    pub devices: Mutex<DeviceList>,
    pub catalog: Mutex<Catalog>,
    pub fail_reads: AtomicBool,
    pub fail_pushes: AtomicBool,
    calls: mpsc::UnboundedSender<Call>,
}

impl FakeApi {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Call>) {
        let (calls, rx) = mpsc::unbounded_channel();
        let api = Self {
            health: Mutex::new(HealthData::default()),
            stats: Mutex::new(StreamStats::default()),
            devices: Mutex::new(DeviceList::default()),
            catalog: Mutex::new(Catalog::default()),
            fail_reads: AtomicBool::new(false),
            fail_pushes: AtomicBool::new(false),
            calls,
        };
        (api, rx)
    }

    fn read<T: Clone>(&self, value: &Mutex<T>) -> Result<T, ApiError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("connection refused".into()));
        }
        Ok(crate::application::lock(value).clone())
    }

    fn push(&self, call: Call) -> Result<(), ApiError> {
        let _ = self.calls.send(call);
        if self.fail_pushes.load(Ordering::SeqCst) {
            Err(ApiError::Status {
                status: 500,
                body: "internal error".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SentinelApi for FakeApi {
    async fn health(&self) -> Result<HealthData, ApiError> {
        self.read(&self.health)
    }

    async fn stream_stats(&self) -> Result<StreamStats, ApiError> {
        self.read(&self.stats)
    }

    async fn stream_telemetry(&self) -> Result<StreamTelemetry, ApiError> {
        self.read(&Mutex::new(StreamTelemetry::default()))
    }

    async fn devices(&self) -> Result<DeviceList, ApiError> {
        self.read(&self.devices)
    }

    async fn catalog(&self) -> Result<Catalog, ApiError> {
        self.read(&self.catalog)
    }

    async fn sentinel_state(&self) -> Result<SentinelState, ApiError> {
        self.read(&Mutex::new(SentinelState::default()))
    }

    async fn set_intent(&self, action: Intent) -> Result<(), ApiError> {
        self.push(Call::Intent(action))
    }

    async fn set_configuration(&self, config: &ConfigPayload) -> Result<(), ApiError> {
        self.push(Call::Config(config.clone()))
    }
}
