// Port to the sentinel backend
use crate::domain::catalog::Catalog;
use crate::domain::selection::{ConfigPayload, Intent};
use crate::domain::telemetry::{DeviceList, HealthData, SentinelState, StreamStats, StreamTelemetry};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("backend reported error: {0}")]
    Backend(String),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait SentinelApi: Send + Sync {
    async fn health(&self) -> Result<HealthData, ApiError>;

    async fn stream_stats(&self) -> Result<StreamStats, ApiError>;

    async fn stream_telemetry(&self) -> Result<StreamTelemetry, ApiError>;

    /// Capture hardware; a response carrying `error` is a failure
    async fn devices(&self) -> Result<DeviceList, ApiError>;

    /// Three-level input / destination / preset catalog
    async fn catalog(&self) -> Result<Catalog, ApiError>;

    async fn sentinel_state(&self) -> Result<SentinelState, ApiError>;

    async fn set_intent(&self, action: Intent) -> Result<(), ApiError>;

    async fn set_configuration(&self, config: &ConfigPayload) -> Result<(), ApiError>;
}
