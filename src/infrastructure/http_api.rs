// Sentinel backend client over HTTP/JSON
use crate::application::sentinel_api::{ApiError, SentinelApi};
use crate::domain::catalog::Catalog;
use crate::domain::selection::{ConfigPayload, Intent, IntentPayload};
use crate::domain::telemetry::{DeviceList, HealthData, SentinelState, StreamStats, StreamTelemetry};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const HEALTH_PATH: &str = "/api/health";
pub const STATS_PATH: &str = "/api/stats";
pub const TELEMETRY_PATH: &str = "/api/stream/telemetry";
pub const DEVICES_PATH: &str = "/api/decklink/devices";
pub const CATALOG_PATH: &str = "/api/sentinel/options/hierarchical";
pub const STATE_PATH: &str = "/api/sentinel/state";
pub const INTENT_PATH: &str = "/api/sentinel/intent";
pub const CONFIG_PATH: &str = "/api/sentinel/config";

#[derive(Debug, Clone)]
pub struct HttpSentinelApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSentinelApi {
    /// Per-request timeouts are applied by the pollers; only connecting is bounded here
    pub fn new(base_url: &str, connect_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let response = check_status(response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        decode(&body)
    }

    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status { status, body })
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// The device endpoint reports hardware problems in-band
fn device_list(list: DeviceList) -> Result<DeviceList, ApiError> {
    match list.error {
        Some(error) => Err(ApiError::Backend(error)),
        None => Ok(list),
    }
}

#[async_trait]
impl SentinelApi for HttpSentinelApi {
    async fn health(&self) -> Result<HealthData, ApiError> {
        self.get_json(HEALTH_PATH).await
    }

    async fn stream_stats(&self) -> Result<StreamStats, ApiError> {
        self.get_json(STATS_PATH).await
    }

    async fn stream_telemetry(&self) -> Result<StreamTelemetry, ApiError> {
        self.get_json(TELEMETRY_PATH).await
    }

    async fn devices(&self) -> Result<DeviceList, ApiError> {
        device_list(self.get_json(DEVICES_PATH).await?)
    }

    async fn catalog(&self) -> Result<Catalog, ApiError> {
        self.get_json(CATALOG_PATH).await
    }

    async fn sentinel_state(&self) -> Result<SentinelState, ApiError> {
        self.get_json(STATE_PATH).await
    }

    async fn set_intent(&self, action: Intent) -> Result<(), ApiError> {
        self.post_json(INTENT_PATH, &IntentPayload { action }).await
    }

    async fn set_configuration(&self, config: &ConfigPayload) -> Result<(), ApiError> {
        self.post_json(CONFIG_PATH, config).await
    }
}
