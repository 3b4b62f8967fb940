use crate::application::poller::{DEFAULT_BUFFER_CAPACITY, PollSettings};
use crate::domain::sparkline::SparklineOptions;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub polling: PollingConfig,
    pub sparkline: SparklineOptions,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub listen: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout_ms: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            connect_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub buffer_capacity: usize,
    pub health: ChannelConfig,
    pub stats: ChannelConfig,
    pub telemetry: ChannelConfig,
    pub devices: ChannelConfig,
    pub options: ChannelConfig,
    pub state: ChannelConfig,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            health: ChannelConfig::every(2000),
            stats: ChannelConfig::every(2000),
            telemetry: ChannelConfig::every(1000),
            devices: ChannelConfig::every(5000),
            options: ChannelConfig::every(30_000),
            state: ChannelConfig::every(1000),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChannelConfig {
    pub interval_ms: u64,
    /// Defaults to twice the interval
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl ChannelConfig {
    pub fn every(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            timeout_ms: None,
        }
    }

    pub fn settings(&self, capacity: usize) -> PollSettings {
        let settings =
            PollSettings::new(Duration::from_millis(self.interval_ms)).with_capacity(capacity);
        match self.timeout_ms {
            Some(ms) => settings.with_timeout(Duration::from_millis(ms)),
            None => settings,
        }
    }
}

impl PollingConfig {
    fn channels(&self) -> [(&'static str, &ChannelConfig); 6] {
        [
            ("health", &self.health),
            ("stats", &self.stats),
            ("telemetry", &self.telemetry),
            ("devices", &self.devices),
            ("options", &self.options),
            ("state", &self.state),
        ]
    }
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, channel) in self.polling.channels() {
            if channel.interval_ms == 0 {
                anyhow::bail!("polling.{}.interval_ms must be greater than zero", name);
            }
            if channel.timeout_ms == Some(0) {
                anyhow::bail!("polling.{}.timeout_ms must be greater than zero", name);
            }
        }
        if self.polling.buffer_capacity < 2 {
            anyhow::bail!("polling.buffer_capacity must hold at least two samples");
        }
        Ok(())
    }
}

/// Defaults, then `config/dashboard.*` if present, then `DASHBOARD__*` environment variables
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}
