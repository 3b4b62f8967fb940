// Telemetry snapshots reported by the sentinel backend
//
// Every field falls back to its initial value when the backend omits it, so a
// partial response still yields a usable snapshot.
use super::selection::Intent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Numeric series a snapshot contributes to its source's rolling buffers
pub trait Sampled {
    fn samples(&self) -> Vec<(&'static str, f64)> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthData {
    pub cpu: f64,
    pub gpu: f64,
    pub temperature: f64,
    pub memory: MemoryUsage,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryUsage {
    pub used: f64,
    pub total: f64,
}

impl HealthData {
    /// Used memory as a percentage; NaN until the total is known
    pub fn memory_percent(&self) -> f64 {
        if self.memory.total > 0.0 {
            self.memory.used / self.memory.total * 100.0
        } else {
            f64::NAN
        }
    }
}

impl Sampled for HealthData {
    fn samples(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("cpu", self.cpu),
            ("gpu", self.gpu),
            ("temperature", self.temperature),
            ("memory", self.memory_percent()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StreamStats {
    pub bitrate: f64,
    pub fps: f64,
    pub dropped_frames: u64,
    pub network: NetworkStats,
    pub encoding: EncodingHealth,
    pub youtube_ingest: IngestQuality,
    pub timestamp: i64,
}

impl Default for StreamStats {
    fn default() -> Self {
        Self {
            bitrate: 0.0,
            fps: 0.0,
            dropped_frames: 0,
            network: NetworkStats::default(),
            encoding: EncodingHealth::default(),
            youtube_ingest: IngestQuality::Good,
            timestamp: 0,
        }
    }
}

impl Sampled for StreamStats {
    fn samples(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("bitrate", self.bitrate),
            ("fps", self.fps),
            ("dropped_frames", self.dropped_frames as f64),
            ("upload", self.network.upload),
            ("rtt", self.network.rtt),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkStats {
    pub upload: f64,
    pub rtt: f64,
    pub drops: f64,
    /// Mbps
    pub interface_speed: f64,
}

impl Default for NetworkStats {
    fn default() -> Self {
        Self {
            upload: 0.0,
            rtt: 0.0,
            drops: 0.0,
            interface_speed: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EncodingHealth {
    pub keyframes: KeyframeState,
    pub gop: String,
    /// ms
    pub audio_sync: f64,
    pub codec_health: CodecHealth,
}

impl Default for EncodingHealth {
    fn default() -> Self {
        Self {
            keyframes: KeyframeState::Stable,
            gop: "2.0s".to_string(),
            audio_sync: 0.0,
            codec_health: CodecHealth::Nominal,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyframeState {
    #[default]
    Stable,
    Unstable,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecHealth {
    #[default]
    Nominal,
    Warning,
    Critical,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestQuality {
    Excellent,
    #[default]
    Good,
    Poor,
    Unstable,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamTelemetry {
    pub bitrate: f64,
    pub fps: f64,
    pub dropped_frames: u64,
    pub processed_frames: u64,
    pub encoding_load: f64,
    pub network_health: String,
    /// Seconds since the stream started
    pub stream_duration: f64,
    pub keyframe_interval: String,
}

impl StreamTelemetry {
    pub fn is_streaming(&self) -> bool {
        self.processed_frames > 0
    }
}

impl Sampled for StreamTelemetry {
    fn samples(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("stream_bitrate", self.bitrate),
            ("stream_fps", self.fps),
            ("encoding_load", self.encoding_load),
            ("stream_dropped", self.dropped_frames as f64),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceList {
    pub devices: Vec<DecklinkDevice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Sampled for DeviceList {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecklinkDevice {
    pub id: String,
    pub device_number: u32,
    pub name: String,
    pub inputs: Vec<DecklinkInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecklinkInput {
    pub id: String,
    pub port: String,
    pub device_number: u32,
    pub signal_detected: bool,
    pub format: Option<String>,
    pub active: bool,
}

/// Aggregated backend state polled from `/api/sentinel/state`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelState {
    pub intent: Intent,
    pub system_status: String,
    pub hardware: BTreeMap<String, HardwareDevice>,
    pub settings: BackendSettings,
}

impl Sampled for SentinelState {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareDevice {
    pub name: String,
    pub device_number: u32,
    pub inputs: Vec<DecklinkInput>,
}

/// Configuration as last persisted by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub selected_device_id: Option<u32>,
    pub selected_input_id: Option<String>,
    pub selected_destination_id: Option<String>,
    pub selected_preset_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_stats_take_initial_values() {
        let stats: StreamStats =
            serde_json::from_str(r#"{"bitrate": 4500.5, "network": {"rtt": 42}}"#).unwrap();
        assert_eq!(stats.bitrate, 4500.5);
        assert_eq!(stats.network.rtt, 42.0);
        assert_eq!(stats.network.interface_speed, 1000.0);
        assert_eq!(stats.encoding.gop, "2.0s");
        assert_eq!(stats.youtube_ingest, IngestQuality::Good);
    }

    #[test]
    fn test_stats_camel_case_fields() {
        let stats: StreamStats = serde_json::from_str(
            r#"{"droppedFrames": 3, "youtubeIngest": "poor",
                "encoding": {"codecHealth": "warning", "audioSync": 12.5,
                             "keyframes": "jittery"}}"#,
        )
        .unwrap();
        assert_eq!(stats.dropped_frames, 3);
        assert_eq!(stats.youtube_ingest, IngestQuality::Poor);
        assert_eq!(stats.encoding.codec_health, CodecHealth::Warning);
        assert_eq!(stats.encoding.keyframes, KeyframeState::Unknown);
    }

    #[test]
    fn test_health_samples() {
        let health: HealthData = serde_json::from_str(
            r#"{"cpu": 12.5, "gpu": 3, "memory": {"used": 4, "total": 16}}"#,
        )
        .unwrap();
        let samples = health.samples();
        assert_eq!(samples[0], ("cpu", 12.5));
        assert_eq!(samples[3], ("memory", 25.0));

        assert!(HealthData::default().memory_percent().is_nan());
    }

    #[test]
    fn test_sentinel_state_shape() {
        let state: SentinelState = serde_json::from_str(
            r#"{"intent": "AUTO_STREAM", "system_status": "Streaming Live",
                "hardware": {"dl0": {"name": "DeckLink Duo", "device_number": 0,
                    "inputs": [{"id": "dl0-in1", "signal_detected": true}]}},
                "settings": {"selected_device_id": 0, "selected_preset_id": "hd_high"}}"#,
        )
        .unwrap();
        assert_eq!(state.intent, Intent::AutoStream);
        assert_eq!(state.hardware["dl0"].inputs[0].id, "dl0-in1");
        assert_eq!(state.settings.selected_device_id, Some(0));
        assert_eq!(state.settings.selected_input_id, None);
    }

    #[test]
    fn test_telemetry_streaming_flag() {
        let telemetry: StreamTelemetry =
            serde_json::from_str(r#"{"processed_frames": 120, "fps": 60}"#).unwrap();
        assert!(telemetry.is_streaming());
        assert!(!StreamTelemetry::default().is_streaming());
    }
}
