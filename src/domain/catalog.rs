// Three-level option catalog: inputs, destinations and encoding presets
use super::telemetry::Sampled;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub inputs: BTreeMap<String, InputDevice>,
    pub destinations: BTreeMap<String, DestinationPlatform>,
    pub presets: BTreeMap<String, PresetQuality>,
}

impl Sampled for Catalog {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputDevice {
    pub id: String,
    pub name: String,
    pub channels: Vec<InputChannel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InputChannel {
    pub id: String,
    pub channel_number: u32,
    pub signal_status: SignalStatus,
    pub format: Option<String>,
    pub selectable: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    Present,
    #[default]
    #[serde(rename = "none")]
    NoSignal,
    Waiting,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationPlatform {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub streams: Vec<DestinationStream>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationStream {
    pub id: String,
    pub name: String,
    pub key: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetQuality {
    pub id: String,
    pub name: String,
    pub resolution: Option<String>,
    pub variants: Vec<PresetVariant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetVariant {
    pub id: String,
    pub name: String,
    /// kbps
    pub bitrate: f64,
    pub fps: f64,
    pub description: Option<String>,
}

impl Catalog {
    /// The input device that owns `channel_id`, keyed as in the catalog
    pub fn device_for_channel(&self, channel_id: &str) -> Option<&InputDevice> {
        self.find_channel(channel_id).map(|(device, _)| device)
    }

    pub fn find_channel(&self, channel_id: &str) -> Option<(&InputDevice, &InputChannel)> {
        self.inputs.values().find_map(|device| {
            device
                .channels
                .iter()
                .find(|c| c.id == channel_id)
                .map(|c| (device, c))
        })
    }

    pub fn find_stream(
        &self,
        stream_id: &str,
    ) -> Option<(&DestinationPlatform, &DestinationStream)> {
        self.destinations.values().find_map(|platform| {
            platform
                .streams
                .iter()
                .find(|s| s.id == stream_id)
                .map(|s| (platform, s))
        })
    }

    pub fn find_variant(&self, variant_id: &str) -> Option<(&PresetQuality, &PresetVariant)> {
        self.presets.values().find_map(|quality| {
            quality
                .variants
                .iter()
                .find(|v| v.id == variant_id)
                .map(|v| (quality, v))
        })
    }
}
