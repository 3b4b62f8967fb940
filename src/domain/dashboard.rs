// Dashboard view model
use super::catalog::{Catalog, SignalStatus};
use super::selection::{Intent, MutationStatus, SelectionState};
use super::telemetry::{DeviceList, HealthData, SentinelState, StreamStats, StreamTelemetry};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Freshness of a polled channel
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelStatus {
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub fetches_issued: u64,
    /// Nothing received yet, or the latest fetch failed
    pub stale: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelView<T> {
    pub snapshot: T,
    pub status: ChannelStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlSnapshot {
    pub selection: SelectionState,
    pub intent: Intent,
    pub can_go_live: bool,
    pub intent_push: MutationStatus,
    pub config_push: MutationStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricSummary {
    pub name: String,
    pub latest: Option<f64>,
    pub samples: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub health: ChannelView<HealthData>,
    pub stats: ChannelView<StreamStats>,
    pub telemetry: ChannelView<StreamTelemetry>,
    pub devices: ChannelView<DeviceList>,
    pub catalog: ChannelView<Catalog>,
    pub state: ChannelView<SentinelState>,
    pub control: ControlSnapshot,
    pub metrics: Vec<MetricSummary>,
    pub widgets: Vec<Widget>,
}

/// A dashboard tile, carrying only what its kind displays
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Widget {
    SignalStatus {
        label: String,
        status: SignalStatus,
        format: Option<String>,
    },
    Bitrate {
        label: String,
        kbps: f64,
        badge: String,
    },
    Description {
        label: String,
        text: String,
    },
}

impl Widget {
    pub fn signal_tiles(devices: &DeviceList) -> Vec<Widget> {
        devices
            .devices
            .iter()
            .flat_map(|device| {
                device.inputs.iter().map(move |input| {
                    let port = if input.port.is_empty() { &input.id } else { &input.port };
                    Widget::SignalStatus {
                        label: format!("{} {}", device.name, port),
                        status: if input.signal_detected {
                            SignalStatus::Present
                        } else {
                            SignalStatus::NoSignal
                        },
                        format: input.format.clone(),
                    }
                })
            })
            .collect()
    }

    pub fn bitrate(label: &str, kbps: f64) -> Widget {
        Widget::Bitrate {
            label: label.to_string(),
            kbps,
            badge: bitrate_badge(kbps),
        }
    }

    pub fn uptime(seconds: f64) -> Widget {
        Widget::Description {
            label: "Stream uptime".to_string(),
            text: format_elapsed(seconds),
        }
    }

    /// Catalog signal state of the selected input channel
    pub fn selected_input(catalog: &Catalog, channel_id: &str) -> Option<Widget> {
        let (device, channel) = catalog.find_channel(channel_id)?;
        Some(Widget::SignalStatus {
            label: format!("Selected input: {} {}", device.name, channel.channel_number + 1),
            status: channel.signal_status,
            format: channel.format.clone(),
        })
    }

    pub fn destination_description(catalog: &Catalog, stream_id: &str) -> Option<Widget> {
        let (platform, stream) = catalog.find_stream(stream_id)?;
        let text = match &stream.description {
            Some(d) if !d.is_empty() => format!("{} / {}: {}", platform.name, stream.name, d),
            _ => format!("{} / {}", platform.name, stream.name),
        };
        Some(Widget::Description {
            label: "Destination".to_string(),
            text,
        })
    }

    /// Describes the selected encoding variant, if the catalog knows it
    pub fn variant_description(catalog: &Catalog, variant_id: &str) -> Option<Widget> {
        let (quality, variant) = catalog.find_variant(variant_id)?;
        let text = match &variant.description {
            Some(d) if !d.is_empty() => d.clone(),
            _ => format!("{} @ {}fps", bitrate_badge(variant.bitrate), variant.fps),
        };
        Some(Widget::Description {
            label: format!("{} {}", quality.name, variant.name),
            text,
        })
    }
}

/// Compact bitrate badge: "6.0M" from 6000 kbps, "800k" below one megabit
pub fn bitrate_badge(kbps: f64) -> String {
    if kbps >= 1000.0 {
        format!("{:.1}M", kbps / 1000.0)
    } else {
        format!("{:.0}k", kbps)
    }
}

/// HH:MM:SS
pub fn format_elapsed(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds as u64 } else { 0 };
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
