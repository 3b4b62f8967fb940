// Selection triple and streaming intent
use serde::{Deserialize, Serialize};

/// Input channel, destination stream and encoding variant picked by the operator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub channel_id: Option<String>,
    pub stream_id: Option<String>,
    pub variant_id: Option<String>,
}

impl SelectionState {
    pub fn set_channel(&mut self, id: impl Into<String>) {
        self.channel_id = Some(id.into());
    }

    pub fn set_stream(&mut self, id: impl Into<String>) {
        self.stream_id = Some(id.into());
    }

    pub fn set_variant(&mut self, id: impl Into<String>) {
        self.variant_id = Some(id.into());
    }

    pub fn is_complete(&self) -> bool {
        [&self.channel_id, &self.stream_id, &self.variant_id]
            .iter()
            .all(|field| field.as_deref().is_some_and(|id| !id.is_empty()))
    }

    /// The full triple, once every field is set
    pub fn triple(&self) -> Option<(&str, &str, &str)> {
        if !self.is_complete() {
            return None;
        }
        Some((
            self.channel_id.as_deref()?,
            self.stream_id.as_deref()?,
            self.variant_id.as_deref()?,
        ))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    AutoStream,
    #[default]
    Disabled,
    /// Reported by the backend only; local intent is always one of the two above
    #[serde(other)]
    Unknown,
}

impl Intent {
    pub fn toggled(self) -> Self {
        match self {
            Intent::AutoStream => Intent::Disabled,
            Intent::Disabled | Intent::Unknown => Intent::AutoStream,
        }
    }
}

/// Outcome of the most recent push of a locally applied change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Applied,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentPayload {
    pub action: Intent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPayload {
    pub device_id: Option<String>,
    pub input_id: String,
    pub destination_id: String,
    pub preset_id: String,
}
