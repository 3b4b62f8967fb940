// Control service - Selection triple and streaming intent with optimistic updates
use crate::application::lock;
use crate::application::poller::PollingSource;
use crate::application::sentinel_api::SentinelApi;
use crate::domain::catalog::Catalog;
use crate::domain::dashboard::ControlSnapshot;
use crate::domain::selection::{ConfigPayload, Intent, MutationStatus, SelectionState};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct ControlState {
    selection: SelectionState,
    intent: Intent,
    intent_push: MutationStatus,
    config_push: MutationStatus,
    intent_generation: u64,
    config_generation: u64,
}

impl ControlState {
    fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            selection: self.selection.clone(),
            intent: self.intent,
            can_go_live: self.selection.is_complete(),
            intent_push: self.intent_push.clone(),
            config_push: self.config_push.clone(),
        }
    }
}

/// Changes apply locally at once and are pushed to the backend in the
/// background. A failed push is logged and reported through
/// `MutationStatus`; local state is never rolled back.
#[derive(Clone)]
pub struct ControlService {
    api: Arc<dyn SentinelApi>,
    catalog: PollingSource<Catalog>,
    state: Arc<Mutex<ControlState>>,
}

impl ControlService {
    pub fn new(api: Arc<dyn SentinelApi>, catalog: PollingSource<Catalog>) -> Self {
        Self {
            api,
            catalog,
            state: Arc::new(Mutex::new(ControlState::default())),
        }
    }

    pub fn select_channel(&self, id: &str) -> ControlSnapshot {
        self.select(|selection| selection.set_channel(id))
    }

    pub fn select_stream(&self, id: &str) -> ControlSnapshot {
        self.select(|selection| selection.set_stream(id))
    }

    pub fn select_variant(&self, id: &str) -> ControlSnapshot {
        self.select(|selection| selection.set_variant(id))
    }

    fn select(&self, update: impl FnOnce(&mut SelectionState)) -> ControlSnapshot {
        let catalog = self.catalog.snapshot();
        let mut state = lock(&self.state);
        update(&mut state.selection);

        if let Some((channel, stream, variant)) = state.selection.triple() {
            let device_id = catalog.device_for_channel(channel).map(|d| d.id.clone());
            if device_id.is_none() {
                let catalog_status = self.catalog.status();
                if catalog_status.last_success.is_none() {
                    tracing::warn!(
                        "Options catalog not loaded yet, pushing {} without a device id",
                        channel
                    );
                } else {
                    tracing::warn!(
                        "Channel {} is not in the catalog, pushing without a device id",
                        channel
                    );
                }
            }
            let payload = ConfigPayload {
                device_id,
                input_id: channel.to_string(),
                destination_id: stream.to_string(),
                preset_id: variant.to_string(),
            };
            state.config_generation += 1;
            state.config_push = MutationStatus::Pending;
            self.push_config(state.config_generation, payload);
        }

        state.snapshot()
    }

    pub fn is_complete(&self) -> bool {
        lock(&self.state).selection.is_complete()
    }

    /// Flip the intent. Callers only offer this once the selection is complete;
    /// the transition itself is unguarded.
    pub fn toggle_intent(&self) -> ControlSnapshot {
        let mut state = lock(&self.state);
        state.intent = state.intent.toggled();
        state.intent_generation += 1;
        state.intent_push = MutationStatus::Pending;
        tracing::info!("Intent set to {:?}", state.intent);
        self.push_intent(state.intent_generation, state.intent);
        state.snapshot()
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        lock(&self.state).snapshot()
    }

    fn push_intent(&self, generation: u64, action: Intent) {
        let api = self.api.clone();
        let state = self.state.clone();
        tokio::spawn(async move {
            let outcome = api.set_intent(action).await;
            let status = match outcome {
                Ok(()) => MutationStatus::Applied,
                Err(e) => {
                    tracing::error!("Failed to push intent {:?}: {}", action, e);
                    MutationStatus::Failed(e.to_string())
                }
            };
            let mut state = lock(&state);
            if state.intent_generation == generation {
                state.intent_push = status;
            }
        });
    }

    fn push_config(&self, generation: u64, payload: ConfigPayload) {
        let api = self.api.clone();
        let state = self.state.clone();
        tokio::spawn(async move {
            let outcome = api.set_configuration(&payload).await;
            let status = match outcome {
                Ok(()) => {
                    tracing::info!(
                        "Configuration pushed: {} -> {} ({})",
                        payload.input_id,
                        payload.destination_id,
                        payload.preset_id
                    );
                    MutationStatus::Applied
                }
                Err(e) => {
                    tracing::error!("Failed to push configuration: {}", e);
                    MutationStatus::Failed(e.to_string())
                }
            };
            let mut state = lock(&state);
            if state.config_generation == generation {
                state.config_push = status;
            }
        });
    }
}
