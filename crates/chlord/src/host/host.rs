use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::collection::EntityCollection;
use super::entity::StateChangedReceiver;
use super::state::BinarySensorState;
use super::state::HostState;

/// The host side of the entity model.
///
/// Owns the entity collection and a serializable view of entity state. The
/// view is updated by draining change notifications in [`run`](Host::run);
/// readers (the HTTP API) load it without touching the entities.
pub struct Host {
    collection: Arc<EntityCollection>,

    /// Latest state view (readers load the Arc, the run loop stores a new one)
    state: ArcSwap<HostState>,

    /// Receive change notifications from entities
    state_rx: Mutex<StateChangedReceiver>,
}

impl Host {
    pub fn new() -> Self {
        let (collection, state_rx) = EntityCollection::new();
        Self {
            collection: Arc::new(collection),
            state: ArcSwap::new(Arc::default()),
            state_rx: Mutex::new(state_rx),
        }
    }

    pub fn collection(&self) -> &Arc<EntityCollection> {
        &self.collection
    }

    /// Get the current state view.
    ///
    /// Clones the `Arc` (atomic refcount bump), essentially free.
    pub fn state(&self) -> Arc<HostState> {
        self.state.load_full()
    }

    /// Run the host's notification loop.
    ///
    /// Re-reads each changed entity's state and folds it into the state
    /// view. Returns once every sender is gone.
    pub async fn run(&self) {
        info!("Host loop starting");

        let mut rx = self.state_rx.lock().await;
        while let Some(unique_id) = rx.recv().await {
            self.handle_state_changed(&unique_id).await;
        }

        info!("Host loop shutting down");
    }

    async fn handle_state_changed(&self, unique_id: &str) {
        let Some((platform, state_json)) = self.collection.entity_state(unique_id).await else {
            warn!("State change from unregistered entity: {}", unique_id);
            return;
        };

        match platform {
            "binary_sensor" => {
                let sensor_state: BinarySensorState = match serde_json::from_value(state_json) {
                    Ok(state) => state,
                    Err(e) => {
                        warn!("Entity {} reported malformed state: {}", unique_id, e);
                        return;
                    }
                };

                debug!(
                    "Binary sensor state changed: {} -> on={:?}",
                    unique_id, sensor_state.on
                );

                {
                    let mut state = HostState::clone(&self.state.load());
                    state
                        .binary_sensors
                        .insert(unique_id.to_string(), sensor_state);
                    self.state.store(Arc::new(state));
                }
            }
            other => {
                debug!("Ignoring state change for unsupported platform: {}", other);
            }
        }
    }

    /// Detach every entity from change notifications.
    pub async fn shutdown(&self) {
        self.collection.detach_all().await;
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}
