use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tracing::info;

use super::entity::Entity;
use super::entity::StateChangedReceiver;
use super::entity::StateChangedSender;

/// The host's collection of registered entities, keyed by unique id.
///
/// Platform setup hands batches of entities in. Each entity is attached to
/// change notifications before it becomes visible to readers.
pub struct EntityCollection {
    entities: Mutex<BTreeMap<String, Box<dyn Entity>>>,
    state_tx: StateChangedSender,
}

impl EntityCollection {
    /// Create a collection and the receiving end of its change channel.
    pub fn new() -> (Self, StateChangedReceiver) {
        let (state_tx, state_rx) = mpsc::unbounded_channel();
        (
            Self {
                entities: Mutex::new(BTreeMap::new()),
                state_tx,
            },
            state_rx,
        )
    }

    /// Register a batch of entities with the host.
    ///
    /// Fails on a duplicate unique id; entities registered earlier in the
    /// batch stay registered. Registration failures are fatal to platform
    /// setup and surface unmodified.
    pub async fn add_entities(&self, batch: Vec<Box<dyn Entity>>) -> Result<(), HostError> {
        let mut entities = self.entities.lock().await;
        for mut entity in batch {
            let unique_id = entity.unique_id().to_string();
            if entities.contains_key(&unique_id) {
                return Err(HostError::DuplicateUniqueId(unique_id));
            }

            entity.attach(self.state_tx.clone());
            info!("Entity registered: {} ({})", unique_id, entity.name());
            entities.insert(unique_id, entity);
        }

        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.entities.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entities.lock().await.is_empty()
    }

    /// Unique ids of all registered entities, sorted.
    pub async fn unique_ids(&self) -> Vec<String> {
        self.entities.lock().await.keys().cloned().collect()
    }

    /// Platform tag and current reported state of one entity.
    pub async fn entity_state(&self, unique_id: &str) -> Option<(&'static str, serde_json::Value)> {
        let entities = self.entities.lock().await;
        entities
            .get(unique_id)
            .map(|entity| (entity.platform(), entity.state_json()))
    }

    /// Detach every entity from change notifications.
    pub async fn detach_all(&self) {
        let mut entities = self.entities.lock().await;
        for entity in entities.values_mut() {
            entity.detach();
        }
        info!("Detached {} entities", entities.len());
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("duplicate unique id: {0}")]
    DuplicateUniqueId(String),
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use super::*;
    use crate::host::DeviceInfo;
    use crate::host::Identifiable;
    use crate::host::Observable;

    struct StubEntity {
        unique_id: String,
        attached: Arc<AtomicBool>,
    }

    impl StubEntity {
        fn new(unique_id: &str) -> (Box<dyn Entity>, Arc<AtomicBool>) {
            let attached = Arc::new(AtomicBool::new(false));
            let entity = Box::new(Self {
                unique_id: unique_id.to_string(),
                attached: attached.clone(),
            });
            (entity, attached)
        }
    }

    impl Identifiable for StubEntity {
        fn unique_id(&self) -> &str {
            &self.unique_id
        }

        fn device_info(&self) -> DeviceInfo {
            DeviceInfo {
                identifiers: vec![("test".to_string(), "stub".to_string())],
                name: "stub".to_string(),
                manufacturer: None,
                model: None,
            }
        }
    }

    impl Observable for StubEntity {
        fn attach(&mut self, _notify: StateChangedSender) {
            self.attached.store(true, Ordering::SeqCst);
        }

        fn detach(&mut self) {
            self.attached.store(false, Ordering::SeqCst);
        }
    }

    impl Entity for StubEntity {
        fn name(&self) -> &str {
            "Stub"
        }

        fn state_json(&self) -> serde_json::Value {
            serde_json::json!({ "on": true })
        }

        fn platform(&self) -> &'static str {
            "binary_sensor"
        }
    }

    #[tokio::test]
    async fn test_register_attaches_entities() {
        let (collection, _state_rx) = EntityCollection::new();
        let (entity, attached) = StubEntity::new("stub_1");

        collection.add_entities(vec![entity]).await.unwrap();

        assert!(attached.load(Ordering::SeqCst));
        assert_eq!(collection.len().await, 1);
        assert_eq!(collection.unique_ids().await, vec!["stub_1".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_unique_id_rejected() {
        let (collection, _state_rx) = EntityCollection::new();
        let (first, _) = StubEntity::new("stub_1");
        let (second, _) = StubEntity::new("stub_1");

        collection.add_entities(vec![first]).await.unwrap();
        let result = collection.add_entities(vec![second]).await;

        assert!(matches!(
            result,
            Err(HostError::DuplicateUniqueId(id)) if id == "stub_1"
        ));
        assert_eq!(collection.len().await, 1);
    }

    #[tokio::test]
    async fn test_entity_state_lookup() {
        let (collection, _state_rx) = EntityCollection::new();
        let (entity, _) = StubEntity::new("stub_1");
        collection.add_entities(vec![entity]).await.unwrap();

        let (platform, state) = collection.entity_state("stub_1").await.unwrap();
        assert_eq!(platform, "binary_sensor");
        assert_eq!(state, serde_json::json!({ "on": true }));

        assert!(collection.entity_state("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_detach_all() {
        let (collection, _state_rx) = EntityCollection::new();
        let (entity, attached) = StubEntity::new("stub_1");
        collection.add_entities(vec![entity]).await.unwrap();
        assert!(attached.load(Ordering::SeqCst));

        collection.detach_all().await;
        assert!(!attached.load(Ordering::SeqCst));
    }
}
