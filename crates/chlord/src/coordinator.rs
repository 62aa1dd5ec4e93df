//! Chlorinator data-update coordinator surface.
//!
//! The transport that talks to the physical controller is not part of this
//! crate; whatever owns it installs fresh state with [`Coordinator::apply`].
//! Everything else holds an `Arc<Coordinator>` and reads.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Weak;

use arc_swap::ArcSwap;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

/// Latest cached view of the chlorinator's state, keyed by sensor key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChlorinatorSnapshot {
    values: HashMap<String, bool>,
}

impl ChlorinatorSnapshot {
    /// Look up a sensor key.
    ///
    /// Absence is a valid transient condition (no refresh has completed
    /// yet), so this returns `None` rather than failing.
    pub fn get(&self, key: &str) -> Option<bool> {
        self.values.get(key).copied()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: bool) {
        self.values.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for ChlorinatorSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

type Listener = Box<dyn Fn() + Send + Sync>;
type ListenerTable = Mutex<HashMap<u64, Listener>>;

/// Holds the latest snapshot and pushes change notifications.
///
/// Readers load the current snapshot with an atomic `Arc` clone; the single
/// writer swaps in a new one with [`apply`](Coordinator::apply) and then
/// runs every listener callback. Callbacks run on the writer's thread with
/// the listener table locked: they must be cheap and must not subscribe or
/// unsubscribe from inside the callback.
pub struct Coordinator {
    snapshot: ArcSwap<ChlorinatorSnapshot>,
    listeners: Arc<ListenerTable>,
    next_listener_id: AtomicU64,
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::new(Arc::default()),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener_id: AtomicU64::new(0),
        }
    }

    /// Get the current snapshot.
    ///
    /// Clones the `Arc` (atomic refcount bump), essentially free.
    pub fn snapshot(&self) -> Arc<ChlorinatorSnapshot> {
        self.snapshot.load_full()
    }

    /// Install a new snapshot and notify every subscriber.
    pub fn apply(&self, snapshot: ChlorinatorSnapshot) {
        debug!("Applying snapshot with {} sensor values", snapshot.len());
        self.snapshot.store(Arc::new(snapshot));

        if let Ok(listeners) = self.listeners.lock() {
            for listener in listeners.values() {
                listener();
            }
        }
    }

    /// Register `callback` to run after every snapshot update.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped.
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.insert(id, Box::new(callback));
        }

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped registration of a coordinator listener.
///
/// Dropping the subscription unregisters the listener. A subscription may
/// outlive its coordinator; unregistering then becomes a no-op.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerTable>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            if let Ok(mut listeners) = listeners.lock() {
                listeners.remove(&self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn test_snapshot_get_absent_returns_none() {
        let snapshot = ChlorinatorSnapshot::default();
        assert_eq!(snapshot.get("pump_is_operating"), None);
    }

    #[test]
    fn test_snapshot_get_present() {
        let snapshot: ChlorinatorSnapshot =
            [("pump_is_operating", true), ("cell_is_operating", false)]
                .into_iter()
                .collect();

        assert_eq!(snapshot.get("pump_is_operating"), Some(true));
        assert_eq!(snapshot.get("cell_is_operating"), Some(false));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_apply_replaces_snapshot() {
        let coordinator = Coordinator::new();
        assert!(coordinator.snapshot().is_empty());

        coordinator.apply([("pump_is_operating", true)].into_iter().collect());
        assert_eq!(coordinator.snapshot().get("pump_is_operating"), Some(true));

        // A later snapshot fully replaces the earlier one.
        coordinator.apply([("cell_is_operating", false)].into_iter().collect());
        assert_eq!(coordinator.snapshot().get("pump_is_operating"), None);
        assert_eq!(coordinator.snapshot().get("cell_is_operating"), Some(false));
    }

    #[test]
    fn test_subscriber_notified_on_apply() {
        let coordinator = Coordinator::new();
        let notified = Arc::new(AtomicUsize::new(0));

        let _subscription = {
            let notified = notified.clone();
            coordinator.subscribe(move || {
                notified.fetch_add(1, Ordering::SeqCst);
            })
        };

        coordinator.apply(ChlorinatorSnapshot::default());
        coordinator.apply(ChlorinatorSnapshot::default());
        assert_eq!(notified.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscription_drop_unregisters() {
        let coordinator = Coordinator::new();
        let notified = Arc::new(AtomicUsize::new(0));

        let subscription = {
            let notified = notified.clone();
            coordinator.subscribe(move || {
                notified.fetch_add(1, Ordering::SeqCst);
            })
        };
        assert_eq!(coordinator.listener_count(), 1);

        drop(subscription);
        assert_eq!(coordinator.listener_count(), 0);

        coordinator.apply(ChlorinatorSnapshot::default());
        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscription_outlives_coordinator() {
        let coordinator = Coordinator::new();
        let subscription = coordinator.subscribe(|| {});

        drop(coordinator);
        drop(subscription);
    }

    #[test]
    fn test_independent_subscriptions() {
        let coordinator = Coordinator::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let first_subscription = {
            let first = first.clone();
            coordinator.subscribe(move || {
                first.fetch_add(1, Ordering::SeqCst);
            })
        };
        let _second_subscription = {
            let second = second.clone();
            coordinator.subscribe(move || {
                second.fetch_add(1, Ordering::SeqCst);
            })
        };

        coordinator.apply(ChlorinatorSnapshot::default());
        drop(first_subscription);
        coordinator.apply(ChlorinatorSnapshot::default());

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }
}
