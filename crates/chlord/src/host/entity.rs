//! Entity abstraction for chlord.
//!
//! Entities are composed from three narrow traits instead of a single base
//! class: [`Identifiable`] (stable identity), [`Observable`] (change
//! notification lifecycle), and [`Entity`] (state reporting).

use tokio::sync::mpsc;

use super::device::DeviceInfo;

/// Channel types for entities to report "my state may have changed" to the
/// host, carrying the entity's unique id (unbounded - notification
/// callbacks must not block the coordinator's writer)
pub type StateChangedSender = mpsc::UnboundedSender<String>;
pub type StateChangedReceiver = mpsc::UnboundedReceiver<String>;

/// Base trait that all entities must implement
pub trait Entity: Identifiable + Observable + Send + Sync {
    /// Human-readable name shown by the host
    fn name(&self) -> &str;

    /// Serialize current state to JSON for host storage
    fn state_json(&self) -> serde_json::Value;

    /// Return the platform type of this entity (e.g. "binary_sensor")
    fn platform(&self) -> &'static str;
}

/// Stable identity of an entity.
pub trait Identifiable {
    /// Deterministic id, stable across restarts. The host uses it for
    /// persistence and identity matching.
    fn unique_id(&self) -> &str;

    /// Device grouping record for this entity.
    fn device_info(&self) -> DeviceInfo;
}

/// Push-based change notification lifecycle.
///
/// The host attaches an entity when it takes ownership and detaches it on
/// teardown. Detaching must deregister the underlying listener; state
/// changes are pushed, never polled.
pub trait Observable {
    fn attach(&mut self, notify: StateChangedSender);

    fn detach(&mut self);
}
