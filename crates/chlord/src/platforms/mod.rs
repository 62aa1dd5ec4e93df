//! Entity platforms.
//!
//! A platform contributes one family of entities (binary sensors, numeric
//! sensors, ...) bound to the chlorinator coordinator. Platforms register
//! a factory in [`REGISTRY`] at link time; the binary constructs every
//! platform whose config section is present.

mod binary_sensor;

use std::sync::Arc;

use async_trait::async_trait;
use linkme::distributed_slice;

pub use binary_sensor::description_for;
pub use binary_sensor::BinarySensorDescription;
pub use binary_sensor::BinarySensorDeviceClass;
pub use binary_sensor::BinarySensorPlatform;
pub use binary_sensor::ChlorinatorBinarySensor;
pub use binary_sensor::BINARY_SENSOR_TYPES;

use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::host::DeviceInfo;
use crate::host::EntityCollection;
use crate::host::HostError;

/// Integration domain, the namespace for device identifiers.
pub const DOMAIN: &str = "astralpool_chlorinator";

/// Fixed id of the chlorinator controller.
pub const DEVICE_ID: &str = "POOL01";

/// Grouping record shared by every chlorinator entity.
pub fn device_info() -> DeviceInfo {
    DeviceInfo {
        identifiers: vec![(DOMAIN.to_string(), DEVICE_ID.to_string())],
        name: DEVICE_ID.to_string(),
        manufacturer: Some("Astral Pool".to_string()),
        model: Some("Viron eQuilibrium".to_string()),
    }
}

/// Result type for platform factory functions
pub type PlatformFactoryResult = anyhow::Result<Option<Box<dyn Platform>>>;

pub struct PlatformContext<'a> {
    pub config: &'a Config,
}

#[distributed_slice]
pub static REGISTRY: [fn(&PlatformContext) -> PlatformFactoryResult];

/// Platform trait that all platforms must implement
#[async_trait]
pub trait Platform: Send + Sync {
    /// Get the name/identifier of this platform
    fn name(&self) -> &'static str;

    /// Build this platform's entities bound to `coordinator` and register
    /// them with the host.
    ///
    /// Registration failures are fatal and surface unmodified.
    async fn setup(
        &mut self,
        coordinator: Arc<Coordinator>,
        entities: &EntityCollection,
    ) -> Result<(), PlatformError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("unknown sensor key: {0}")]
    UnknownSensorKey(String),

    #[error(transparent)]
    Registration(#[from] HostError),
}
