//! Binary sensor platform for the chlorinator.
//!
//! Six sensors, each bound to one key of the coordinator snapshot. State
//! is recomputed on demand by re-reading the snapshot; a key the
//! coordinator has not populated yet reads as unknown.

use std::sync::Arc;

use async_trait::async_trait;
use linkme::distributed_slice;
use serde::Deserialize;
use serde::Serialize;
use strum::Display;
use strum::EnumString;
use tracing::info;

use super::Platform;
use super::PlatformContext;
use super::PlatformError;
use super::PlatformFactoryResult;
use super::DEVICE_ID;
use crate::coordinator::Coordinator;
use crate::coordinator::Subscription;
use crate::host::DeviceInfo;
use crate::host::Entity;
use crate::host::EntityCollection;
use crate::host::Identifiable;
use crate::host::Observable;
use crate::host::StateChangedSender;

/// Device class for binary sensors. Controls how the host renders the
/// on/off pair (e.g. `running` shows running/not running).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BinarySensorDeviceClass {
    Connectivity,
    Heat,
    Moisture,
    Power,
    Problem,
    Running,
    Safety,
}

/// Static display metadata for one binary sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinarySensorDescription {
    /// Sensor key, matching the coordinator's snapshot key
    pub key: &'static str,

    /// Human-readable name
    pub name: &'static str,

    /// Opaque UI hint passed through to the host
    pub icon: &'static str,

    pub device_class: Option<BinarySensorDeviceClass>,
}

/// Every binary sensor the chlorinator exposes, in construction order.
pub static BINARY_SENSOR_TYPES: &[BinarySensorDescription] = &[
    BinarySensorDescription {
        key: "pump_is_operating",
        name: "Pump",
        icon: "mdi:pump",
        device_class: Some(BinarySensorDeviceClass::Running),
    },
    BinarySensorDescription {
        key: "pump_is_priming",
        name: "Pump priming",
        icon: "mdi:reload",
        device_class: Some(BinarySensorDeviceClass::Running),
    },
    BinarySensorDescription {
        key: "chemistry_values_current",
        name: "Chemistry values current",
        icon: "mdi:check-circle-outline",
        device_class: None,
    },
    BinarySensorDescription {
        key: "chemistry_values_valid",
        name: "Chemistry values valid",
        icon: "mdi:check-circle",
        device_class: None,
    },
    BinarySensorDescription {
        key: "cell_is_operating",
        name: "Cell",
        icon: "mdi:fuel-cell",
        device_class: Some(BinarySensorDeviceClass::Running),
    },
    BinarySensorDescription {
        key: "sanitising_until_next_timer_tomorrow",
        name: "Sanitising until next timer tomorrow",
        icon: "mdi:fuel-cell",
        device_class: None,
    },
];

/// Look up the description for a sensor key.
///
/// The table is self-defining, so an unknown key is a programming error
/// and fails fast at setup time.
pub fn description_for(key: &str) -> Result<&'static BinarySensorDescription, PlatformError> {
    BINARY_SENSOR_TYPES
        .iter()
        .find(|description| description.key == key)
        .ok_or_else(|| PlatformError::UnknownSensorKey(key.to_string()))
}

/// Binary sensor bound to one key of the coordinator snapshot.
pub struct ChlorinatorBinarySensor {
    description: &'static BinarySensorDescription,
    unique_id: String,
    coordinator: Arc<Coordinator>,
    subscription: Option<Subscription>,
}

impl ChlorinatorBinarySensor {
    pub fn new(
        coordinator: Arc<Coordinator>,
        description: &'static BinarySensorDescription,
    ) -> Self {
        let unique_id = format!("{}_{}", DEVICE_ID, description.key).to_lowercase();
        Self {
            description,
            unique_id,
            coordinator,
            subscription: None,
        }
    }

    /// Current state from the snapshot.
    ///
    /// `None` when the coordinator has not reported this key yet; that is
    /// a valid transient condition, not an error.
    pub fn is_on(&self) -> Option<bool> {
        self.coordinator.snapshot().get(self.description.key)
    }

    pub fn icon(&self) -> &'static str {
        self.description.icon
    }

    pub fn device_class(&self) -> Option<BinarySensorDeviceClass> {
        self.description.device_class
    }
}

impl Identifiable for ChlorinatorBinarySensor {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn device_info(&self) -> DeviceInfo {
        super::device_info()
    }
}

impl Observable for ChlorinatorBinarySensor {
    fn attach(&mut self, notify: StateChangedSender) {
        let unique_id = self.unique_id.clone();
        self.subscription = Some(self.coordinator.subscribe(move || {
            // The host may already be tearing down; a closed channel is fine.
            let _ = notify.send(unique_id.clone());
        }));
    }

    fn detach(&mut self) {
        self.subscription = None;
    }
}

impl Entity for ChlorinatorBinarySensor {
    fn name(&self) -> &str {
        self.description.name
    }

    fn state_json(&self) -> serde_json::Value {
        serde_json::json!({ "on": self.is_on() })
    }

    fn platform(&self) -> &'static str {
        "binary_sensor"
    }
}

/// Binary sensor platform for the chlorinator.
pub struct BinarySensorPlatform;

#[distributed_slice(crate::platforms::REGISTRY)]
fn init_binary_sensor(ctx: &PlatformContext) -> PlatformFactoryResult {
    let config = if let Some(c) = &ctx.config.platforms.binary_sensor {
        c
    } else {
        return Ok(None);
    };
    if !config.enabled {
        return Ok(None);
    }

    Ok(Some(Box::new(BinarySensorPlatform)))
}

#[async_trait]
impl Platform for BinarySensorPlatform {
    fn name(&self) -> &'static str {
        "binary_sensor"
    }

    async fn setup(
        &mut self,
        coordinator: Arc<Coordinator>,
        entities: &EntityCollection,
    ) -> Result<(), PlatformError> {
        let sensors: Vec<Box<dyn Entity>> = BINARY_SENSOR_TYPES
            .iter()
            .map(|description| {
                Box::new(ChlorinatorBinarySensor::new(coordinator.clone(), description))
                    as Box<dyn Entity>
            })
            .collect();

        info!("Registering {} chlorinator binary sensors", sensors.len());
        entities.add_entities(sensors).await?;

        Ok(())
    }
}
