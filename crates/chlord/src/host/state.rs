use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

/// State of a binary sensor entity.
///
/// `None` is the unknown sentinel: the coordinator has not reported a
/// value for this sensor yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BinarySensorState {
    pub on: Option<bool>,
}

/// Centralized snapshot of entity state as the host has last seen it,
/// keyed by unique id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HostState {
    pub binary_sensors: HashMap<String, BinarySensorState>,
}
