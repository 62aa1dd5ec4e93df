use serde::Serialize;

/// Grouping record the host uses to collect entities under one physical
/// device.
///
/// Every entity of one device must report an equal record, or the host
/// will split them across device entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// (domain, id) pairs that uniquely identify this device
    pub identifiers: Vec<(String, String)>,

    /// Device name
    pub name: String,

    /// Manufacturer name
    pub manufacturer: Option<String>,

    /// Model name
    pub model: Option<String>,
}
