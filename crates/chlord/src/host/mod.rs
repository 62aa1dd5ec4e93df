mod collection;
mod device;
mod entity;
// Private module - allowed by clippy.toml allow-private-module-inception
#[allow(clippy::module_inception)]
mod host;
mod state;

pub use collection::EntityCollection;
pub use collection::HostError;
pub use device::DeviceInfo;
pub use entity::Entity;
pub use entity::Identifiable;
pub use entity::Observable;
pub use entity::StateChangedReceiver;
pub use entity::StateChangedSender;
pub use host::Host;
pub use state::BinarySensorState;
pub use state::HostState;
