pub mod api;
pub mod config;
pub mod coordinator;
pub mod host;
pub mod platforms;

pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use coordinator::ChlorinatorSnapshot;
pub use coordinator::Coordinator;
pub use coordinator::Subscription;
pub use host::BinarySensorState;
pub use host::Host;
pub use host::HostState;
