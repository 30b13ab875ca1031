//! IO modules - external system interfaces
//!
//! - `cache` - FindMy cache files as record sources
//! - `discovery` - Home Assistant MQTT discovery payloads
//! - `publisher` - Publisher trait and publication type
//! - `mqtt_publisher` - rumqttc-backed publisher
//! - `console` - Status table output

pub mod cache;
pub mod console;
pub mod discovery;
pub mod mqtt_publisher;
pub mod publisher;

// Re-export commonly used types
pub use cache::{cache_sources, CacheFile, CacheKind, RecordSource};
pub use discovery::DiscoveryMessage;
pub use mqtt_publisher::MqttPublisher;
pub use publisher::{Publication, Publisher};
