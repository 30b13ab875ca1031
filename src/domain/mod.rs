//! Domain models - raw cache records and normalized device data
//!
//! - `record` - permissive shape of a FindMy cache entry
//! - `types` - `Zone`, `DeviceSnapshot`, and the `"unknown"` sentinel

pub mod record;
pub mod types;

pub use record::RawDeviceRecord;
pub use types::{DeviceSnapshot, LastUpdate, Position, Reading, SourceType, Zone};
