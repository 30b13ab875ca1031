//! Services - change detection and zone classification
//!
//! - `identity` - Device name to bus-safe identifier
//! - `classifier` - Coordinate to zone name
//! - `normalizer` - Raw cache record to `DeviceSnapshot`
//! - `change_detector` - Per-device publish suppression
//! - `sync` - One pass over all record sources

pub mod change_detector;
pub mod classifier;
pub mod identity;
pub mod normalizer;
pub mod sync;

// Re-export commonly used types
pub use change_detector::{ChangeDetector, DeviceState};
pub use classifier::classify;
pub use identity::device_id;
pub use normalizer::{format_timestamp, normalize};
pub use sync::{PassSummary, SyncOrchestrator};
