//! Infrastructure - configuration, errors, and metrics
//!
//! - `config` - CLI/environment arguments and the resolved `Config`
//! - `zones` - Known-locations file loading and validation
//! - `error` - Configuration and source read errors
//! - `metrics` - Lock-free sync counters

pub mod config;
pub mod error;
pub mod metrics;
pub mod zones;

// Re-export commonly used types
pub use config::{CliArgs, Config};
pub use error::{ConfigError, SourceReadError};
pub use metrics::Metrics;
pub use zones::load_zones;
