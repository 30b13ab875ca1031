//! Shared types for the FindMy bridge

use serde::{Serialize, Serializer};
use std::fmt;

/// Literal used wherever a location-dependent value is not available
pub const UNKNOWN: &str = "unknown";

/// Zone label reported when a position falls outside every configured zone
pub const NOT_HOME: &str = "not_home";

/// Tolerance applied when a zone does not specify one (meters)
pub const DEFAULT_TOLERANCE_M: u32 = 70;

/// A value that is either known or the `"unknown"` sentinel
///
/// `Unknown` serializes as the JSON string `"unknown"` and never compares
/// equal to a `Known` value.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading<T> {
    Known(T),
    Unknown,
}

impl<T> Reading<T> {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Reading::Unknown)
    }
}

impl<T> From<Option<T>> for Reading<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Reading::Unknown, Reading::Known)
    }
}

impl<T: Serialize> Serialize for Reading<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reading::Known(v) => v.serialize(serializer),
            Reading::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Reading<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Known(v) => write!(f, "{}", v),
            Reading::Unknown => f.write_str(UNKNOWN),
        }
    }
}

/// Last-update marker of a device (milliseconds since epoch)
pub type LastUpdate = Reading<i64>;

/// A named reference point with a per-axis distance tolerance
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub tolerance_m: u32,
}

impl Zone {
    /// Create a zone; a missing or zero tolerance falls back to 70 m
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, tolerance_m: Option<u32>) -> Self {
        let tolerance_m = tolerance_m.filter(|t| *t > 0).unwrap_or(DEFAULT_TOLERANCE_M);
        Self { name: name.into(), latitude, longitude, tolerance_m }
    }
}

/// How Home Assistant should interpret the position source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Gps,
    Router,
}

/// Location part of a snapshot; only exists when the record had coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Raw address object as reported by FindMy (JSON null when missing)
    pub address: serde_json::Value,
    /// Horizontal and vertical accuracy combined in quadrature
    pub accuracy_m: f64,
    pub last_update: LastUpdate,
}

/// Normalized point-in-time view of one raw device record
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    pub name: String,
    pub manufacturer: String,
    pub model: Option<String>,
    /// Passed through verbatim; FindMy uses strings for devices and numbers for items
    pub battery_status: serde_json::Value,
    pub battery_level: Option<f64>,
    pub source_type: SourceType,
    pub position: Option<Position>,
}

impl DeviceSnapshot {
    pub fn latitude(&self) -> Reading<f64> {
        self.position.as_ref().map(|p| p.latitude).into()
    }

    pub fn longitude(&self) -> Reading<f64> {
        self.position.as_ref().map(|p| p.longitude).into()
    }

    pub fn address(&self) -> Reading<serde_json::Value> {
        self.position.as_ref().map(|p| p.address.clone()).into()
    }

    pub fn accuracy_m(&self) -> Reading<f64> {
        self.position.as_ref().map(|p| p.accuracy_m).into()
    }

    pub fn last_update(&self) -> LastUpdate {
        self.position.as_ref().map_or(Reading::Unknown, |p| p.last_update.clone())
    }
}
