//! Raw record normalization
//!
//! Converts a `RawDeviceRecord` into a `DeviceSnapshot`. Missing or malformed
//! sub-fields fall back to fixed defaults; normalization itself never fails.

use crate::domain::record::{RawDeviceRecord, RawLocation};
use crate::domain::types::{DeviceSnapshot, LastUpdate, Position, Reading, SourceType, UNKNOWN};
use chrono::{Local, TimeZone};

/// Manufacturer assumed when the record carries none
pub const DEFAULT_MANUFACTURER: &str = "Apple";

/// Model assumed for Apple items without a display name
pub const DEFAULT_APPLE_MODEL: &str = "AirTag";

/// Normalize one raw record
///
/// `name` is the record's key; callers skip records without one.
pub fn normalize(name: &str, raw: &RawDeviceRecord) -> DeviceSnapshot {
    let manufacturer = manufacturer(raw);
    let model = model(raw, &manufacturer);
    let location = raw.location.as_ref();

    DeviceSnapshot {
        name: name.to_string(),
        source_type: source_type(location.and_then(|l| l.position_type.as_deref())),
        position: location.and_then(|l| position(l, raw.address.as_ref())),
        battery_status: raw
            .battery_status
            .clone()
            .unwrap_or_else(|| serde_json::Value::String(UNKNOWN.to_string())),
        battery_level: raw
            .battery_level
            .as_ref()
            .and_then(serde_json::Value::as_f64)
            .filter(|level| *level != 0.0),
        manufacturer,
        model,
    }
}

/// Manufacturer from product information, defaulting to Apple
pub fn manufacturer(raw: &RawDeviceRecord) -> String {
    raw.product_information()
        .and_then(|info| info.manufacturer_name.clone())
        .unwrap_or_else(|| DEFAULT_MANUFACTURER.to_string())
}

/// Model name; `None` when nothing usable is known
pub fn model(raw: &RawDeviceRecord, manufacturer: &str) -> Option<String> {
    if let Some(display_name) = &raw.device_display_name {
        return Some(display_name.clone());
    }
    if manufacturer == DEFAULT_MANUFACTURER {
        return Some(DEFAULT_APPLE_MODEL.to_string());
    }
    raw.product_information()
        .and_then(|info| info.model_name.clone())
        .filter(|model| !model.is_empty())
}

/// Map a FindMy position type to a Home Assistant source type
pub fn source_type(position_type: Option<&str>) -> SourceType {
    match position_type {
        Some("crowdsourced") => SourceType::Gps,
        Some("safeLocation") => SourceType::Gps,
        Some("Wifi") => SourceType::Router,
        _ => SourceType::Gps,
    }
}

fn position(location: &RawLocation, address: Option<&serde_json::Value>) -> Option<Position> {
    let (latitude, longitude) = (location.latitude?, location.longitude?);
    let horizontal = location.horizontal_accuracy.unwrap_or(0.0);
    let vertical = location.vertical_accuracy.unwrap_or(0.0);

    Some(Position {
        latitude,
        longitude,
        address: address.cloned().unwrap_or(serde_json::Value::Null),
        accuracy_m: horizontal.hypot(vertical),
        last_update: location.time_stamp.as_ref().and_then(serde_json::Value::as_i64).into(),
    })
}

/// Format a last-update marker as local time, or `"unknown"`
pub fn format_timestamp(last_update: &LastUpdate) -> String {
    let Reading::Known(ms) = last_update else {
        return UNKNOWN.to_string();
    };
    match Local.timestamp_millis_opt(*ms).single() {
        Some(dt) if dt.timestamp_subsec_micros() == 0 => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        None => UNKNOWN.to_string(),
    }
}
