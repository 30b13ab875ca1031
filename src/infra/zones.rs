//! Known-locations (zone) file loading
//!
//! The file maps a zone name to `{latitude, longitude, tolerance}`:
//!
//! ```json
//! { "Home": { "latitude": 52.52, "longitude": 13.405, "tolerance": 70 } }
//! ```
//!
//! JSON is the default format; a `.toml` extension selects TOML with the same
//! layout. Zones keep the order in which they appear in the file, which is
//! the order the classifier tries them in.

use crate::domain::types::Zone;
use crate::infra::error::ConfigError;
use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

/// Load and validate a zone file
pub fn load_zones(path: &Path) -> Result<Vec<Zone>, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotAFile(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

    let entries = if is_toml(path) { parse_toml(path, &content)? } else { parse_json(path, &content)? };

    let zones = entries
        .into_iter()
        .map(|(name, value)| parse_zone(name, value))
        .collect::<Result<Vec<_>, _>>()?;

    info!(path = %path.display(), zones = zones.len(), "zones_loaded");
    Ok(zones)
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

fn parse_json(path: &Path, content: &str) -> Result<IndexMap<String, Value>, ConfigError> {
    serde_json::from_str(content)
        .map_err(|e| ConfigError::Parse { path: path.to_path_buf(), message: e.to_string() })
}

fn parse_toml(path: &Path, content: &str) -> Result<IndexMap<String, Value>, ConfigError> {
    let parse_error = |message: String| ConfigError::Parse { path: path.to_path_buf(), message };

    let table: IndexMap<String, toml::Value> =
        toml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
    table
        .into_iter()
        .map(|(name, value)| -> Result<(String, Value), ConfigError> {
            let value = serde_json::to_value(value).map_err(|e| parse_error(e.to_string()))?;
            Ok((name, value))
        })
        .collect()
}

fn parse_zone(name: String, value: Value) -> Result<Zone, ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::EmptyZoneName);
    }
    let Value::Object(fields) = value else {
        return Err(ConfigError::ZoneNotAnObject { zone: name });
    };

    let latitude = float_field(&name, &fields, "latitude", 90.0)?;
    let longitude = float_field(&name, &fields, "longitude", 180.0)?;

    let invalid_tolerance = |reason| ConfigError::InvalidZoneField {
        zone: name.clone(),
        field: "tolerance in meters",
        reason,
    };
    let tolerance = fields
        .get("tolerance")
        .filter(|v| v.is_i64() || v.is_u64())
        .ok_or_else(|| invalid_tolerance("expected an integer"))?;
    let tolerance = match tolerance.as_i64() {
        Some(t) if t < 0 => return Err(invalid_tolerance("must not be negative")),
        Some(t) => u32::try_from(t).map_err(|_| invalid_tolerance("too large"))?,
        None => return Err(invalid_tolerance("too large")),
    };

    Ok(Zone::new(name, latitude, longitude, Some(tolerance)))
}

fn float_field(
    zone: &str,
    fields: &serde_json::Map<String, Value>,
    field: &'static str,
    limit: f64,
) -> Result<f64, ConfigError> {
    let invalid = |reason| ConfigError::InvalidZoneField { zone: zone.to_string(), field, reason };

    let value = fields
        .get(field)
        .filter(|v| v.is_f64())
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid("expected a floating-point number"))?;
    if value.abs() > limit {
        return Err(invalid("out of range"));
    }
    Ok(value)
}
