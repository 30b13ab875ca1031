//! Zone classification
//!
//! Tolerances are converted from meters to degrees with a flat-earth
//! approximation and checked per axis, so the matched region is a box rather
//! than a circle. A point near a box corner can be ~1.4x the tolerance away
//! and still match.

use crate::domain::types::{Zone, NOT_HOME};

/// Approximate meters per degree at the equator
const METERS_PER_DEGREE: f64 = 111_111.0;

/// Convert a tolerance in meters to coordinate degrees
#[inline]
pub fn tolerance_degrees(meters: u32) -> f64 {
    f64::from(meters) / METERS_PER_DEGREE
}

/// Return the first zone (in configured order) whose box contains the point,
/// or `"not_home"` when none does
///
/// First match wins even if a later zone is closer.
pub fn classify<'a>(latitude: f64, longitude: f64, zones: &'a [Zone]) -> &'a str {
    zones
        .iter()
        .find(|zone| {
            let tolerance = tolerance_degrees(zone.tolerance_m);
            (zone.latitude - latitude).abs() <= tolerance
                && (zone.longitude - longitude).abs() <= tolerance
        })
        .map_or(NOT_HOME, |zone| zone.name.as_str())
}
