//! Publish suppression
//!
//! Remembers, per device name, the last-update marker that was last
//! published. A device is republished only when that marker changes. The
//! check is pure equality: an older timestamp still counts as a change, and
//! `"unknown"` differs from every real timestamp.

use crate::domain::types::{LastUpdate, Reading};
use rustc_hash::FxHashMap;
use tracing::debug;

/// What was last published for a device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    pub device_id: String,
    pub last_update: LastUpdate,
    pub zone_label: Reading<String>,
}

/// Per-device last-seen state, kept for the process lifetime
#[derive(Debug, Default)]
pub struct ChangeDetector {
    states: FxHashMap<String, DeviceState>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a snapshot with `last_update` should be published
    pub fn should_publish(&self, device_name: &str, last_update: &LastUpdate, force_sync: bool) -> bool {
        if force_sync {
            return true;
        }
        match self.states.get(device_name) {
            Some(state) => state.last_update != *last_update,
            None => true,
        }
    }

    /// Commit the state of a published device, replacing any previous entry
    pub fn record(
        &mut self,
        device_name: &str,
        last_update: LastUpdate,
        zone_label: Reading<String>,
        device_id: String,
    ) {
        debug!(device_id = %device_id, last_update = %last_update, "device_state_recorded");
        self.states
            .insert(device_name.to_string(), DeviceState { device_id, last_update, zone_label });
    }

    pub fn get(&self, device_name: &str) -> Option<&DeviceState> {
        self.states.get(device_name)
    }

    /// Iterate over all known devices (unordered)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceState)> {
        self.states.iter().map(|(name, state)| (name.as_str(), state))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(detector: &mut ChangeDetector, name: &str, last_update: LastUpdate) {
        detector.record(name, last_update, Reading::Known("Home".to_string()), format!("findmy_{}", name));
    }

    #[test]
    fn test_first_observation_publishes() {
        let detector = ChangeDetector::new();

        assert!(detector.should_publish("keys", &Reading::Known(1000), false));
        assert!(detector.should_publish("keys", &Reading::Known(1000), true));
        assert!(detector.should_publish("keys", &Reading::Unknown, false));
    }

    #[test]
    fn test_same_marker_suppressed() {
        let mut detector = ChangeDetector::new();
        commit(&mut detector, "keys", Reading::Known(1000));

        assert!(!detector.should_publish("keys", &Reading::Known(1000), false));
    }

    #[test]
    fn test_force_sync_overrides() {
        let mut detector = ChangeDetector::new();
        commit(&mut detector, "keys", Reading::Known(1000));

        assert!(detector.should_publish("keys", &Reading::Known(1000), true));
    }

    #[test]
    fn test_older_timestamp_still_publishes() {
        let mut detector = ChangeDetector::new();
        commit(&mut detector, "keys", Reading::Known(2000));

        assert!(detector.should_publish("keys", &Reading::Known(1000), false));
    }

    #[test]
    fn test_unknown_sentinel_transitions() {
        let mut detector = ChangeDetector::new();
        commit(&mut detector, "keys", Reading::Known(1000));
        assert!(detector.should_publish("keys", &Reading::Unknown, false));

        commit(&mut detector, "keys", Reading::Unknown);
        assert!(detector.should_publish("keys", &Reading::Known(1000), false));
        assert!(!detector.should_publish("keys", &Reading::Unknown, false));
    }

    #[test]
    fn test_record_overwrites() {
        let mut detector = ChangeDetector::new();
        commit(&mut detector, "keys", Reading::Known(1000));
        detector.record("keys", Reading::Known(2000), Reading::Known("Work".to_string()), "findmy_keys".to_string());

        let state = detector.get("keys").unwrap();
        assert_eq!(state.last_update, Reading::Known(2000));
        assert_eq!(state.zone_label, Reading::Known("Work".to_string()));
        assert_eq!(detector.len(), 1);
    }

    #[test]
    fn test_devices_are_independent() {
        let mut detector = ChangeDetector::new();
        commit(&mut detector, "keys", Reading::Known(1000));

        assert!(detector.should_publish("wallet", &Reading::Known(1000), false));
        assert_eq!(detector.iter().count(), 1);
    }
}
