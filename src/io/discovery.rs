//! Home Assistant MQTT discovery payloads
//!
//! Each published device gets three retained messages under
//! `homeassistant/device_tracker/<device_id>/`:
//! - `config` - entity and device description (discovery)
//! - `attributes` - location, accuracy, battery, timestamps
//! - `state` - zone label, or `reset` when no zones are configured

use crate::domain::types::{DeviceSnapshot, LastUpdate, Reading, SourceType, NOT_HOME};
use crate::io::publisher::Publication;
use crate::services::normalizer::format_timestamp;
use serde::Serialize;

/// Topic prefix for device trackers
pub const DISCOVERY_PREFIX: &str = "homeassistant/device_tracker";

/// State payload used when the deployment relies on Home Assistant zones
pub const PAYLOAD_RESET: &str = "reset";

pub const PAYLOAD_HOME: &str = "home";

/// Static provider tag included in every attributes payload
pub const PROVIDER: &str = "FindMy (ofirsnb/home-assistant-findmy) v1.1.1";

#[derive(Debug, Clone, Serialize)]
pub struct DeviceDescriptor {
    pub identifiers: String,
    pub manufacturer: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Discovery (config) payload
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPayload {
    pub unique_id: String,
    pub state_topic: String,
    pub json_attributes_topic: String,
    pub device: DeviceDescriptor,
    pub source_type: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_home: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_not_home: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_reset: Option<&'static str>,
}

/// JSON attributes payload
#[derive(Debug, Clone, Serialize)]
pub struct AttributesPayload {
    pub latitude: Reading<f64>,
    pub longitude: Reading<f64>,
    pub gps_accuracy: Reading<f64>,
    pub address: Reading<serde_json::Value>,
    #[serde(rename = "batteryStatus")]
    pub battery_status: serde_json::Value,
    pub last_update_timestamp: LastUpdate,
    pub last_update: String,
    pub provider: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,
}

/// The full set of messages published for one device
#[derive(Debug, Clone)]
pub struct DiscoveryMessage {
    pub topic_base: String,
    pub config: ConfigPayload,
    pub attributes: AttributesPayload,
    pub state: String,
}

impl DiscoveryMessage {
    /// Build the payloads for a snapshot
    ///
    /// With `manual_zones` the state carries the zone label and the config
    /// declares home/not_home payloads; otherwise state is always `reset`.
    pub fn build(
        snapshot: &DeviceSnapshot,
        device_id: &str,
        zone_label: &Reading<String>,
        manual_zones: bool,
    ) -> Self {
        let topic_base = format!("{}/{}/", DISCOVERY_PREFIX, device_id);
        let last_update = snapshot.last_update();

        let config = ConfigPayload {
            unique_id: format!("{} {}", device_id, snapshot.name),
            state_topic: format!("{}state", topic_base),
            json_attributes_topic: format!("{}attributes", topic_base),
            device: DeviceDescriptor {
                identifiers: device_id.to_string(),
                manufacturer: snapshot.manufacturer.clone(),
                name: format!("FindMy {}", snapshot.name),
                model: snapshot.model.clone(),
            },
            source_type: snapshot.source_type,
            payload_home: manual_zones.then_some(PAYLOAD_HOME),
            payload_not_home: manual_zones.then_some(NOT_HOME),
            payload_reset: (!manual_zones).then_some(PAYLOAD_RESET),
        };

        let attributes = AttributesPayload {
            latitude: snapshot.latitude(),
            longitude: snapshot.longitude(),
            gps_accuracy: snapshot.accuracy_m(),
            address: snapshot.address(),
            battery_status: snapshot.battery_status.clone(),
            last_update: format_timestamp(&last_update),
            last_update_timestamp: last_update,
            provider: PROVIDER,
            battery_level: snapshot.battery_level,
        };

        let state = if manual_zones { zone_label.to_string() } else { PAYLOAD_RESET.to_string() };

        Self { topic_base, config, attributes, state }
    }

    /// Serialize into retained publications: config, attributes, state
    pub fn publications(&self) -> serde_json::Result<[Publication; 3]> {
        Ok([
            Publication::retained(format!("{}config", self.topic_base), serde_json::to_string(&self.config)?),
            Publication::retained(
                format!("{}attributes", self.topic_base),
                serde_json::to_string(&self.attributes)?,
            ),
            Publication::retained(format!("{}state", self.topic_base), self.state.clone()),
        ])
    }
}
