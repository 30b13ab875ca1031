//! Raw FindMy cache record shape
//!
//! Every field is optional. Fields and sub-objects that do not have the
//! expected shape deserialize to `None` on their own; the rest of the
//! record is kept.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDeviceRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default)]
    pub battery_status: Option<serde_json::Value>,
    #[serde(default)]
    pub battery_level: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub device_display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub product_type: Option<RawProductType>,
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<RawLocation>,
    #[serde(default)]
    pub address: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProductType {
    #[serde(default, deserialize_with = "lenient")]
    pub product_information: Option<RawProductInformation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProductInformation {
    #[serde(default, deserialize_with = "lenient")]
    pub manufacturer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub model_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocation {
    #[serde(default, deserialize_with = "lenient")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub horizontal_accuracy: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub vertical_accuracy: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub position_type: Option<String>,
    /// Kept as raw JSON: only integer epoch milliseconds count as a timestamp
    #[serde(default)]
    pub time_stamp: Option<serde_json::Value>,
}

impl RawDeviceRecord {
    /// Parse a single cache entry
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Manufacturer and model names from the nested product information
    pub fn product_information(&self) -> Option<&RawProductInformation> {
        self.product_type.as_ref()?.product_information.as_ref()
    }
}

/// Deserialize an optional field, yielding `None` when its shape is wrong
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_record() {
        let record = RawDeviceRecord::from_value(json!({
            "name": "Keys",
            "batteryStatus": 1,
            "productType": {"productInformation": {"manufacturerName": "Acme", "modelName": "Tag"}},
            "location": {
                "latitude": 52.0,
                "longitude": 13.0,
                "horizontalAccuracy": 3.0,
                "verticalAccuracy": 4.0,
                "positionType": "Wifi",
                "timeStamp": 1700000000000_i64
            },
            "address": {"locality": "Berlin"}
        }))
        .unwrap();

        assert_eq!(record.name.as_deref(), Some("Keys"));
        let info = record.product_information().unwrap();
        assert_eq!(info.manufacturer_name.as_deref(), Some("Acme"));
        let location = record.location.unwrap();
        assert_eq!(location.position_type.as_deref(), Some("Wifi"));
        assert_eq!(location.time_stamp, Some(json!(1700000000000_i64)));
    }

    #[test]
    fn test_malformed_sub_objects_become_none() {
        let record = RawDeviceRecord::from_value(json!({
            "name": "Bike",
            "productType": "not an object",
            "location": "somewhere"
        }))
        .unwrap();

        assert!(record.product_type.is_none());
        assert!(record.location.is_none());
        assert_eq!(record.name.as_deref(), Some("Bike"));
    }

    #[test]
    fn test_malformed_scalar_keeps_rest_of_location() {
        let record = RawDeviceRecord::from_value(json!({
            "name": "Keys",
            "productType": {"productInformation": {"manufacturerName": 7, "modelName": "Tag"}},
            "location": {
                "latitude": 52.0,
                "longitude": 13.0,
                "verticalAccuracy": "n/a",
                "positionType": 3,
                "timeStamp": 1700000000000_i64
            }
        }))
        .unwrap();

        let location = record.location.as_ref().unwrap();
        assert_eq!(location.latitude, Some(52.0));
        assert_eq!(location.longitude, Some(13.0));
        assert!(location.vertical_accuracy.is_none());
        assert!(location.position_type.is_none());
        let info = record.product_information().unwrap();
        assert!(info.manufacturer_name.is_none());
        assert_eq!(info.model_name.as_deref(), Some("Tag"));
    }

    #[test]
    fn test_non_string_name_is_absent() {
        let record = RawDeviceRecord::from_value(json!({"name": 42, "batteryStatus": "Full"})).unwrap();
        assert!(record.name.is_none());
        assert_eq!(record.battery_status, Some(json!("Full")));
    }

    #[test]
    fn test_null_location() {
        let record = RawDeviceRecord::from_value(json!({"name": "Watch", "location": null})).unwrap();
        assert!(record.location.is_none());
    }
}
