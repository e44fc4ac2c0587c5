use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::constants::keys;

/// Discovery announcement for one device
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DevicePayload {
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl DevicePayload {
    /// Property-only payloads carry telemetry for existing devices and skip reconciliation
    pub fn is_property_only(&self) -> bool {
        self.kind.as_deref() == Some(keys::PROPERTY_PAYLOAD_TYPE)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Capability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Capability {
    /// Name and value, if both are present; anything else is ignored by the bridge
    pub fn named_value(&self) -> Option<(&str, &Value)> {
        match (&self.capability_name, &self.value) {
            (Some(name), Some(value)) if !name.is_empty() => Some((name, value)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Property {
    #[serde(alias = "property_name")]
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Target device when it differs from the enclosing payload's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

/// Message received on the capability topic
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CapabilityMessage {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub capability_name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub value: Option<Value>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Event published whenever a capability value changes
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CapabilityEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub capability_name: String,
    pub value: Value,
}

// An explicit `null` still counts as a value; only an absent field means "skip".
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn parse_full_discovery_payload() {
        let payload: DevicePayload = serde_json::from_value(json!({
            "device_id": "esp32-kitchen",
            "mac_address": "11:22:33:44:55:66",
            "ip_address": "192.168.0.100",
            "capabilities": [{"capability_name": "on_off", "value": true, "type": "switch"}],
            "properties": [{"property_name": "rssi", "value": -60}]
        }))
        .unwrap();

        assert_eq!(payload.platform, None);
        assert!(!payload.is_property_only());
        assert_eq!(
            payload.capabilities[0].named_value(),
            Some(("on_off", &json!(true)))
        );
        assert_eq!(payload.properties[0].name, "rssi");
        assert_eq!(payload.properties[0].description, None);
    }

    #[test]
    fn property_type_marks_property_only_payload() {
        let payload: DevicePayload =
            serde_json::from_str(r#"{"device_id": "d1", "type": "property"}"#).unwrap();
        assert!(payload.is_property_only());
        assert!(payload.capabilities.is_empty());
    }

    #[test]
    fn null_value_differs_from_absent_value() {
        let with_null: CapabilityMessage =
            serde_json::from_str(r#"{"capability_name": "x", "value": null}"#).unwrap();
        let without: CapabilityMessage =
            serde_json::from_str(r#"{"capability_name": "x"}"#).unwrap();
        assert_eq!(with_null.value, Some(Value::Null));
        assert_eq!(without.value, None);
    }

    #[test]
    fn capability_without_name_or_value_is_ignored() {
        let nameless = Capability {
            value: Some(json!(1)),
            ..Default::default()
        };
        let valueless = Capability {
            capability_name: Some("x".into()),
            ..Default::default()
        };
        assert_eq!(nameless.named_value(), None);
        assert_eq!(valueless.named_value(), None);
    }

    #[test]
    fn device_payload_requires_device_id() {
        assert!(serde_json::from_str::<DevicePayload>(r#"{"ip_address": "1.2.3.4"}"#).is_err());
    }
}
