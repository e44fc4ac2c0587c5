//! Registry endpoints and their JSON records

use serde::Serialize;
use serde_json::Value;
use urlencoding::encode;

use super::{Method, RegistryError, RegistryRequest};

/// JSON-Patch style `replace` operation
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Patch {
    pub op: &'static str,
    pub path: String,
    pub value: Value,
}

impl Patch {
    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Patch {
            op: "replace",
            path: path.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PropertyRecord {
    pub name: String,
    pub description: String,
    pub value: Value,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewDevice {
    pub device_id: String,
    pub device_name: String,
    pub description: String,
    pub last_active: String,
    pub state: String,
    pub mac_address: String,
    pub ip_address: Option<String>,
    pub protocol: String,
    pub platform: String,
    pub capabilities: Vec<NewCapability>,
    pub properties: Vec<PropertyRecord>,
    pub power_on: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewCapability {
    pub capability_name: String,
    pub description: String,
    pub owner: String,
    pub device_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Value,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CapabilityValue<'a> {
    pub capability_name: &'a str,
    pub value: &'a Value,
}

// Ids and names are percent-encoded so each one stays a single path segment

pub fn get_device(device_id: &str) -> RegistryRequest {
    RegistryRequest::get(format!("devices/{}", encode(device_id)))
}

pub fn create_device(device: &NewDevice) -> Result<RegistryRequest, RegistryError> {
    RegistryRequest::with_body(Method::Post, "devices", device)
}

pub fn patch_device(device_id: &str, patches: &[Patch]) -> Result<RegistryRequest, RegistryError> {
    RegistryRequest::with_body(Method::Patch, format!("devices/{}", encode(device_id)), patches)
}

pub fn put_property(
    device_id: &str,
    property: &PropertyRecord,
) -> Result<RegistryRequest, RegistryError> {
    RegistryRequest::with_body(
        Method::Put,
        format!("devices/{}/properties", encode(device_id)),
        property,
    )
}

pub fn get_capability(name: &str) -> RegistryRequest {
    RegistryRequest::get(format!("capabilities/{}", encode(name)))
}

pub fn patch_capability(update: &CapabilityValue) -> Result<RegistryRequest, RegistryError> {
    RegistryRequest::with_body(Method::Patch, "capabilities", update)
}

/// The registry takes a list, but devsync always creates one capability at a time
pub fn create_capability(
    device_id: &str,
    capability: &NewCapability,
) -> Result<RegistryRequest, RegistryError> {
    RegistryRequest::with_body(
        Method::Post,
        format!("devices/{}/capabilities", encode(device_id)),
        std::slice::from_ref(capability),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn patch_body_is_a_list_of_replace_ops() {
        let request = patch_device(
            "esp32-1",
            &[Patch::replace("ip_address", "10.0.0.2"), Patch::replace("state", true)],
        )
        .unwrap();
        assert_eq!(request.method, Method::Patch);
        assert_eq!(request.path, "devices/esp32-1");
        assert_eq!(
            request.body,
            Some(json!([
                {"op": "replace", "path": "ip_address", "value": "10.0.0.2"},
                {"op": "replace", "path": "state", "value": true}
            ]))
        );
    }

    #[test]
    fn capability_creation_wraps_record_in_list() {
        let capability = NewCapability {
            capability_name: "lamp_on".into(),
            description: "lamp_on".into(),
            owner: "dev-1".into(),
            device_id: "dev-1".into(),
            kind: "switch".into(),
            value: json!(true),
        };
        let request = create_capability("dev-1", &capability).unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.path, "devices/dev-1/capabilities");
        assert_eq!(
            request.body,
            Some(json!([{
                "capability_name": "lamp_on",
                "description": "lamp_on",
                "owner": "dev-1",
                "device_id": "dev-1",
                "type": "switch",
                "value": true
            }]))
        );
    }

    #[test]
    fn lookups_have_no_body() {
        let request = get_capability("on_off");
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "capabilities/on_off");
        assert_eq!(request.body, None);
        assert_eq!(get_device("x").path, "devices/x");
    }

    #[test]
    fn ids_and_names_stay_single_segments() {
        assert_eq!(get_device("a/b").path, "devices/a%2Fb");
        assert_eq!(get_capability("living room lamp").path, "capabilities/living%20room%20lamp");
        assert_eq!(get_device("dev?x#y").path, "devices/dev%3Fx%23y");

        let record = PropertyRecord {
            name: "rssi".into(),
            description: "rssi".into(),
            value: Value::from(-70),
        };
        assert_eq!(
            put_property("zigbee/0x1", &record).unwrap().path,
            "devices/zigbee%2F0x1/properties"
        );
    }
}
