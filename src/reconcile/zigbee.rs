//! Zigbee devices reach the bridge through a coordinator and are never announced on
//! their own. When one of their capabilities cannot be created because the device is
//! unknown to the registry, a discovery payload is synthesized from the device id.

use serde_json::Value;

use crate::constants::defaults;
use crate::models::{Capability, DevicePayload};

const ZIGBEE_PREFIX: &str = "zigbee";
pub const ZIGBEE_PLATFORM: &str = "Zigbee";

pub fn is_zigbee_id(device_id: &str) -> bool {
    device_id
        .get(..ZIGBEE_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ZIGBEE_PREFIX))
}

/// Derives a colon-separated hardware address from the hex digits of a device id
///
/// `zigbee-AABBCC` becomes `AA:BB:CC`. A trailing odd digit forms its own group, and an
/// id without hex digits yields the zero address.
pub fn pseudo_mac(device_id: &str) -> String {
    let rest = if is_zigbee_id(device_id) {
        &device_id[ZIGBEE_PREFIX.len()..]
    } else {
        device_id
    };
    let digits: Vec<char> = rest
        .chars()
        .filter(char::is_ascii_hexdigit)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if digits.is_empty() {
        return defaults::ZERO_MAC_ADDRESS.to_string();
    }
    digits
        .chunks(2)
        .map(|pair| pair.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(":")
}

/// Discovery payload announcing the device together with the capability that failed
pub fn discovery_payload(
    device_id: &str,
    capability_name: &str,
    value: &Value,
    kind: &str,
    description: Option<&str>,
) -> DevicePayload {
    DevicePayload {
        device_id: device_id.to_string(),
        platform: Some(ZIGBEE_PLATFORM.to_string()),
        mac_address: Some(pseudo_mac(device_id)),
        ip_address: Some(String::new()),
        kind: None,
        capabilities: vec![Capability {
            capability_name: Some(capability_name.to_string()),
            value: Some(value.clone()),
            kind: Some(kind.to_string()),
            description: description.map(str::to_string),
        }],
        properties: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn prefix_match_ignores_case() {
        assert!(is_zigbee_id("zigbee-AABBCC"));
        assert!(is_zigbee_id("ZigBee_0x00124b"));
        assert!(!is_zigbee_id("esp32-zigbee"));
        assert!(!is_zigbee_id("zig"));
        assert!(!is_zigbee_id("zígbee-01"));
    }

    #[test]
    fn pseudo_mac_pairs_hex_digits() {
        assert_eq!(pseudo_mac("zigbee-AABBCC"), "AA:BB:CC");
        assert_eq!(pseudo_mac("Zigbee_00:12:4b:00"), "00:12:4B:00");
        assert_eq!(pseudo_mac("zigbee-abc"), "AB:C");
        assert_eq!(pseudo_mac("zigbee-xyz"), defaults::ZERO_MAC_ADDRESS);
    }

    #[test]
    fn synthesized_payload_carries_the_capability() {
        let payload = discovery_payload("zigbee-AABBCC", "lamp_on", &json!(true), "switch", None);
        assert_eq!(payload.device_id, "zigbee-AABBCC");
        assert_eq!(payload.platform.as_deref(), Some(ZIGBEE_PLATFORM));
        assert_eq!(payload.mac_address.as_deref(), Some("AA:BB:CC"));
        assert!(!payload.is_property_only());
        assert_eq!(
            payload.capabilities[0].named_value(),
            Some(("lamp_on", &json!(true)))
        );
        assert_eq!(payload.capabilities[0].kind.as_deref(), Some("switch"));
    }
}
