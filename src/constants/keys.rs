// Capability names with dedicated routing
pub const DEVICE_STATE: &str = "device_state";
pub const WIFI_SIGNAL: &str = "wifi_signal";
pub const WIFI_SSID: &str = "wifi_ssid";
pub const BATTERY_LEVEL: &str = "battery_level";

// Device attributes addressed by PATCH
pub const STATE: &str = "state";
pub const LAST_ACTIVE: &str = "last_active";
pub const POWER_ON: &str = "power_on";
pub const MAC_ADDRESS: &str = "mac_address";
pub const IP_ADDRESS: &str = "ip_address";

pub const PROPERTY_PAYLOAD_TYPE: &str = "property";
