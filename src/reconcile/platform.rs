/// Substrings of a device id that identify its hardware platform, checked in order
const PLATFORM_MARKERS: &[(&str, &str)] = &[
    ("esp32", "ESP32"),
    ("esp8266", "ESP8266"),
    ("raspberry", "Raspberry"),
    ("arduino", "Arduino"),
];

/// Guesses the platform from the device id; unknown ids map to an empty platform
pub fn platform_from_device_id(device_id: &str) -> &'static str {
    PLATFORM_MARKERS
        .iter()
        .find(|(marker, _)| device_id.contains(marker))
        .map(|(_, platform)| *platform)
        .unwrap_or("")
}
