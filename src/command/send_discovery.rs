use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::interfaces::mqtt::{self, MqttMessage};
use crate::models::DevicePayload;

/// Publishes a discovery payload from a JSON file, as a device would announce itself
pub fn send_discovery(config: &Config, path: &Path) -> Result<()> {
    let raw = fs::read(path).with_context(|| format!("Could not read {}", path.display()))?;
    let payload: DevicePayload = serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not a valid discovery payload", path.display()))?;

    log::info!(
        "Announcing device '{}' on {}",
        payload.device_id,
        config.topics.discovery
    );
    let msg = MqttMessage::new(config.topics.discovery.clone(), serde_json::to_vec(&payload)?);
    mqtt::publish_msgs(&config.mqtt, &[msg], Some("devsync-send"))?;
    Ok(())
}
