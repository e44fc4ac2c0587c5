use serde_json::Value;

use crate::constants::{defaults, keys};
use crate::correlation::Scope;
use crate::helpers::{now_local, now_utc};
use crate::interfaces::registry::requests::{self, NewDevice, Patch, PropertyRecord};
use crate::interfaces::registry::{Registry, RegistryError};
use crate::models::DevicePayload;

use super::capabilities::{self, EnsureOutcome};
use super::platform::platform_from_device_id;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceOutcome {
    Updated,
    UpdateFailed,
    Created,
    CreateFailed,
    /// The existence check failed with something other than 404
    LookupFailed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeviceReport {
    pub device: DeviceOutcome,
    pub capabilities: Vec<(String, EnsureOutcome)>,
}

/// Brings the registry in line with a discovery payload
///
/// Existing devices get their network attributes and properties refreshed; unknown
/// ones are created. Capabilities are ensured in every case, even when the device step
/// failed, so that as much of the payload as possible lands in the registry.
pub fn reconcile(registry: &dyn Registry, scope: &Scope, payload: &DevicePayload) -> DeviceReport {
    let device_id = payload.device_id.as_str();
    log::info!("{scope}Checking whether device '{device_id}' exists");

    let device = match registry.send(scope, &requests::get_device(device_id)) {
        Ok(_) => {
            log::info!("{scope}Device '{device_id}' already exists");
            refresh_existing(registry, scope, payload)
        }
        Err(e) if e.is_not_found() => match create_device(registry, scope, payload) {
            Ok(()) => DeviceOutcome::Created,
            Err(_) => DeviceOutcome::CreateFailed,
        },
        Err(e) => {
            log::error!("{scope}Could not check device '{device_id}': {e}");
            DeviceOutcome::LookupFailed
        }
    };

    let capabilities = capabilities::ensure_all(registry, scope, payload);
    DeviceReport {
        device,
        capabilities,
    }
}

fn refresh_existing(registry: &dyn Registry, scope: &Scope, payload: &DevicePayload) -> DeviceOutcome {
    let device_id = payload.device_id.as_str();
    let outcome = match update_device(registry, scope, device_id, &refresh_patches(payload)) {
        Ok(()) => DeviceOutcome::Updated,
        Err(_) => DeviceOutcome::UpdateFailed,
    };

    // Each property stands alone; one failure does not stop the rest
    for property in &payload.properties {
        let _ = update_property(
            registry,
            scope,
            device_id,
            &property.name,
            &property.value,
            property.description.as_deref(),
        );
    }
    outcome
}

fn refresh_patches(payload: &DevicePayload) -> Vec<Patch> {
    let mut patches = Vec::with_capacity(3);
    if let Some(mac) = &payload.mac_address {
        patches.push(Patch::replace(keys::MAC_ADDRESS, mac.as_str()));
    }
    patches.push(Patch::replace(keys::IP_ADDRESS, payload.ip_address.clone()));
    patches.push(Patch::replace(keys::POWER_ON, now_local()));
    patches
}

pub fn update_device(
    registry: &dyn Registry,
    scope: &Scope,
    device_id: &str,
    patches: &[Patch],
) -> Result<(), RegistryError> {
    log::info!("{scope}Patching device '{device_id}': {patches:?}");
    let result = requests::patch_device(device_id, patches).and_then(|req| registry.send(scope, &req));
    match result {
        Ok(response) => {
            log::info!("{scope}Device '{device_id}' updated: {}", response.body);
            Ok(())
        }
        Err(e) => {
            log::error!("{scope}Could not update device '{device_id}': {e}");
            Err(e)
        }
    }
}

pub fn update_property(
    registry: &dyn Registry,
    scope: &Scope,
    device_id: &str,
    name: &str,
    value: &Value,
    description: Option<&str>,
) -> Result<(), RegistryError> {
    let record = PropertyRecord {
        name: name.to_string(),
        description: description.unwrap_or(name).to_string(),
        value: value.clone(),
    };
    log::info!("{scope}Updating property '{name}' of device '{device_id}' to {value}");
    let result = requests::put_property(device_id, &record).and_then(|req| registry.send(scope, &req));
    match result {
        Ok(_) => {
            log::info!("{scope}Property '{name}' of device '{device_id}' updated");
            Ok(())
        }
        Err(e) => {
            log::error!("{scope}Could not update property '{name}' of device '{device_id}': {e}");
            Err(e)
        }
    }
}

pub fn create_device(
    registry: &dyn Registry,
    scope: &Scope,
    payload: &DevicePayload,
) -> Result<(), RegistryError> {
    let platform = match payload.platform.as_deref() {
        Some(platform) if !platform.is_empty() => platform.to_string(),
        _ => {
            log::warn!(
                "{scope}No platform given for device '{}'; inferring it from the id",
                payload.device_id
            );
            platform_from_device_id(&payload.device_id).to_string()
        }
    };

    let device = new_device(payload, platform);
    log::info!("{scope}Creating device {device:?}");
    let result = requests::create_device(&device).and_then(|req| registry.send(scope, &req));
    match result {
        Ok(response) => {
            log::info!("{scope}Device '{}' created: {}", payload.device_id, response.body);
            Ok(())
        }
        Err(e) => {
            log::error!("{scope}Could not create device '{}': {e}", payload.device_id);
            Err(e)
        }
    }
}

fn new_device(payload: &DevicePayload, platform: String) -> NewDevice {
    let now = now_utc();
    NewDevice {
        device_id: payload.device_id.clone(),
        device_name: payload.device_id.clone(),
        description: payload.device_id.clone(),
        last_active: now.clone(),
        state: defaults::DEVICE_STATE_ACTIVE.to_string(),
        mac_address: payload
            .mac_address
            .clone()
            .unwrap_or_else(|| defaults::ZERO_MAC_ADDRESS.to_string()),
        ip_address: payload.ip_address.clone(),
        protocol: defaults::DEVICE_PROTOCOL.to_string(),
        platform,
        capabilities: vec![],
        properties: payload
            .properties
            .iter()
            .map(|p| PropertyRecord {
                name: p.name.clone(),
                description: p.description.clone().unwrap_or_else(|| p.name.clone()),
                value: p.value.clone(),
            })
            .collect(),
        power_on: now,
    }
}
