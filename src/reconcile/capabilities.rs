use serde_json::Value;

use crate::correlation::Scope;
use crate::interfaces::registry::requests::{self, CapabilityValue, NewCapability};
use crate::interfaces::registry::{Registry, RegistryError, RegistryResponse};
use crate::models::{Capability, DevicePayload};

use super::zigbee;

/// Result of [`update_or_create`]
#[derive(Clone, Debug, PartialEq)]
pub enum CapabilityOutcome {
    Updated,
    Created,
    /// The capability was missing and the message lacked `device_id` or `type`
    CreateSkipped,
    CreateFailed,
    UpdateFailed,
    /// The owning Zigbee device is unknown to the registry; announce it first
    DiscoveryRequired(DevicePayload),
}

/// Result of ensuring one capability in [`ensure_all`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnsureOutcome {
    Present,
    Created,
    CreateSkipped,
    CreateFailed,
    LookupFailed,
}

/// What the caller knows about the capability beyond its name and value
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CapabilityContext {
    pub device_id: Option<String>,
    pub kind: Option<String>,
    pub description: Option<String>,
}

/// Makes sure every capability of a discovered device exists, without touching values
pub fn ensure_all(
    registry: &dyn Registry,
    scope: &Scope,
    payload: &DevicePayload,
) -> Vec<(String, EnsureOutcome)> {
    payload
        .capabilities
        .iter()
        .filter_map(|capability| {
            let (name, _) = capability.named_value()?;
            let outcome = ensure(registry, scope, &payload.device_id, capability);
            Some((name.to_string(), outcome))
        })
        .collect()
}

fn ensure(
    registry: &dyn Registry,
    scope: &Scope,
    device_id: &str,
    capability: &Capability,
) -> EnsureOutcome {
    let Some((name, value)) = capability.named_value() else {
        return EnsureOutcome::CreateSkipped;
    };

    log::info!("{scope}Checking whether capability '{name}' exists");
    match registry.send(scope, &requests::get_capability(name)) {
        Ok(_) => {
            log::info!("{scope}Capability '{name}' already exists");
            EnsureOutcome::Present
        }
        Err(e) if e.is_not_found() => {
            let Some(kind) = capability.kind.as_deref() else {
                log::error!("{scope}Cannot create capability '{name}': no type given");
                return EnsureOutcome::CreateSkipped;
            };
            log::info!("{scope}Capability '{name}' does not exist; creating it");
            let record = new_capability(
                device_id,
                name,
                value,
                kind,
                capability.description.as_deref(),
            );
            match create_capability(registry, scope, device_id, &record) {
                Ok(_) => EnsureOutcome::Created,
                Err(_) => EnsureOutcome::CreateFailed,
            }
        }
        Err(e) => {
            log::error!("{scope}Could not check capability '{name}': {e}");
            EnsureOutcome::LookupFailed
        }
    }
}

/// Updates a capability by name, creating it under the context's device if it is missing
pub fn update_or_create(
    registry: &dyn Registry,
    scope: &Scope,
    name: &str,
    value: &Value,
    context: &CapabilityContext,
) -> CapabilityOutcome {
    log::info!("{scope}Updating capability '{name}' to {value}");
    let update = CapabilityValue {
        capability_name: name,
        value,
    };
    let result = requests::patch_capability(&update).and_then(|req| registry.send(scope, &req));

    match result {
        Ok(response) => {
            log::info!("{scope}Capability '{name}' updated: {}", response.body);
            CapabilityOutcome::Updated
        }
        Err(e) if e.is_not_found() => {
            log::warn!("{scope}Capability '{name}' not found; trying to create it");
            create_missing(registry, scope, name, value, context)
        }
        Err(e) => {
            log::error!("{scope}Could not update capability '{name}': {e}");
            CapabilityOutcome::UpdateFailed
        }
    }
}

fn create_missing(
    registry: &dyn Registry,
    scope: &Scope,
    name: &str,
    value: &Value,
    context: &CapabilityContext,
) -> CapabilityOutcome {
    let (Some(device_id), Some(kind)) = (context.device_id.as_deref(), context.kind.as_deref())
    else {
        log::error!(
            "{scope}Cannot create capability '{name}': device_id ({:?}) and type ({:?}) are both required",
            context.device_id,
            context.kind
        );
        return CapabilityOutcome::CreateSkipped;
    };

    let description = context.description.as_deref();
    let record = new_capability(device_id, name, value, kind, description);
    match create_capability(registry, scope, device_id, &record) {
        Ok(_) => CapabilityOutcome::Created,
        Err(e) if zigbee::is_zigbee_id(device_id) && e.is_missing_owner() => {
            log::warn!("{scope}Zigbee device '{device_id}' is not registered; requesting discovery");
            CapabilityOutcome::DiscoveryRequired(zigbee::discovery_payload(
                device_id,
                name,
                value,
                kind,
                description,
            ))
        }
        Err(_) => CapabilityOutcome::CreateFailed,
    }
}

fn new_capability(
    device_id: &str,
    name: &str,
    value: &Value,
    kind: &str,
    description: Option<&str>,
) -> NewCapability {
    NewCapability {
        capability_name: name.to_string(),
        description: description.unwrap_or(name).to_string(),
        owner: device_id.to_string(),
        device_id: device_id.to_string(),
        kind: kind.to_string(),
        // The registry rejects a null value on creation
        value: match value {
            Value::Null => Value::String(String::new()),
            other => other.clone(),
        },
    }
}

fn create_capability(
    registry: &dyn Registry,
    scope: &Scope,
    device_id: &str,
    capability: &NewCapability,
) -> Result<RegistryResponse, RegistryError> {
    log::debug!("{scope}Creating capability {capability:?}");
    let result =
        requests::create_capability(device_id, capability).and_then(|req| registry.send(scope, &req));
    match &result {
        Ok(response) => log::info!(
            "{scope}Capability '{}' created: {}",
            capability.capability_name,
            response.body
        ),
        Err(e) => log::error!(
            "{scope}Could not create capability '{}': {e}",
            capability.capability_name
        ),
    }
    result
}
