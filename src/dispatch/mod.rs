//! Entry point for inbound transport messages
//!
//! Every message opens its own correlation scope, is classified by topic and routed
//! to the reconcilers. Nothing here propagates an error: a bad payload or a failing
//! registry call is logged and the dispatcher moves on to the next message.

mod pool;

use serde::Serialize;
use thiserror::Error;

use crate::config::Topics;
use crate::constants::keys;
use crate::correlation::{CorrelationId, Scope};
use crate::helpers::now_local;
use crate::interfaces::mqtt::{MqttError, MqttMessage, Publisher};
use crate::interfaces::registry::requests::Patch;
use crate::interfaces::registry::Registry;
use crate::models::{CapabilityEvent, CapabilityMessage, DevicePayload, Property};
use crate::reconcile::{capabilities, devices, CapabilityContext, CapabilityOutcome, DeviceReport};

pub use pool::WorkerPool;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("could not parse payload: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where a capability message is sent, decided by its name alone
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapabilityRoute {
    DeviceState,
    Property(&'static str),
    Generic,
}

/// Summary of how one message was handled
#[derive(Clone, Debug, PartialEq)]
pub enum Handled {
    UnknownTopic,
    /// Capability message without name or value
    Ignored,
    DeviceState,
    Property(&'static str),
    Capability(CapabilityOutcome),
    Properties(usize),
    Discovery(DeviceReport),
}

pub fn route_capability(name: &str) -> CapabilityRoute {
    match name {
        keys::DEVICE_STATE => CapabilityRoute::DeviceState,
        keys::WIFI_SIGNAL => CapabilityRoute::Property(keys::WIFI_SIGNAL),
        keys::WIFI_SSID => CapabilityRoute::Property(keys::WIFI_SSID),
        n if n.contains(keys::BATTERY_LEVEL) => CapabilityRoute::Property(keys::BATTERY_LEVEL),
        _ => CapabilityRoute::Generic,
    }
}

pub struct Dispatcher<R, P> {
    registry: R,
    publisher: P,
    topics: Topics,
}

impl<R: Registry, P: Publisher> Dispatcher<R, P> {
    pub fn new(registry: R, publisher: P, topics: Topics) -> Self {
        Dispatcher {
            registry,
            publisher,
            topics,
        }
    }

    /// Handles one inbound message inside a fresh correlation scope
    pub fn handle(&self, msg: &MqttMessage) -> Option<Handled> {
        Scope::run(CorrelationId::generate(), |scope| self.handle_in(scope, msg))
    }

    pub fn handle_in(&self, scope: &Scope, msg: &MqttMessage) -> Option<Handled> {
        let raw = String::from_utf8_lossy(&msg.payload);
        let result = if msg.topic == self.topics.capability {
            log::info!("{scope}Message received on capability topic: {raw}");
            self.handle_capability(scope, &msg.payload)
        } else if msg.topic == self.topics.discovery {
            log::info!("{scope}Message received on discovery topic: {raw}");
            self.handle_discovery(scope, &msg.payload)
        } else {
            log::warn!("{scope}Message received on unknown topic {}", msg.topic);
            Ok(Handled::UnknownTopic)
        };

        match result {
            Ok(handled) => {
                log::debug!("{scope}Handled message on {}: {handled:?}", msg.topic);
                Some(handled)
            }
            Err(e) => {
                log::error!("{scope}Dropping message on {}: {e}; payload: {raw}", msg.topic);
                None
            }
        }
    }

    fn handle_capability(&self, scope: &Scope, payload: &[u8]) -> Result<Handled, DispatchError> {
        let message: CapabilityMessage = serde_json::from_slice(payload)?;
        let name = message.capability_name.as_deref().filter(|n| !n.is_empty());
        let (Some(name), Some(value)) = (name, message.value.as_ref()) else {
            log::debug!("{scope}Capability message without name or value; ignoring");
            return Ok(Handled::Ignored);
        };

        let handled = match route_capability(name) {
            CapabilityRoute::DeviceState => {
                if let Some(device_id) = self.require_device(scope, &message, name) {
                    let _ = devices::update_device(
                        &self.registry,
                        scope,
                        device_id,
                        &[Patch::replace(keys::STATE, value.clone())],
                    );
                }
                Handled::DeviceState
            }
            CapabilityRoute::Property(property) => {
                if let Some(device_id) = self.require_device(scope, &message, name) {
                    let _ = devices::update_property(
                        &self.registry,
                        scope,
                        device_id,
                        property,
                        value,
                        message.description.as_deref(),
                    );
                }
                Handled::Property(property)
            }
            CapabilityRoute::Generic => {
                let context = CapabilityContext {
                    device_id: message.device_id.clone(),
                    kind: message.kind.clone(),
                    description: message.description.clone(),
                };
                let outcome =
                    capabilities::update_or_create(&self.registry, scope, name, value, &context);
                if let CapabilityOutcome::DiscoveryRequired(discovery) = &outcome {
                    self.publish_json(scope, &self.topics.discovery, discovery);
                }
                // Consumers learn about the intended value even if the registry refused it
                self.publish_json(
                    scope,
                    &self.topics.capability_updated,
                    &CapabilityEvent {
                        device_id: message.device_id.clone(),
                        capability_name: name.to_string(),
                        value: value.clone(),
                    },
                );
                log::info!(
                    "{scope}Capability '{name}' set to {value} on device {:?}: {outcome:?}",
                    message.device_id
                );
                Handled::Capability(outcome)
            }
        };
        Ok(handled)
    }

    fn require_device<'m>(
        &self,
        scope: &Scope,
        message: &'m CapabilityMessage,
        name: &str,
    ) -> Option<&'m str> {
        let device_id = message.device_id.as_deref().filter(|id| !id.is_empty());
        if device_id.is_none() {
            log::error!("{scope}Cannot apply '{name}': message has no device_id");
        }
        device_id
    }

    fn handle_discovery(&self, scope: &Scope, payload: &[u8]) -> Result<Handled, DispatchError> {
        let device: DevicePayload = serde_json::from_slice(payload)?;

        if device.is_property_only() {
            for property in &device.properties {
                self.apply_property(scope, &device.device_id, property);
            }
            return Ok(Handled::Properties(device.properties.len()));
        }

        let report = devices::reconcile(&self.registry, scope, &device);

        log::info!("{scope}Announcing discovered capabilities of '{}'", device.device_id);
        for capability in &device.capabilities {
            if let Some((name, value)) = capability.named_value() {
                self.publish_json(
                    scope,
                    &self.topics.capability,
                    &CapabilityEvent {
                        device_id: Some(device.device_id.clone()),
                        capability_name: name.to_string(),
                        value: value.clone(),
                    },
                );
            }
        }
        Ok(Handled::Discovery(report))
    }

    fn apply_property(&self, scope: &Scope, payload_device: &str, property: &Property) {
        let device_id = property.device_id.as_deref().unwrap_or(payload_device);
        if property.name == keys::DEVICE_STATE {
            // A state heartbeat only refreshes the last-seen time
            let _ = devices::update_device(
                &self.registry,
                scope,
                device_id,
                &[Patch::replace(keys::LAST_ACTIVE, now_local())],
            );
        } else {
            let _ = devices::update_property(
                &self.registry,
                scope,
                device_id,
                &property.name,
                &property.value,
                property.description.as_deref(),
            );
        }
    }

    fn publish_json<T: Serialize>(&self, scope: &Scope, topic: &str, payload: &T) {
        let result = serde_json::to_vec(payload)
            .map_err(MqttError::from)
            .and_then(|bytes| self.publisher.publish(MqttMessage::new(topic, bytes)));
        match result {
            Ok(()) => log::info!("{scope}Published to {topic}"),
            Err(e) => log::error!("{scope}Could not publish to {topic}: {e}"),
        }
    }
}
