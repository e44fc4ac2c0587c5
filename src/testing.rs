//! In-memory stand-ins for the registry and the broker

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::correlation::{CorrelationId, Scope};
use crate::interfaces::mqtt::{MqttError, MqttMessage, Publisher};
use crate::interfaces::registry::{
    check_status, Method, Registry, RegistryError, RegistryRequest, RegistryResponse,
};

#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub correlation_id: Option<CorrelationId>,
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Clone, Debug)]
enum Reply {
    Status(u16, String),
    Unreachable,
}

/// Registry that answers 200 `{}` unless told otherwise, and records every call
#[derive(Default)]
pub struct FakeRegistry {
    replies: HashMap<(Method, String), Reply>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        FakeRegistry::default()
    }

    pub fn respond(mut self, method: Method, path: &str, status: u16, body: &str) -> Self {
        self.replies
            .insert((method, path.into()), Reply::Status(status, body.into()));
        self
    }

    pub fn unreachable(mut self, method: Method, path: &str) -> Self {
        self.replies.insert((method, path.into()), Reply::Unreachable);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }

    pub fn calls_with(&self, method: Method) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }
}

impl Registry for FakeRegistry {
    fn send(
        &self,
        scope: &Scope,
        request: &RegistryRequest,
    ) -> Result<RegistryResponse, RegistryError> {
        self.calls.lock().unwrap().push(RecordedCall {
            correlation_id: scope.current().cloned(),
            method: request.method,
            path: request.path.clone(),
            body: request.body.clone(),
        });
        match self.replies.get(&(request.method, request.path.clone())) {
            Some(Reply::Status(status, body)) => check_status(*status, body.clone()),
            Some(Reply::Unreachable) => Err(RegistryError::Transport("connection refused".into())),
            None => check_status(200, "{}".into()),
        }
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<MqttMessage>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        RecordingPublisher::default()
    }

    pub fn published_to(&self, topic: &str) -> Vec<Value> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.topic == topic)
            .map(|m| serde_json::from_slice(&m.payload).unwrap())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, msg: MqttMessage) -> Result<(), MqttError> {
        self.messages.lock().unwrap().push(msg);
        Ok(())
    }
}
