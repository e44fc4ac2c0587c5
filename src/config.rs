use std::env;

use thiserror::Error;
use url::Url;

use crate::constants::{defaults, envvars, topics};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
    #[error("environment variable {var} has invalid value '{value}'")]
    InvalidNumber { var: &'static str, value: String },
    #[error("MQTT protocol '{0}' is not supported; only 'mqtt' is")]
    UnsupportedProtocol(String),
    #[error("invalid registry URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Clone, Debug)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topics {
    /// Inbound capability updates; also receives the capabilities found on discovery
    pub capability: String,
    /// Inbound discovery announcements
    pub discovery: String,
    /// Outbound echo of every handled capability update
    pub capability_updated: String,
}

impl Topics {
    pub fn inbound(&self) -> Vec<String> {
        vec![self.capability.clone(), self.discovery.clone()]
    }
}

impl Default for Topics {
    fn default() -> Self {
        Topics {
            capability: topics::CAPABILITY.into(),
            discovery: topics::DISCOVERY.into(),
            capability_updated: topics::CAPABILITY_UPDATED.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RegistryConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub topics: Topics,
    pub registry: RegistryConfig,
    pub worker_threads: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = var(envvars::API_URL).ok_or(ConfigError::Missing(envvars::API_URL))?;
        // Validate early so a typo fails at startup, not on the first message
        Url::parse(&base_url)?;

        // TLS to the broker is not built in; refuse rather than connect in plain text
        if let Some(protocol) = var(envvars::MQTT_PROTOCOL) {
            if !protocol.eq_ignore_ascii_case(defaults::MQTT_PROTOCOL) {
                return Err(ConfigError::UnsupportedProtocol(protocol));
            }
        }

        Ok(Config {
            mqtt: MqttConfig {
                host: var(envvars::MQTT_HOST).unwrap_or_else(|| defaults::MQTT_HOST.into()),
                port: parse_var(envvars::MQTT_PORT)?.unwrap_or(defaults::MQTT_PORT),
                client_id: var(envvars::MQTT_CLIENT_ID)
                    .unwrap_or_else(|| defaults::MQTT_CLIENT_ID.into()),
                username: var(envvars::MQTT_USER_NAME),
                password: var(envvars::MQTT_PASSWORD),
            },
            topics: Topics {
                capability: var(envvars::MQTT_TOPIC).unwrap_or_else(|| topics::CAPABILITY.into()),
                discovery: var(envvars::MQTT_TOPIC_DISCOVERY)
                    .unwrap_or_else(|| topics::DISCOVERY.into()),
                capability_updated: var(envvars::MQTT_PUBLISH_TOPIC)
                    .unwrap_or_else(|| topics::CAPABILITY_UPDATED.into()),
            },
            registry: RegistryConfig {
                base_url,
                api_key: var(envvars::API_KEY),
                authorization: var(envvars::API_AUTHORIZATION),
            },
            worker_threads: parse_var::<usize>(envvars::WORKER_THREADS)?
                .filter(|n| *n > 0)
                .unwrap_or(defaults::WORKER_THREADS),
        })
    }
}

// Empty values count as unset
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match var(name) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var: name, value }),
        None => Ok(None),
    }
}
