use std::sync::Arc;
use std::thread;

use backoff::{backoff::Backoff, ExponentialBackoff};
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use thiserror::Error;

use crate::config::MqttConfig;
use crate::constants::defaults;
use crate::helpers::rand_hex;

#[derive(Clone, Debug, PartialEq)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl MqttMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        MqttMessage {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum MqttError {
    #[error(transparent)]
    MqttClient(#[from] rumqttc::ClientError),
    #[error(transparent)]
    MqttConnection(#[from] rumqttc::ConnectionError),
    #[error("could not encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outbound half of the transport
pub trait Publisher: Send + Sync {
    fn publish(&self, msg: MqttMessage) -> Result<(), MqttError>;
}

impl<T: Publisher + ?Sized> Publisher for Arc<T> {
    fn publish(&self, msg: MqttMessage) -> Result<(), MqttError> {
        (**self).publish(msg)
    }
}

/// Fire-and-forget publisher on top of a shared rumqttc client
///
/// Publishing never blocks. The client's request channel is only drained by the thread
/// polling the connection, and that thread may itself be waiting on the workers that
/// publish; when the channel is full the message is dropped with an error.
pub struct MqttPublisher {
    client: Client,
}

impl MqttPublisher {
    pub fn new(client: Client) -> Self {
        MqttPublisher { client }
    }
}

impl Publisher for MqttPublisher {
    fn publish(&self, msg: MqttMessage) -> Result<(), MqttError> {
        log::debug!(
            "Publishing to {}: {}",
            msg.topic,
            String::from_utf8_lossy(&msg.payload)
        );
        self.client
            .try_publish(msg.topic, QoS::AtLeastOnce, false, msg.payload)?;
        Ok(())
    }
}

pub fn get_rand_client_id(prefix: Option<&str>) -> String {
    const RAND_ID_BYTES: usize = 3;
    let randhex = rand_hex(RAND_ID_BYTES);

    if let Some(pref) = prefix {
        format!("{pref}-{randhex}")
    } else {
        randhex
    }
}

pub fn client_conn(config: &MqttConfig, client_id: String) -> (Client, Connection) {
    log::info!(
        "Establishing MQTT connection to {}:{} as {client_id}",
        config.host,
        config.port
    );

    let mut mqttoptions = MqttOptions::new(client_id, config.host.clone(), config.port);
    mqttoptions.set_clean_session(true);
    mqttoptions.set_keep_alive(defaults::MQTT_KEEP_ALIVE);
    if let (Some(user), Some(password)) = (&config.username, &config.password) {
        mqttoptions.set_credentials(user.clone(), password.clone());
    }

    Client::new(mqttoptions, defaults::MQTT_CHANNEL_CAPACITY)
}

/// Publishes a batch on a short-lived connection and waits for every acknowledgement
pub fn publish_msgs(
    config: &MqttConfig,
    messages: &[MqttMessage],
    client_prefix: Option<&str>,
) -> Result<(), MqttError> {
    let (client, mut connection) = client_conn(config, get_rand_client_id(client_prefix));

    let mut expected_msg_acks = messages.len();

    for msg in messages.iter() {
        log::debug!(
            "Publishing to {}: {}",
            msg.topic,
            String::from_utf8_lossy(&msg.payload)
        );
        client
            .clone()
            .publish(msg.topic.clone(), QoS::AtLeastOnce, false, msg.payload.clone())?;
    }

    for notification in connection.iter() {
        log::debug!("Notification = {:?}", notification);
        match notification {
            Ok(Event::Incoming(Packet::PubAck(_))) => expected_msg_acks -= 1,
            Err(e) => return Err(e.into()),
            _ => (),
        }
        if expected_msg_acks == 0 {
            break;
        }
    }
    client.clone().disconnect()?;
    Ok(())
}

/// Drains the connection, handing every inbound publish to `func`
///
/// Subscriptions are (re)issued on every ConnAck. Connection errors are logged and
/// followed by an exponential wait; rumqttc reconnects on the next poll.
pub fn sub_topics<F>(
    client: &Client,
    mut connection: Connection,
    topics: &[String],
    mut func: F,
) -> Result<(), MqttError>
where
    F: FnMut(MqttMessage),
{
    let mut backoff = ExponentialBackoff {
        max_interval: defaults::MQTT_RECONNECT_MAX_WAIT,
        max_elapsed_time: None,
        ..ExponentialBackoff::default()
    };

    for notification in connection.iter() {
        log::trace!("Notification = {:?}", notification);
        match notification {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                log::info!("Connected to MQTT broker");
                backoff.reset();
                for topic in topics.iter() {
                    log::info!("Subscribing to {}", topic);
                    client.clone().subscribe(topic.clone(), QoS::AtLeastOnce)?;
                }
            }
            Ok(Event::Incoming(Packet::Publish(r))) => {
                func(MqttMessage::new(r.topic, r.payload.to_vec()));
            }
            Err(e) => {
                let wait = backoff
                    .next_backoff()
                    .unwrap_or(defaults::MQTT_RECONNECT_MAX_WAIT);
                log::error!(
                    "MQTT connection error: {e}; reconnecting in {:.1}s",
                    wait.as_secs_f32()
                );
                thread::sleep(wait);
            }
            _ => (),
        }
    }
    Ok(())
}
