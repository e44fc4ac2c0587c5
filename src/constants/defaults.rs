use std::time::Duration;

pub const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const LOG_LEVEL: &str = "INFO";

pub const MQTT_PROTOCOL: &str = "mqtt";
pub const MQTT_HOST: &str = "localhost";
pub const MQTT_PORT: u16 = 1883;
pub const MQTT_CLIENT_ID: &str = "database_sync_local-client";
pub const MQTT_KEEP_ALIVE: Duration = Duration::from_secs(30);
pub const MQTT_CHANNEL_CAPACITY: usize = 10;
pub const MQTT_RECONNECT_MAX_WAIT: Duration = Duration::from_secs(60);

pub const WORKER_THREADS: usize = 4;
pub const QUEUE_DEPTH_PER_WORKER: usize = 16;

pub const ZERO_MAC_ADDRESS: &str = "00:00:00:00:00:00";
pub const DEVICE_STATE_ACTIVE: &str = "Active";
pub const DEVICE_PROTOCOL: &str = "MQTT";
