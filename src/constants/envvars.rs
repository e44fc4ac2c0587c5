pub const LOG_LEVEL: &str = "LOG_LEVEL";

pub const MQTT_PROTOCOL: &str = "MQTT_PROTOCOL";
pub const MQTT_HOST: &str = "MQTT_HOST";
pub const MQTT_PORT: &str = "MQTT_PORT";
pub const MQTT_USER_NAME: &str = "MQTT_USER_NAME";
pub const MQTT_PASSWORD: &str = "MQTT_PASSWORD";
pub const MQTT_CLIENT_ID: &str = "MQTT_CLIENT_ID";

pub const MQTT_TOPIC: &str = "MQTT_TOPIC";
pub const MQTT_PUBLISH_TOPIC: &str = "MQTT_PUBLISH_TOPIC";
pub const MQTT_TOPIC_DISCOVERY: &str = "MQTT_TOPIC_SMARTHOME_DISCOVERY";

pub const API_URL: &str = "API_URL";
pub const API_KEY: &str = "API_KEY";
pub const API_AUTHORIZATION: &str = "API_AUTHORIZATION";

pub const WORKER_THREADS: &str = "WORKER_THREADS";
