use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::dispatch::{Dispatcher, WorkerPool};
use crate::interfaces::mqtt::{self, MqttPublisher};
use crate::interfaces::registry::HttpRegistry;

/// Runs the bridge until the MQTT connection loop ends
pub fn run(config: Config) -> Result<()> {
    log::info!(
        "Starting bridge: registry at {}, listening on {:?}",
        config.registry.base_url,
        config.topics.inbound()
    );

    let registry = HttpRegistry::new(&config.registry);
    let (client, connection) = mqtt::client_conn(
        &config.mqtt,
        mqtt::get_rand_client_id(Some(&config.mqtt.client_id)),
    );
    let publisher = MqttPublisher::new(client.clone());
    let dispatcher = Arc::new(Dispatcher::new(registry, publisher, config.topics.clone()));
    let pool = WorkerPool::start(dispatcher, config.worker_threads)?;

    let result = mqtt::sub_topics(&client, connection, &config.topics.inbound(), |msg| {
        pool.submit(msg)
    });

    pool.shutdown();
    result?;
    Ok(())
}
