use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::interfaces::mqtt::{MqttError, MqttMessage, Publisher};
use crate::interfaces::registry::HttpRegistry;

/// Writes published messages to stdout as `<topic> <payload>` lines
struct StdoutPublisher {
    out: Mutex<io::Stdout>,
}

impl Publisher for StdoutPublisher {
    fn publish(&self, msg: MqttMessage) -> Result<(), MqttError> {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        // A closed stdout only loses the echo, never the registry work
        let _ = writeln!(out, "{} {}", msg.topic, String::from_utf8_lossy(&msg.payload));
        Ok(())
    }
}

/// Runs one message from a file through the dispatcher against the real registry
pub fn simulate(config: Config, topic: &str, path: &Path) -> Result<()> {
    let payload = fs::read(path).with_context(|| format!("Could not read {}", path.display()))?;

    let publisher = StdoutPublisher {
        out: Mutex::new(io::stdout()),
    };
    let dispatcher = Dispatcher::new(HttpRegistry::new(&config.registry), publisher, config.topics);

    match dispatcher.handle(&MqttMessage::new(topic, payload)) {
        Some(handled) => log::info!("Simulation finished: {handled:?}"),
        None => anyhow::bail!("Message on {topic} could not be processed"),
    }
    Ok(())
}
