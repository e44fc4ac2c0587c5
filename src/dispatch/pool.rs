use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use flume::{Sender, TrySendError};

use crate::constants::defaults;
use crate::interfaces::mqtt::{MqttMessage, Publisher};
use crate::interfaces::registry::Registry;

use super::Dispatcher;

/// Fixed set of threads pulling inbound messages off a bounded queue
///
/// Messages are handled concurrently; a slow registry call only holds up the worker
/// that issued it.
pub struct WorkerPool {
    sender: Sender<MqttMessage>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn start<R, P>(dispatcher: Arc<Dispatcher<R, P>>, size: usize) -> io::Result<Self>
    where
        R: Registry + 'static,
        P: Publisher + 'static,
    {
        let size = size.max(1);
        let (sender, receiver) = flume::bounded::<MqttMessage>(size * defaults::QUEUE_DEPTH_PER_WORKER);

        let mut workers = Vec::with_capacity(size);
        for n in 0..size {
            let receiver = receiver.clone();
            let dispatcher = dispatcher.clone();
            let worker = thread::Builder::new()
                .name(format!("dispatch-{n}"))
                .spawn(move || {
                    for msg in receiver.iter() {
                        dispatcher.handle(&msg);
                    }
                    log::debug!("Worker {n} stopped");
                })?;
            workers.push(worker);
        }
        log::info!("Started {size} dispatch workers");

        Ok(WorkerPool { sender, workers })
    }

    /// Queues a message, blocking while every worker is busy and the queue is full
    pub fn submit(&self, msg: MqttMessage) {
        let msg = match self.sender.try_send(msg) {
            Ok(()) => return,
            Err(TrySendError::Full(msg)) => {
                log::warn!("Dispatch queue full; waiting for a free worker");
                msg
            }
            Err(TrySendError::Disconnected(msg)) => {
                log::error!("Dispatch workers are gone; dropping message on {}", msg.topic);
                return;
            }
        };
        if let Err(e) = self.sender.send(msg) {
            log::error!("Dispatch workers are gone; dropping message on {}", e.0.topic);
        }
    }

    /// Stops accepting messages and waits for queued ones to be handled
    pub fn shutdown(self) {
        drop(self.sender);
        for worker in self.workers {
            if worker.join().is_err() {
                log::error!("A dispatch worker panicked");
            }
        }
    }
}
