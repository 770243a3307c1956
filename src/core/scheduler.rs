// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Periodic task scheduling

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::debug;

/// Interval whose first tick fires one `period` from now
pub fn periodic(period: Duration, behavior: MissedTickBehavior) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(behavior);
    ticker
}

/// A spawned task that stops when signalled (or when this handle is dropped)
pub struct TaskHandle<T> {
    name: &'static str,
    shutdown: broadcast::Sender<()>,
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> TaskHandle<T> {
    /// Spawn `task` on the current runtime, handing it its shutdown receiver
    pub fn spawn<F, Fut>(name: &'static str, task: F) -> Self
    where
        F: FnOnce(broadcast::Receiver<()>) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (shutdown, rx) = broadcast::channel(1);
        let handle = tokio::spawn(task(rx));
        debug!("Spawned task '{}'", name);

        Self {
            name,
            shutdown,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Signal shutdown and wait for the task's output
    pub async fn stop(self) -> Result<T, JoinError> {
        let _ = self.shutdown.send(());
        let out = self.handle.await;
        debug!("Task '{}' stopped", self.name);
        out
    }
}
