// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Event bus for display and observability subscribers

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::recording::timestamp_format;

/// Running totals after a tick, at full precision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub power_watts: u32,
    pub energy_kwh: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    Started { session_id: Uuid },
    Stopped { session_id: Uuid, records: usize },
    Persisted { path: PathBuf, records: usize },
    PersistFailed { path: PathBuf, message: String },
    SyncSucceeded { target: String, records: usize, elapsed_ms: u64 },
    SyncFailed { target: String, message: String },
    SyncDropped,
}

/// Lifecycle event wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

/// Fan-out of totals and lifecycle events.
///
/// Publishing never blocks: with no subscribers the event is dropped, and a
/// slow subscriber sees `Lagged` instead of holding up the sender.
pub struct EventBus {
    totals_tx: broadcast::Sender<Totals>,
    event_tx: broadcast::Sender<Event>,
    event_counter: AtomicU64,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (totals_tx, _) = broadcast::channel(capacity);
        let (event_tx, _) = broadcast::channel(capacity);

        Self {
            totals_tx,
            event_tx,
            event_counter: AtomicU64::new(0),
        }
    }

    pub fn publish_totals(&self, totals: Totals) {
        let _ = self.totals_tx.send(totals);
    }

    pub fn publish(&self, payload: EventPayload) {
        let id = self.event_counter.fetch_add(1, Ordering::Relaxed);
        let event = Event {
            id,
            timestamp: Local::now(),
            payload,
        };
        let _ = self.event_tx.send(event);
    }

    pub fn subscribe_totals(&self) -> broadcast::Receiver<Totals> {
        self.totals_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
