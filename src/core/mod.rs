//! Core engine module - orchestrates sampling, recording and sync

mod engine;
mod error;
mod event_bus;
mod sampling;
mod scheduler;

pub use engine::{Monitor, StopReport};
pub use error::{ConfigError, MonitorError, PersistenceError, SyncError};
pub use event_bus::{Event, EventBus, EventPayload, Totals};
pub use sampling::{SamplingLoop, SharedSource};
pub use scheduler::{periodic, TaskHandle};

use crate::recording::{timestamp_format, Record};
use crate::sync::SyncStats;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monitor lifecycle state. There is no paused state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    Idle,
    Running,
}

impl MonitorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorState::Idle => "idle",
            MonitorState::Running => "running",
        }
    }
}

/// Point-in-time view of the monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub state: MonitorState,
    pub session_id: Option<Uuid>,
    #[serde(with = "optional_timestamp")]
    pub started_at: Option<NaiveDateTime>,
    #[serde(with = "optional_timestamp")]
    pub ended_at: Option<NaiveDateTime>,
    pub records: usize,
    pub last_record: Option<Record>,
    pub history_len: usize,
    pub sync: SyncStats,
}

mod optional_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::timestamp_format;

    #[derive(Serialize, Deserialize)]
    struct Wrapped(#[serde(with = "timestamp_format")] NaiveDateTime);

    pub fn serialize<S: Serializer>(ts: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
        ts.map(Wrapped).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error> {
        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|w| w.0))
    }
}
