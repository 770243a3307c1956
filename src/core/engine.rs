// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Monitor engine - owns the session and drives the sampling and sync tasks

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::event_bus::{EventBus, EventPayload};
use super::sampling::{SamplingLoop, SharedSource};
use super::scheduler::TaskHandle;
use super::{MonitorError, MonitorState, MonitorStatus};
use crate::config::Config;
use crate::recording::{now_millis, HistoryPoint, HistoryWindow, RecordReader, Session};
use crate::sensors::PowerSource;
use crate::storage;
use crate::sync::{SyncManager, SyncTarget, Trigger};

/// Result of a stop command
#[derive(Debug)]
pub struct StopReport {
    pub session_id: Uuid,
    pub records: usize,
    /// Where the log was written, if persistence ran and succeeded
    pub persisted: Option<PathBuf>,
    /// The final sync cycle, if one was requested
    pub sync: Option<Trigger>,
}

struct ActiveRun {
    session_id: Uuid,
    started_at: NaiveDateTime,
    reader: RecordReader,
    sampler: TaskHandle<SamplingLoop>,
    syncer: TaskHandle<()>,
}

/// Idle/Running state machine for one monitor.
///
/// Exactly one session is active while running. The last closed session is
/// kept in memory for export until the next start discards it.
pub struct Monitor {
    config: Arc<Config>,
    events: Arc<EventBus>,
    history: Arc<Mutex<HistoryWindow>>,
    source: SharedSource,
    sync: Arc<SyncManager>,
    active: Option<ActiveRun>,
    last_session: Option<Session>,
}

impl Monitor {
    pub fn new(
        config: Config,
        source: Box<dyn PowerSource>,
        target: Arc<dyn SyncTarget>,
    ) -> Result<Self, MonitorError> {
        config.validate()?;

        let events = Arc::new(EventBus::default());
        let sync = Arc::new(SyncManager::from_config(&config.sync, target, Arc::clone(&events)));
        let history = Arc::new(Mutex::new(HistoryWindow::new(config.sampling.history_capacity)));

        Ok(Self {
            config: Arc::new(config),
            events,
            history,
            source: Arc::new(Mutex::new(source)),
            sync,
            active: None,
            last_session: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    pub fn sync_manager(&self) -> &Arc<SyncManager> {
        &self.sync
    }

    pub fn state(&self) -> MonitorState {
        if self.active.is_some() {
            MonitorState::Running
        } else {
            MonitorState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Copy of the live history window
    pub fn history(&self) -> Vec<HistoryPoint> {
        self.history.lock().snapshot()
    }

    /// Idle → Running. Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<Uuid, MonitorError> {
        if self.active.is_some() {
            warn!("Start ignored: monitor already running");
            return Err(MonitorError::InvalidState {
                command: "start",
                state: MonitorState::Running.as_str(),
            });
        }

        let session = Session::new(self.config.sampling.cost_rate)?;
        let session_id = session.id();
        let started_at = session.start_time();
        let reader = session.reader();

        self.last_session = None;
        self.history.lock().reset();

        let sampling = SamplingLoop::new(
            Arc::clone(&self.source),
            session,
            Arc::clone(&self.history),
            Arc::clone(&self.events),
            Duration::from_millis(self.config.sampling.sample_interval_ms),
        );
        let sampler = TaskHandle::spawn("sampler", |shutdown| sampling.run(shutdown));

        let sync = Arc::clone(&self.sync);
        let sync_reader = reader.clone();
        let sync_period = Duration::from_millis(self.config.sync.sync_interval_ms);
        let syncer = TaskHandle::spawn("sync-scheduler", move |shutdown| {
            sync.run_periodic(sync_reader, sync_period, shutdown)
        });

        self.active = Some(ActiveRun {
            session_id,
            started_at,
            reader,
            sampler,
            syncer,
        });

        info!(
            "Monitoring started (session {}, source {})",
            session_id,
            self.source.lock().id()
        );
        self.events.publish(EventPayload::Started { session_id });
        Ok(session_id)
    }

    /// Running → Idle. Persists and syncs once if anything was recorded.
    ///
    /// The final sync cycle is dispatched, not awaited; its handle is in the
    /// returned report.
    pub async fn stop(&mut self) -> Result<StopReport, MonitorError> {
        let Some(run) = self.active.take() else {
            warn!("Stop ignored: monitor is idle");
            return Err(MonitorError::InvalidState {
                command: "stop",
                state: MonitorState::Idle.as_str(),
            });
        };

        let ActiveRun {
            session_id,
            reader,
            sampler,
            syncer,
            ..
        } = run;

        if let Err(e) = syncer.stop().await {
            error!("Sync scheduler ended abnormally: {}", e);
        }

        let session = match sampler.stop().await {
            Ok(sampling) => {
                let mut session = sampling.into_session();
                session.close();
                Some(session)
            }
            Err(e) => {
                error!("Sampling task ended abnormally: {}", e);
                None
            }
        };

        let records = reader.len();
        info!("Monitoring stopped (session {}, {} records)", session_id, records);
        self.events.publish(EventPayload::Stopped {
            session_id,
            records,
        });

        let mut report = StopReport {
            session_id,
            records,
            persisted: None,
            sync: None,
        };

        if records > 0 {
            report.persisted = self.persist(&reader).await;
            report.sync = Some(self.sync.trigger(reader));
        }

        self.last_session = session;
        Ok(report)
    }

    /// Write the session log to the configured sink, reporting (not
    /// propagating) failures.
    async fn persist(&self, reader: &RecordReader) -> Option<PathBuf> {
        let path = self.config.sync.sink_path.clone();
        let written = {
            let reader = reader.clone();
            let path = path.clone();
            tokio::task::spawn_blocking(move || reader.persist(&path)).await
        };

        let failure = match written {
            Ok(Ok(records)) => {
                info!("Data saved to {:?}", path);
                self.events.publish(EventPayload::Persisted {
                    path: path.clone(),
                    records,
                });
                return Some(path);
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => e.to_string(),
        };

        error!("Save failed: {}", failure);
        self.events.publish(EventPayload::PersistFailed {
            path,
            message: failure,
        });
        None
    }

    /// Export the running or last session to `dir` under its derived name
    pub fn export(&self, dir: &Path) -> Result<PathBuf, MonitorError> {
        let (file_name, records) = if let Some(run) = &self.active {
            (
                storage::export_file_name(run.started_at, now_millis()),
                run.reader.snapshot(),
            )
        } else if let Some(session) = &self.last_session {
            (session.export_file_name(), session.records().snapshot())
        } else {
            return Err(MonitorError::NoSession);
        };

        Ok(storage::export_records(dir, &file_name, &records)?)
    }

    pub fn status(&self) -> MonitorStatus {
        let (session_id, started_at, ended_at, records, last_record) = match (&self.active, &self.last_session) {
            (Some(run), _) => (
                Some(run.session_id),
                Some(run.started_at),
                None,
                run.reader.len(),
                run.reader.last(),
            ),
            (None, Some(session)) => (
                Some(session.id()),
                Some(session.start_time()),
                session.end_time(),
                session.records().len(),
                session.records().last(),
            ),
            (None, None) => (None, None, None, 0, None),
        };

        MonitorStatus {
            state: self.state(),
            session_id,
            started_at,
            ended_at,
            records,
            last_record,
            history_len: self.history.lock().len(),
            sync: self.sync.stats(),
        }
    }
}
