// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Sync module - single-flight publishing of the record log

mod target;
mod git;
mod http;

pub use target::{build_target, LocalOnly, SyncTarget};
pub use git::GitTarget;
pub use http::HttpTarget;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::core::{periodic, EventBus, EventPayload, SyncError};
use crate::recording::RecordReader;

/// Counters and last outcome of sync cycles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStats {
    pub attempts: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub dropped: u64,
    pub last_success: Option<DateTime<Local>>,
    pub last_error: Option<String>,
    pub last_records: usize,
}

/// Outcome of one completed sync cycle
#[derive(Debug)]
pub struct SyncReport {
    pub records: usize,
    pub elapsed: Duration,
    pub result: Result<(), SyncError>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// What happened to a trigger request
#[derive(Debug)]
pub enum Trigger {
    /// A cycle was started; the handle yields its report
    Dispatched(JoinHandle<SyncReport>),
    /// A cycle was already running, so this request was discarded
    Dropped,
}

impl Trigger {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Trigger::Dispatched(_))
    }
}

/// Clears the in-flight flag however the cycle ends (including panic or abort)
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Persists a snapshot and publishes it, never more than one cycle at a time
pub struct SyncManager {
    target: Arc<dyn SyncTarget>,
    sink_path: PathBuf,
    timeout: Duration,
    in_flight: Arc<AtomicBool>,
    stats: Arc<Mutex<SyncStats>>,
    events: Arc<EventBus>,
}

impl SyncManager {
    pub fn new(
        target: Arc<dyn SyncTarget>,
        sink_path: PathBuf,
        timeout: Duration,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            target,
            sink_path,
            timeout,
            in_flight: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(Mutex::new(SyncStats::default())),
            events,
        }
    }

    pub fn from_config(config: &SyncConfig, target: Arc<dyn SyncTarget>, events: Arc<EventBus>) -> Self {
        Self::new(
            target,
            config.sink_path.clone(),
            Duration::from_millis(config.timeout_ms),
            events,
        )
    }

    pub fn sink_path(&self) -> &Path {
        &self.sink_path
    }

    pub fn target_name(&self) -> &str {
        self.target.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> SyncStats {
        self.stats.lock().clone()
    }

    /// Request a sync cycle for the current contents of `records`.
    ///
    /// Returns immediately. Must be called from within a tokio runtime.
    pub fn trigger(&self, records: RecordReader) -> Trigger {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.stats.lock().dropped += 1;
            debug!("Sync already in flight, dropping trigger");
            self.events.publish(EventPayload::SyncDropped);
            return Trigger::Dropped;
        }

        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        self.stats.lock().attempts += 1;

        let cycle = SyncCycle {
            target: Arc::clone(&self.target),
            sink_path: self.sink_path.clone(),
            timeout: self.timeout,
            stats: Arc::clone(&self.stats),
            events: Arc::clone(&self.events),
        };

        Trigger::Dispatched(tokio::spawn(async move {
            let _guard = guard;
            cycle.run(records).await
        }))
    }

    /// Trigger every `period` until shutdown. A failed cycle is retried only
    /// by the next tick.
    pub async fn run_periodic(
        self: Arc<Self>,
        records: RecordReader,
        period: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut ticker = periodic(period, MissedTickBehavior::Skip);
        debug!("Periodic sync every {:?} to {}", period, self.target.name());

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    self.trigger(records.clone());
                }
            }
        }
    }
}

struct SyncCycle {
    target: Arc<dyn SyncTarget>,
    sink_path: PathBuf,
    timeout: Duration,
    stats: Arc<Mutex<SyncStats>>,
    events: Arc<EventBus>,
}

impl SyncCycle {
    /// Snapshot and write the sink off the async workers
    async fn persist(&self, records: RecordReader) -> Result<usize, SyncError> {
        let sink_path = self.sink_path.clone();
        Ok(tokio::task::spawn_blocking(move || records.persist(&sink_path)).await??)
    }

    async fn publish(&self) -> Result<(), SyncError> {
        match tokio::time::timeout(self.timeout, self.target.publish(&self.sink_path)).await {
            Ok(published) => published,
            Err(_) => Err(SyncError::Timeout(self.timeout)),
        }
    }

    async fn run(self, records: RecordReader) -> SyncReport {
        let started = Instant::now();
        let (count, result) = match self.persist(records).await {
            Ok(count) => (count, self.publish().await),
            Err(e) => (0, Err(e)),
        };
        let elapsed = started.elapsed();
        let target = self.target.name().to_string();
        let mut stats = self.stats.lock();
        stats.last_records = count;

        match &result {
            Ok(()) => {
                stats.succeeded += 1;
                stats.last_success = Some(Local::now());
                info!("Synced {} records to {} in {:?}", count, target, elapsed);
                self.events.publish(EventPayload::SyncSucceeded {
                    target,
                    records: count,
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }
            Err(e) => {
                stats.failed += 1;
                stats.last_error = Some(e.to_string());
                warn!("Sync to {} failed: {}", target, e);
                self.events.publish(EventPayload::SyncFailed {
                    target,
                    message: e.to_string(),
                });
            }
        }
        drop(stats);

        SyncReport {
            records: count,
            elapsed,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Accumulator, RecordLog};
    use crate::sensors::Reading;
    use crate::storage::load_records;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Blocks every publish until released; counts calls
    struct GatedTarget {
        calls: AtomicUsize,
        gate: Notify,
    }

    impl GatedTarget {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: Notify::new(),
            })
        }
    }

    #[async_trait]
    impl SyncTarget for GatedTarget {
        fn name(&self) -> &str {
            "gated"
        }

        async fn publish(&self, _local_sink: &Path) -> Result<(), SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(())
        }
    }

    struct FailingTarget;

    #[async_trait]
    impl SyncTarget for FailingTarget {
        fn name(&self) -> &str {
            "failing"
        }

        async fn publish(&self, _local_sink: &Path) -> Result<(), SyncError> {
            Err(SyncError::Http("connection refused".into()))
        }
    }

    fn log_with(n: u32) -> RecordLog {
        let mut log = RecordLog::new();
        let mut acc = Accumulator::new(0.12);
        for i in 0..n {
            log.append(acc.absorb(Reading::new(200 + i), 0.1));
        }
        log
    }

    fn manager(target: Arc<dyn SyncTarget>, sink: PathBuf, timeout: Duration) -> SyncManager {
        SyncManager::new(target, sink, timeout, Arc::new(EventBus::new(64)))
    }

    #[tokio::test]
    async fn test_second_trigger_while_in_flight_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let target = GatedTarget::new();
        let sync = manager(target.clone(), dir.path().join("data.csv"), Duration::from_secs(30));
        let log = log_with(5);

        let first = sync.trigger(log.reader());
        assert!(first.is_dispatched());
        assert!(sync.is_in_flight());

        let second = sync.trigger(log.reader());
        assert!(matches!(second, Trigger::Dropped));

        // Let the first cycle reach the target before releasing it
        while target.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        target.gate.notify_one();

        let Trigger::Dispatched(handle) = first else {
            panic!("first trigger was not dispatched");
        };
        let report = handle.await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.records, 5);

        assert_eq!(target.calls.load(Ordering::SeqCst), 1);
        assert!(!sync.is_in_flight());

        let stats = sync.stats();
        assert_eq!(stats.attempts, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.succeeded, 1);
    }

    #[tokio::test]
    async fn test_cycle_persists_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let sink = dir.path().join("data.csv");
        let sync = manager(Arc::new(LocalOnly), sink.clone(), Duration::from_secs(5));
        let log = log_with(12);

        let Trigger::Dispatched(handle) = sync.trigger(log.reader()) else {
            panic!("not dispatched");
        };
        assert!(handle.await.unwrap().is_success());
        assert_eq!(load_records(&sink).unwrap(), log.snapshot());
    }

    #[tokio::test]
    async fn test_failure_is_reported_and_flag_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let events = Arc::new(EventBus::new(16));
        let mut rx = events.subscribe_events();
        let sync = SyncManager::new(
            Arc::new(FailingTarget),
            dir.path().join("data.csv"),
            Duration::from_secs(5),
            events,
        );

        let Trigger::Dispatched(handle) = sync.trigger(log_with(1).reader()) else {
            panic!("not dispatched");
        };
        let report = handle.await.unwrap();
        assert!(matches!(report.result, Err(SyncError::Http(_))));
        assert!(!sync.is_in_flight());
        assert_eq!(sync.stats().failed, 1);
        assert!(sync.stats().last_error.unwrap().contains("connection refused"));

        let event = rx.recv().await.unwrap();
        assert!(matches!(event.payload, EventPayload::SyncFailed { .. }));

        // Next trigger is allowed again
        assert!(sync.trigger(log_with(1).reader()).is_dispatched());
    }

    #[tokio::test]
    async fn test_publish_timeout_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = GatedTarget::new();
        let sync = manager(target, dir.path().join("data.csv"), Duration::from_millis(50));

        let Trigger::Dispatched(handle) = sync.trigger(log_with(3).reader()) else {
            panic!("not dispatched");
        };
        let report = handle.await.unwrap();
        assert!(matches!(report.result, Err(SyncError::Timeout(_))));
        assert!(!sync.is_in_flight());
    }

    #[tokio::test]
    async fn test_unwritable_sink_fails_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let sync = manager(
            Arc::new(LocalOnly),
            dir.path().join("missing/dir/data.csv"),
            Duration::from_secs(5),
        );

        let Trigger::Dispatched(handle) = sync.trigger(log_with(2).reader()) else {
            panic!("not dispatched");
        };
        let report = handle.await.unwrap();
        assert!(matches!(report.result, Err(SyncError::Persistence(_))));
        assert_eq!(sync.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_periodic_triggers_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let sync = Arc::new(manager(
            Arc::new(LocalOnly),
            dir.path().join("data.csv"),
            Duration::from_secs(5),
        ));
        let log = log_with(4);
        let (tx, rx) = broadcast::channel(1);

        let task = tokio::spawn(sync.clone().run_periodic(log.reader(), Duration::from_millis(10), rx));
        tokio::time::sleep(Duration::from_millis(120)).await;
        tx.send(()).unwrap();
        task.await.unwrap();

        assert!(sync.stats().attempts >= 2);
    }
}
