// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Sampling loop - source → accumulator → history window + record log

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use super::event_bus::{EventBus, Totals};
use super::scheduler::periodic;
use crate::recording::{Accumulator, HistoryWindow, Record, Session};
use crate::sensors::PowerSource;

/// Source handle shared between the monitor and the running loop
pub type SharedSource = Arc<Mutex<Box<dyn PowerSource>>>;

/// Per-session sampling state. Owns the session while it runs.
pub struct SamplingLoop {
    source: SharedSource,
    accumulator: Accumulator,
    session: Session,
    history: Arc<Mutex<HistoryWindow>>,
    events: Arc<EventBus>,
    interval: Duration,
    ticks: u64,
}

impl SamplingLoop {
    pub fn new(
        source: SharedSource,
        session: Session,
        history: Arc<Mutex<HistoryWindow>>,
        events: Arc<EventBus>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            accumulator: Accumulator::new(session.cost_rate()),
            session,
            history,
            events,
            interval,
            ticks: 0,
        }
    }

    /// One sample-and-record step. No I/O.
    pub fn tick(&mut self) -> Record {
        let reading = self.source.lock().sample();
        let record = self
            .accumulator
            .absorb(reading, self.interval.as_secs_f64());

        self.history.lock().push(record.timestamp, record.power_watts);
        self.session.append(record);
        self.ticks += 1;

        self.events.publish_totals(Totals {
            timestamp: record.timestamp,
            power_watts: record.power_watts,
            energy_kwh: self.accumulator.energy_kwh(),
            cost: self.accumulator.cost(),
        });

        trace!(
            "tick {} power={}W energy={:.6}kWh",
            self.ticks,
            record.power_watts,
            self.accumulator.energy_kwh()
        );
        record
    }

    /// Tick every interval until shutdown; late ticks are caught up, not skipped
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Self {
        let mut ticker = periodic(self.interval, MissedTickBehavior::Burst);
        debug!(
            "Sampling session {} every {:?}",
            self.session.id(),
            self.interval
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }

        debug!("Sampling loop finished after {} ticks", self.ticks);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn into_session(self) -> Session {
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::ReplaySource;

    fn replay(readings: &[u32]) -> SharedSource {
        let source: Box<dyn PowerSource> = Box::new(ReplaySource::new("test", readings.to_vec()));
        Arc::new(Mutex::new(source))
    }

    fn sampling_loop(readings: &[u32], capacity: usize, interval_ms: u64) -> SamplingLoop {
        SamplingLoop::new(
            replay(readings),
            Session::new(0.12).unwrap(),
            Arc::new(Mutex::new(HistoryWindow::new(capacity))),
            Arc::new(EventBus::new(64)),
            Duration::from_millis(interval_ms),
        )
    }

    #[test]
    fn test_three_tick_scenario() {
        let mut lp = sampling_loop(&[1000, 2000, 3000], 500, 100);
        let records: Vec<_> = (0..3).map(|_| lp.tick()).collect();

        let expected = [0.000_027_8, 0.000_083_3, 0.000_166_7];
        assert!((lp.accumulator().energy_kwh() - expected[2]).abs() < 1e-7);
        assert_eq!(
            records.iter().map(|r| r.cumulative_energy_kwh).collect::<Vec<_>>(),
            vec![0.0, 0.0001, 0.0002]
        );
        assert_eq!(lp.history.lock().len(), 3);
        assert_eq!(lp.session().records().len(), 3);
        assert_eq!(lp.ticks(), 3);
        assert!((lp.accumulator().cost() - expected[2] * 0.12).abs() < 1e-8);
    }

    #[test]
    fn test_history_is_bounded_but_log_is_not() {
        let mut lp = sampling_loop(&[500], 2, 100);
        for _ in 0..10 {
            lp.tick();
        }
        assert_eq!(lp.history.lock().len(), 2);
        assert_eq!(lp.session().records().len(), 10);
    }

    #[test]
    fn test_tick_publishes_totals() {
        let lp_events = Arc::new(EventBus::new(16));
        let mut rx = lp_events.subscribe_totals();
        let mut lp = SamplingLoop::new(
            replay(&[3600]),
            Session::new(0.5).unwrap(),
            Arc::new(Mutex::new(HistoryWindow::new(10))),
            lp_events,
            Duration::from_secs(1),
        );

        lp.tick();
        let totals = rx.try_recv().unwrap();
        assert_eq!(totals.power_watts, 3600);
        assert!((totals.energy_kwh - 0.001).abs() < 1e-12);
        assert!((totals.cost - 0.0005).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let lp = sampling_loop(&[1000, 4000], 500, 5);
        let (tx, rx) = broadcast::channel(1);
        let task = tokio::spawn(lp.run(rx));

        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(()).unwrap();
        let lp = task.await.unwrap();

        let records = lp.session().records().snapshot();
        assert!(!records.is_empty());
        assert_eq!(records.len() as u64, lp.ticks());
        assert!(records
            .windows(2)
            .all(|w| w[0].cumulative_energy_kwh <= w[1].cumulative_energy_kwh
                && w[0].timestamp <= w[1].timestamp));
    }
}
