// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Energy and cost accumulation

use chrono::NaiveDateTime;

use super::{now_millis, round_to, Record, COST_DECIMALS, ENERGY_DECIMALS};
use crate::sensors::Reading;

const WATTS_PER_KILOWATT: f64 = 1000.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Integrates power readings into cumulative kWh and cost.
///
/// Full precision is kept internally; only the emitted [`Record`]s are
/// rounded, so rounding never feeds back into later steps.
#[derive(Debug, Clone)]
pub struct Accumulator {
    energy_kwh: f64,
    cost_rate: f64,
    last_timestamp: Option<NaiveDateTime>,
}

impl Accumulator {
    pub fn new(cost_rate: f64) -> Self {
        Self {
            energy_kwh: 0.0,
            cost_rate,
            last_timestamp: None,
        }
    }

    /// Unrounded cumulative energy in kWh
    pub fn energy_kwh(&self) -> f64 {
        self.energy_kwh
    }

    /// Unrounded cumulative cost
    pub fn cost(&self) -> f64 {
        self.energy_kwh * self.cost_rate
    }

    pub fn cost_rate(&self) -> f64 {
        self.cost_rate
    }

    /// Fold one reading covering `dt_seconds` into the totals, stamped now
    pub fn absorb(&mut self, reading: Reading, dt_seconds: f64) -> Record {
        self.absorb_at(reading, dt_seconds, now_millis())
    }

    /// Same as [`absorb`](Self::absorb) with an explicit timestamp.
    ///
    /// Timestamps never go backwards within one accumulator: a clock that
    /// steps back is clamped to the previous record's time.
    pub fn absorb_at(&mut self, reading: Reading, dt_seconds: f64, at: NaiveDateTime) -> Record {
        if dt_seconds.is_finite() && dt_seconds > 0.0 {
            let delta_kwh =
                reading.power_watts as f64 / WATTS_PER_KILOWATT / SECONDS_PER_HOUR * dt_seconds;
            self.energy_kwh += delta_kwh;
        }

        let timestamp = match self.last_timestamp {
            Some(last) if at < last => last,
            _ => at,
        };
        self.last_timestamp = Some(timestamp);

        Record {
            timestamp,
            power_watts: reading.power_watts,
            cumulative_energy_kwh: round_to(self.energy_kwh, ENERGY_DECIMALS),
            cost: round_to(self.cost(), COST_DECIMALS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(0, 0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_three_tick_scenario() {
        let mut acc = Accumulator::new(0.12);
        let expected = [0.000_027_78, 0.000_083_33, 0.000_166_67];

        for (i, watts) in [1000u32, 2000, 3000].into_iter().enumerate() {
            acc.absorb(Reading::new(watts), 0.1);
            assert!((acc.energy_kwh() - expected[i]).abs() < 1e-8);
            assert!((acc.cost() - expected[i] * 0.12).abs() < 1e-9);
        }
    }

    #[test]
    fn test_matches_closed_form_sum() {
        let mut acc = Accumulator::new(0.2);
        let powers: Vec<u32> = (0..1000).map(|i| 200 + (i * 37) % 4800).collect();
        let dt = 0.25;

        let mut previous = 0.0;
        for &p in &powers {
            let record = acc.absorb(Reading::new(p), dt);
            assert!(record.cumulative_energy_kwh >= previous);
            previous = record.cumulative_energy_kwh;
        }

        let expected: f64 = powers.iter().map(|&p| p as f64 / 1000.0 / 3600.0 * dt).sum();
        assert!((acc.energy_kwh() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_record_is_rounded_but_state_is_not() {
        let mut acc = Accumulator::new(0.12);

        // 100 ticks of 1000 W at 0.1 s: each record alone rounds to ~0, the sum must not
        let mut last = None;
        for _ in 0..100 {
            last = Some(acc.absorb(Reading::new(1000), 0.1));
        }
        let record = last.unwrap();

        let exact = 100.0 * 1000.0 / 1000.0 / 3600.0 * 0.1;
        assert!((acc.energy_kwh() - exact).abs() < 1e-12);
        assert_eq!(record.cumulative_energy_kwh, round_to(exact, 4));
        assert_eq!(record.cost, round_to(exact * 0.12, 2));
    }

    #[test]
    fn test_cost_matches_rounded_product() {
        let mut acc = Accumulator::new(0.31);
        for i in 0..500u32 {
            let record = acc.absorb(Reading::new(4000 + i), 3600.0);
            assert_eq!(record.cost, round_to(acc.energy_kwh() * 0.31, 2));
        }
    }

    #[test]
    fn test_non_positive_dt_adds_nothing() {
        let mut acc = Accumulator::new(0.12);
        acc.absorb(Reading::new(5000), 0.0);
        acc.absorb(Reading::new(5000), -1.0);
        acc.absorb(Reading::new(5000), f64::NAN);
        assert_eq!(acc.energy_kwh(), 0.0);
    }

    #[test]
    fn test_timestamps_never_go_backwards() {
        let mut acc = Accumulator::new(0.12);
        let first = acc.absorb_at(Reading::new(100), 0.1, t0());
        let stepped_back = acc.absorb_at(Reading::new(100), 0.1, t0() - Duration::seconds(5));
        let later = acc.absorb_at(Reading::new(100), 0.1, t0() + Duration::milliseconds(100));

        assert_eq!(stepped_back.timestamp, first.timestamp);
        assert!(later.timestamp > first.timestamp);
    }
}
