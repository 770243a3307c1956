// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Session recording - energy accumulation, history window and record log

mod accumulator;
mod history;
mod log;
mod session;

pub use accumulator::Accumulator;
pub use history::{HistoryWindow, DEFAULT_HISTORY_CAPACITY};
pub use log::{RecordLog, RecordReader};
pub use session::Session;

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Wall-clock format used for persisted timestamps (millisecond precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Decimal places kept for persisted energy values
pub const ENERGY_DECIMALS: i32 = 4;

/// Decimal places kept for persisted cost values
pub const COST_DECIMALS: i32 = 2;

/// One row of the session log. Immutable once appended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub power_watts: u32,
    pub cumulative_energy_kwh: f64,
    pub cost: f64,
}

/// A `(timestamp, power)` pair kept for live display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub power_watts: u32,
}

impl From<&Record> for HistoryPoint {
    fn from(record: &Record) -> Self {
        Self {
            timestamp: record.timestamp,
            power_watts: record.power_watts,
        }
    }
}

/// Current local time truncated to whole milliseconds
pub fn now_millis() -> NaiveDateTime {
    truncate_millis(Local::now().naive_local())
}

pub(crate) fn truncate_millis(ts: NaiveDateTime) -> NaiveDateTime {
    let millis_only = ts.nanosecond() / 1_000_000 * 1_000_000;
    ts.with_nanosecond(millis_only).unwrap_or(ts)
}

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

pub(crate) mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.034_349, 4), 0.0343);
        assert_eq!(round_to(0.004_1, 2), 0.0);
        assert_eq!(round_to(1.005_01, 2), 1.01);
        assert_eq!(round_to(0.0, 4), 0.0);
    }

    #[test]
    fn test_truncate_millis() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_nano_opt(0, 0, 0, 123_456_789)
            .unwrap();
        assert_eq!(truncate_millis(ts).nanosecond(), 123_000_000);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(0, 0, 0, 7)
            .unwrap();
        assert_eq!(ts.format(TIMESTAMP_FORMAT).to_string(), "2024-01-01 00:00:00.007");
    }
}
