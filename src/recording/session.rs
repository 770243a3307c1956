// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! One monitoring run, from start command to stop command

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::{now_millis, Record, RecordLog, RecordReader};
use crate::core::ConfigError;
use crate::storage;

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    start_time: NaiveDateTime,
    end_time: Option<NaiveDateTime>,
    cost_rate: f64,
    records: RecordLog,
}

impl Session {
    pub fn new(cost_rate: f64) -> Result<Self, ConfigError> {
        Self::starting_at(cost_rate, now_millis())
    }

    pub fn starting_at(cost_rate: f64, start_time: NaiveDateTime) -> Result<Self, ConfigError> {
        if !cost_rate.is_finite() || cost_rate <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "cost_rate must be a positive number, got {}",
                cost_rate
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            start_time,
            end_time: None,
            cost_rate,
            records: RecordLog::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.end_time
    }

    pub fn cost_rate(&self) -> f64 {
        self.cost_rate
    }

    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn append(&mut self, record: Record) {
        self.records.append(record);
    }

    pub fn records(&self) -> &RecordLog {
        &self.records
    }

    pub fn reader(&self) -> RecordReader {
        self.records.reader()
    }

    /// Set the end time. Closing twice keeps the first end time.
    pub fn close(&mut self) {
        self.close_at(now_millis());
    }

    pub fn close_at(&mut self, end_time: NaiveDateTime) {
        if self.end_time.is_none() {
            self.end_time = Some(end_time.max(self.start_time));
        }
    }

    /// `<start>_to_<end>_energy_data.csv`, using now as end while active
    pub fn export_file_name(&self) -> String {
        let end = self.end_time.unwrap_or_else(now_millis);
        storage::export_file_name(self.start_time, end)
    }
}
