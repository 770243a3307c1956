// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Replays a fixed sequence of readings, cycling when exhausted

use std::path::Path;

use super::{PowerSource, Reading};
use crate::core::PersistenceError;
use crate::storage;

pub struct ReplaySource {
    id: String,
    readings: Vec<Reading>,
    cursor: usize,
}

impl ReplaySource {
    pub fn new(id: &str, readings: impl IntoIterator<Item = u32>) -> Self {
        Self {
            id: id.to_string(),
            readings: readings.into_iter().map(Reading::new).collect(),
            cursor: 0,
        }
    }

    /// Replay the power column of a previously persisted session
    pub fn from_csv(path: &Path) -> Result<Self, PersistenceError> {
        let records = storage::load_records(path)?;
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "replay".to_string());

        Ok(Self::new(&id, records.iter().map(|r| r.power_watts)))
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl PowerSource for ReplaySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn sample(&mut self) -> Reading {
        if self.readings.is_empty() {
            return Reading::new(0);
        }

        let reading = self.readings[self.cursor];
        self.cursor = (self.cursor + 1) % self.readings.len();
        reading
    }
}
