// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Append-only record log backing a session

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Record;
use crate::core::PersistenceError;
use crate::storage;

/// Write side of the session log. Only the sampling loop holds one.
#[derive(Debug, Default)]
pub struct RecordLog {
    records: Arc<RwLock<Vec<Record>>>,
}

/// Read-only handle for snapshotting the log from other tasks
#[derive(Debug, Clone)]
pub struct RecordReader {
    records: Arc<RwLock<Vec<Record>>>,
}

impl RecordLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: Record) {
        self.records.write().push(record);
    }

    pub fn reader(&self) -> RecordReader {
        RecordReader {
            records: Arc::clone(&self.records),
        }
    }

    pub fn snapshot(&self) -> Vec<Record> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn last(&self) -> Option<Record> {
        self.records.read().last().copied()
    }

    /// Write a snapshot as CSV to `destination`, returning the row count
    pub fn persist(&self, destination: &Path) -> Result<usize, PersistenceError> {
        self.reader().persist(destination)
    }
}

impl RecordReader {
    /// Consistent prefix of the log as of this call
    pub fn snapshot(&self) -> Vec<Record> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn last(&self) -> Option<Record> {
        self.records.read().last().copied()
    }

    pub fn persist(&self, destination: &Path) -> Result<usize, PersistenceError> {
        let snapshot = self.snapshot();
        storage::persist_records(destination, &snapshot)?;
        Ok(snapshot.len())
    }
}
