// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Fixed-capacity recent-sample window for live display

use std::collections::VecDeque;

use chrono::NaiveDateTime;

use super::HistoryPoint;

/// Default number of points kept for the live chart
pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// FIFO buffer holding at most `capacity` of the most recent points
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    points: VecDeque<HistoryPoint>,
    capacity: usize,
}

impl HistoryWindow {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, timestamp: NaiveDateTime, power_watts: u32) {
        self.points.push_back(HistoryPoint {
            timestamp,
            power_watts,
        });
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Copy of the current contents, oldest first
    pub fn snapshot(&self) -> Vec<HistoryPoint> {
        self.points.iter().copied().collect()
    }

    pub fn reset(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
