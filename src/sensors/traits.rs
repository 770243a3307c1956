// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Reading source traits and common types

use serde::{Deserialize, Serialize};

/// A single instantaneous power reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub power_watts: u32,
}

impl Reading {
    pub fn new(power_watts: u32) -> Self {
        Self { power_watts }
    }
}

impl From<u32> for Reading {
    fn from(power_watts: u32) -> Self {
        Self::new(power_watts)
    }
}

/// Anything that can produce one power reading per tick.
///
/// `sample` runs on the sampling path, so implementations must return
/// within a tick interval and must not perform blocking I/O. A real meter
/// driver should buffer its acquisitions elsewhere and hand out the latest
/// value here.
pub trait PowerSource: Send {
    /// Source identifier, used in logs
    fn id(&self) -> &str;

    /// Produce the reading for the current tick
    fn sample(&mut self) -> Reading;
}

impl<S: PowerSource + ?Sized> PowerSource for Box<S> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn sample(&mut self) -> Reading {
        (**self).sample()
    }
}
