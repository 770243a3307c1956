// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Power simulator for demo/testing

use rand::prelude::*;
use rand_distr::Uniform;

use super::{PowerSource, Reading};

/// Default lower bound of the simulated load, in watts
pub const DEFAULT_MIN_WATTS: u32 = 200;

/// Default upper bound of the simulated load, in watts
pub const DEFAULT_MAX_WATTS: u32 = 5000;

/// Draws power values uniformly from an inclusive watt range
pub struct PowerSimulator {
    id: String,
    range: Uniform<u32>,
    rng: StdRng,
}

impl PowerSimulator {
    pub fn new(id: &str, min_watts: u32, max_watts: u32) -> Self {
        Self::with_rng(id, min_watts, max_watts, StdRng::from_entropy())
    }

    /// Reproducible simulator for tests and demos
    pub fn seeded(id: &str, min_watts: u32, max_watts: u32, seed: u64) -> Self {
        Self::with_rng(id, min_watts, max_watts, StdRng::seed_from_u64(seed))
    }

    fn with_rng(id: &str, min_watts: u32, max_watts: u32, rng: StdRng) -> Self {
        let (lo, hi) = if min_watts <= max_watts {
            (min_watts, max_watts)
        } else {
            (max_watts, min_watts)
        };

        Self {
            id: id.to_string(),
            range: Uniform::new_inclusive(lo, hi),
            rng,
        }
    }
}

impl Default for PowerSimulator {
    fn default() -> Self {
        Self::new("simulator", DEFAULT_MIN_WATTS, DEFAULT_MAX_WATTS)
    }
}

impl PowerSource for PowerSimulator {
    fn id(&self) -> &str {
        &self.id
    }

    fn sample(&mut self) -> Reading {
        Reading::new(self.rng.sample(self.range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_stay_in_range() {
        let mut sim = PowerSimulator::seeded("sim", DEFAULT_MIN_WATTS, DEFAULT_MAX_WATTS, 7);

        for _ in 0..10_000 {
            let reading = sim.sample();
            assert!((200..=5000).contains(&reading.power_watts));
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = PowerSimulator::seeded("a", 200, 5000, 42);
        let mut b = PowerSimulator::seeded("b", 200, 5000, 42);

        let xs: Vec<_> = (0..32).map(|_| a.sample()).collect();
        let ys: Vec<_> = (0..32).map(|_| b.sample()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_inverted_bounds_are_normalized() {
        let mut sim = PowerSimulator::seeded("sim", 900, 100, 1);

        for _ in 0..1000 {
            let w = sim.sample().power_watts;
            assert!((100..=900).contains(&w));
        }
    }

    #[test]
    fn test_degenerate_range() {
        let mut sim = PowerSimulator::seeded("sim", 750, 750, 3);
        assert_eq!(sim.sample().power_watts, 750);
    }
}
