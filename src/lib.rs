// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! WattLog - Power Telemetry Recorder
//!
//! Samples instantaneous power draw on a fixed cadence and keeps:
//! - a cumulative energy (kWh) and cost total per session
//! - a bounded history window for live display
//! - an append-only record log, persisted as CSV
//! - a background sync of that CSV to a local, git or HTTP target
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        WattLog Monitor                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────┐  ┌─────────────┐  ┌───────────┐  ┌───────────┐  │
//! │  │ Power   │→ │ Accumulator │→ │ Record    │→ │ Sync      │  │
//! │  │ Source  │  │ + History   │  │ Log       │  │ Manager   │  │
//! │  └─────────┘  └─────────────┘  └───────────┘  └───────────┘  │
//! │       ↓              ↓               ↓              ↓        │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                       Event Bus                        │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                              ↓                               │
//! │  ┌──────────────┐  ┌───────────────┐  ┌───────────────────┐  │
//! │  │ CSV Storage  │  │ Local / Git   │  │ HTTP Upload       │  │
//! │  └──────────────┘  └───────────────┘  └───────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod recording;
pub mod sensors;
pub mod storage;
pub mod sync;

// Re-exports for convenience
pub use config::Config;
pub use core::{EventBus, Monitor, MonitorError, MonitorState, MonitorStatus};
pub use recording::{Accumulator, HistoryWindow, Record, RecordLog, Session};
pub use sensors::{PowerSimulator, PowerSource, Reading, ReplaySource};
pub use sync::{SyncManager, SyncTarget};

/// WattLog version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WattLog name
pub const NAME: &str = "WattLog";

/// Build info
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: VERSION.to_string(),
        rust_version: env!("CARGO_PKG_RUST_VERSION").to_string(),
        target: std::env::consts::ARCH.to_string(),
        os: std::env::consts::OS.to_string(),
    }
}

/// Build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version string
    pub version: String,
    /// Minimum supported Rust version, empty when unset
    pub rust_version: String,
    /// Target architecture
    pub target: String,
    /// Operating system
    pub os: String,
}
