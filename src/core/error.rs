// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Error taxonomy for the telemetry pipeline

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("cannot {command} while {state}")]
    InvalidState {
        command: &'static str,
        state: &'static str,
    },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("no session has been started")]
    NoSession,
}

/// Local sink could not be written or read back.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed record on line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

/// A sync cycle failed. Never fatal; the next scheduled trigger retries.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("publish timed out after {0:?}")]
    Timeout(Duration),

    #[error("`{program}` exited with {status}: {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("sync endpoint rejected upload with status {status}")]
    Rejected { status: u16 },

    #[error("could not prepare local sink: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("sink writer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
