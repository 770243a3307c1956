// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Sync target trait and factory

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{GitTarget, HttpTarget};
use crate::config::SyncTargetConfig;
use crate::core::SyncError;

/// External system the persisted sink is published to
#[async_trait]
pub trait SyncTarget: Send + Sync {
    /// Target name, used in logs and events
    fn name(&self) -> &str;

    /// Publish the file at `local_sink`. Cancellation-safe: the sync
    /// manager drops this future when its timeout fires.
    async fn publish(&self, local_sink: &Path) -> Result<(), SyncError>;
}

/// Keeps the local sink only; publishing always succeeds
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalOnly;

#[async_trait]
impl SyncTarget for LocalOnly {
    fn name(&self) -> &str {
        "local"
    }

    async fn publish(&self, local_sink: &Path) -> Result<(), SyncError> {
        debug!("Local-only sync, leaving {:?} in place", local_sink);
        Ok(())
    }
}

/// Build the configured target
pub fn build_target(config: &SyncTargetConfig) -> Result<Arc<dyn SyncTarget>, SyncError> {
    let target: Arc<dyn SyncTarget> = match config {
        SyncTargetConfig::None => Arc::new(LocalOnly),
        SyncTargetConfig::Git {
            repo_dir,
            remote,
            branch,
            commit_message,
        } => Arc::new(GitTarget::new(
            repo_dir.clone(),
            remote.clone(),
            branch.clone(),
            commit_message.clone(),
        )),
        SyncTargetConfig::Http { endpoint } => Arc::new(HttpTarget::new(endpoint)?),
    };
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_local_only_succeeds() {
        let target = build_target(&SyncTargetConfig::None).unwrap();
        assert_eq!(target.name(), "local");
        assert!(target.publish(Path::new("data.csv")).await.is_ok());
    }

    #[test]
    fn test_builds_git_target() {
        let target = build_target(&SyncTargetConfig::Git {
            repo_dir: PathBuf::from("."),
            remote: "origin".into(),
            branch: "main".into(),
            commit_message: "auto update data".into(),
        })
        .unwrap();
        assert_eq!(target.name(), "git");
    }

    #[test]
    fn test_builds_http_target() {
        let target = build_target(&SyncTargetConfig::Http {
            endpoint: "http://127.0.0.1:8080/upload".into(),
        })
        .unwrap();
        assert_eq!(target.name(), "http");
    }
}
