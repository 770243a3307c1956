// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Git push sync target

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::SyncTarget;
use crate::core::SyncError;

/// Commits the sink into a working tree and pushes it to a remote.
///
/// Credentials come from the git configuration of `repo_dir`.
pub struct GitTarget {
    repo_dir: PathBuf,
    remote: String,
    branch: String,
    commit_message: String,
}

impl GitTarget {
    pub fn new(repo_dir: PathBuf, remote: String, branch: String, commit_message: String) -> Self {
        Self {
            repo_dir,
            remote,
            branch,
            commit_message,
        }
    }

    async fn git(&self, args: &[&str]) -> Result<Output, SyncError> {
        debug!("git {}", args.join(" "));
        Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| SyncError::Spawn {
                program: "git".to_string(),
                source,
            })
    }

    async fn git_checked(&self, args: &[&str]) -> Result<Output, SyncError> {
        let output = self.git(args).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(command_error(args, &output))
        }
    }
}

fn command_error(args: &[&str], output: &Output) -> SyncError {
    SyncError::Command {
        program: format!("git {}", args.join(" ")),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

#[async_trait]
impl SyncTarget for GitTarget {
    fn name(&self) -> &str {
        "git"
    }

    async fn publish(&self, local_sink: &Path) -> Result<(), SyncError> {
        // Relative sinks are resolved against our cwd, not the repository
        let sink = std::fs::canonicalize(local_sink)
            .unwrap_or_else(|_| local_sink.to_path_buf())
            .to_string_lossy()
            .into_owned();

        self.git_checked(&["add", "--", sink.as_str()]).await?;

        // Exits non-zero when nothing changed since the last push
        let commit = self.git(&["commit", "-m", self.commit_message.as_str()]).await?;
        if !commit.status.success() {
            debug!("git commit made no commit: {}", String::from_utf8_lossy(&commit.stdout).trim());
        }

        self.git_checked(&["push", self.remote.as_str(), self.branch.as_str()]).await?;
        info!("Pushed {:?} to {}/{}", local_sink, self.remote, self.branch);
        Ok(())
    }
}
