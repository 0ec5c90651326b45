// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GitAdapter` backed by shelling out to the `git` binary. Every call is an
//! explicit argv, never a shell string.

use crate::adapter::GitAdapter;
use crate::error::GitError;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessGitAdapter;

impl ProcessGitAdapter {
    async fn run(&self, repo: &Path, args: &[&str]) -> Result<std::process::Output, GitError> {
        Command::new("git")
            .args(args)
            .current_dir(repo)
            .output()
            .await
            .map_err(GitError::Spawn)
    }

    async fn run_ok(&self, repo: &Path, args: &[&str]) -> Result<String, GitError> {
        let output = self.run(repo, args).await?;
        if !output.status.success() {
            return Err(GitError::CommandFailed {
                args: args.iter().map(|a| a.to_string()).collect(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8(output.stdout)?.trim().to_string())
    }
}

#[async_trait]
impl GitAdapter for ProcessGitAdapter {
    async fn branch_exists(&self, repo: &Path, branch: &str) -> Result<bool, GitError> {
        let output = self
            .run(
                repo,
                &["show-ref", "--verify", "--quiet", &format!("refs/heads/{branch}")],
            )
            .await?;
        Ok(output.status.success())
    }

    async fn create_branch(&self, repo: &Path, branch: &str) -> Result<(), GitError> {
        self.run_ok(repo, &["checkout", "-b", branch]).await?;
        Ok(())
    }

    async fn commit(&self, repo: &Path, message: &str) -> Result<(), GitError> {
        self.run_ok(repo, &["add", "-A"]).await?;
        self.run_ok(repo, &["commit", "-m", message]).await?;
        Ok(())
    }

    async fn current_branch(&self, repo: &Path) -> Result<String, GitError> {
        self.run_ok(repo, &["rev-parse", "--abbrev-ref", "HEAD"]).await
    }

    async fn has_uncommitted_changes(&self, repo: &Path) -> Result<bool, GitError> {
        let status = self.run_ok(repo, &["status", "--porcelain"]).await?;
        Ok(!status.is_empty())
    }

    async fn stash(&self, repo: &Path) -> Result<(), GitError> {
        self.run_ok(repo, &["stash", "push", "--include-untracked"]).await?;
        Ok(())
    }

    async fn pop(&self, repo: &Path) -> Result<(), GitError> {
        self.run_ok(repo, &["stash", "pop"]).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
