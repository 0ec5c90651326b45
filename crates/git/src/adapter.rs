// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seam task execution calls through to touch a worktree. Provides only
//! the primitives named below; branching/merge policy lives above this
//! crate.

use crate::error::GitError;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait GitAdapter: Send + Sync + 'static {
    async fn branch_exists(&self, repo: &Path, branch: &str) -> Result<bool, GitError>;
    async fn create_branch(&self, repo: &Path, branch: &str) -> Result<(), GitError>;
    async fn commit(&self, repo: &Path, message: &str) -> Result<(), GitError>;
    async fn current_branch(&self, repo: &Path) -> Result<String, GitError>;
    async fn has_uncommitted_changes(&self, repo: &Path) -> Result<bool, GitError>;
    async fn stash(&self, repo: &Path) -> Result<(), GitError>;
    async fn pop(&self, repo: &Path) -> Result<(), GitError>;
}
