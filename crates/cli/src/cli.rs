// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line surface. Flat flags, no subcommands: one binary that either
//! drives a plan to completion or inspects/controls other running instances.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "conductor", version, about = "Plan execution orchestrator")]
pub struct Args {
    /// Path to the plan file to execute.
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Maximum number of tasks to run concurrently.
    #[arg(long, default_value_t = 4)]
    pub max_parallel: usize,

    /// Stop after this many scheduling iterations (0 = unbounded).
    #[arg(long, default_value_t = 0)]
    pub max_iterations: u64,

    /// Per-task timeout in seconds before it is marked failed.
    #[arg(long, default_value_t = 600)]
    pub timeout_per_task: u64,

    /// Also serve the push API over HTTP.
    #[arg(long)]
    pub api_server: bool,

    /// Host to bind the push API to (only with --api-server).
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the push API to (only with --api-server).
    #[arg(long, default_value_t = 4270)]
    pub port: u16,

    /// Detach and run in the background, printing the instance id on start.
    #[arg(long)]
    pub daemon: bool,

    /// List registered orchestrator instances and exit.
    #[arg(long)]
    pub list: bool,

    /// Print the status of one running instance and exit.
    #[arg(long, value_name = "INSTANCE_ID")]
    pub status: Option<String>,

    /// Ask one running instance to stop.
    #[arg(long, value_name = "INSTANCE_ID")]
    pub stop: Option<String>,

    /// Ask every running instance to stop.
    #[arg(long)]
    pub shutdown_all: bool,
}

impl Args {
    /// True when this invocation only inspects/controls other instances and
    /// never needs to parse a plan itself.
    pub fn is_query_mode(&self) -> bool {
        self.list || self.status.is_some() || self.stop.is_some() || self.shutdown_all
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
