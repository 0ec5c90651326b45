// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan execution orchestrator entry point: parses a plan, drives it to
//! completion against real worker processes, and optionally exposes the
//! push API and control socket while it runs.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod cli;
mod commands;
mod config;
mod control;
mod engine;
mod error;
mod ipc_listener;
mod logging;
mod state;

use clap::Parser;
use cli::Args;
use conductor_core::{Event, EventPayload, InstanceId, RunId};
use conductor_worker::ProcessAdapter;
use error::CliError;
use state::OrchestratorState;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let code = match run(args).await {
        Ok(()) => error::EXIT_OK,
        Err(err) => {
            eprintln!("conductor: {err}");
            err.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(args: Args) -> Result<(), CliError> {
    if args.list {
        return commands::list().await;
    }
    if let Some(instance_id) = &args.status {
        return commands::status(instance_id).await;
    }
    if let Some(instance_id) = &args.stop {
        return commands::stop(instance_id).await;
    }
    if args.shutdown_all {
        return commands::shutdown_all().await;
    }

    let plan_path = args
        .plan
        .as_ref()
        .ok_or_else(|| CliError::InvalidArguments("--plan is required unless a query flag is given".to_string()))?;
    if !plan_path.exists() {
        return Err(CliError::PlanNotFound(plan_path.display().to_string()));
    }

    run_plan(args, plan_path.clone()).await
}

async fn run_plan(args: Args, plan_path: std::path::PathBuf) -> Result<(), CliError> {
    let plan = conductor_plan::parse_plan_file(&plan_path)?;
    let config = config::Config::resolve(&plan.id)?;

    std::fs::create_dir_all(&config.plan_dir)?;
    std::fs::create_dir_all(config.findings_dir())?;
    std::fs::create_dir_all(config.logs_dir())?;
    std::fs::create_dir_all(&config.runtime_dir)?;
    std::fs::create_dir_all(config.registry_dir())?;

    let log_path = config::log_path(&config);
    rotate_log_if_needed(&log_path);
    let _log_guard = logging::init(&log_path)?;

    let now = chrono::Utc::now();
    let (mut status, recovery) = conductor_status::load_or_recover(
        &conductor_status::status_path(&config.plan_dir),
        &plan,
        now,
    )?;

    let events = conductor_events::EventBus::default();
    match recovery {
        conductor_status::RecoverySource::Primary => {}
        conductor_status::RecoverySource::Backup => {
            events.publish(Event::new(plan.id.clone(), now, EventPayload::RecoveryFromBackup));
        }
        conductor_status::RecoverySource::RebuiltFromPlan => {
            events.publish(Event::new(plan.id.clone(), now, EventPayload::RecoveryRebuilt));
        }
    }

    let instance_id = InstanceId::new(Uuid::new_v4().to_string());
    conductor_registry::register(config.registry_dir(), &plan.id, instance_id.clone(), now).map_err(
        |err| match err {
            conductor_registry::RegistryError::AlreadyRunning { existing_pid, .. } => {
                CliError::AlreadyRunning { existing_pid }
            }
            other => CliError::Registry(other),
        },
    )?;

    let run_id = RunId::new(Uuid::new_v4().to_string());
    conductor_status::start_run(&mut status, run_id.clone(), now);

    let state = Arc::new(OrchestratorState::new(
        plan,
        plan_path,
        config,
        status,
        events.clone(),
        instance_id.clone(),
    ));

    let socket = ipc_listener::bind(&state.config.socket_path)?;
    let control = Arc::new(control::LocalControl::new(Arc::clone(&state)));
    let listener_handle = tokio::spawn(ipc_listener::run(socket, Arc::clone(&control), state.shutdown_token()));

    let mut http_handle = None;
    if args.api_server {
        let control: Arc<dyn conductor_http::ControlPlane> = control.clone() as Arc<dyn conductor_http::ControlPlane>;
        let events = events.clone();
        let host = args.host.clone();
        let port = args.port;
        http_handle = Some(tokio::spawn(async move {
            if let Err(err) = conductor_http::run_server(control, events, &host, port).await {
                error!(error = %err, "push server exited with an error");
            }
        }));
    }

    install_signal_forwarding(Arc::clone(&state));

    if args.daemon {
        println!("{instance_id}");
    }

    let worker: Arc<dyn conductor_worker::WorkerAdapter> = Arc::new(ProcessAdapter::default());
    let options = engine::EngineOptions {
        max_parallel: args.max_parallel,
        max_iterations: args.max_iterations,
        timeout_per_task: std::time::Duration::from_secs(args.timeout_per_task),
    };

    let exit = engine::run(Arc::clone(&state), worker, options).await;

    let now = chrono::Utc::now();
    state.with_status_mut(|status| {
        conductor_status::complete_run(status, &run_id, now);
        let _ = conductor_status::save(&conductor_status::status_path(&state.config.plan_dir), status, now);
    });

    if let Err(err) = conductor_registry::unregister(state.config.registry_dir(), state.plan_id(), &instance_id) {
        warn!(error = %err, "failed to unregister instance on exit");
    }

    listener_handle.abort();
    if let Some(handle) = http_handle {
        handle.abort();
    }

    print_summary(&state, &exit);
    Ok(())
}

fn install_signal_forwarding(state: Arc<OrchestratorState>) {
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(err) => {
                warn!(error = %err, "failed to install SIGINT handler");
                return;
            }
        };
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("received SIGINT, shutting down"),
        }
        state.request_shutdown();
    });
}

fn print_summary(state: &OrchestratorState, exit: &engine::EngineExit) {
    state.with_status(|status| {
        println!(
            "{}: {} completed, {} failed, {} skipped, {} pending (of {})",
            state.plan_id(),
            status.summary.completed,
            status.summary.failed,
            status.summary.skipped,
            status.summary.pending,
            status.summary.total,
        );
        for task in &status.tasks {
            if task.status == conductor_core::TaskStatus::Failed {
                if let Some(error) = &task.last_error {
                    println!("  {}: {error}", task.id);
                }
            }
        }
    });
    match exit {
        engine::EngineExit::Finished => {}
        engine::EngineExit::IterationLimitReached => println!("stopped: --max-iterations reached"),
        engine::EngineExit::StoppedByRequest => println!("stopped: shutdown requested"),
    }
}

const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

fn rotate_log_if_needed(log_path: &std::path::Path) {
    let Ok(metadata) = std::fs::metadata(log_path) else {
        return;
    };
    if metadata.len() < MAX_LOG_BYTES {
        return;
    }
    let rotated = log_path.with_extension("log.1");
    let _ = std::fs::rename(log_path, rotated);
}
