//! In-memory `ControlPlane` fake shared by the route test modules.

use crate::control::{ControlError, ControlPlane};
use crate::dto::{
    PlanDetail, PlanStatusLight, PlanSummary, ResourceEntry, StartRequest, WorktreeEntry,
};
use async_trait::async_trait;
use conductor_core::{Summary, Task, TaskId, TaskStatus};
use std::collections::BTreeSet;
use std::sync::Mutex;

pub struct FakePlan {
    pub plan_id: String,
    pub tasks: Vec<Task>,
    pub current_phase: Option<String>,
    pub findings: Vec<(TaskId, String)>,
    pub log_lines: Vec<String>,
}

pub fn sample_task(id: &str, status: TaskStatus) -> Task {
    Task {
        id: TaskId::new(id),
        phase_number: 1,
        description: format!("task {id}"),
        status,
        started_at: None,
        completed_at: None,
        duration_ms: None,
        retry_count: 0,
        last_error: None,
        last_error_at: None,
        stuck_detected: false,
        notes: None,
        dependencies: BTreeSet::new(),
        dependents: BTreeSet::new(),
        file_refs: BTreeSet::new(),
        is_verify: false,
    }
}

#[derive(Default)]
pub struct FakeControlPlane {
    pub plans: Mutex<Vec<FakePlan>>,
    pub running: Mutex<BTreeSet<String>>,
}

impl FakeControlPlane {
    pub fn with_plan(plan: FakePlan) -> Self {
        Self {
            plans: Mutex::new(vec![plan]),
            running: Mutex::new(BTreeSet::new()),
        }
    }

    fn find(&self, plan_id: &str) -> Option<PlanDetail> {
        let plans = self.plans.lock().unwrap_or_else(|e| e.into_inner());
        plans.iter().find(|p| p.plan_id == plan_id).map(|p| PlanDetail {
            plan_id: p.plan_id.clone(),
            plan_path: std::path::PathBuf::from(format!("{}.plan.md", p.plan_id)),
            current_phase: p.current_phase.clone(),
            summary: Summary::compute(&p.tasks),
            tasks: p.tasks.clone(),
        })
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn list_plans(&self) -> Vec<PlanSummary> {
        let plans = self.plans.lock().unwrap_or_else(|e| e.into_inner());
        plans
            .iter()
            .map(|p| PlanSummary {
                plan_id: p.plan_id.clone(),
                current_phase: p.current_phase.clone(),
                summary: Summary::compute(&p.tasks),
            })
            .collect()
    }

    async fn plan_detail(&self, plan_id: &str) -> Option<PlanDetail> {
        self.find(plan_id)
    }

    async fn plan_status(&self, plan_id: &str) -> Option<PlanStatusLight> {
        let detail = self.find(plan_id)?;
        let active_tasks = detail
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .map(|t| t.id.clone())
            .collect();
        Some(PlanStatusLight {
            plan_id: detail.plan_id,
            current_phase: detail.current_phase,
            summary: detail.summary,
            active_tasks,
        })
    }

    async fn plan_tasks(&self, plan_id: &str) -> Option<Vec<Task>> {
        self.find(plan_id).map(|d| d.tasks)
    }

    async fn finding(&self, plan_id: &str, task_id: &TaskId) -> Option<String> {
        let plans = self.plans.lock().unwrap_or_else(|e| e.into_inner());
        plans
            .iter()
            .find(|p| p.plan_id == plan_id)
            .and_then(|p| p.findings.iter().find(|(id, _)| id == task_id))
            .map(|(_, content)| content.clone())
    }

    async fn logs(&self, plan_id: &str, lines: usize) -> Option<String> {
        let plans = self.plans.lock().unwrap_or_else(|e| e.into_inner());
        plans.iter().find(|p| p.plan_id == plan_id).map(|p| {
            p.log_lines
                .iter()
                .rev()
                .take(lines)
                .rev()
                .cloned()
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    async fn start(&self, plan_id: &str, _req: StartRequest) -> Result<(), ControlError> {
        if self.find(plan_id).is_none() {
            return Err(ControlError::PlanNotFound(plan_id.to_string()));
        }
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if !running.insert(plan_id.to_string()) {
            return Err(ControlError::AlreadyRunning);
        }
        Ok(())
    }

    async fn stop(&self, plan_id: &str, _force: bool) -> Result<(), ControlError> {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if !running.remove(plan_id) {
            return Err(ControlError::NotRunning);
        }
        Ok(())
    }

    async fn pause(&self, plan_id: &str) -> Result<(), ControlError> {
        let running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if !running.contains(plan_id) {
            return Err(ControlError::NotRunning);
        }
        Ok(())
    }

    async fn resume(&self, plan_id: &str) -> Result<(), ControlError> {
        let running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if !running.contains(plan_id) {
            return Err(ControlError::NotRunning);
        }
        Ok(())
    }

    async fn skip_task(&self, plan_id: &str, task_id: &TaskId, _reason: String) -> Result<(), ControlError> {
        if self.find(plan_id).is_none() {
            return Err(ControlError::PlanNotFound(plan_id.to_string()));
        }
        let _ = task_id;
        Ok(())
    }

    async fn retry_task(&self, plan_id: &str, task_id: &TaskId) -> Result<(), ControlError> {
        if self.find(plan_id).is_none() {
            return Err(ControlError::PlanNotFound(plan_id.to_string()));
        }
        let _ = task_id;
        Ok(())
    }

    async fn resources(&self) -> Vec<ResourceEntry> {
        Vec::new()
    }

    async fn worktrees(&self) -> Vec<WorktreeEntry> {
        Vec::new()
    }
}
