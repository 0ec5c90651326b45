// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Markdown plan parsing.
//!
//! The parser only recognizes the annotation grammar documented on the
//! crate root; everything else in the file is narrative and ignored.
//! Markdown checkboxes are read, never written — this module has no write
//! path at all.

use conductor_core::plan::{
    Annotations, NonBlockingVerify, ParallelPhases, Phase, PipelineStart, Plan, SequentialGroup,
};
use conductor_core::task::{TaskDef, TaskId};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// A parse failure, always carrying the offending line number.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: duplicate task id {id}")]
    DuplicateTaskId { line: usize, id: String },

    #[error("line {line}: task {task} depends on itself")]
    SelfDependency { line: usize, task: String },

    #[error("line {line}: task {task} depends on unknown task {dep}")]
    UnknownDependency {
        line: usize,
        task: String,
        dep: String,
    },

    #[error("dependency cycle: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("line {line}: invalid sequential range {raw:?}: {reason}")]
    InvalidSequentialRange {
        line: usize,
        raw: String,
        reason: String,
    },

    #[error("line {line}: sequential range references unknown task {id}")]
    UnknownSequentialTask { line: usize, id: String },

    #[error("line {line}: pipeline-start references unknown task {id}")]
    UnknownPipelineTrigger { line: usize, id: String },

    #[error("line {line}: VERIFY annotation references unknown phase {phase}")]
    UnknownVerifyPhase { line: usize, phase: u32 },

    #[error("could not read plan file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn phase_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^##\s+Phase\s+(\d+):\s+(.+)$").expect("valid regex"))
}

fn task_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-\s+\[[ x]\]\s+(\d+\.\d+)\s+(.+)$").expect("valid regex"))
}

fn dependency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\(depends:\s*(\d+\.\d+(?:\s*,\s*\d+\.\d+)*)\s*\)").expect("valid regex")
    })
}

fn sequential_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Tasks\s+([0-9.,\-\s]+?)\s+are\s+\[SEQUENTIAL\]").expect("valid regex")
    })
}

fn parallel_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Phases\s+([0-9,\-\s]+?)\s+are\s+\[PARALLEL\]").expect("valid regex")
    })
}

fn non_blocking_verify_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:\*\*VERIFY Phase (\d+):\*\*\s*\(non-blocking\)|\*\*VERIFY Phase (\d+) \(non-blocking\):\*\*)",
        )
        .expect("valid regex")
    })
}

fn pipeline_start_inline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\(pipeline-start:\s*when\s+(\d+\.\d+)\s+completes\)").expect("valid regex")
    })
}

fn pipeline_start_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\*\*pipeline-start:\*\*\s+when\s+(\d+\.\d+)\s+completes").expect("valid regex")
    })
}

fn backtick_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`([^`]+)`").expect("valid regex"))
}

/// True if a backticked token looks like a file path rather than, say, a
/// function name or a shell flag.
fn looks_like_path(token: &str) -> bool {
    if token.contains(char::is_whitespace) || token.is_empty() {
        return false;
    }
    if token.contains('/') {
        return true;
    }
    // bare filename with an extension, e.g. `Cargo.toml`
    matches!(token.rsplit_once('.'), Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Parse a plan from a file on disk. `id` is the plan's stable id (the
/// basename without extension).
pub fn parse_plan_file(path: &Path) -> Result<Plan, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "plan".to_string());
    parse_plan_str(&id, path, &content)
}

/// Parse plan markdown already read into memory.
pub fn parse_plan_str(id: &str, path: &Path, content: &str) -> Result<Plan, ParseError> {
    let lines: Vec<&str> = content.lines().collect();

    let mut phases: Vec<Phase> = Vec::new();
    let mut tasks: BTreeMap<TaskId, TaskDef> = BTreeMap::new();
    let mut current_phase: Option<u32> = None;
    let mut pipeline_starts: Vec<PipelineStart> = Vec::new();

    for (idx, raw_line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end();

        if let Some(caps) = phase_heading_re().captures(line) {
            let number: u32 = caps[1].parse().expect("regex guarantees digits");
            let title = caps[2].trim().to_string();
            phases.push(Phase {
                number,
                title: title.clone(),
                task_ids: Vec::new(),
            });
            current_phase = Some(number);

            if let Some(inline) = pipeline_start_inline_re().captures(&title) {
                pipeline_starts.push(PipelineStart {
                    phase: number,
                    trigger: TaskId::new(&inline[1]),
                });
            }
            continue;
        }

        if let Some(caps) = pipeline_start_line_re().captures(line) {
            let Some(phase) = current_phase else {
                continue;
            };
            pipeline_starts.push(PipelineStart {
                phase,
                trigger: TaskId::new(&caps[1]),
            });
            continue;
        }

        if let Some(caps) = task_item_re().captures(line) {
            let id_str = caps[1].to_string();
            let description = caps[2].trim().to_string();
            let task_id = TaskId::new(id_str.clone());

            if tasks.contains_key(&task_id) {
                return Err(ParseError::DuplicateTaskId {
                    line: line_no,
                    id: id_str,
                });
            }

            let phase_number = current_phase.unwrap_or_else(|| {
                id_str
                    .split('.')
                    .next()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0)
            });

            let mut dependencies = BTreeSet::new();
            for cap in dependency_re().captures_iter(&description) {
                for dep in cap[1].split(',') {
                    let dep = dep.trim();
                    if dep == id_str {
                        return Err(ParseError::SelfDependency {
                            line: line_no,
                            task: id_str,
                        });
                    }
                    dependencies.insert(TaskId::new(dep));
                }
            }

            let mut file_refs = BTreeSet::new();
            for cap in backtick_token_re().captures_iter(&description) {
                let token = &cap[1];
                if looks_like_path(token) {
                    file_refs.insert(token.to_string());
                }
            }

            let is_verify = description.to_ascii_uppercase().contains("VERIFY");

            tasks.insert(
                task_id.clone(),
                TaskDef {
                    id: task_id.clone(),
                    phase_number,
                    description,
                    dependencies,
                    file_refs,
                    is_verify,
                },
            );

            if let Some(phase) = phases.iter_mut().find(|p| p.number == phase_number) {
                phase.task_ids.push(task_id);
            }
        }
    }

    // Validate dependencies resolve.
    for task in tasks.values() {
        for dep in &task.dependencies {
            if !tasks.contains_key(dep) {
                let line = task_line_number(&lines, task.id.as_str()).unwrap_or(0);
                return Err(ParseError::UnknownDependency {
                    line,
                    task: task.id.as_str().to_string(),
                    dep: dep.as_str().to_string(),
                });
            }
        }
    }

    detect_cycle(&tasks)?;

    let sequential_groups = parse_sequential_groups(&lines, &tasks)?;
    let parallel_phases = parse_parallel_phases(&lines);
    let non_blocking_verify = parse_non_blocking_verify(&lines, &phases)?;

    for start in &pipeline_starts {
        if !phases.iter().any(|p| p.number == start.phase) {
            return Err(ParseError::UnknownVerifyPhase {
                line: 0,
                phase: start.phase,
            });
        }
        if !tasks.contains_key(&start.trigger) {
            return Err(ParseError::UnknownPipelineTrigger {
                line: 0,
                id: start.trigger.as_str().to_string(),
            });
        }
    }

    Ok(Plan {
        id: id.to_string(),
        path: path.to_path_buf(),
        phases,
        tasks,
        annotations: Annotations {
            sequential_groups,
            pipeline_starts,
            non_blocking_verify,
            parallel_phases,
        },
    })
}

fn task_line_number(lines: &[&str], task_id: &str) -> Option<usize> {
    let needle = format!(" {task_id} ");
    lines.iter().position(|l| l.contains(&needle)).map(|i| i + 1)
}

/// Expand a range expression like `3.1-3.3`, `3.1,3.3`, or `3.1-3.2,3.4`
/// into a concrete ordered list of task ids.
fn expand_task_range(raw: &str, line: usize) -> Result<Vec<TaskId>, ParseError> {
    let mut out = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((from, to)) = part.split_once('-') {
            let from = from.trim();
            let to = to.trim();
            let (from_phase, from_minor) = split_task_id(from, line, raw)?;
            let (to_phase, to_minor) = split_task_id(to, line, raw)?;
            if from_phase != to_phase {
                return Err(ParseError::InvalidSequentialRange {
                    line,
                    raw: raw.to_string(),
                    reason: format!("range spans different phases: {from}-{to}"),
                });
            }
            if from_minor > to_minor {
                return Err(ParseError::InvalidSequentialRange {
                    line,
                    raw: raw.to_string(),
                    reason: format!("range is not increasing: {from}-{to}"),
                });
            }
            for minor in from_minor..=to_minor {
                out.push(TaskId::new(format!("{from_phase}.{minor}")));
            }
        } else {
            let (phase, minor) = split_task_id(part, line, raw)?;
            out.push(TaskId::new(format!("{phase}.{minor}")));
        }
    }
    Ok(out)
}

fn split_task_id(id: &str, line: usize, raw: &str) -> Result<(u32, u32), ParseError> {
    let (phase, minor) = id.split_once('.').ok_or_else(|| ParseError::InvalidSequentialRange {
        line,
        raw: raw.to_string(),
        reason: format!("not a task id: {id}"),
    })?;
    let phase: u32 = phase.parse().map_err(|_| ParseError::InvalidSequentialRange {
        line,
        raw: raw.to_string(),
        reason: format!("not a task id: {id}"),
    })?;
    let minor: u32 = minor.parse().map_err(|_| ParseError::InvalidSequentialRange {
        line,
        raw: raw.to_string(),
        reason: format!("not a task id: {id}"),
    })?;
    Ok((phase, minor))
}

fn parse_sequential_groups(
    lines: &[&str],
    tasks: &BTreeMap<TaskId, TaskDef>,
) -> Result<Vec<SequentialGroup>, ParseError> {
    let mut groups = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        if let Some(caps) = sequential_re().captures(line) {
            let raw = caps[1].trim();
            let task_ids = expand_task_range(raw, line_no)?;
            for id in &task_ids {
                if !tasks.contains_key(id) {
                    return Err(ParseError::UnknownSequentialTask {
                        line: line_no,
                        id: id.as_str().to_string(),
                    });
                }
            }
            groups.push(SequentialGroup { task_ids });
        }
    }
    Ok(groups)
}

fn parse_parallel_phases(lines: &[&str]) -> Vec<ParallelPhases> {
    let mut hints = Vec::new();
    for line in lines {
        if let Some(caps) = parallel_re().captures(line) {
            let raw = caps[1].trim();
            let mut phases = Vec::new();
            for part in raw.split(',') {
                let part = part.trim();
                if let Some((from, to)) = part.split_once('-') {
                    if let (Ok(from), Ok(to)) = (from.trim().parse::<u32>(), to.trim().parse::<u32>()) {
                        phases.extend(from..=to);
                    }
                } else if let Ok(n) = part.parse::<u32>() {
                    phases.push(n);
                }
            }
            if !phases.is_empty() {
                hints.push(ParallelPhases { phases });
            }
        }
    }
    hints
}

fn parse_non_blocking_verify(
    lines: &[&str],
    phases: &[Phase],
) -> Result<Vec<NonBlockingVerify>, ParseError> {
    let mut out = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        if let Some(caps) = non_blocking_verify_re().captures(line) {
            let phase_str = caps.get(1).or_else(|| caps.get(2)).expect("one group matches");
            let phase: u32 = phase_str.as_str().parse().expect("regex guarantees digits");
            if !phases.iter().any(|p| p.number == phase) {
                return Err(ParseError::UnknownVerifyPhase { line: line_no, phase });
            }
            out.push(NonBlockingVerify { phase });
        }
    }
    Ok(out)
}

/// DFS cycle detection with an explicit stack, reporting the full cycle
/// path on failure.
fn detect_cycle(tasks: &BTreeMap<TaskId, TaskDef>) -> Result<(), ParseError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    let mut marks: BTreeMap<TaskId, Mark> = BTreeMap::new();

    fn visit(
        id: &TaskId,
        tasks: &BTreeMap<TaskId, TaskDef>,
        marks: &mut BTreeMap<TaskId, Mark>,
        stack: &mut Vec<TaskId>,
    ) -> Result<(), ParseError> {
        if let Some(Mark::Done) = marks.get(id) {
            return Ok(());
        }
        if marks.get(id) == Some(&Mark::Visiting) {
            let start = stack.iter().position(|t| t == id).unwrap_or(0);
            let mut path: Vec<String> = stack[start..].iter().map(|t| t.as_str().to_string()).collect();
            path.push(id.as_str().to_string());
            return Err(ParseError::Cycle { path });
        }

        marks.insert(id.clone(), Mark::Visiting);
        stack.push(id.clone());

        if let Some(def) = tasks.get(id) {
            for dep in &def.dependencies {
                visit(dep, tasks, marks, stack)?;
            }
        }

        stack.pop();
        marks.insert(id.clone(), Mark::Done);
        Ok(())
    }

    let mut stack = Vec::new();
    for id in tasks.keys() {
        visit(id, tasks, &mut marks, &mut stack)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
