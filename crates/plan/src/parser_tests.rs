use super::*;
use std::path::Path;

fn parse(md: &str) -> Result<conductor_core::plan::Plan, ParseError> {
    parse_plan_str("demo", Path::new("demo.md"), md)
}

#[test]
fn parses_phases_and_tasks() {
    let md = "\
## Phase 1: Setup
- [ ] 1.1 Create the schema
- [ ] 1.2 Seed fixtures (depends: 1.1)

## Phase 2: Build
- [ ] 2.1 Wire the handlers (depends: 1.1, 1.2)
";
    let plan = parse(md).unwrap();
    assert_eq!(plan.phases.len(), 2);
    assert_eq!(plan.tasks.len(), 3);
    let t21 = &plan.tasks[&TaskId::new("2.1")];
    assert!(t21.dependencies.contains(&TaskId::new("1.1")));
    assert!(t21.dependencies.contains(&TaskId::new("1.2")));
}

#[test]
fn extracts_file_references() {
    let md = "\
## Phase 1: Setup
- [ ] 1.1 Edit `src/lib.rs` and `Cargo.toml`
";
    let plan = parse(md).unwrap();
    let t = &plan.tasks[&TaskId::new("1.1")];
    assert!(t.file_refs.contains("src/lib.rs"));
    assert!(t.file_refs.contains("Cargo.toml"));
}

#[test]
fn ignores_non_path_backticks() {
    let md = "\
## Phase 1: Setup
- [ ] 1.1 Run `cargo test` to check things
";
    let plan = parse(md).unwrap();
    let t = &plan.tasks[&TaskId::new("1.1")];
    assert!(t.file_refs.is_empty());
}

#[test]
fn rejects_self_dependency() {
    let md = "\
## Phase 1: Setup
- [ ] 1.1 Do the thing (depends: 1.1)
";
    let err = parse(md).unwrap_err();
    assert!(matches!(err, ParseError::SelfDependency { .. }));
}

#[test]
fn rejects_unknown_dependency() {
    let md = "\
## Phase 1: Setup
- [ ] 1.1 Do the thing (depends: 9.9)
";
    let err = parse(md).unwrap_err();
    assert!(matches!(err, ParseError::UnknownDependency { .. }));
}

#[test]
fn rejects_duplicate_task_id() {
    let md = "\
## Phase 1: Setup
- [ ] 1.1 First
- [ ] 1.1 Second
";
    let err = parse(md).unwrap_err();
    assert!(matches!(err, ParseError::DuplicateTaskId { .. }));
}

#[test]
fn detects_cycle() {
    let md = "\
## Phase 1: Setup
- [ ] 1.1 A (depends: 1.2)
- [ ] 1.2 B (depends: 1.1)
";
    let err = parse(md).unwrap_err();
    match err {
        ParseError::Cycle { path } => {
            assert!(path.contains(&"1.1".to_string()));
            assert!(path.contains(&"1.2".to_string()));
        }
        other => panic!("expected Cycle, got {other:?}"),
    }
}

#[test]
fn parses_sequential_range() {
    let md = "\
## Phase 3: Migrate
- [ ] 3.1 A
- [ ] 3.2 B
- [ ] 3.3 C

Execution Note: Tasks 3.1-3.3 are [SEQUENTIAL] - shared schema file.
";
    let plan = parse(md).unwrap();
    assert_eq!(plan.annotations.sequential_groups.len(), 1);
    let group = &plan.annotations.sequential_groups[0];
    assert_eq!(
        group.task_ids,
        vec![TaskId::new("3.1"), TaskId::new("3.2"), TaskId::new("3.3")]
    );
}

#[test]
fn parses_sequential_list() {
    let md = "\
## Phase 3: Migrate
- [ ] 3.1 A
- [ ] 3.3 C

Tasks 3.1,3.3 are [SEQUENTIAL].
";
    let plan = parse(md).unwrap();
    let group = &plan.annotations.sequential_groups[0];
    assert_eq!(group.task_ids, vec![TaskId::new("3.1"), TaskId::new("3.3")]);
}

#[test]
fn rejects_unknown_sequential_task() {
    let md = "\
## Phase 3: Migrate
- [ ] 3.1 A

Tasks 3.1-3.3 are [SEQUENTIAL].
";
    let err = parse(md).unwrap_err();
    assert!(matches!(err, ParseError::UnknownSequentialTask { .. }));
}

#[test]
fn parses_parallel_phase_hint() {
    let md = "\
## Phase 1: A
- [ ] 1.1 Do it

## Phase 2: B
- [ ] 2.1 Do it too

Phases 1-2 are [PARALLEL].
";
    let plan = parse(md).unwrap();
    assert_eq!(plan.annotations.parallel_phases[0].phases, vec![1, 2]);
}

#[test]
fn parses_non_blocking_verify() {
    let md = "\
## Phase 4: Checks
- [ ] 4.1 VERIFY the build

**VERIFY Phase 4:** (non-blocking)
";
    let plan = parse(md).unwrap();
    assert!(plan.annotations.is_non_blocking_verify(4));
}

#[test]
fn parses_pipeline_start_inline() {
    let md = "\
## Phase 1: First
- [ ] 1.1 Kick things off

## Phase 2: Second (pipeline-start: when 1.1 completes)
- [ ] 2.1 Continue
";
    let plan = parse(md).unwrap();
    assert_eq!(
        plan.annotations.trigger_for_phase(2).map(|t| t.as_str()),
        Some("1.1")
    );
}

#[test]
fn parses_pipeline_start_standalone_line() {
    let md = "\
## Phase 1: First
- [ ] 1.1 Kick things off

## Phase 2: Second
**pipeline-start:** when 1.1 completes
- [ ] 2.1 Continue
";
    let plan = parse(md).unwrap();
    assert_eq!(
        plan.annotations.trigger_for_phase(2).map(|t| t.as_str()),
        Some("1.1")
    );
}

#[test]
fn rejects_unknown_pipeline_trigger() {
    let md = "\
## Phase 1: First
- [ ] 1.1 Kick things off

## Phase 2: Second (pipeline-start: when 9.9 completes)
- [ ] 2.1 Continue
";
    let err = parse(md).unwrap_err();
    assert!(matches!(err, ParseError::UnknownPipelineTrigger { .. }));
}

#[test]
fn never_mutates_checkbox_state() {
    let md = "\
## Phase 1: Setup
- [x] 1.1 Already done
- [ ] 1.2 Not yet (depends: 1.1)
";
    // The parser reads checkbox state from nowhere — it isn't part of Task
    // at all, so there is nothing to accidentally write back.
    let plan = parse(md).unwrap();
    assert_eq!(plan.tasks.len(), 2);
}
