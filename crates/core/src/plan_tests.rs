use super::*;
use crate::task::{TaskDef, TaskId};
use std::collections::BTreeMap;

fn plan_with(tasks: Vec<TaskDef>) -> Plan {
    let mut map = BTreeMap::new();
    for t in tasks {
        map.insert(t.id.clone(), t);
    }
    Plan {
        id: "demo".to_string(),
        path: "demo.md".into(),
        phases: vec![Phase {
            number: 1,
            title: "One".to_string(),
            task_ids: map.keys().cloned().collect(),
        }],
        tasks: map,
        annotations: Annotations::default(),
    }
}

fn def(id: &str, phase: u32) -> TaskDef {
    TaskDef {
        id: TaskId::new(id),
        phase_number: phase,
        description: "x".to_string(),
        dependencies: Default::default(),
        file_refs: Default::default(),
        is_verify: false,
    }
}

#[test]
fn tasks_in_order_sorts_by_phase_then_id() {
    let plan = plan_with(vec![def("2.1", 2), def("1.2", 1), def("1.1", 1)]);
    let ids: Vec<_> = plan.tasks_in_order().into_iter().map(|t| t.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["1.1", "1.2", "2.1"]);
}

#[test]
fn phase_of_looks_up_structural_task() {
    let plan = plan_with(vec![def("3.1", 3)]);
    assert_eq!(plan.phase_of(&TaskId::new("3.1")), Some(3));
    assert_eq!(plan.phase_of(&TaskId::new("9.9")), None);
}

#[test]
fn annotations_find_sequential_group() {
    let mut annotations = Annotations::default();
    annotations.sequential_groups.push(SequentialGroup {
        task_ids: vec![TaskId::new("3.1"), TaskId::new("3.2")],
    });
    assert!(annotations.group_for(&TaskId::new("3.1")).is_some());
    assert!(annotations.group_for(&TaskId::new("9.9")).is_none());
}

#[test]
fn annotations_find_pipeline_start_trigger() {
    let mut annotations = Annotations::default();
    annotations.pipeline_starts.push(PipelineStart {
        phase: 2,
        trigger: TaskId::new("1.1"),
    });
    assert_eq!(annotations.trigger_for_phase(2).map(|t| t.as_str()), Some("1.1"));
    assert_eq!(annotations.trigger_for_phase(3), None);
}

#[test]
fn annotations_non_blocking_verify() {
    let mut annotations = Annotations::default();
    annotations.non_blocking_verify.push(NonBlockingVerify { phase: 4 });
    assert!(annotations.is_non_blocking_verify(4));
    assert!(!annotations.is_non_blocking_verify(5));
}
