use super::*;
use crate::task::TaskId;

#[test]
fn type_name_matches_spec_vocabulary() {
    let now = chrono::Utc::now();
    let event = Event::new("p1", now, EventPayload::TaskStarted { task_id: TaskId::new("1.1") });
    assert_eq!(event.type_name(), "task.started");

    let event = Event::new("p1", now, EventPayload::BusDropped { count: 3 });
    assert_eq!(event.type_name(), "bus.dropped");
}

#[test]
fn payload_serializes_with_tag() {
    let now = chrono::Utc::now();
    let event = Event::new(
        "p1",
        now,
        EventPayload::TaskFailed {
            task_id: TaskId::new("1.1"),
            error: "boom".to_string(),
        },
    );
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "task_failed");
    assert_eq!(value["plan_id"], "p1");
    assert_eq!(value["error"], "boom");
}

#[test]
fn round_trips_through_json() {
    let now = chrono::Utc::now();
    let event = Event::new("p1", now, EventPayload::OrchestratorShutdown { reason: "done".into(), exit_code: 0 });
    let json = serde_json::to_string(&event).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back.type_name(), "orchestrator.shutdown");
}
