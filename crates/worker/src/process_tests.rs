use super::*;
use conductor_core::TaskId;
use std::time::Duration;

fn spec(script: &str, timeout: Duration) -> WorkSpec {
    WorkSpec {
        task_id: TaskId::new("1.1"),
        command: "/bin/sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        cwd: std::env::temp_dir(),
        env: Vec::new(),
        timeout,
    }
}

async fn drain(mut rx: mpsc::Receiver<WorkerEvent>) -> Vec<WorkerEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn successful_process_reports_success_and_parses_markers() {
    let adapter = ProcessAdapter;
    let (tx, rx) = mpsc::channel(32);
    let outcome = adapter
        .run(
            spec("echo TASK_BEGIN 1.1; echo TASK_END 1.1 ok", Duration::from_secs(5)),
            tx,
        )
        .await
        .unwrap();

    assert_eq!(outcome, WorkerOutcome::Succeeded);
    let events = drain(rx).await;
    assert!(events.contains(&WorkerEvent::TaskBegin {
        task_id: TaskId::new("1.1")
    }));
    assert!(events.contains(&WorkerEvent::TaskEnd {
        task_id: TaskId::new("1.1"),
        ok: true,
        message: None,
    }));
}

#[tokio::test]
async fn nonzero_exit_reports_failure() {
    let adapter = ProcessAdapter;
    let (tx, rx) = mpsc::channel(32);
    let outcome = adapter.run(spec("exit 1", Duration::from_secs(5)), tx).await.unwrap();
    drop(rx);
    assert!(matches!(outcome, WorkerOutcome::Failed { .. }));
}

#[tokio::test]
async fn unrecognized_output_is_forwarded_as_a_line() {
    let adapter = ProcessAdapter;
    let (tx, rx) = mpsc::channel(32);
    adapter
        .run(spec("echo building project", Duration::from_secs(5)), tx)
        .await
        .unwrap();
    let events = drain(rx).await;
    assert!(events.contains(&WorkerEvent::Line("building project".to_string())));
}

#[tokio::test]
async fn task_end_err_marker_overrides_a_clean_exit() {
    let adapter = ProcessAdapter;
    let (tx, rx) = mpsc::channel(32);
    let outcome = adapter
        .run(
            spec("echo TASK_END 1.1 err something broke; exit 0", Duration::from_secs(5)),
            tx,
        )
        .await
        .unwrap();
    drop(rx);
    assert_eq!(outcome, WorkerOutcome::Failed { message: Some("something broke".to_string()) });
}

#[tokio::test]
async fn clean_exit_without_a_marker_reports_exit_without_result() {
    let adapter = ProcessAdapter;
    let (tx, rx) = mpsc::channel(32);
    let outcome = adapter.run(spec("exit 0", Duration::from_secs(5)), tx).await.unwrap();
    drop(rx);
    match outcome {
        WorkerOutcome::Failed { message: Some(message) } => {
            assert!(message.contains(EXIT_WITHOUT_RESULT));
        }
        other => panic!("expected a worker_exit_without_result failure, got {other:?}"),
    }
}

#[tokio::test]
async fn marker_for_a_different_task_id_is_ignored() {
    let adapter = ProcessAdapter;
    let (tx, rx) = mpsc::channel(32);
    let outcome = adapter
        .run(spec("echo TASK_END 9.9 ok; exit 0", Duration::from_secs(5)), tx)
        .await
        .unwrap();
    drop(rx);
    match outcome {
        WorkerOutcome::Failed { message: Some(message) } => {
            assert!(message.contains(EXIT_WITHOUT_RESULT));
        }
        other => panic!("expected a worker_exit_without_result failure, got {other:?}"),
    }
}

#[tokio::test]
async fn exceeding_timeout_kills_the_process() {
    let adapter = ProcessAdapter;
    let (tx, rx) = mpsc::channel(32);
    let outcome = adapter
        .run(spec("sleep 30", Duration::from_millis(100)), tx)
        .await
        .unwrap();
    drop(rx);
    assert_eq!(outcome, WorkerOutcome::TimedOut);
}
