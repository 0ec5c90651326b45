use super::*;
use conductor_core::{Annotations, Phase, Plan, TaskDef, TaskId};
use std::collections::BTreeMap;

fn sample_status() -> Status {
    let id = TaskId::new("1.1");
    let task = TaskDef {
        id: id.clone(),
        phase_number: 1,
        description: "do the thing".to_string(),
        dependencies: Default::default(),
        file_refs: Default::default(),
        is_verify: false,
    };
    let mut tasks = BTreeMap::new();
    tasks.insert(id.clone(), task);
    let plan = Plan {
        id: "test-plan".to_string(),
        path: "plan.md".into(),
        phases: vec![Phase {
            number: 1,
            title: "Setup".to_string(),
            task_ids: vec![id],
        }],
        tasks,
        annotations: Annotations::default(),
    };
    Status::initialize(&plan, chrono::Utc::now())
}

#[tokio::test]
async fn round_trips_every_request_variant() {
    let (mut client, mut server) = tokio::io::duplex(4096);

    let requests = vec![
        Request::Status,
        Request::Pause,
        Request::Resume,
        Request::Shutdown { force: true },
        Request::SkipTask {
            id: conductor_core::TaskId::new("1.1"),
            reason: "blocked upstream".to_string(),
        },
        Request::RetryTask {
            id: conductor_core::TaskId::new("1.1"),
        },
    ];

    for req in &requests {
        let data = wire::encode(req).unwrap();
        wire::write_message(&mut client, &data).await.unwrap();
        let got = read_request_default(&mut server).await.unwrap();
        assert_eq!(&got, req);
    }
}

#[tokio::test]
async fn round_trips_a_status_response() {
    let (mut client, mut server) = tokio::io::duplex(1024 * 1024);

    let response = Response::Status {
        status: Box::new(sample_status()),
    };
    write_response_default(&mut client, &response).await.unwrap();

    let data = wire::read_message(&mut server).await.unwrap();
    let decoded: Response = wire::decode(&data).unwrap();
    match decoded {
        Response::Status { status } => assert_eq!(status.plan_id, "test-plan"),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn round_trips_an_error_response() {
    let (mut client, mut server) = tokio::io::duplex(4096);

    let response = Response::Error {
        code: ErrorCode::UnknownTask,
        message: "no such task 9.9".to_string(),
    };
    write_response_default(&mut client, &response).await.unwrap();

    let data = wire::read_message(&mut server).await.unwrap();
    let decoded: Response = wire::decode(&data).unwrap();
    match decoded {
        Response::Error { code, message } => {
            assert_eq!(code, ErrorCode::UnknownTask);
            assert!(message.contains("9.9"));
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn read_request_times_out_when_nothing_arrives() {
    let (_client, mut server) = tokio::io::duplex(64);
    let err = read_request(&mut server, Duration::from_millis(20)).await.unwrap_err();
    assert!(matches!(err, ProtocolError::Timeout));
}
