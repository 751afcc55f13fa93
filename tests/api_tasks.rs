//! # Integration Tests: Task Polling
//!
//! ## What is tested
//! - task_href from an action resolves to the queued task
//! - GET /api/tasks lists every queued task
//! - Unknown task id → 404 error envelope
//!
//! ## Expected outcome
//! - Tasks stay `queued`; nothing in the agent executes them

mod common;

use common::*;
use serde_json::json;
use vm_snapshot_agent::inventory::ParentKind;
use warp::http::StatusCode;

#[tokio::test]
async fn test_poll_task_href() {
    let fx = Fixture::new();
    let (_, body) = fx
        .post(
            &snapshot_path(ParentKind::Vm, &fx.vm, &fx.vm_snapshot),
            json!({"action": "revert"}),
        )
        .await;
    let task_id = body["task_id"].as_str().unwrap().to_string();
    let task_href = body["task_href"].as_str().unwrap();
    let path = task_href.strip_prefix(BASE_URL).unwrap();

    let (status, task) = fx.get(path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["task_id"], task_id);
    assert_eq!(task["href"], task_href);
    assert_eq!(task["status"], "queued");
    assert_eq!(task["operation"], "revert_to_snapshot");
    assert_eq!(task["target"]["parent_kind"], "vm");
    assert_eq!(task["target"]["parent_id"], fx.vm.id);
    assert_eq!(task["target"]["snapshot_id"], fx.vm_snapshot.id);
}

#[tokio::test]
async fn test_list_tasks() {
    let fx = Fixture::new();
    fx.post(&snapshots_path(ParentKind::Vm, &fx.vm), json!({"name": "a"}))
        .await;
    fx.delete(&snapshot_path(ParentKind::Instance, &fx.instance, &fx.instance_snapshot))
        .await;

    let (status, body) = fx.get("/api/tasks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "tasks");
    assert_eq!(body["count"], 2);

    let hrefs: Vec<&str> = body["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["href"].as_str().unwrap())
        .collect();
    for task in fx.tasks.list_tasks() {
        assert!(hrefs.contains(&format!("{}/api/tasks/{}", BASE_URL, task.task_id).as_str()));
    }
}

#[tokio::test]
async fn test_unknown_task() {
    let fx = Fixture::new();
    let (status, body) = fx.get("/api/tasks/snapcreate-00000000").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(
        &body,
        "not_found",
        "Couldn't find Task with 'id'=snapcreate-00000000",
    );
}
