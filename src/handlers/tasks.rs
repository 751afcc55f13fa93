// handlers/tasks.rs
// Task handlers: list queued tasks, task status

use crate::auth::Caller;
use crate::error::ApiError;
use crate::models::{CollectionMember, CollectionResponse, HrefOnly, TaskStatusResponse};
use crate::task_manager::TaskManager;
use crate::utils::{error_response, success_response, HrefBuilder};
use tracing::debug;
use warp::reply::Response;
use warp::Rejection;

/// GET /api/tasks
pub async fn list_tasks_handler(
    caller: Caller,
    task_manager: TaskManager,
    hrefs: HrefBuilder,
) -> Result<Response, Rejection> {
    debug!(caller = %caller.name, "Listing tasks");
    let tasks = task_manager.list_tasks();
    let resources: Vec<CollectionMember<TaskStatusResponse>> = tasks
        .iter()
        .map(|task| {
            CollectionMember::Href(HrefOnly {
                href: hrefs.task(&task.task_id),
            })
        })
        .collect();

    Ok(success_response(&CollectionResponse {
        name: "tasks".to_string(),
        count: tasks.len(),
        subcount: resources.len(),
        resources,
    }))
}

/// Get task status by task_id
/// GET /api/tasks/{task_id}
pub async fn get_task_status_handler(
    task_id: String,
    caller: Caller,
    task_manager: TaskManager,
    hrefs: HrefBuilder,
) -> Result<Response, Rejection> {
    debug!(caller = %caller.name, task_id = %task_id, "Task status requested");
    match task_manager.get_task(&task_id) {
        Some(task) => Ok(success_response(&TaskStatusResponse::from_state(
            &task,
            hrefs.task(&task.task_id),
        ))),
        None => Ok(error_response(&ApiError::not_found("Task", task_id))),
    }
}
