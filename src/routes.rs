//-----------------------------------------------------
// ROUTES
//-----------------------------------------------------

use crate::auth::{with_caller, AccessControl};
use crate::dispatcher::SnapshotDispatcher;
use crate::error::ApiError;
use crate::handlers::*;
use crate::inventory::ParentKind;
use crate::models::{CollectionRequest, LastAction, ListQuery, ResourceActionRequest};
use crate::task_manager::TaskManager;
use crate::utils::{error_response, with_action_tracking};
use std::convert::Infallible;
use std::sync::{Arc, RwLock};
use tracing::{debug, error};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

/// Largest accepted JSON body
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: SnapshotDispatcher,
    pub access: AccessControl,
    pub tasks: TaskManager,
    pub last_action: Arc<RwLock<Option<LastAction>>>,
}

impl AppState {
    pub fn new(dispatcher: SnapshotDispatcher, access: AccessControl, tasks: TaskManager) -> Self {
        AppState {
            dispatcher,
            access,
            tasks,
            last_action: Arc::new(RwLock::new(None)),
        }
    }
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Full route table, with rejections rendered as error envelopes
pub fn routes(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let dispatcher = {
        let dispatcher = state.dispatcher.clone();
        warp::any().map(move || dispatcher.clone())
    };
    let task_manager = {
        let tasks = state.tasks.clone();
        warp::any().map(move || tasks.clone())
    };
    let hrefs = {
        let hrefs = state.dispatcher.hrefs().clone();
        warp::any().map(move || hrefs.clone())
    };
    let caller = with_caller(state.access.clone());
    let last_action = state.last_action.clone();

    let health_routes = {
        let last_action = last_action.clone();
        // GET /health - Health check endpoint
        warp::path("health")
            .and(warp::path::end())
            .and(warp::get())
            .and(warp::any().map(move || last_action.clone()))
            .and_then(health_check_handler)
    };

    let snapshot_routes = {
        // GET /api/{collection}/{id}/snapshots - List snapshots
        let list = warp::path!("api" / ParentKind / String / "snapshots")
            .and(warp::get())
            .and(warp::query::<ListQuery>())
            .and(caller.clone())
            .and(with_action_tracking("list_snapshots", last_action.clone()))
            .and(dispatcher.clone())
            .and_then(list_snapshots_handler);

        // GET /api/{collection}/{id}/snapshots/{sid} - Show snapshot
        let show = warp::path!("api" / ParentKind / String / "snapshots" / String)
            .and(warp::get())
            .and(caller.clone())
            .and(with_action_tracking("show_snapshot", last_action.clone()))
            .and(dispatcher.clone())
            .and_then(show_snapshot_handler);

        // POST /api/{collection}/{id}/snapshots - Create snapshot(s) or delete many
        let collection_action = warp::path!("api" / ParentKind / String / "snapshots")
            .and(warp::post())
            .and(caller.clone())
            .and(with_action_tracking("snapshots_collection_action", last_action.clone()))
            .and(json_body::<CollectionRequest>())
            .and(dispatcher.clone())
            .and_then(snapshots_collection_handler);

        // POST /api/{collection}/{id}/snapshots/{sid} - Revert or delete
        let resource_action = warp::path!("api" / ParentKind / String / "snapshots" / String)
            .and(warp::post())
            .and(caller.clone())
            .and(with_action_tracking("snapshot_action", last_action.clone()))
            .and(json_body::<ResourceActionRequest>())
            .and(dispatcher.clone())
            .and_then(snapshot_action_handler);

        // DELETE /api/{collection}/{id}/snapshots/{sid} - Delete snapshot
        let delete = warp::path!("api" / ParentKind / String / "snapshots" / String)
            .and(warp::delete())
            .and(caller.clone())
            .and(with_action_tracking("delete_snapshot", last_action.clone()))
            .and(dispatcher.clone())
            .and_then(delete_snapshot_handler);

        list.or(show)
            .or(collection_action)
            .or(resource_action)
            .or(delete)
    };

    let task_routes = {
        // GET /api/tasks - List queued tasks
        let list = warp::path!("api" / "tasks")
            .and(warp::get())
            .and(caller.clone())
            .and(with_action_tracking("list_tasks", last_action.clone()))
            .and(task_manager.clone())
            .and(hrefs.clone())
            .and_then(list_tasks_handler);

        // GET /api/tasks/{task_id} - Task status
        let status = warp::path!("api" / "tasks" / String)
            .and(warp::get())
            .and(caller.clone())
            .and(with_action_tracking("get_task_status", last_action.clone()))
            .and(task_manager.clone())
            .and(hrefs.clone())
            .and_then(get_task_status_handler);

        list.or(status)
    };

    task_routes
        .or(snapshot_routes)
        .or(health_routes)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

/// Render any rejection as an `{"error": {...}}` envelope
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let api_error = if let Some(e) = err.find::<ApiError>() {
        e.clone()
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiError::BadRequest(format!("Invalid request body: {}", e))
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        ApiError::BadRequest(e.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        ApiError::BadRequest("Request body too large".to_string())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        ApiError::BadRequest("A Content-Length header is required".to_string())
    } else if err.is_not_found() {
        return Ok(warp::reply::with_status(
            error_json("not_found", "Not Found", "RoutingError"),
            StatusCode::NOT_FOUND,
        )
        .into_response());
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(warp::reply::with_status(
            error_json("method_not_allowed", "Method Not Allowed", "RoutingError"),
            StatusCode::METHOD_NOT_ALLOWED,
        )
        .into_response());
    } else {
        error!(rejection = ?err, "Unhandled rejection");
        ApiError::Internal("Unhandled rejection".to_string())
    };

    debug!(kind = api_error.kind(), message = %api_error, "Request rejected");
    Ok(error_response(&api_error))
}

fn error_json(kind: &str, message: &str, klass: &str) -> warp::reply::Json {
    warp::reply::json(&serde_json::json!({
        "error": {
            "kind": kind,
            "message": message,
            "klass": klass,
        }
    }))
}
