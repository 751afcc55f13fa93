// handlers/snapshots.rs
// Snapshot handlers: list, show, create/batch delete, revert/delete, DELETE verb

use crate::auth::Caller;
use crate::dispatcher::SnapshotDispatcher;
use crate::inventory::ParentKind;
use crate::models::{CollectionRequest, ListQuery, ResourceActionRequest};
use crate::utils::{error_response, no_content_response, success_response};
use warp::reply::Response;
use warp::Rejection;

/// GET /api/{collection}/{id}/snapshots
pub async fn list_snapshots_handler(
    kind: ParentKind,
    parent_id: String,
    query: ListQuery,
    caller: Caller,
    dispatcher: SnapshotDispatcher,
) -> Result<Response, Rejection> {
    match dispatcher.list(&caller, kind, &parent_id, query.expands_resources()) {
        Ok(collection) => Ok(success_response(&collection)),
        Err(e) => Ok(error_response(&e)),
    }
}

/// GET /api/{collection}/{id}/snapshots/{sid}
pub async fn show_snapshot_handler(
    kind: ParentKind,
    parent_id: String,
    snapshot_id: String,
    caller: Caller,
    dispatcher: SnapshotDispatcher,
) -> Result<Response, Rejection> {
    match dispatcher.show(&caller, kind, &parent_id, &snapshot_id) {
        Ok(snapshot) => Ok(success_response(&snapshot)),
        Err(e) => Ok(error_response(&e)),
    }
}

/// POST /api/{collection}/{id}/snapshots
/// Creates snapshots, or deletes several with `action: "delete"`
pub async fn snapshots_collection_handler(
    kind: ParentKind,
    parent_id: String,
    caller: Caller,
    body: CollectionRequest,
    dispatcher: SnapshotDispatcher,
) -> Result<Response, Rejection> {
    match dispatcher.collection_action(&caller, kind, &parent_id, body) {
        Ok(results) => Ok(success_response(&results)),
        Err(e) => Ok(error_response(&e)),
    }
}

/// POST /api/{collection}/{id}/snapshots/{sid}
pub async fn snapshot_action_handler(
    kind: ParentKind,
    parent_id: String,
    snapshot_id: String,
    caller: Caller,
    body: ResourceActionRequest,
    dispatcher: SnapshotDispatcher,
) -> Result<Response, Rejection> {
    match dispatcher.resource_action(&caller, kind, &parent_id, &snapshot_id, body.action) {
        Ok(result) => Ok(success_response(&result)),
        Err(e) => Ok(error_response(&e)),
    }
}

/// DELETE /api/{collection}/{id}/snapshots/{sid}
pub async fn delete_snapshot_handler(
    kind: ParentKind,
    parent_id: String,
    snapshot_id: String,
    caller: Caller,
    dispatcher: SnapshotDispatcher,
) -> Result<Response, Rejection> {
    match dispatcher.destroy(&caller, kind, &parent_id, &snapshot_id) {
        Ok(()) => Ok(no_content_response()),
        Err(e) => Ok(error_response(&e)),
    }
}
