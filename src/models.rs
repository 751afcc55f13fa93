use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::inventory::ParentKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastAction {
    pub function: String,
    pub timestamp: u64,
}

impl LastAction {
    pub fn new(function: String) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Self { function, timestamp }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub last_action: Option<LastAction>,
}

// ============================================================================
// Request structures
// ============================================================================

/// Action posted to a single snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceAction {
    Revert,
    Delete,
}

/// Body of POST /api/{collection}/{id}/snapshots/{sid}
#[derive(Debug, Deserialize)]
pub struct ResourceActionRequest {
    pub action: ResourceAction,
}

/// Action posted to a snapshots subcollection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionAction {
    Create,
    Delete,
}

/// Body of POST /api/{collection}/{id}/snapshots
///
/// Without `action` (or with `action: "create"`) the body itself describes the
/// snapshot to create, or `resources` lists several of them. With
/// `action: "delete"`, `resources` references the snapshots to delete.
#[derive(Debug, Default, Deserialize)]
pub struct CollectionRequest {
    #[serde(default)]
    pub action: Option<CollectionAction>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub resources: Option<Vec<ResourceEntry>>,
}

/// One element of a `resources` list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceEntry {
    #[serde(default)]
    pub href: Option<String>,
    /// Snapshot id, as a JSON number or string
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Query params for collection reads
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub expand: Option<String>,
}

impl ListQuery {
    pub fn expands_resources(&self) -> bool {
        self.expand
            .as_deref()
            .map(|e| e.split(',').any(|part| part.trim() == "resources"))
            .unwrap_or(false)
    }
}

// ============================================================================
// Response structures
// ============================================================================

/// Outcome of one create/revert/delete against one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl ActionResult {
    pub fn failed(message: impl Into<String>) -> Self {
        ActionResult {
            success: false,
            message: message.into(),
            task_id: None,
            task_href: None,
            href: None,
        }
    }

    pub fn queued(message: String, task_id: String, task_href: String) -> Self {
        ActionResult {
            success: true,
            message,
            task_id: Some(task_id),
            task_href: Some(task_href),
            href: None,
        }
    }

    pub fn with_href(mut self, href: String) -> Self {
        self.href = Some(href);
        self
    }
}

/// Per-resource outcomes of a multi-resource request
#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub results: Vec<ActionResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HrefOnly {
    pub href: String,
}

/// Full snapshot representation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotResource {
    pub href: String,
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    /// ISO-8601, UTC
    pub create_time: String,
    pub vm_or_template_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CollectionMember<T> {
    Href(HrefOnly),
    Full(T),
}

/// Envelope for collection reads
#[derive(Debug, Serialize)]
pub struct CollectionResponse<T> {
    pub name: String,
    pub count: usize,
    pub subcount: usize,
    pub resources: Vec<CollectionMember<T>>,
}

// ============================================================================
// Task System
// ============================================================================

/// Task status for queued operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
}

/// Task operation type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TaskOperation {
    CreateSnapshot,
    RevertToSnapshot,
    RemoveSnapshot,
}

impl TaskOperation {
    pub fn id_prefix(&self) -> &'static str {
        match self {
            TaskOperation::CreateSnapshot => "snapcreate",
            TaskOperation::RevertToSnapshot => "snaprevert",
            TaskOperation::RemoveSnapshot => "snapremove",
        }
    }
}

/// Resource a task operates on
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskTarget {
    pub parent_kind: ParentKind,
    pub parent_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<u64>,
}

/// Complete task state
#[derive(Debug, Clone, Serialize)]
pub struct TaskState {
    pub task_id: String,
    pub status: TaskStatus,
    pub operation: TaskOperation,
    pub target: TaskTarget,
    pub params: serde_json::Value,
    pub queued_at: u64,
}

/// Task status response (for GET /api/tasks/{id})
#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    pub href: String,
    pub task_id: String,
    pub status: TaskStatus,
    pub operation: TaskOperation,
    pub target: TaskTarget,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub params: serde_json::Value,
    pub queued_at: u64,
}

impl TaskStatusResponse {
    pub fn from_state(state: &TaskState, href: String) -> Self {
        TaskStatusResponse {
            href,
            task_id: state.task_id.clone(),
            status: state.status.clone(),
            operation: state.operation,
            target: state.target.clone(),
            params: state.params.clone(),
            queued_at: state.queued_at,
        }
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    // -------------------------------------------------------------------------
    // LastAction Tests
    // -------------------------------------------------------------------------

    /// Test: LastAction timestamp is current epoch
    #[test]
    fn test_last_action_timestamp_current() {
        let before = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let action = LastAction::new("list_snapshots".to_string());
        let after = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();

        assert!(action.timestamp >= before);
        assert!(action.timestamp <= after);
        assert_eq!(action.function, "list_snapshots");
    }

    // -------------------------------------------------------------------------
    // Request Deserialization Tests
    // -------------------------------------------------------------------------

    /// Test: create body with name only
    #[test]
    fn test_collection_request_create_minimal() {
        let req: CollectionRequest = serde_json::from_str(r#"{"name": "Alice's snapshot"}"#).unwrap();
        assert!(req.action.is_none());
        assert_eq!(req.name.as_deref(), Some("Alice's snapshot"));
        assert!(req.description.is_none());
        assert!(req.resources.is_none());
    }

    /// Test: batch delete body
    #[test]
    fn test_collection_request_batch_delete() {
        let json = r#"{
            "action": "delete",
            "resources": [{"href": "http://localhost:9876/api/vms/1/snapshots/2"}, {"id": 3}]
        }"#;
        let req: CollectionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.action, Some(CollectionAction::Delete));
        let resources = req.resources.unwrap();
        assert_eq!(resources.len(), 2);
        assert!(resources[0].href.is_some());
        assert_eq!(resources[1].id, Some(serde_json::json!(3)));
    }

    /// Test: unknown collection action is rejected
    #[test]
    fn test_collection_request_unknown_action() {
        let result: Result<CollectionRequest, _> = serde_json::from_str(r#"{"action": "explode"}"#);
        assert!(result.is_err());
    }

    /// Test: resource actions are a closed set
    #[test]
    fn test_resource_action_request() {
        let revert: ResourceActionRequest = serde_json::from_str(r#"{"action": "revert"}"#).unwrap();
        assert_eq!(revert.action, ResourceAction::Revert);

        let delete: ResourceActionRequest = serde_json::from_str(r#"{"action": "delete"}"#).unwrap();
        assert_eq!(delete.action, ResourceAction::Delete);

        assert!(serde_json::from_str::<ResourceActionRequest>(r#"{"action": "clone"}"#).is_err());
        assert!(serde_json::from_str::<ResourceActionRequest>(r#"{}"#).is_err());
    }

    #[test]
    fn test_list_query_expand() {
        let plain = ListQuery::default();
        assert!(!plain.expands_resources());

        let expanded = ListQuery {
            expand: Some("tags, resources".to_string()),
        };
        assert!(expanded.expands_resources());
    }

    // -------------------------------------------------------------------------
    // Response Serialization Tests
    // -------------------------------------------------------------------------

    /// Test: failed result omits task fields
    #[test]
    fn test_failed_action_result_serialization() {
        let json = serde_json::to_value(ActionResult::failed("The VM is not connected to a Host")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "The VM is not connected to a Host");
        assert!(json.get("task_id").is_none());
        assert!(json.get("task_href").is_none());
    }

    /// Test: queued result carries task handle
    #[test]
    fn test_queued_action_result_serialization() {
        let result = ActionResult::queued(
            "Deleting snapshot s for Virtual Machine id:1 name:'vm'".to_string(),
            "snapremove-0123abcd".to_string(),
            "http://localhost:9876/api/tasks/snapremove-0123abcd".to_string(),
        )
        .with_href("http://localhost:9876/api/vms/1/snapshots/2".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["task_id"], "snapremove-0123abcd");
        assert_eq!(json["href"], "http://localhost:9876/api/vms/1/snapshots/2");
    }

    /// Test: href-only collection members serialize flat
    #[test]
    fn test_collection_member_serialization() {
        let response: CollectionResponse<SnapshotResource> = CollectionResponse {
            name: "snapshots".to_string(),
            count: 2,
            subcount: 1,
            resources: vec![CollectionMember::Href(HrefOnly {
                href: "http://localhost:9876/api/vms/1/snapshots/2".to_string(),
            })],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "snapshots",
                "count": 2,
                "subcount": 1,
                "resources": [{"href": "http://localhost:9876/api/vms/1/snapshots/2"}]
            })
        );
    }

    #[test]
    fn test_task_status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskOperation::RevertToSnapshot).unwrap();
        assert_eq!(json, "\"revert_to_snapshot\"");
        let json = serde_json::to_string(&TaskStatus::Queued).unwrap();
        assert_eq!(json, "\"queued\"");
    }
}
