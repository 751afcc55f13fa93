//! Snapshot action dispatcher
//!
//! Every entry point authorizes the caller first, then resolves the parent
//! and snapshot, then validates action preconditions. Structural failures
//! (forbidden, not found, bad request) come back as `Err(ApiError)` and abort
//! the whole request. Domain failures (missing name, disconnected parent)
//! come back as `ActionResult { success: false, .. }`.

use crate::auth::{Caller, Permission, PermissionMap};
use crate::error::{ApiError, ApiResult};
use crate::inventory::{Inventory, ParentKind, Snapshot, VmOrTemplate};
use crate::models::{
    ActionResult, CollectionAction, CollectionMember, CollectionRequest, CollectionResponse,
    HrefOnly, ResourceAction, ResourceEntry, ResultsResponse, SnapshotResource, TaskOperation,
    TaskTarget,
};
use crate::task_manager::TaskManager;
use crate::utils::HrefBuilder;
use chrono::SecondsFormat;
use tracing::{debug, info, warn};

pub const MISSING_NAME_MESSAGE: &str = "Must specify a name for the snapshot";

#[derive(Clone)]
pub struct SnapshotDispatcher {
    inventory: Inventory,
    tasks: TaskManager,
    permissions: PermissionMap,
    hrefs: HrefBuilder,
}

impl SnapshotDispatcher {
    pub fn new(
        inventory: Inventory,
        tasks: TaskManager,
        permissions: PermissionMap,
        hrefs: HrefBuilder,
    ) -> Self {
        SnapshotDispatcher {
            inventory,
            tasks,
            permissions,
            hrefs,
        }
    }

    pub fn hrefs(&self) -> &HrefBuilder {
        &self.hrefs
    }

    fn authorize(&self, caller: &Caller, kind: ParentKind, permission: Permission) -> ApiResult<()> {
        match self.permissions.identifier(kind, permission) {
            Some(identifier) if caller.holds(identifier) => Ok(()),
            _ => {
                warn!(
                    caller = %caller.name,
                    collection = kind.collection(),
                    ?permission,
                    "Snapshot request forbidden"
                );
                Err(ApiError::Forbidden)
            }
        }
    }

    fn describe(&self, verb: &str, snapshot_name: &str, parent: &VmOrTemplate) -> String {
        format!(
            "{} {} for {} id:{} name:'{}'",
            verb,
            snapshot_name,
            parent.kind.display_name(),
            parent.id,
            parent.name
        )
    }

    fn resource(&self, parent: &VmOrTemplate, snapshot: &Snapshot) -> SnapshotResource {
        SnapshotResource {
            href: self.hrefs.snapshot(parent.kind, parent.id, snapshot.id),
            id: snapshot.id,
            name: snapshot.name.clone(),
            description: snapshot.description.clone(),
            create_time: snapshot.create_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            vm_or_template_id: snapshot.vm_or_template_id,
        }
    }

    fn queue(
        &self,
        operation: TaskOperation,
        parent: &VmOrTemplate,
        snapshot_id: Option<u64>,
        params: serde_json::Value,
    ) -> (String, String) {
        let target = TaskTarget {
            parent_kind: parent.kind,
            parent_id: parent.id,
            snapshot_id,
        };
        let task_id = self.tasks.enqueue(operation, target, params);
        let task_href = self.hrefs.task(&task_id);
        (task_id, task_href)
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    /// GET /api/{collection}/{id}/snapshots
    pub fn list(
        &self,
        caller: &Caller,
        kind: ParentKind,
        parent_id: &str,
        expand: bool,
    ) -> ApiResult<CollectionResponse<SnapshotResource>> {
        self.authorize(caller, kind, Permission::Read)?;
        let parent = self.inventory.find_parent(kind, parent_id)?;

        let resources: Vec<CollectionMember<SnapshotResource>> = self
            .inventory
            .snapshots_of(parent.id)
            .iter()
            .map(|snapshot| {
                if expand {
                    CollectionMember::Full(self.resource(&parent, snapshot))
                } else {
                    CollectionMember::Href(HrefOnly {
                        href: self.hrefs.snapshot(kind, parent.id, snapshot.id),
                    })
                }
            })
            .collect();

        Ok(CollectionResponse {
            name: "snapshots".to_string(),
            count: self.inventory.snapshot_count(),
            subcount: resources.len(),
            resources,
        })
    }

    /// GET /api/{collection}/{id}/snapshots/{sid}
    pub fn show(
        &self,
        caller: &Caller,
        kind: ParentKind,
        parent_id: &str,
        snapshot_id: &str,
    ) -> ApiResult<SnapshotResource> {
        self.authorize(caller, kind, Permission::Read)?;
        let parent = self.inventory.find_parent(kind, parent_id)?;
        let snapshot = self.inventory.find_snapshot(&parent, snapshot_id)?;
        Ok(self.resource(&parent, &snapshot))
    }

    // -----------------------------------------------------------------
    // Collection actions
    // -----------------------------------------------------------------

    /// POST /api/{collection}/{id}/snapshots
    pub fn collection_action(
        &self,
        caller: &Caller,
        kind: ParentKind,
        parent_id: &str,
        request: CollectionRequest,
    ) -> ApiResult<ResultsResponse> {
        match request.action.unwrap_or(CollectionAction::Create) {
            CollectionAction::Create => self.create(caller, kind, parent_id, request),
            CollectionAction::Delete => {
                self.authorize(caller, kind, Permission::Delete)?;
                let resources = request.resources.ok_or_else(|| {
                    ApiError::BadRequest("Must specify resources to delete".to_string())
                })?;
                self.delete_many(caller, kind, parent_id, &resources)
            }
        }
    }

    /// Create one snapshot from the body, or one per entry of `resources`
    pub fn create(
        &self,
        caller: &Caller,
        kind: ParentKind,
        parent_id: &str,
        request: CollectionRequest,
    ) -> ApiResult<ResultsResponse> {
        self.authorize(caller, kind, Permission::Create)?;
        let parent = self.inventory.find_parent(kind, parent_id)?;

        let results = match request.resources {
            Some(entries) => entries
                .iter()
                .map(|entry| {
                    self.create_one(&parent, entry.name.as_deref(), entry.description.as_deref())
                })
                .collect(),
            None => vec![self.create_one(
                &parent,
                request.name.as_deref(),
                request.description.as_deref(),
            )],
        };

        Ok(ResultsResponse { results })
    }

    fn create_one(
        &self,
        parent: &VmOrTemplate,
        name: Option<&str>,
        description: Option<&str>,
    ) -> ActionResult {
        let name = match name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None => return ActionResult::failed(MISSING_NAME_MESSAGE),
        };
        if !self.inventory.is_manageable(parent) {
            debug!(parent_id = parent.id, "Create refused, parent not manageable");
            return ActionResult::failed(parent.kind.disconnected_message());
        }

        let params = serde_json::json!({
            "name": name,
            "description": description,
        });
        let (task_id, task_href) = self.queue(TaskOperation::CreateSnapshot, parent, None, params);
        info!(parent_id = parent.id, snapshot = name, task_id = %task_id, "Snapshot creation queued");
        ActionResult::queued(self.describe("Creating snapshot", name, parent), task_id, task_href)
    }

    /// Delete every referenced snapshot
    ///
    /// All references are resolved before anything is queued, so one bad
    /// reference fails the whole request with nothing queued.
    pub fn delete_many(
        &self,
        caller: &Caller,
        kind: ParentKind,
        parent_id: &str,
        resources: &[ResourceEntry],
    ) -> ApiResult<ResultsResponse> {
        self.authorize(caller, kind, Permission::Delete)?;
        let parent = self.inventory.find_parent(kind, parent_id)?;

        let snapshots = resources
            .iter()
            .map(|entry| self.resolve_entry(&parent, entry))
            .collect::<ApiResult<Vec<Snapshot>>>()?;

        let results = snapshots
            .iter()
            .map(|snapshot| self.queue_delete(&parent, snapshot))
            .collect();
        Ok(ResultsResponse { results })
    }

    fn resolve_entry(&self, parent: &VmOrTemplate, entry: &ResourceEntry) -> ApiResult<Snapshot> {
        if let Some(href) = &entry.href {
            let (kind, href_parent, snapshot_id) = HrefBuilder::parse_snapshot(href)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid snapshot href specified {}", href)))?;
            if kind != parent.kind || href_parent != parent.id.to_string() {
                return Err(ApiError::not_found("Snapshot", snapshot_id));
            }
            return self.inventory.find_snapshot(parent, &snapshot_id);
        }

        match &entry.id {
            Some(serde_json::Value::Number(n)) => self.inventory.find_snapshot(parent, &n.to_string()),
            Some(serde_json::Value::String(s)) => self.inventory.find_snapshot(parent, s),
            _ => Err(ApiError::BadRequest(
                "Resource must specify an href or id".to_string(),
            )),
        }
    }

    // -----------------------------------------------------------------
    // Resource actions
    // -----------------------------------------------------------------

    /// POST /api/{collection}/{id}/snapshots/{sid}
    pub fn resource_action(
        &self,
        caller: &Caller,
        kind: ParentKind,
        parent_id: &str,
        snapshot_id: &str,
        action: ResourceAction,
    ) -> ApiResult<ActionResult> {
        let permission = match action {
            ResourceAction::Revert => Permission::Revert,
            ResourceAction::Delete => Permission::Delete,
        };
        self.authorize(caller, kind, permission)?;
        let parent = self.inventory.find_parent(kind, parent_id)?;
        let snapshot = self.inventory.find_snapshot(&parent, snapshot_id)?;

        Ok(match action {
            ResourceAction::Revert => self.queue_revert(&parent, &snapshot),
            ResourceAction::Delete => self.queue_delete(&parent, &snapshot),
        })
    }

    fn queue_revert(&self, parent: &VmOrTemplate, snapshot: &Snapshot) -> ActionResult {
        let href = self.hrefs.snapshot(parent.kind, parent.id, snapshot.id);
        if !self.inventory.is_manageable(parent) {
            return ActionResult::failed(parent.kind.disconnected_message()).with_href(href);
        }
        let (task_id, task_href) = self.queue(
            TaskOperation::RevertToSnapshot,
            parent,
            Some(snapshot.id),
            serde_json::Value::Null,
        );
        ActionResult::queued(
            self.describe("Reverting to snapshot", &snapshot.name, parent),
            task_id,
            task_href,
        )
        .with_href(href)
    }

    fn queue_delete(&self, parent: &VmOrTemplate, snapshot: &Snapshot) -> ActionResult {
        let href = self.hrefs.snapshot(parent.kind, parent.id, snapshot.id);
        if !self.inventory.is_manageable(parent) {
            return ActionResult::failed(parent.kind.disconnected_message()).with_href(href);
        }
        let (task_id, task_href) = self.queue(
            TaskOperation::RemoveSnapshot,
            parent,
            Some(snapshot.id),
            serde_json::Value::Null,
        );
        ActionResult::queued(
            self.describe("Deleting snapshot", &snapshot.name, parent),
            task_id,
            task_href,
        )
        .with_href(href)
    }

    /// DELETE /api/{collection}/{id}/snapshots/{sid}
    /// Queues the removal without checking connectivity
    pub fn destroy(
        &self,
        caller: &Caller,
        kind: ParentKind,
        parent_id: &str,
        snapshot_id: &str,
    ) -> ApiResult<()> {
        self.authorize(caller, kind, Permission::Delete)?;
        let parent = self.inventory.find_parent(kind, parent_id)?;
        let snapshot = self.inventory.find_snapshot(&parent, snapshot_id)?;

        let (task_id, _) = self.queue(
            TaskOperation::RemoveSnapshot,
            &parent,
            Some(snapshot.id),
            serde_json::Value::Null,
        );
        info!(parent_id = parent.id, snapshot_id = snapshot.id, task_id = %task_id, "Snapshot removal queued");
        Ok(())
    }
}
