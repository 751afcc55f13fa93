//! Shared fixture for the integration tests
//!
//! Builds an in-process agent (no listening socket) over a small inventory:
//!
//! | parent              | kind     | connectivity                 |
//! |---------------------|----------|------------------------------|
//! | `vm`                | Vm       | on a host                    |
//! | `offline_vm`        | Vm       | no host                      |
//! | `other_vm`          | Vm       | on a host                    |
//! | `instance`          | Instance | active provider              |
//! | `orphan_instance`   | Instance | inactive provider            |

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::convert::Infallible;
use vm_snapshot_agent::auth::{AccessControl, PermissionMap};
use vm_snapshot_agent::dispatcher::SnapshotDispatcher;
use vm_snapshot_agent::inventory::{Inventory, ParentKind, Snapshot, VmOrTemplate};
use vm_snapshot_agent::routes::{routes, AppState};
use vm_snapshot_agent::settings::UserSettings;
use vm_snapshot_agent::task_manager::TaskManager;
use vm_snapshot_agent::utils::HrefBuilder;
use warp::http::StatusCode;
use warp::{Filter, Reply};

pub const BASE_URL: &str = "http://localhost:9876";

/// Holds every vm_snapshot_* and instance_snapshot_* identifier
pub const ADMIN_KEY: &str = "admin-key";
/// Holds vm_snapshot_show only
pub const READER_KEY: &str = "reader-key";
/// Authenticates but holds nothing
pub const NO_GRANTS_KEY: &str = "no-grants-key";

pub struct Fixture {
    pub inventory: Inventory,
    pub tasks: TaskManager,
    state: AppState,

    pub vm: VmOrTemplate,
    pub offline_vm: VmOrTemplate,
    pub other_vm: VmOrTemplate,
    pub instance: VmOrTemplate,
    pub orphan_instance: VmOrTemplate,

    pub vm_snapshot: Snapshot,
    pub vm_snapshot_2: Snapshot,
    pub offline_snapshot: Snapshot,
    pub other_snapshot: Snapshot,
    pub instance_snapshot: Snapshot,
    pub orphan_snapshot: Snapshot,
}

impl Fixture {
    pub fn new() -> Self {
        let inventory = Inventory::new();
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let vcenter = inventory.add_provider("vCenter", true);
        let host = inventory.add_host("esx-01", Some(vcenter.id));
        let cloud = inventory.add_provider("OpenStack", true);
        let retired = inventory.add_provider("Retired Cloud", false);

        let vm = inventory.add_parent(ParentKind::Vm, "Alice's VM", Some(host.id), Some(vcenter.id));
        let offline_vm = inventory.add_parent(ParentKind::Vm, "Parked VM", None, Some(vcenter.id));
        let other_vm = inventory.add_parent(ParentKind::Vm, "Bob's VM", Some(host.id), Some(vcenter.id));
        let instance = inventory.add_parent(ParentKind::Instance, "web-instance", None, Some(cloud.id));
        let orphan_instance =
            inventory.add_parent(ParentKind::Instance, "old-instance", None, Some(retired.id));

        let snap = |owner: &VmOrTemplate, name: &str| {
            inventory
                .add_snapshot(owner.id, name, Some("fixture"), created)
                .unwrap()
        };
        let vm_snapshot = snap(&vm, "before-upgrade");
        let vm_snapshot_2 = snap(&vm, "after-upgrade");
        let offline_snapshot = snap(&offline_vm, "parked");
        let other_snapshot = snap(&other_vm, "bobs-snapshot");
        let instance_snapshot = snap(&instance, "instance-snap");
        let orphan_snapshot = snap(&orphan_instance, "orphan-snap");

        let permissions = PermissionMap::standard();
        let user = |name: &str, key: &str, grants: Vec<String>| UserSettings {
            name: name.to_string(),
            api_key: key.to_string(),
            grants,
        };
        let access = AccessControl::new(&[
            user("admin", ADMIN_KEY, permissions.all_identifiers()),
            user("reader", READER_KEY, vec!["vm_snapshot_show".to_string()]),
            user("nobody", NO_GRANTS_KEY, Vec::new()),
        ]);

        let tasks = TaskManager::new();
        let dispatcher = SnapshotDispatcher::new(
            inventory.clone(),
            tasks.clone(),
            permissions,
            HrefBuilder::new(BASE_URL),
        );
        let state = AppState::new(dispatcher, access, tasks.clone());

        Fixture {
            inventory,
            tasks,
            state,
            vm,
            offline_vm,
            other_vm,
            instance,
            orphan_instance,
            vm_snapshot,
            vm_snapshot_2,
            offline_snapshot,
            other_snapshot,
            instance_snapshot,
            orphan_snapshot,
        }
    }

    pub fn api(&self) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone + 'static {
        routes(self.state.clone())
    }

    /// Send one request through the route table, returning status and JSON body
    ///
    /// An empty body decodes as `Value::Null`.
    pub async fn call(
        &self,
        method: &str,
        path: &str,
        api_key: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = warp::test::request().method(method).path(path);
        if let Some(key) = api_key {
            request = request.header("X-API-Key", key);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.reply(&self.api()).await;
        let status = response.status();
        let body = if response.body().is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(response.body()).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.call("GET", path, Some(ADMIN_KEY), None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.call("POST", path, Some(ADMIN_KEY), Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.call("DELETE", path, Some(ADMIN_KEY), None).await
    }

    pub fn task_count(&self) -> usize {
        self.tasks.list_tasks().len()
    }
}

pub fn snapshots_path(kind: ParentKind, parent: &VmOrTemplate) -> String {
    format!("/api/{}/{}/snapshots", kind.collection(), parent.id)
}

pub fn snapshot_path(kind: ParentKind, parent: &VmOrTemplate, snapshot: &Snapshot) -> String {
    format!("{}/{}", snapshots_path(kind, parent), snapshot.id)
}

pub fn snapshot_href(kind: ParentKind, parent: &VmOrTemplate, snapshot: &Snapshot) -> String {
    format!("{}{}", BASE_URL, snapshot_path(kind, parent, snapshot))
}

/// Assert an `{"error": {kind, message, klass}}` envelope
pub fn assert_error(body: &Value, kind: &str, message: &str) {
    assert_eq!(body["error"]["kind"], kind, "body: {}", body);
    assert_eq!(body["error"]["message"], message, "body: {}", body);
    assert!(body["error"]["klass"].is_string(), "body: {}", body);
}
