// inventory/snapshots.rs
// Parent and snapshot lookup, listing and connectivity checks

use super::manager::Inventory;
use super::types::{ParentKind, Snapshot, VmOrTemplate};
use crate::error::{ApiError, ApiResult};

/// Canonical decimal ids only: no sign, no leading zeros
fn parse_id(id: &str) -> Option<u64> {
    let canonical = !id.is_empty()
        && id.bytes().all(|b| b.is_ascii_digit())
        && (id == "0" || !id.starts_with('0'));
    if canonical {
        id.parse().ok()
    } else {
        None
    }
}

impl Inventory {
    /// Resolve a parent id under the collection of `kind`
    /// Ids that are not numeric, unknown, or belong to the other kind are not found
    pub fn find_parent(&self, kind: ParentKind, id: &str) -> ApiResult<VmOrTemplate> {
        let store = self.read();
        parse_id(id)
            .and_then(|id| store.parents.get(&id))
            .filter(|parent| parent.kind == kind)
            .cloned()
            .ok_or_else(|| ApiError::not_found(kind.model_name(), id))
    }

    /// Resolve a snapshot owned by `parent`
    pub fn find_snapshot(&self, parent: &VmOrTemplate, id: &str) -> ApiResult<Snapshot> {
        let store = self.read();
        parse_id(id)
            .and_then(|id| store.snapshots.get(&id))
            .filter(|snapshot| snapshot.vm_or_template_id == parent.id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Snapshot", id))
    }

    /// Snapshots owned by `parent_id`, ordered by id
    pub fn snapshots_of(&self, parent_id: u64) -> Vec<Snapshot> {
        self.read()
            .snapshots
            .values()
            .filter(|snapshot| snapshot.vm_or_template_id == parent_id)
            .cloned()
            .collect()
    }

    /// Number of snapshots across all parents
    pub fn snapshot_count(&self) -> usize {
        self.read().snapshots.len()
    }

    /// Whether snapshot operations can be sent to the system managing `parent`
    ///
    /// VMs need an existing host. Instances need an existing, active provider.
    pub fn is_manageable(&self, parent: &VmOrTemplate) -> bool {
        let store = self.read();
        match parent.kind {
            ParentKind::Vm => parent
                .host_id
                .map(|id| store.hosts.contains_key(&id))
                .unwrap_or(false),
            ParentKind::Instance => parent
                .provider_id
                .and_then(|id| store.providers.get(&id))
                .map(|provider| provider.active)
                .unwrap_or(false),
        }
    }
}
