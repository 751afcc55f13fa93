// inventory/manager.rs
// Inventory struct definition, constructors and seeding

use super::types::{Host, InventoryError, InventorySeed, ParentKind, Provider, Snapshot, VmOrTemplate};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

#[derive(Debug, Default)]
pub(crate) struct Store {
    pub(crate) next_id: u64,
    pub(crate) providers: BTreeMap<u64, Provider>,
    pub(crate) hosts: BTreeMap<u64, Host>,
    pub(crate) parents: BTreeMap<u64, VmOrTemplate>,
    pub(crate) snapshots: BTreeMap<u64, Snapshot>,
}

impl Store {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Keep generated ids clear of ids supplied by a seed
    fn reserve_id(&mut self, id: u64) {
        if id > self.next_id {
            self.next_id = id;
        }
    }
}

/// In-memory inventory of providers, hosts, VMs/instances and snapshots
/// Cheap to clone; all clones share the same store
#[derive(Clone, Default)]
pub struct Inventory {
    pub(crate) store: Arc<RwLock<Store>>,
}

impl Inventory {
    /// Create an empty inventory
    pub fn new() -> Self {
        Inventory::default()
    }

    /// Build an inventory from seed data, keeping the seeded ids
    pub fn from_seed(seed: InventorySeed) -> Result<Self, InventoryError> {
        let inventory = Inventory::new();
        {
            let mut store = inventory.write();
            for provider in seed.providers {
                store.reserve_id(provider.id);
                store.providers.insert(provider.id, provider);
            }
            for host in seed.hosts {
                store.reserve_id(host.id);
                store.hosts.insert(host.id, host);
            }
            for parent in seed.vms {
                store.reserve_id(parent.id);
                store.parents.insert(parent.id, parent);
            }
            for snapshot in seed.snapshots {
                if !store.parents.contains_key(&snapshot.vm_or_template_id) {
                    return Err(InventoryError::UnknownOwner {
                        snapshot: snapshot.id,
                        owner: snapshot.vm_or_template_id,
                    });
                }
                store.reserve_id(snapshot.id);
                store.snapshots.insert(snapshot.id, snapshot);
            }
        }
        Ok(inventory)
    }

    /// Load seed data from a JSON file
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        let content = fs::read_to_string(path)?;
        let seed: InventorySeed = serde_json::from_str(&content)?;
        let inventory = Inventory::from_seed(seed)?;
        {
            let store = inventory.read();
            info!(
                path = %path.display(),
                providers = store.providers.len(),
                hosts = store.hosts.len(),
                parents = store.parents.len(),
                snapshots = store.snapshots.len(),
                "Inventory loaded"
            );
        }
        Ok(inventory)
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_provider(&self, name: &str, active: bool) -> Provider {
        let mut store = self.write();
        let provider = Provider {
            id: store.allocate_id(),
            name: name.to_string(),
            active,
        };
        store.providers.insert(provider.id, provider.clone());
        provider
    }

    pub fn add_host(&self, name: &str, provider_id: Option<u64>) -> Host {
        let mut store = self.write();
        let host = Host {
            id: store.allocate_id(),
            name: name.to_string(),
            provider_id,
        };
        store.hosts.insert(host.id, host.clone());
        host
    }

    pub fn add_parent(
        &self,
        kind: ParentKind,
        name: &str,
        host_id: Option<u64>,
        provider_id: Option<u64>,
    ) -> VmOrTemplate {
        let mut store = self.write();
        let parent = VmOrTemplate {
            id: store.allocate_id(),
            name: name.to_string(),
            kind,
            host_id,
            provider_id,
        };
        store.parents.insert(parent.id, parent.clone());
        parent
    }

    /// Record a snapshot owned by `owner_id`
    pub fn add_snapshot(
        &self,
        owner_id: u64,
        name: &str,
        description: Option<&str>,
        create_time: DateTime<Utc>,
    ) -> Result<Snapshot, InventoryError> {
        let mut store = self.write();
        if !store.parents.contains_key(&owner_id) {
            return Err(InventoryError::UnknownParent(owner_id));
        }
        let snapshot = Snapshot {
            id: store.allocate_id(),
            name: name.to_string(),
            description: description.map(str::to_string),
            create_time,
            vm_or_template_id: owner_id,
        };
        store.snapshots.insert(snapshot.id, snapshot.clone());
        Ok(snapshot)
    }
}
