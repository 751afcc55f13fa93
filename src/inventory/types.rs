// inventory/types.rs
// Entity types held by the inventory

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of resource that owns snapshots
///
/// Each kind is exposed under its own API collection and carries the
/// wording used in action messages and not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentKind {
    Vm,
    Instance,
}

impl ParentKind {
    pub const ALL: [ParentKind; 2] = [ParentKind::Vm, ParentKind::Instance];

    /// Collection segment in `/api/{collection}`
    pub fn collection(&self) -> &'static str {
        match self {
            ParentKind::Vm => "vms",
            ParentKind::Instance => "instances",
        }
    }

    /// Human name used in action result messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ParentKind::Vm => "Virtual Machine",
            ParentKind::Instance => "Instance",
        }
    }

    /// Model name used in not-found errors
    pub fn model_name(&self) -> &'static str {
        match self {
            ParentKind::Vm => "Vm",
            ParentKind::Instance => "Instance",
        }
    }

    /// Reason a parent of this kind cannot run snapshot operations
    pub fn disconnected_message(&self) -> &'static str {
        match self {
            ParentKind::Vm => "The VM is not connected to a Host",
            ParentKind::Instance => "The VM is not connected to an active Provider",
        }
    }
}

impl fmt::Display for ParentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnknownCollection(pub String);

impl FromStr for ParentKind {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vms" => Ok(ParentKind::Vm),
            "instances" => Ok(ParentKind::Instance),
            other => Err(UnknownCollection(other.to_string())),
        }
    }
}

/// Managing system (provider) that hosts and instances belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: u64,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub provider_id: Option<u64>,
}

/// A VM or cloud instance; the owner of snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmOrTemplate {
    pub id: u64,
    pub name: String,
    pub kind: ParentKind,
    #[serde(default)]
    pub host_id: Option<u64>,
    #[serde(default)]
    pub provider_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub create_time: DateTime<Utc>,
    pub vm_or_template_id: u64,
}

/// Contents of an inventory seed file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventorySeed {
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub vms: Vec<VmOrTemplate>,
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
}

/// Error from loading or seeding the inventory
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Failed to read inventory file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse inventory file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Snapshot {snapshot} references unknown owner {owner}")]
    UnknownOwner { snapshot: u64, owner: u64 },
    #[error("Unknown VM or instance {0}")]
    UnknownParent(u64),
}
