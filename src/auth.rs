//-----------------------------------------------------
// AUTHENTICATION & AUTHORIZATION
//-----------------------------------------------------

use crate::error::ApiError;
use crate::inventory::ParentKind;
use crate::settings::UserSettings;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use warp::{Filter, Rejection};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Snapshot operations that are granted independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Read,
    Create,
    Revert,
    Delete,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::Read,
        Permission::Create,
        Permission::Revert,
        Permission::Delete,
    ];
}

/// Permission identifiers keyed by (collection, permission)
#[derive(Debug, Clone)]
pub struct PermissionMap {
    identifiers: HashMap<(ParentKind, Permission), String>,
}

impl PermissionMap {
    pub fn new() -> Self {
        PermissionMap {
            identifiers: HashMap::new(),
        }
    }

    /// `vm_snapshot_show`, `vm_snapshot_add`, ..., `instance_snapshot_delete`
    pub fn standard() -> Self {
        let mut map = PermissionMap::new();
        for kind in ParentKind::ALL {
            let prefix = match kind {
                ParentKind::Vm => "vm",
                ParentKind::Instance => "instance",
            };
            for permission in Permission::ALL {
                let suffix = match permission {
                    Permission::Read => "show",
                    Permission::Create => "add",
                    Permission::Revert => "revert",
                    Permission::Delete => "delete",
                };
                map.insert(kind, permission, format!("{}_snapshot_{}", prefix, suffix));
            }
        }
        map
    }

    pub fn insert(&mut self, kind: ParentKind, permission: Permission, identifier: String) {
        self.identifiers.insert((kind, permission), identifier);
    }

    pub fn identifier(&self, kind: ParentKind, permission: Permission) -> Option<&str> {
        self.identifiers.get(&(kind, permission)).map(String::as_str)
    }

    pub fn all_identifiers(&self) -> Vec<String> {
        let mut all: Vec<String> = self.identifiers.values().cloned().collect();
        all.sort();
        all
    }
}

impl Default for PermissionMap {
    fn default() -> Self {
        PermissionMap::standard()
    }
}

/// Authenticated identity of a request
#[derive(Debug, Clone)]
pub struct Caller {
    pub name: String,
    grants: Arc<HashSet<String>>,
}

impl Caller {
    pub fn new(name: &str, grants: impl IntoIterator<Item = String>) -> Self {
        Caller {
            name: name.to_string(),
            grants: Arc::new(grants.into_iter().collect()),
        }
    }

    /// Whether this caller holds `identifier`
    pub fn holds(&self, identifier: &str) -> bool {
        self.grants.contains(identifier)
    }
}

/// API keys and the callers they authenticate
#[derive(Clone, Default)]
pub struct AccessControl {
    callers: Arc<HashMap<String, Caller>>,
}

impl AccessControl {
    pub fn new(users: &[UserSettings]) -> Self {
        let callers = users
            .iter()
            .map(|user| {
                (
                    user.api_key.clone(),
                    Caller::new(&user.name, user.grants.iter().cloned()),
                )
            })
            .collect();
        AccessControl {
            callers: Arc::new(callers),
        }
    }

    /// Single admin caller holding every identifier in `permissions`
    pub fn admin(api_key: &str, permissions: &PermissionMap) -> Self {
        AccessControl::new(&[UserSettings {
            name: "admin".to_string(),
            api_key: api_key.to_string(),
            grants: permissions.all_identifiers(),
        }])
    }

    pub fn identify(&self, api_key: Option<&str>) -> Option<Caller> {
        api_key.and_then(|key| self.callers.get(key)).cloned()
    }
}

// Function to get an existing API key or create a new one
pub fn get_or_create_api_key(file_path: &Path) -> Result<String, std::io::Error> {
    if let Ok(api_key) = fs::read_to_string(file_path) {
        let api_key = api_key.trim().to_string();
        if !api_key.is_empty() {
            debug!(path = %file_path.display(), "Using existing API key");
            return Ok(api_key);
        }
    }

    let api_key: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let mut file = fs::File::create(file_path)?;
    file.write_all(api_key.as_bytes())?;
    info!(path = %file_path.display(), "Generated new API key");
    Ok(api_key)
}

/// Resolve the caller from the X-API-Key header
/// Rejects with `ApiError::Unauthorized` for a missing or unknown key
pub fn with_caller(
    access: AccessControl,
) -> impl Filter<Extract = (Caller,), Error = Rejection> + Clone {
    warp::header::optional::<String>(API_KEY_HEADER)
        .and(warp::any().map(move || access.clone()))
        .and_then(|api_key: Option<String>, access: AccessControl| async move {
            access
                .identify(api_key.as_deref())
                .ok_or_else(|| warp::reject::custom(ApiError::Unauthorized))
        })
}
