// inventory/mod.rs
// In-memory inventory of snapshot owners and their snapshots

mod manager;
mod snapshots;
mod types;


pub use manager::Inventory;
pub use types::{
    Host, InventoryError, InventorySeed, ParentKind, Provider, Snapshot, UnknownCollection,
    VmOrTemplate,
};
