//! REST agent for VM and instance snapshot management.
//!
//! Snapshots are exposed as a subcollection of `/api/vms/{id}` and
//! `/api/instances/{id}`. Mutating actions are queued as tasks and answered
//! with a task id and a polling href.

pub mod auth;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod inventory;
pub mod models;
pub mod routes;
pub mod settings;
pub mod task_manager;
pub mod utils;
