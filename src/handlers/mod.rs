// handlers/mod.rs
// Re-exports all handlers for the route table

mod health;
mod snapshots;
mod tasks;

pub use health::*;
pub use snapshots::*;
pub use tasks::*;
