//! Task Manager for queued snapshot operations
//!
//! Handles:
//! - Task creation with an opaque, prefixed task id
//! - Task lookup for the polling endpoint
//! - Listing queued tasks
//!
//! Tasks are handed off here and executed elsewhere; nothing in this
//! crate runs them.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use uuid::Uuid;

use crate::models::{TaskOperation, TaskState, TaskStatus, TaskTarget};

/// Task manager for queued operations
#[derive(Clone, Default)]
pub struct TaskManager {
    /// All tasks indexed by task_id
    tasks: Arc<RwLock<HashMap<String, TaskState>>>,
}

impl TaskManager {
    /// Create a new TaskManager
    pub fn new() -> Self {
        TaskManager::default()
    }

    /// Get current timestamp
    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// Queue a new task and return its id
    pub fn enqueue(
        &self,
        operation: TaskOperation,
        target: TaskTarget,
        params: serde_json::Value,
    ) -> String {
        let task_id = format!(
            "{}-{}",
            operation.id_prefix(),
            &Uuid::new_v4().simple().to_string()[..8]
        );

        let task = TaskState {
            task_id: task_id.clone(),
            status: TaskStatus::Queued,
            operation,
            target,
            params,
            queued_at: Self::now(),
        };

        info!(
            task_id = %task_id,
            operation = ?task.operation,
            parent_id = task.target.parent_id,
            snapshot_id = ?task.target.snapshot_id,
            "Task queued"
        );

        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        tasks.insert(task_id.clone(), task);

        task_id
    }

    /// Get task by ID
    pub fn get_task(&self, task_id: &str) -> Option<TaskState> {
        let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        tasks.get(task_id).cloned()
    }

    /// List all tasks, oldest first
    pub fn list_tasks(&self) -> Vec<TaskState> {
        let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<TaskState> = tasks.values().cloned().collect();
        all.sort_by(|a, b| {
            a.queued_at
                .cmp(&b.queued_at)
                .then_with(|| a.task_id.cmp(&b.task_id))
        });
        all
    }
}
