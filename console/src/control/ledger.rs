//! Accepted control requests waiting for the task status to follow

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use openapi_client::models::Task;
use tracing::{debug, info};

use crate::control::protocol::ControlDirective;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingControl {
    pub directive: ControlDirective,
    pub requested_at: DateTime<Utc>,
}

/// A pending request whose effect has been observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub task_id: String,
    pub directive: ControlDirective,
    pub requested_at: DateTime<Utc>,
}

/// Per-task record of accepted requests. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ControlLedger {
    pending: Arc<Mutex<HashMap<String, PendingControl>>>,
}

impl ControlLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted request, replacing an older one for the same task
    pub fn record(&self, task_id: &str, directive: ControlDirective) {
        debug!("Awaiting {} confirmation for task {}", directive.verb(), task_id);
        self.lock().insert(
            task_id.to_string(),
            PendingControl {
                directive,
                requested_at: Utc::now(),
            },
        );
    }

    pub fn pending(&self, task_id: &str) -> Option<PendingControl> {
        self.lock().get(task_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Match an observed task against its pending request
    pub fn observe(&self, task: &Task) -> Option<Confirmation> {
        let mut pending = self.lock();
        let entry = pending.get(&task.id)?;
        if entry.directive.expected_status() != task.status {
            return None;
        }
        let entry = pending.remove(&task.id)?;
        info!(
            "Task {} confirmed {} ({})",
            task.id,
            entry.directive.verb(),
            task.status
        );
        Some(Confirmation {
            task_id: task.id.clone(),
            directive: entry.directive,
            requested_at: entry.requested_at,
        })
    }

    /// Task ids whose request is older than `timeout`
    pub fn overdue(&self, timeout: Duration) -> Vec<(String, PendingControl)> {
        let now = Utc::now();
        let Ok(timeout) = chrono::Duration::from_std(timeout) else {
            return Vec::new();
        };
        let mut overdue: Vec<_> = self
            .lock()
            .iter()
            .filter(|(_, p)| now.signed_duration_since(p.requested_at) >= timeout)
            .map(|(id, p)| (id.clone(), p.clone()))
            .collect();
        overdue.sort_by(|a, b| a.0.cmp(&b.0));
        overdue
    }

    pub fn clear(&self, task_id: &str) -> Option<PendingControl> {
        self.lock().remove(task_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingControl>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}
