//! Local snapshot of the task list

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use openapi_client::models::{ListQuery, Task};
use tracing::debug;

use crate::control::{Confirmation, ControlLedger};
use crate::errors::ConsoleError;
use crate::http::HttpClient;

#[derive(Debug, Default)]
struct Snapshot {
    tasks: Vec<Task>,
    loaded_at: Option<DateTime<Utc>>,
}

/// Disposable copy of the backend's task list.
///
/// Every reload replaces the whole list.
#[derive(Debug)]
pub struct TaskBoard {
    snapshot: RwLock<Snapshot>,
    ledger: ControlLedger,
}

impl TaskBoard {
    pub fn new(ledger: ControlLedger) -> Self {
        Self {
            snapshot: RwLock::new(Snapshot::default()),
            ledger,
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.read().tasks.clone()
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.read().tasks.iter().find(|t| t.id == id).cloned()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.read().loaded_at
    }

    /// Task count per status
    pub fn summary(&self) -> BTreeMap<&'static str, usize> {
        let mut summary = BTreeMap::new();
        for task in &self.read().tasks {
            *summary.entry(task.status.as_str()).or_insert(0) += 1;
        }
        summary
    }

    /// Swap in a fresh list and collect the control requests it confirms
    pub fn replace(&self, tasks: Vec<Task>) -> Vec<Confirmation> {
        let confirmations = tasks.iter().filter_map(|t| self.ledger.observe(t)).collect();
        let mut snapshot = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        snapshot.tasks = tasks;
        snapshot.loaded_at = Some(Utc::now());
        confirmations
    }

    /// Fetch the task list from the backend and replace the snapshot
    pub async fn reload(&self, http_client: &HttpClient, query: &ListQuery) -> Result<Vec<Confirmation>, ConsoleError> {
        let page = http_client.list_tasks(query).await?;
        debug!("Reloaded {} of {} tasks", page.items.len(), page.total);
        Ok(self.replace(page.items))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(|e| e.into_inner())
    }
}
