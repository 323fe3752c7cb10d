//! Start/stop requests against remote automation hosts

use async_trait::async_trait;
use openapi_client::models::{ControlAck, Task, TaskStatus};
use tracing::{error, info, warn};

use crate::control::ledger::ControlLedger;
use crate::control::protocol::{ControlDirective, ControlOutcome, ControlRequest, UNKNOWN_PORT};
use crate::errors::ConsoleError;

/// Backend operations the controller needs
#[async_trait]
pub trait ControlBackend: Send + Sync {
    /// Forward a request through the intranet control proxy
    async fn send_control(&self, request: &ControlRequest) -> Result<ControlAck, ConsoleError>;

    /// Write a task status straight to the backend store
    async fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Task, ConsoleError>;
}

/// Issues control requests and tracks which ones still await confirmation.
///
/// Never changes a task's local status: confirmation arrives through a push
/// event or a reload.
pub struct TaskController<B: ControlBackend> {
    backend: B,
    ledger: ControlLedger,
}

impl<B: ControlBackend> TaskController<B> {
    pub fn new(backend: B) -> Self {
        Self::with_ledger(backend, ControlLedger::new())
    }

    pub fn with_ledger(backend: B, ledger: ControlLedger) -> Self {
        Self { backend, ledger }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn ledger(&self) -> &ControlLedger {
        &self.ledger
    }

    /// Ask the task's host to start its application
    pub async fn request_start(&self, task: &Task, port: u16) -> Result<ControlOutcome, ConsoleError> {
        self.request(task, port, ControlDirective::Start).await
    }

    /// Ask the task's host to stop all running applications
    pub async fn request_stop(&self, task: &Task, port: u16) -> Result<ControlOutcome, ConsoleError> {
        self.request(task, port, ControlDirective::StopAll).await
    }

    /// Set the task to `pending` without involving the remote host
    pub async fn force_stop(&self, task: &Task) -> Result<Task, ConsoleError> {
        warn!(
            "Force stopping task {} ({}) without remote confirmation",
            task.id, task.task_name
        );
        let updated = self
            .backend
            .set_task_status(&task.id, TaskStatus::Pending)
            .await
            .inspect_err(|e| error!("Force stop of task {} failed: {}", task.id, e))?;
        self.ledger.clear(&task.id);
        info!("Task {} forced to {}", updated.id, updated.status);
        Ok(updated)
    }

    async fn request(
        &self,
        task: &Task,
        port: u16,
        directive: ControlDirective,
    ) -> Result<ControlOutcome, ConsoleError> {
        if port == UNKNOWN_PORT {
            warn!(
                "No account named {} for task {}; sending {} with unknown port",
                task.shadow_bot_account,
                task.id,
                directive.verb()
            );
        }

        let request = ControlRequest::for_task(task, port, directive);
        let ack = match self.backend.send_control(&request).await {
            Ok(ack) => ack,
            Err(e) => {
                error!("{} request for task {} failed: {}", directive.verb(), task.id, e);
                return Err(e);
            }
        };

        if !ack.success {
            let message = ack
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Remote host refused the {} request", directive.verb()));
            warn!("{} request for task {} rejected: {}", directive.verb(), task.id, message);
            return Err(ConsoleError::ControlRejected(message));
        }

        let message = ack
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("{} request sent; waiting for confirmation", directive.verb()));
        info!(
            "{} request for task {} accepted by {}:{}: {}",
            directive.verb(),
            task.id,
            request.backend_ip,
            request.backend_port,
            message
        );
        self.ledger.record(&task.id, directive);
        Ok(ControlOutcome::AwaitingConfirmation { message })
    }
}
