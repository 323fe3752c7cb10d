//! Task controller tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use openapi_client::models::{ControlAck, Task, TaskStatus};
use rpa_console::control::{
    ControlBackend, ControlDirective, ControlOutcome, ControlRequest, TaskController, UNKNOWN_PORT,
};
use rpa_console::errors::ConsoleError;

use crate::support::task_json;

/// Backend store kept in memory
#[derive(Default)]
struct MemoryBackend {
    tasks: Mutex<HashMap<String, Task>>,
    requests: Mutex<Vec<ControlRequest>>,
    ack: Mutex<Option<ControlAck>>,
}

impl MemoryBackend {
    fn with_task(task: Task) -> Self {
        let backend = Self::default();
        backend.tasks.lock().unwrap().insert(task.id.clone(), task);
        backend
    }

    fn acking(self, success: bool, message: Option<&str>) -> Self {
        *self.ack.lock().unwrap() = Some(ControlAck {
            success,
            message: message.map(str::to_string),
            url: None,
            response_status: Some(200),
        });
        self
    }

    fn stored_status(&self, id: &str) -> TaskStatus {
        self.tasks.lock().unwrap()[id].status
    }
}

#[async_trait]
impl ControlBackend for MemoryBackend {
    async fn send_control(&self, request: &ControlRequest) -> Result<ControlAck, ConsoleError> {
        self.requests.lock().unwrap().push(request.clone());
        // no scripted ack means the proxy could not be reached
        self.ack
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ConsoleError::Internal("connection reset by peer".to_string()))
    }

    async fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Task, ConsoleError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| ConsoleError::Api {
                status: 404,
                message: format!("Task with ID '{task_id}' not found"),
            })?;
        task.status = status;
        Ok(task.clone())
    }
}

fn task(status: &str) -> Task {
    serde_json::from_value(task_json("t-1", "bot-a", status)).unwrap()
}

#[tokio::test]
async fn test_accepted_start_leaves_task_pending() {
    let local = task("pending");
    let controller = TaskController::new(MemoryBackend::with_task(local.clone()).acking(true, None));

    let outcome = controller.request_start(&local, 8001).await.unwrap();
    assert!(matches!(outcome, ControlOutcome::AwaitingConfirmation { .. }));
    assert!(outcome.message().contains("waiting for confirmation"));

    assert_eq!(local.status, TaskStatus::Pending);
    assert_eq!(controller.backend().stored_status("t-1"), TaskStatus::Pending);
    assert_eq!(
        controller.ledger().pending("t-1").map(|p| p.directive),
        Some(ControlDirective::Start)
    );

    let requests = controller.backend().requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].backend_ip, "10.0.0.5");
    assert_eq!(requests[0].backend_port, 8001);
    assert_eq!(requests[0].app, "invoice");
    assert_eq!(requests[0].directive.wire_value(), "START");
}

#[tokio::test]
async fn test_rejection_message_is_verbatim() {
    let local = task("running");
    let controller = TaskController::new(
        MemoryBackend::with_task(local.clone()).acking(false, Some("Remote host unreachable: timed out")),
    );

    let err = controller.request_stop(&local, 8001).await.unwrap_err();
    match &err {
        ConsoleError::ControlRejected(message) => assert_eq!(message, "Remote host unreachable: timed out"),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(err.user_message(), "Remote host unreachable: timed out");
    assert!(controller.ledger().is_empty());
    assert_eq!(controller.backend().stored_status("t-1"), TaskStatus::Running);
}

#[tokio::test]
async fn test_transport_failure_is_not_retried() {
    let local = task("pending");
    let controller = TaskController::new(MemoryBackend::with_task(local.clone()));

    assert!(controller.request_start(&local, 8001).await.is_err());
    assert_eq!(controller.backend().requests.lock().unwrap().len(), 1);
    assert!(controller.ledger().is_empty());
}

#[tokio::test]
async fn test_unknown_port_is_still_sent() {
    let local = task("running");
    let controller = TaskController::new(MemoryBackend::with_task(local.clone()).acking(true, Some("ok")));

    let outcome = controller.request_stop(&local, UNKNOWN_PORT).await.unwrap();
    assert_eq!(outcome.message(), "ok");
    let requests = controller.backend().requests.lock().unwrap().clone();
    assert_eq!(requests[0].backend_port, UNKNOWN_PORT);
    assert_eq!(requests[0].directive, ControlDirective::StopAll);
}

#[tokio::test]
async fn test_force_stop_sets_pending_immediately() {
    let local = task("running");
    let controller = TaskController::new(MemoryBackend::with_task(local.clone()).acking(true, None));

    controller.request_stop(&local, 8001).await.unwrap();
    assert_eq!(controller.ledger().len(), 1);

    let updated = controller.force_stop(&local).await.unwrap();
    assert_eq!(updated.status, TaskStatus::Pending);
    assert_eq!(controller.backend().stored_status("t-1"), TaskStatus::Pending);
    assert!(controller.ledger().is_empty());
}

#[tokio::test]
async fn test_force_stop_of_missing_task_fails() {
    let controller = TaskController::new(MemoryBackend::default());
    let err = controller.force_stop(&task("running")).await.unwrap_err();
    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn test_confirmation_arrives_with_reload() {
    let local = task("pending");
    let controller = TaskController::new(MemoryBackend::with_task(local.clone()).acking(true, None));
    controller.request_start(&local, 8001).await.unwrap();

    assert!(controller.ledger().observe(&local).is_none());
    let confirmed = controller.ledger().observe(&task("running")).unwrap();
    assert_eq!(confirmed.directive, ControlDirective::Start);
}
