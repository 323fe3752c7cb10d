//! Control proxy request shapes

use std::fmt;

use openapi_client::models::{Account, Task, TaskStatus};

/// Port sent when no account matches the task
pub const UNKNOWN_PORT: u16 = 0;

/// What the remote host is asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlDirective {
    Start,
    /// Stop every running application on the host
    StopAll,
}

impl ControlDirective {
    /// Value of the `target` query parameter
    pub fn wire_value(&self) -> &'static str {
        match self {
            ControlDirective::Start => "START",
            ControlDirective::StopAll => "ALL",
        }
    }

    /// Task status that confirms the directive took effect
    pub fn expected_status(&self) -> TaskStatus {
        match self {
            ControlDirective::Start => TaskStatus::Running,
            ControlDirective::StopAll => TaskStatus::Pending,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            ControlDirective::Start => "start",
            ControlDirective::StopAll => "stop",
        }
    }
}

impl fmt::Display for ControlDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_value())
    }
}

/// One request to the intranet control proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    pub backend_ip: String,
    pub backend_port: u16,
    /// Target application
    pub app: String,
    pub directive: ControlDirective,
}

impl ControlRequest {
    pub fn for_task(task: &Task, port: u16, directive: ControlDirective) -> Self {
        Self {
            backend_ip: task.host_ip.clone(),
            backend_port: port,
            app: task.app_name.clone(),
            directive,
        }
    }

    /// Query parameters in wire order
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("backend_ip", self.backend_ip.clone()),
            ("backend_port", self.backend_port.to_string()),
            ("tak", self.app.clone()),
            ("target", self.directive.wire_value().to_string()),
        ]
    }
}

/// Control port of the account bound to `task`
pub fn resolve_control_port(task: &Task, accounts: &[Account]) -> u16 {
    accounts
        .iter()
        .find(|a| a.shadow_bot_account == task.shadow_bot_account)
        .map(|a| a.port)
        .unwrap_or(UNKNOWN_PORT)
}

/// Result of an accepted control request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    /// The remote host took the request; status changes arrive later
    AwaitingConfirmation { message: String },
}

impl ControlOutcome {
    pub fn message(&self) -> &str {
        match self {
            ControlOutcome::AwaitingConfirmation { message } => message,
        }
    }
}
