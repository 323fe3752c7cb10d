use serde::{Deserialize, Serialize};

/// Task status.
///
/// The backend only produces `pending` and `running`. Older backend revisions
/// also wrote `completed` and `failed` into task rows; those still decode but
/// are display-only and never drive control decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "completed")]
    LegacyCompleted,
    #[serde(rename = "failed")]
    LegacyFailed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::LegacyCompleted => "completed",
            TaskStatus::LegacyFailed => "failed",
        }
    }

    /// Whether this value only exists in rows written by older backends
    pub fn is_legacy(&self) -> bool {
        matches!(self, TaskStatus::LegacyCompleted | TaskStatus::LegacyFailed)
    }

    pub fn is_running(&self) -> bool {
        *self == TaskStatus::Running
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of automation work bound to one account and one application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub task_name: String,
    pub shadow_bot_account: String,
    pub host_ip: String,
    pub app_name: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub config_file: bool,
    #[serde(default)]
    pub config_info: bool,
    /// Remote object reference of the uploaded config file
    #[serde(default)]
    pub config_file_path: Option<String>,
    /// JSON-encoded config payload
    #[serde(default)]
    pub config_json: Option<String>,
    #[serde(default)]
    pub last_run_time: Option<String>,
    #[serde(default)]
    pub trigger_time: Option<String>,
    /// Control port copied from the bound account, when the backend includes it
    #[serde(default)]
    pub account_port: Option<u16>,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    /// A config file is expected but nothing has been uploaded yet
    pub fn has_pending_config_upload(&self) -> bool {
        self.config_file
            && self
                .config_file_path
                .as_deref()
                .map_or(true, |p| p.trim().is_empty())
    }

    /// `config_json` is either empty or well-formed JSON
    pub fn config_json_is_valid(&self) -> bool {
        match self.config_json.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(raw) => serde_json::from_str::<serde_json::Value>(raw).is_ok(),
        }
    }
}

/// Task creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCreate {
    pub task_name: String,
    pub shadow_bot_account: String,
    pub host_ip: String,
    pub app_name: String,
    pub config_file: bool,
    pub config_info: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_json: Option<String>,
}

/// Partial task update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_bot_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_info: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_json: Option<String>,
}

impl TaskUpdate {
    /// Update that only touches the status column
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}
