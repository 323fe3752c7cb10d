use serde::{Deserialize, Serialize};

/// Account status, reflecting the most recent run on the account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Pending => "pending",
            AccountStatus::Running => "running",
            AccountStatus::Completed => "completed",
            AccountStatus::Failed => "failed",
        }
    }
}

/// A shadow bot account bound to a host and control port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub shadow_bot_account: String,
    pub host_ip: String,
    /// Control port; 0 when the port was never configured
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub recent_app: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub task_control: String,
    #[serde(default)]
    pub task_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Account creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCreate {
    pub shadow_bot_account: String,
    pub host_ip: String,
    pub port: u16,
    pub task_control: String,
}

/// Partial account update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_bot_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_control: Option<String>,
}
