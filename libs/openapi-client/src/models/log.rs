use serde::{Deserialize, Serialize};

/// Terminal status of one task run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Completed,
    Failed,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Completed => "completed",
            LogStatus::Failed => "failed",
        }
    }
}

/// Immutable record of one task run, written by the execution webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub app_name: String,
    pub shadow_bot_account: String,
    pub status: LogStatus,
    pub start_time: String,
    pub end_time: String,
    /// Run duration in seconds
    #[serde(default)]
    pub duration: f64,
    pub host_ip: String,
    #[serde(default)]
    pub log_info: bool,
    #[serde(default)]
    pub screenshot: bool,
    /// Local path or remote URL of the screenshot
    #[serde(default)]
    pub screenshot_path: Option<String>,
    /// Local path or remote URL of the log text
    #[serde(default)]
    pub log_content: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}
