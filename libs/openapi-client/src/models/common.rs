use serde::{Deserialize, Serialize};

/// Paginated list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 0,
            page_size: 0,
            total_pages: 0,
        }
    }
}

/// Search and pagination parameters for account and task lists
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl ListQuery {
    /// First page with the backend's maximum page size
    pub fn first_page() -> Self {
        Self {
            search: None,
            page: Some(1),
            page_size: Some(100),
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.is_empty() { None } else { Some(search) };
        self
    }
}

/// Execution log filters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// `start_time`, `created_at` or `duration`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    /// `asc` or `desc`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

/// Acknowledgment returned by the intranet control proxy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlAck {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Upstream URL the proxy called
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub response_status: Option<u16>,
}

/// Result of a config file upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigUploadResponse {
    pub success: bool,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Generic message response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(default)]
    pub code: String,
}

/// Backend health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub sse: Option<String>,
}

/// Error body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Human-readable message: `message`, then `detail.message`, then a string `detail`
    pub fn best_message(&self) -> Option<String> {
        if let Some(message) = self.message.as_ref().filter(|m| !m.is_empty()) {
            return Some(message.clone());
        }
        match &self.detail {
            Some(serde_json::Value::Object(detail)) => detail
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            _ => None,
        }
    }
}
