//! Execution log API client

use bytes::Bytes;
use openapi_client::models::{ExecutionLog, LogQuery, Page};

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// List execution logs
    pub async fn list_logs(&self, query: &LogQuery) -> Result<Page<ExecutionLog>, ConsoleError> {
        self.get_query("/logs", query).await
    }

    /// Spreadsheet export of all logs
    pub async fn export_logs(&self) -> Result<Bytes, ConsoleError> {
        self.get_bytes("/logs/export").await
    }
}
