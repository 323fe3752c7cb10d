//! Resource proxy, control proxy and config upload

use async_trait::async_trait;
use bytes::Bytes;
use openapi_client::models::{ConfigUploadResponse, ControlAck, ExecutionLog, Task, TaskStatus};
use reqwest::multipart;

use crate::control::{ControlBackend, ControlRequest};
use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::resources::ResourceUrls;

impl HttpClient {
    /// Forward a start/stop request to a remote host through the backend
    pub async fn send_control(&self, request: &ControlRequest) -> Result<ControlAck, ConsoleError> {
        self.get_query("/resources/proxy/intranet", &request.query_pairs()).await
    }

    /// Upload a task config file; the returned `file_url` goes into `config_file_path`
    pub async fn upload_config_file(
        &self,
        shadow_bot_account: &str,
        app_name: &str,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<ConfigUploadResponse, ConsoleError> {
        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(content).file_name(filename.to_string()))
            .text("shadow_bot_account", shadow_bot_account.to_string())
            .text("app_name", app_name.to_string());

        let response: ConfigUploadResponse = self.post_multipart("/resources/upload/config", form).await?;
        if !response.success {
            return Err(ConsoleError::Api {
                status: 200,
                message: response.message,
            });
        }
        Ok(response)
    }

    /// Text of a log's attached log file, via the cacheable view path
    pub async fn fetch_log_content(
        &self,
        log: &ExecutionLog,
        urls: &ResourceUrls,
    ) -> Result<Option<String>, ConsoleError> {
        let Some(reference) = log.log_content.as_deref().filter(|r| !r.is_empty()) else {
            return Ok(None);
        };
        let bytes = self.fetch_resolved(urls.view_url(Some(reference)), reference).await?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Raw bytes of a stored resource, via the uncached download path
    pub async fn download_resource(&self, reference: &str, urls: &ResourceUrls) -> Result<Bytes, ConsoleError> {
        self.fetch_resolved(urls.download_url(Some(reference)), reference).await
    }

    async fn fetch_resolved(&self, url: String, reference: &str) -> Result<Bytes, ConsoleError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConsoleError::NotFound(format!(
                "Resource reference is not fetchable: {}",
                reference
            )));
        }
        self.fetch_bytes(&url).await
    }
}

#[async_trait]
impl ControlBackend for HttpClient {
    async fn send_control(&self, request: &ControlRequest) -> Result<ControlAck, ConsoleError> {
        HttpClient::send_control(self, request).await
    }

    async fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Task, ConsoleError> {
        HttpClient::set_task_status(self, task_id, status).await
    }
}
