//! Task API client

use openapi_client::models::{ListQuery, MessageResponse, Page, Task, TaskStatus, TaskUpdate};

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::validate::TaskForm;

impl HttpClient {
    /// List tasks matching the query
    pub async fn list_tasks(&self, query: &ListQuery) -> Result<Page<Task>, ConsoleError> {
        self.get_query("/tasks", query).await
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, ConsoleError> {
        self.get(&format!("/tasks/{}", id)).await
    }

    /// Validate the form locally, then create the task
    pub async fn create_task(&self, form: &TaskForm) -> Result<Task, ConsoleError> {
        let body = form.to_create()?;
        self.post("/tasks", &body).await
    }

    /// Validate the form locally, then update the task
    pub async fn update_task(&self, id: &str, form: &TaskForm) -> Result<Task, ConsoleError> {
        let body = form.to_update()?;
        self.put(&format!("/tasks/{}", id), &body).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<MessageResponse, ConsoleError> {
        self.delete(&format!("/tasks/{}", id)).await
    }

    /// Overwrite only the status column of a task
    pub async fn set_task_status(&self, id: &str, status: TaskStatus) -> Result<Task, ConsoleError> {
        self.put(&format!("/tasks/{}", id), &TaskUpdate::status(status)).await
    }
}
