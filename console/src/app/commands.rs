//! One-shot console commands

use openapi_client::models::{ListQuery, LogQuery, Task};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::control::{resolve_control_port, ControlDirective, ControlOutcome, TaskController};
use crate::errors::ConsoleError;
use crate::filesys::file::File;
use crate::http::HttpClient;
use crate::resources::ResourceUrls;

fn to_value<T: Serialize>(value: &T) -> Result<Value, ConsoleError> {
    Ok(serde_json::to_value(value)?)
}

fn list_query(search: Option<&str>) -> ListQuery {
    ListQuery::first_page().with_search(search.unwrap_or_default())
}

pub async fn accounts(http_client: &HttpClient, search: Option<&str>) -> Result<Value, ConsoleError> {
    to_value(&http_client.list_accounts(&list_query(search)).await?)
}

pub async fn tasks(http_client: &HttpClient, search: Option<&str>) -> Result<Value, ConsoleError> {
    to_value(&http_client.list_tasks(&list_query(search)).await?)
}

pub async fn logs(http_client: &HttpClient, search: Option<&str>) -> Result<Value, ConsoleError> {
    let query = LogQuery {
        search: search.filter(|s| !s.is_empty()).map(str::to_string),
        page: Some(1),
        page_size: Some(100),
        sort_by: Some("start_time".to_string()),
        order: Some("desc".to_string()),
        ..Default::default()
    };
    to_value(&http_client.list_logs(&query).await?)
}

pub async fn stats(http_client: &HttpClient, days: u32) -> Result<Value, ConsoleError> {
    let stats = http_client.dashboard_stats().await?;
    let performance = http_client.performance_trends(days).await?;
    let rank = http_client.execution_rank(10).await?;
    Ok(json!({
        "stats": stats,
        "performance": performance,
        "execution_rank": rank,
    }))
}

/// Look up the task and its account port, then send the directive
pub async fn control(
    controller: &TaskController<HttpClient>,
    task_id: &str,
    directive: ControlDirective,
) -> Result<(Task, ControlOutcome), ConsoleError> {
    let http_client = controller.backend();
    let task = http_client.get_task(task_id).await?;
    let accounts = http_client.list_accounts(&ListQuery::first_page()).await?;
    // always matched by account name; `account_port` on the task is informational
    let port = resolve_control_port(&task, &accounts.items);

    let outcome = match directive {
        ControlDirective::Start => controller.request_start(&task, port).await?,
        ControlDirective::StopAll => controller.request_stop(&task, port).await?,
    };
    Ok((task, outcome))
}

/// Force a task back to `pending`; refuses unless the operator confirmed
pub async fn force_stop(
    controller: &TaskController<HttpClient>,
    task_id: &str,
    confirmed: bool,
) -> Result<Task, ConsoleError> {
    if !confirmed {
        return Err(ConsoleError::Config(
            "Force stop skips remote confirmation; pass --yes to proceed".to_string(),
        ));
    }
    let task = controller.backend().get_task(task_id).await?;
    controller.force_stop(&task).await
}

/// Write the log export to `path`; returns the number of bytes written
pub async fn export_logs(http_client: &HttpClient, path: &str) -> Result<usize, ConsoleError> {
    let bytes = http_client.export_logs().await?;
    File::new(path).write_bytes(&bytes).await?;
    info!("Exported {} bytes of logs to {}", bytes.len(), path);
    Ok(bytes.len())
}

pub async fn upload_config(
    http_client: &HttpClient,
    path: &str,
    account: &str,
    app: &str,
) -> Result<Value, ConsoleError> {
    if account.trim().is_empty() || app.trim().is_empty() {
        return Err(ConsoleError::Config(
            "--account and --app are required for a config upload".to_string(),
        ));
    }
    let file = File::new(path);
    let content = file.read_bytes().await?;
    let response = http_client
        .upload_config_file(account.trim(), app.trim(), &file.name()?, content)
        .await?;
    to_value(&response)
}

/// View and download URLs of a stored reference
pub fn resolve(urls: &ResourceUrls, reference: &str) -> Value {
    json!({
        "reference": reference,
        "view_url": urls.view_url(Some(reference)),
        "download_url": urls.download_url(Some(reference)),
    })
}

/// Download a stored resource into `path`
pub async fn download(
    http_client: &HttpClient,
    urls: &ResourceUrls,
    reference: &str,
    path: &str,
) -> Result<usize, ConsoleError> {
    let bytes = http_client.download_resource(reference, urls).await?;
    File::new(path).write_bytes(&bytes).await?;
    Ok(bytes.len())
}
