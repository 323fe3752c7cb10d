//! REST binding tests against the in-process backend

use std::sync::atomic::Ordering;

use openapi_client::models::{ExecutionLog, ListQuery, TaskStatus};
use rpa_console::app::commands;
use rpa_console::control::{ControlDirective, ControlRequest, TaskController, UNKNOWN_PORT};
use rpa_console::errors::ConsoleError;
use rpa_console::http::HttpClient;
use rpa_console::resources::ResourceUrls;
use rpa_console::validate::AccountForm;
use tokio_test::{assert_err, assert_ok};

use crate::support::TestServer;

fn log_with_content(reference: &str) -> ExecutionLog {
    serde_json::from_value(serde_json::json!({
        "id": "l-1",
        "text": "nightly run",
        "app_name": "invoice",
        "shadow_bot_account": "bot-a",
        "status": "completed",
        "start_time": "2026-01-27T10:00:00",
        "end_time": "2026-01-27T10:05:00",
        "duration": 300.0,
        "host_ip": "10.0.0.5",
        "log_info": true,
        "screenshot": false,
        "log_content": reference
    }))
    .unwrap()
}

#[tokio::test]
async fn test_lists_and_search() {
    let server = TestServer::start().await;
    let client = HttpClient::new(&server.api_base_url()).unwrap();

    let accounts = assert_ok!(client.list_accounts(&ListQuery::first_page().with_search("bot-b")).await);
    assert_eq!(accounts.items.len(), 1);
    assert_eq!(accounts.items[0].port, 8002);

    let tasks = assert_ok!(client.list_tasks(&ListQuery::first_page()).await);
    assert_eq!(tasks.total, 2);
    assert_eq!(tasks.items[1].status, TaskStatus::Running);

    let health = assert_ok!(client.health().await);
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn test_error_body_becomes_api_error() {
    let server = TestServer::start().await;
    let client = HttpClient::new(&server.api_base_url()).unwrap();

    let err = assert_err!(client.get_task("t-404").await);
    assert_eq!(err.status(), 404);
    assert_eq!(err.user_message(), "Task with ID 't-404' not found");

    let err = assert_err!(client.get::<serde_json::Value>("/broken").await);
    assert_eq!(err.status(), 502);
    assert_eq!(err.user_message(), "API request failed");
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = HttpClient::new(&format!("http://127.0.0.1:{port}/api/v1")).unwrap();
    let err = assert_err!(client.health().await);
    assert!(matches!(err, ConsoleError::Transport(_)));
    assert_eq!(err.status(), 0);
    assert_eq!(err.user_message(), "Network request failed");
}

#[tokio::test]
async fn test_invalid_form_never_reaches_backend() {
    let server = TestServer::start().await;
    let client = HttpClient::new(&server.api_base_url()).unwrap();

    let mut form = AccountForm {
        shadow_bot_account: "bot-c".to_string(),
        host_ip: "192.168.1".to_string(),
        port: 8003,
        task_control: "nightly".to_string(),
    };
    let err = assert_err!(client.create_account(&form).await);
    assert!(err.is_validation());
    assert_eq!(server.backend.account_posts.load(Ordering::SeqCst), 0);

    form.host_ip = "192.168.1.1".to_string();
    let account = assert_ok!(client.create_account(&form).await);
    assert_eq!(account.port, 8003);
    assert_eq!(server.backend.account_posts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_control_request_query() {
    let server = TestServer::start().await;
    let client = HttpClient::new(&server.api_base_url()).unwrap();

    let request = ControlRequest {
        backend_ip: "10.0.0.5".to_string(),
        backend_port: UNKNOWN_PORT,
        app: "发票 app".to_string(),
        directive: ControlDirective::StopAll,
    };
    let ack = assert_ok!(client.send_control(&request).await);
    assert!(ack.success);

    let calls = server.backend.control_calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["backend_ip"], "10.0.0.5");
    assert_eq!(calls[0]["backend_port"], "0");
    assert_eq!(calls[0]["tak"], "发票 app");
    assert_eq!(calls[0]["target"], "ALL");
}

#[tokio::test]
async fn test_set_task_status_sends_status_only() {
    let server = TestServer::start().await;
    let client = HttpClient::new(&server.api_base_url()).unwrap();

    let task = assert_ok!(client.set_task_status("t-2", TaskStatus::Pending).await);
    assert_eq!(task.status, TaskStatus::Pending);

    let updates = server.backend.task_updates.lock().unwrap().clone();
    assert_eq!(updates, vec![("t-2".to_string(), serde_json::json!({"status": "pending"}))]);
}

#[tokio::test]
async fn test_log_content_and_downloads_use_resolver() {
    let server = TestServer::start().await;
    let client = HttpClient::new(&server.api_base_url()).unwrap();
    let urls = ResourceUrls::new(&server.api_base_url()).unwrap();
    assert_eq!(urls.local_origin(), server.origin());

    let local = assert_ok!(client.fetch_log_content(&log_with_content("/static/logs/run.txt"), &urls).await);
    assert_eq!(local.as_deref(), Some("local log line 1\nlocal log line 2"));

    let remote = assert_ok!(
        client
            .fetch_log_content(&log_with_content("https://oss.example.com/logs/run.txt"), &urls)
            .await
    );
    assert_eq!(remote.as_deref(), Some("view:https://oss.example.com/logs/run.txt"));

    let bytes = assert_ok!(client.download_resource("https://oss.example.com/a.png", &urls).await);
    assert_eq!(&bytes[..], b"download:https://oss.example.com/a.png");

    let mut empty = log_with_content("");
    assert_eq!(assert_ok!(client.fetch_log_content(&empty, &urls).await), None);
    empty.log_content = Some("relative/run.txt".to_string());
    assert!(matches!(
        client.fetch_log_content(&empty, &urls).await,
        Err(ConsoleError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_upload_config_file_multipart() {
    let server = TestServer::start().await;
    let client = HttpClient::new(&server.api_base_url()).unwrap();

    let response = assert_ok!(
        client
            .upload_config_file("bot-a", "invoice", "params.json", b"{\"region\":\"east\"}".to_vec())
            .await
    );
    assert!(response.success);
    assert_eq!(
        response.file_url.as_deref(),
        Some("https://oss.example.com/config/bot-a/invoice/params.json")
    );

    let uploads = server.backend.uploads.lock().unwrap().clone();
    assert_eq!(uploads[0]["file"], "{\"region\":\"east\"}");
    assert_eq!(uploads[0]["shadow_bot_account"], "bot-a");
}

#[tokio::test]
async fn test_export_and_performance_window() {
    let server = TestServer::start().await;
    let client = HttpClient::new(&server.api_base_url()).unwrap();

    let export = assert_ok!(client.export_logs().await);
    assert!(export.starts_with(b"PK"));

    let trends = assert_ok!(client.performance_trends(90).await);
    assert_eq!(trends.period, "30 days");
    let trends = assert_ok!(client.performance_trends(0).await);
    assert_eq!(trends.period, "1 days");
}

#[tokio::test]
async fn test_control_port_comes_from_account_name() {
    let server = TestServer::start().await;
    let controller = TaskController::new(HttpClient::new(&server.api_base_url()).unwrap());

    let (task, _) = assert_ok!(commands::control(&controller, "t-1", ControlDirective::Start).await);
    assert_eq!(task.account_port, Some(9999));
    let (_, outcome) = assert_ok!(commands::control(&controller, "t-2", ControlDirective::StopAll).await);
    assert!(outcome.message().contains("ALL"));

    let calls = server.backend.control_calls.lock().unwrap().clone();
    assert_eq!(calls[0]["backend_port"], "8001");
    assert_eq!(calls[0]["target"], "START");
    // bot-z has no account
    assert_eq!(calls[1]["backend_port"], UNKNOWN_PORT.to_string());
}
