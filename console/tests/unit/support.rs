//! In-process backend for HTTP-level tests

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::stream::{self, Stream, StreamExt};
use serde_json::{json, Value};

type Params = Query<HashMap<String, String>>;

#[derive(Default)]
pub struct Backend {
    pub control_calls: Mutex<Vec<HashMap<String, String>>>,
    pub account_posts: AtomicUsize,
    pub task_updates: Mutex<Vec<(String, Value)>>,
    pub uploads: Mutex<Vec<HashMap<String, String>>>,
    pub sse_connections: AtomicUsize,
    pub task_lists: AtomicUsize,
    /// Delay before the task list responds
    pub tasks_delay_ms: AtomicU64,
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub backend: Arc<Backend>,
}

impl TestServer {
    pub async fn start() -> Self {
        let backend = Arc::new(Backend::default());
        let api = Router::new()
            .route("/health", get(health))
            .route("/accounts", get(list_accounts).post(create_account))
            .route("/tasks", get(list_tasks))
            .route("/tasks/{id}", get(get_task).put(update_task))
            .route("/logs/export", get(export_logs))
            .route("/dashboard/performance", get(performance))
            .route("/resources/proxy", get(view_proxy))
            .route("/resources/proxy/download", get(download_proxy))
            .route("/resources/proxy/intranet", get(intranet_proxy))
            .route("/resources/upload/config", axum::routing::post(upload_config))
            .route("/sse/events", get(sse_events))
            .route("/broken", get(broken));

        let app = Router::new()
            .nest("/api/v1", api)
            .route("/static/logs/run.txt", get(|| async { "local log line 1\nlocal log line 2" }))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, backend }
    }

    pub fn api_base_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    pub fn origin(&self) -> String {
        format!("http://{}", self.addr)
    }
}

pub fn task_json(id: &str, account: &str, status: &str) -> Value {
    json!({
        "id": id,
        "task_name": format!("task {id}"),
        "shadow_bot_account": account,
        "host_ip": "10.0.0.5",
        "app_name": "invoice",
        "status": status,
        "config_file": false,
        "config_info": false,
        "created_at": "2026-01-27T10:00:00",
        "updated_at": "2026-01-27T10:00:00"
    })
}

fn account_json(id: &str, name: &str, port: u16) -> Value {
    json!({
        "id": id,
        "shadow_bot_account": name,
        "host_ip": "10.0.0.5",
        "port": port,
        "status": "pending",
        "task_control": "nightly",
        "task_count": 1,
        "created_at": "2026-01-27T10:00:00",
        "updated_at": "2026-01-27T10:00:00"
    })
}

fn page(items: Vec<Value>) -> Value {
    let total = items.len();
    json!({"items": items, "total": total, "page": 1, "page_size": 100, "total_pages": 1})
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "database": "connected", "version": "1.0.0", "sse": "enabled"}))
}

async fn list_accounts(Query(params): Params) -> Json<Value> {
    let accounts = vec![account_json("a-1", "bot-a", 8001), account_json("a-2", "bot-b", 8002)];
    let search = params.get("search").cloned().unwrap_or_default();
    let items = accounts
        .into_iter()
        .filter(|a| a["shadow_bot_account"].as_str().unwrap_or_default().contains(&search))
        .collect();
    Json(page(items))
}

async fn create_account(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Json<Value> {
    backend.account_posts.fetch_add(1, Ordering::SeqCst);
    let name = body["shadow_bot_account"].as_str().unwrap_or_default();
    let port = body["port"].as_u64().unwrap_or_default() as u16;
    Json(account_json("a-new", name, port))
}

async fn list_tasks(State(backend): State<Arc<Backend>>) -> Json<Value> {
    backend.task_lists.fetch_add(1, Ordering::SeqCst);
    let delay = backend.tasks_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    Json(page(vec![
        task_json("t-1", "bot-a", "pending"),
        task_json("t-2", "bot-z", "running"),
    ]))
}

async fn get_task(Path(id): Path<String>) -> impl IntoResponse {
    match id.as_str() {
        "t-1" => {
            let mut task = task_json("t-1", "bot-a", "pending");
            task["account_port"] = json!(9999);
            (StatusCode::OK, Json(task))
        }
        "t-2" => (StatusCode::OK, Json(task_json("t-2", "bot-z", "running"))),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": {"code": "NOT_FOUND", "message": format!("Task with ID '{id}' not found")}})),
        ),
    }
}

async fn update_task(
    State(backend): State<Arc<Backend>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    backend.task_updates.lock().unwrap().push((id.clone(), body.clone()));
    let status = body["status"].as_str().unwrap_or("pending");
    Json(task_json(&id, "bot-a", status))
}

async fn export_logs() -> impl IntoResponse {
    (
        [("content-type", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")],
        b"PK\x03\x04export".to_vec(),
    )
}

async fn performance(Query(params): Params) -> Json<Value> {
    let days = params.get("days").cloned().unwrap_or_default();
    Json(json!({"period": format!("{days} days"), "dailyStats": [], "totalExecutions": 0}))
}

async fn view_proxy(Query(params): Params) -> String {
    format!("view:{}", params.get("url").cloned().unwrap_or_default())
}

async fn download_proxy(Query(params): Params) -> String {
    format!("download:{}", params.get("url").cloned().unwrap_or_default())
}

async fn intranet_proxy(State(backend): State<Arc<Backend>>, Query(params): Params) -> Json<Value> {
    backend.control_calls.lock().unwrap().push(params.clone());
    let target = params.get("target").cloned().unwrap_or_default();
    if params.get("tak").map(String::as_str) == Some("offline-app") {
        return Json(json!({
            "success": false,
            "message": "Remote host unreachable: connection timed out",
            "url": null,
            "response_status": null
        }));
    }
    Json(json!({
        "success": true,
        "message": format!("Command {target} delivered"),
        "url": format!("http://{}:{}/{}", params["backend_ip"], params["backend_port"], target),
        "response_status": 200
    }))
}

async fn upload_config(State(backend): State<Arc<Backend>>, mut multipart: Multipart) -> Json<Value> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            fields.insert("filename".to_string(), field.file_name().unwrap_or_default().to_string());
            let bytes = field.bytes().await.unwrap();
            fields.insert("file".to_string(), String::from_utf8_lossy(&bytes).into_owned());
        } else {
            fields.insert(name, field.text().await.unwrap());
        }
    }
    let url = format!(
        "https://oss.example.com/config/{}/{}/{}",
        fields["shadow_bot_account"], fields["app_name"], fields["filename"]
    );
    backend.uploads.lock().unwrap().push(fields);
    Json(json!({"success": true, "file_url": url, "message": "uploaded"}))
}

async fn sse_events(State(backend): State<Arc<Backend>>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    backend.sse_connections.fetch_add(1, Ordering::SeqCst);
    let events = vec![
        Event::default()
            .event("task_updated")
            .data(r#"{"type":"task_updated","data":{"task_id":"t-1","status":"running"}}"#),
        Event::default().data("{not json"),
        Event::default()
            .event("heartbeat")
            .data(r#"{"type":"heartbeat","timestamp":"2026-01-27T10:00:30"}"#),
        Event::default()
            .event("log_created")
            .data(r#"{"type":"log_created","data":{"log_id":"l-1","app_name":"invoice","status":"completed"}}"#),
    ];
    let stream = stream::iter(events.into_iter().map(Ok)).chain(stream::pending());
    Sse::new(stream)
}

async fn broken() -> impl IntoResponse {
    (StatusCode::BAD_GATEWAY, "<html>upstream down</html>")
}
