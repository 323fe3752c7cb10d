//! Event stream tests over a real SSE endpoint

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rpa_console::app::options::AppOptions;
use rpa_console::app::run::watch;
use rpa_console::control::ControlLedger;
use rpa_console::errors::ConsoleError;
use rpa_console::events::{
    ByteStream, ConnectionState, EventSource, EventStreamClient, EventStreamOptions, EventType,
    HttpEventSource,
};
use rpa_console::http::HttpClient;

use crate::support::TestServer;

fn options() -> EventStreamOptions {
    EventStreamOptions {
        reconnect_interval: Duration::from_millis(20),
        max_reconnect_attempts: 3,
        heartbeat_interval: Duration::from_millis(100),
        ..Default::default()
    }
}

async fn eventually<F: Fn() -> bool>(check: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_http_stream_fans_out_and_skips_malformed() {
    let server = TestServer::start().await;
    let source: Arc<dyn EventSource> = Arc::new(HttpEventSource::new(&server.api_base_url()).unwrap());
    let client = EventStreamClient::new(source, options());

    let generic = Arc::new(Mutex::new(Vec::new()));
    let tasks = Arc::new(AtomicUsize::new(0));
    let g = generic.clone();
    let _all = client.subscribe(EventType::Message, move |event| {
        g.lock().unwrap().push(event.event_type);
    });
    let t = tasks.clone();
    let _tasks = client.subscribe(EventType::TaskUpdated, move |event| {
        assert_eq!(event.data_str("status"), Some("running"));
        t.fetch_add(1, Ordering::SeqCst);
    });

    client.connect();
    eventually(|| generic.lock().unwrap().len() >= 3).await;

    assert_eq!(
        *generic.lock().unwrap(),
        vec![EventType::TaskUpdated, EventType::Heartbeat, EventType::LogCreated]
    );
    assert_eq!(tasks.load(Ordering::SeqCst), 1);
    assert_eq!(client.status().state, ConnectionState::Connected);
    assert_eq!(server.backend.sse_connections.load(Ordering::SeqCst), 1);

    client.disconnect();
    assert_eq!(client.status().state, ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_unreachable_stream_gives_up_then_manual_reconnect() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let source: Arc<dyn EventSource> =
        Arc::new(HttpEventSource::new(&format!("http://127.0.0.1:{port}/api/v1")).unwrap());
    let client = EventStreamClient::new(source, options());

    client.connect();
    let mut rx = client.watch_status();
    let status = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.state == ConnectionState::Disconnected),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_eq!(status.reconnect_attempts, 3);
    assert!(status.last_error.is_some());

    client.reconnect();
    assert_eq!(client.status().reconnect_attempts, 0);
    assert_eq!(client.status().state, ConnectionState::Connecting);
    client.disconnect();
}

#[tokio::test]
async fn test_watch_reloads_tasks_on_events() {
    let server = TestServer::start().await;
    let mut app_options = AppOptions::default();
    app_options.api_base_url = server.api_base_url();
    app_options.local_origin = server.origin();
    app_options.events = options();

    let http_client = HttpClient::new(&server.api_base_url()).unwrap();
    let source: Arc<dyn EventSource> = Arc::new(HttpEventSource::new(&server.api_base_url()).unwrap());
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(watch(app_options, http_client, source, ControlLedger::new(), async move {
        let _ = stop_rx.await;
    }));

    // initial load plus at least one event-driven reload
    eventually(|| server.backend.task_lists.load(Ordering::SeqCst) >= 2).await;
    assert_eq!(server.backend.sse_connections.load(Ordering::SeqCst), 1);

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
}

/// Source whose every open attempt fails
#[derive(Default)]
struct RefusingSource {
    opens: AtomicUsize,
}

#[async_trait]
impl EventSource for RefusingSource {
    async fn open(&self) -> Result<ByteStream, ConsoleError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Err(ConsoleError::Internal("connection refused".to_string()))
    }

    fn describe(&self) -> String {
        "refusing".to_string()
    }
}

fn watch_options(server: &TestServer) -> AppOptions {
    let mut app_options = AppOptions::default();
    app_options.api_base_url = server.api_base_url();
    app_options.local_origin = server.origin();
    app_options.events = options();
    app_options
}

#[tokio::test]
async fn test_slow_reload_does_not_delay_shutdown() {
    let server = TestServer::start().await;
    server.backend.tasks_delay_ms.store(10_000, Ordering::SeqCst);

    let http_client = HttpClient::new(&server.api_base_url()).unwrap();
    let source: Arc<dyn EventSource> = Arc::new(HttpEventSource::new(&server.api_base_url()).unwrap());
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(watch(
        watch_options(&server),
        http_client,
        source,
        ControlLedger::new(),
        async move {
            let _ = stop_rx.await;
        },
    ));

    eventually(|| server.backend.task_lists.load(Ordering::SeqCst) >= 1).await;
    eventually(|| server.backend.sse_connections.load(Ordering::SeqCst) >= 1).await;

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_watch_restarts_stream_after_giving_up() {
    let server = TestServer::start().await;
    let mut app_options = watch_options(&server);
    app_options.events.max_reconnect_attempts = 1;
    app_options.stream_restart_delay = Some(Duration::from_millis(30));

    let source = Arc::new(RefusingSource::default());
    let http_client = HttpClient::new(&server.api_base_url()).unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(watch(
        app_options,
        http_client,
        source.clone(),
        ControlLedger::new(),
        async move {
            let _ = stop_rx.await;
        },
    ));

    // each open gives up at once; later opens come from the restart timer
    eventually(|| source.opens.load(Ordering::SeqCst) >= 3).await;

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
}
