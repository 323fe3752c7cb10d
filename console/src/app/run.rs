//! Watch mode run loop

use std::future::Future;
use std::sync::Arc;

use openapi_client::models::ListQuery;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::app::board::TaskBoard;
use crate::app::options::AppOptions;
use crate::control::{Confirmation, ControlLedger};
use crate::errors::ConsoleError;
use crate::events::{
    ConnectionState, EventSource, EventStreamClient, EventType, HttpEventSource, SseEvent, Subscription,
};
use crate::http::HttpClient;

/// Why the task list should be fetched again
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReloadReason {
    Event(EventType),
    Reconnected,
}

/// Follow the push channel until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    ledger: ControlLedger,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ConsoleError> {
    let http_client = HttpClient::with_timeout(&options.api_base_url, options.request_timeout)?;
    let source: Arc<dyn EventSource> = Arc::new(HttpEventSource::new(&options.api_base_url)?);
    watch(options, http_client, source, ledger, shutdown_signal).await
}

/// Run loop with injectable transport
pub async fn watch(
    options: AppOptions,
    http_client: HttpClient,
    source: Arc<dyn EventSource>,
    ledger: ControlLedger,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ConsoleError> {
    info!("Watching {}", options.api_base_url);

    let board = Arc::new(TaskBoard::new(ledger.clone()));
    let query = ListQuery::first_page();

    let client = EventStreamClient::new(source, options.events.clone());
    let (reload_tx, mut reload_rx) = mpsc::unbounded_channel();
    let _subscriptions = subscribe_all(&client, &reload_tx);

    let mut status_rx = client.watch_status();
    let mut confirmation_tick = tokio::time::interval(options.confirmation_check_interval);
    let mut was_connected = false;
    let mut restart_at: Option<Instant> = None;
    tokio::pin!(shutdown_signal);

    // reloads run beside the loop; at most one in flight plus one queued
    let mut reload_task = Some(spawn_reload(&board, &http_client, &query));
    let mut reload_queued = false;

    client.connect();

    loop {
        let restart = restart_at;
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Shutdown signal received, disconnecting...");
                break;
            }
            Some(reason) = reload_rx.recv() => {
                // coalesce a burst of triggers into one fetch
                let mut pending = 1;
                while reload_rx.try_recv().is_ok() {
                    pending += 1;
                }
                debug!("Reload requested ({:?}, {} trigger(s))", reason, pending);
                if reload_task.is_some() {
                    reload_queued = true;
                } else {
                    reload_task = Some(spawn_reload(&board, &http_client, &query));
                }
            }
            joined = join_reload(&mut reload_task), if reload_task.is_some() => {
                reload_task = None;
                match joined {
                    Ok(Ok(confirmations)) => {
                        report_confirmations(&confirmations);
                        info!("Tasks by status: {:?}", board.summary());
                    }
                    Ok(Err(e)) => error!("Task reload failed: {}", e.user_message()),
                    Err(e) => error!("Task reload aborted: {}", e),
                }
                if std::mem::take(&mut reload_queued) {
                    reload_task = Some(spawn_reload(&board, &http_client, &query));
                }
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = status_rx.borrow_and_update().clone();
                match status.state {
                    ConnectionState::Connected => {
                        info!("Event stream connected");
                        if was_connected {
                            let _ = reload_tx.send(ReloadReason::Reconnected);
                        }
                        was_connected = true;
                    }
                    ConnectionState::Disconnected => {
                        if let Some(e) = &status.last_error {
                            error!(
                                "Event stream stopped after {} failures: {}",
                                status.reconnect_attempts, e
                            );
                            match options.stream_restart_delay {
                                Some(delay) => {
                                    warn!("Restarting event stream in {:?}", delay);
                                    restart_at = Some(Instant::now() + delay);
                                }
                                None => warn!("Event stream will not restart; restart the console to resume"),
                            }
                        }
                    }
                    state => info!("Event stream {}", state),
                }
            }
            _ = sleep_until(restart), if restart.is_some() => {
                restart_at = None;
                client.reconnect();
            }
            _ = confirmation_tick.tick() => {
                for (task_id, pending) in ledger.overdue(options.confirmation_timeout) {
                    warn!(
                        "Task {} has no {} confirmation since {}",
                        task_id,
                        pending.directive.verb(),
                        pending.requested_at.to_rfc3339()
                    );
                }
            }
        }
    }

    if let Some(task) = reload_task.take() {
        task.abort();
    }
    client.disconnect();
    Ok(())
}

fn spawn_reload(
    board: &Arc<TaskBoard>,
    http_client: &HttpClient,
    query: &ListQuery,
) -> JoinHandle<Result<Vec<Confirmation>, ConsoleError>> {
    let board = board.clone();
    let http_client = http_client.clone();
    let query = query.clone();
    tokio::spawn(async move { board.reload(&http_client, &query).await })
}

async fn join_reload<T>(task: &mut Option<JoinHandle<T>>) -> Result<T, JoinError> {
    match task {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn subscribe_all(
    client: &EventStreamClient,
    reload_tx: &mpsc::UnboundedSender<ReloadReason>,
) -> Vec<Subscription> {
    let mut subscriptions = vec![client.subscribe(EventType::Message, log_event)];

    for event_type in [EventType::TaskUpdated, EventType::LogCreated] {
        let tx = reload_tx.clone();
        subscriptions.push(client.subscribe(event_type, move |_| {
            let _ = tx.send(ReloadReason::Event(event_type));
        }));
    }
    subscriptions
}

fn log_event(event: &SseEvent) {
    match event.event_type {
        EventType::Heartbeat => debug!("Heartbeat {}", event.timestamp.as_deref().unwrap_or("-")),
        EventType::LogCreated => info!(
            "New execution log {} for {} ({})",
            event.data_str("log_id").unwrap_or("?"),
            event.data_str("app_name").unwrap_or("?"),
            event.data_str("status").unwrap_or("?")
        ),
        EventType::TaskUpdated => info!(
            "Task {} is now {}",
            event.data_str("task_id").unwrap_or("?"),
            event.data_str("status").unwrap_or("?")
        ),
        EventType::AccountUpdated => info!(
            "Account {} is now {}",
            event.data_str("shadow_bot_account").unwrap_or("?"),
            event
                .data
                .get("changes")
                .and_then(|c| c.get("status"))
                .and_then(|s| s.as_str())
                .unwrap_or("?")
        ),
        EventType::Message => info!("Event: {}", serde_json::Value::Object(event.data.clone())),
    }
}

fn report_confirmations(confirmations: &[Confirmation]) {
    for c in confirmations {
        info!(
            "Task {} {} confirmed ({}s after request)",
            c.task_id,
            c.directive.verb(),
            (chrono::Utc::now() - c.requested_at).num_seconds()
        );
    }
}
