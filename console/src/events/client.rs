//! Push channel connection manager
//!
//! One worker task per `connect()` owns the transport, the keep-alive timer
//! and the reconnect delay. Tearing down bumps a generation counter; a worker
//! whose generation is stale can no longer publish state or deliver events.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval};
use tracing::{debug, error, info, warn};

use crate::events::decoder::{SseDecoder, SseFrame};
use crate::events::event::{EventType, SseEvent};
use crate::events::registry::{ListenerRegistry, Subscription};
use crate::events::source::{ByteStream, EventSource};

/// Event stream client options
#[derive(Debug, Clone)]
pub struct EventStreamOptions {
    /// Retry after a failure instead of going idle
    pub auto_reconnect: bool,

    /// Delay between a failure and the next attempt
    pub reconnect_interval: Duration,

    /// Consecutive failures tolerated before giving up
    pub max_reconnect_attempts: u32,

    /// Run the keep-alive timer while connected
    pub heartbeat: bool,

    /// Keep-alive timer period
    pub heartbeat_interval: Duration,
}

impl Default for EventStreamOptions {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            reconnect_interval: Duration::from_secs(3),
            max_reconnect_attempts: 5,
            heartbeat: true,
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot published on every state change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub last_error: Option<String>,
    /// Consecutive failures since the last successful connection
    pub reconnect_attempts: u32,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            last_error: None,
            reconnect_attempts: 0,
        }
    }
}

struct Shared {
    generation: Mutex<u64>,
    status_tx: watch::Sender<ConnectionStatus>,
    last_activity: Mutex<Option<Instant>>,
}

impl Shared {
    fn generation(&self) -> std::sync::MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Publish only while `generation` is still the live one
    fn publish(&self, generation: u64, status: ConnectionStatus) -> bool {
        let current = self.generation();
        if *current != generation {
            return false;
        }
        self.status_tx.send_replace(status);
        true
    }

    fn is_current(&self, generation: u64) -> bool {
        *self.generation() == generation
    }

    fn touch(&self) {
        *self.last_activity.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
    }

    fn last_activity(&self) -> Option<Instant> {
        *self.last_activity.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Long-lived subscription to the backend push channel.
///
/// `connect` spawns onto the current tokio runtime.
pub struct EventStreamClient {
    source: Arc<dyn EventSource>,
    options: EventStreamOptions,
    registry: ListenerRegistry,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl EventStreamClient {
    pub fn new(source: Arc<dyn EventSource>, options: EventStreamOptions) -> Self {
        Self::with_registry(source, options, ListenerRegistry::new())
    }

    /// Share an existing registry with this client
    pub fn with_registry(
        source: Arc<dyn EventSource>,
        options: EventStreamOptions,
        registry: ListenerRegistry,
    ) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::default());
        Self {
            source,
            options,
            registry,
            shared: Arc::new(Shared {
                generation: Mutex::new(0),
                status_tx,
                last_activity: Mutex::new(None),
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &EventStreamOptions {
        &self.options
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    /// Open the channel, replacing any running one
    pub fn connect(&self) {
        let failures = self.status().reconnect_attempts;
        self.start(failures);
    }

    /// Reset the failure counter, then connect
    pub fn reconnect(&self) {
        info!("Manual reconnect to {}", self.source.describe());
        self.start(0);
    }

    /// Close the channel and cancel pending timers
    pub fn disconnect(&self) {
        let attempts = self.status().reconnect_attempts;
        {
            let mut generation = self.shared.generation();
            *generation += 1;
            self.abort_worker();
            self.shared.status_tx.send_replace(ConnectionStatus {
                state: ConnectionState::Disconnected,
                last_error: None,
                reconnect_attempts: attempts,
            });
        }
        debug!("Event stream disconnected");
    }

    pub fn subscribe<F>(&self, event_type: EventType, callback: F) -> Subscription
    where
        F: Fn(&SseEvent) + Send + Sync + 'static,
    {
        self.registry.subscribe(event_type, callback)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.status_tx.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status_tx.subscribe()
    }

    /// Instant the last inbound bytes arrived
    pub fn last_activity(&self) -> Option<Instant> {
        self.shared.last_activity()
    }

    fn start(&self, failures: u32) {
        let generation = {
            let mut generation = self.shared.generation();
            *generation += 1;
            self.abort_worker();
            self.shared.status_tx.send_replace(ConnectionStatus {
                state: ConnectionState::Connecting,
                last_error: None,
                reconnect_attempts: failures,
            });
            *generation
        };

        let worker = Worker {
            source: self.source.clone(),
            options: self.options.clone(),
            registry: self.registry.clone(),
            shared: self.shared.clone(),
            generation,
        };
        let handle = tokio::spawn(worker.run(failures));
        *self.worker.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    fn abort_worker(&self) {
        if let Some(handle) = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
    }
}

impl Drop for EventStreamClient {
    fn drop(&mut self) {
        *self.shared.generation() += 1;
        self.abort_worker();
    }
}

struct Worker {
    source: Arc<dyn EventSource>,
    options: EventStreamOptions,
    registry: ListenerRegistry,
    shared: Arc<Shared>,
    generation: u64,
}

impl Worker {
    async fn run(self, mut failures: u32) {
        loop {
            if !self.publish(ConnectionState::Connecting, None, failures) {
                return;
            }
            info!("Connecting to event stream: {}", self.source.describe());

            let reason = match self.source.open().await {
                Ok(stream) => {
                    failures = 0;
                    if !self.publish(ConnectionState::Connected, None, 0) {
                        return;
                    }
                    self.shared.touch();
                    info!("Event stream connected");
                    self.pump(stream).await
                }
                Err(e) => e.to_string(),
            };

            if !self.shared.is_current(self.generation) {
                return;
            }
            failures += 1;
            error!("Event stream failure ({} in a row): {}", failures, reason);
            self.publish(ConnectionState::Error, Some(reason.clone()), failures);

            if !self.options.auto_reconnect || failures >= self.options.max_reconnect_attempts {
                warn!(
                    "Event stream giving up after {} consecutive failures; waiting for manual reconnect",
                    failures
                );
                self.publish(ConnectionState::Disconnected, Some(reason), failures);
                return;
            }

            debug!("Retrying event stream in {:?}", self.options.reconnect_interval);
            tokio::time::sleep(self.options.reconnect_interval).await;
        }
    }

    /// Read until the stream fails or ends; returns why it stopped
    async fn pump(&self, mut stream: ByteStream) -> String {
        let mut decoder = SseDecoder::new();
        let period = self.options.heartbeat_interval;
        // a zero period would panic in `interval_at`
        let mut keepalive = (self.options.heartbeat && !period.is_zero())
            .then(|| tokio::time::interval_at(Instant::now() + period, period));

        loop {
            tokio::select! {
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => {
                        self.shared.touch();
                        for frame in decoder.feed(&bytes) {
                            if !self.shared.is_current(self.generation) {
                                return "superseded".to_string();
                            }
                            self.deliver(&frame);
                        }
                    }
                    Some(Err(e)) => return e.to_string(),
                    None => return "Event stream closed by server".to_string(),
                },
                _ = next_tick(&mut keepalive), if keepalive.is_some() => {
                    self.check_liveness(period);
                }
            }
        }
    }

    fn deliver(&self, frame: &SseFrame) {
        match SseEvent::from_frame(frame) {
            Ok(event) => {
                debug!("Received {} event", event.event_type);
                self.registry.dispatch(&event);
            }
            Err(e) => warn!("Dropping malformed event frame: {}", e),
        }
    }

    fn check_liveness(&self, period: Duration) {
        match self.shared.last_activity() {
            Some(at) if at.elapsed() >= period * 2 => {
                warn!("No event stream activity for {:?}", at.elapsed());
            }
            _ => debug!("Event stream alive"),
        }
    }

    fn publish(&self, state: ConnectionState, last_error: Option<String>, failures: u32) -> bool {
        self.shared.publish(
            self.generation,
            ConnectionStatus {
                state,
                last_error,
                reconnect_attempts: failures,
            },
        )
    }
}

async fn next_tick(keepalive: &mut Option<Interval>) {
    match keepalive {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
