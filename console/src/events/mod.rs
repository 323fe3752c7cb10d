//! Backend push channel: decoding, fan-out and connection management

pub mod client;
pub mod decoder;
pub mod event;
pub mod registry;
pub mod source;

pub use client::{ConnectionState, ConnectionStatus, EventStreamClient, EventStreamOptions};
pub use event::{EventType, SseEvent};
pub use registry::{ListenerRegistry, Subscription};
pub use source::{ByteStream, EventSource, HttpEventSource};
