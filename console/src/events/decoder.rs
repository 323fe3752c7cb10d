//! Incremental `text/event-stream` frame decoder

use std::time::Duration;

use tracing::warn;

/// Longest line kept while waiting for its terminator
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// One dispatched frame: event name and joined data lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

/// Stateful line parser fed with raw byte chunks.
///
/// Chunks may split lines, frames and UTF-8 sequences anywhere. A line
/// longer than the cap is dropped up to its terminator.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    max_line: usize,
    /// inside the tail of an oversized line
    discarding: bool,
    event: Option<String>,
    data: Vec<String>,
    last_id: Option<String>,
    retry: Option<Duration>,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_line,
            discarding: false,
            event: None,
            data: Vec::new(),
            last_id: None,
            retry: None,
        }
    }

    /// Feed a chunk and return every frame it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            line.pop();
            if line.len() > self.max_line {
                warn!("Dropping event stream line of {} bytes", line.len());
                continue;
            }
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }

        if self.buffer.len() > self.max_line {
            warn!("Dropping event stream line over {} bytes", self.max_line);
            self.buffer.clear();
            self.discarding = true;
        }
        frames
    }

    /// Reconnection delay requested by the server, if any
    pub fn retry_hint(&self) -> Option<Duration> {
        self.retry
    }

    /// Last event id seen on the stream
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }

        // comment / keep-alive
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" => {
                if !value.contains('\0') {
                    self.last_id = Some(value.to_string());
                }
            }
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take().filter(|e| !e.is_empty());
        if self.data.is_empty() {
            return None;
        }
        let data = self.data.join("\n");
        self.data.clear();
        Some(SseFrame {
            event,
            data,
            id: self.last_id.clone(),
        })
    }
}
