//! Transport that opens the push channel

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tracing::{debug, error};

use crate::errors::ConsoleError;

/// Raw byte chunks of an open event stream
pub type ByteStream = BoxStream<'static, Result<Bytes, ConsoleError>>;

/// Something that can open a `text/event-stream` channel.
///
/// `open` resolves once the server acknowledged the subscription; the stream
/// ends when the channel closes.
#[async_trait]
pub trait EventSource: Send + Sync + 'static {
    async fn open(&self) -> Result<ByteStream, ConsoleError>;

    /// Human readable endpoint for logs
    fn describe(&self) -> String;
}

/// `GET {base}/sse/events` over reqwest
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    client: reqwest::Client,
    url: String,
}

impl HttpEventSource {
    pub fn new(api_base_url: &str) -> Result<Self, ConsoleError> {
        // no overall timeout: the response body never completes
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(client, api_base_url))
    }

    pub fn with_client(client: reqwest::Client, api_base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/sse/events", api_base_url.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn open(&self) -> Result<ByteStream, ConsoleError> {
        debug!("GET {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Event stream request failed: {} - {}", status, body);
            return Err(ConsoleError::Api {
                status: status.as_u16(),
                message: format!("Event stream request failed with status {}", status),
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ConsoleError::from))
            .boxed())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
