//! HTTP client implementation

use std::time::Duration;

use bytes::Bytes;
use openapi_client::models::ErrorResponse;
use reqwest::{multipart, Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::errors::ConsoleError;

const DEFAULT_ERROR_MESSAGE: &str = "API request failed";

/// HTTP client for the console backend
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client with a 30 second request timeout
    pub fn new(base_url: &str) -> Result<Self, ConsoleError> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ConsoleError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConsoleError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        decode(check("GET", response).await?).await
    }

    /// Make a GET request with query parameters
    pub async fn get_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, ConsoleError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self.client.get(&url).query(query).send().await?;
        decode(check("GET", response).await?).await
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ConsoleError> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        decode(check("POST", response).await?).await
    }

    /// Make a PUT request
    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ConsoleError> {
        let url = self.url(path);
        debug!("PUT {}", url);

        let response = self.client.put(&url).json(body).send().await?;
        decode(check("PUT", response).await?).await
    }

    /// Make a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConsoleError> {
        let url = self.url(path);
        debug!("DELETE {}", url);

        let response = self.client.delete(&url).send().await?;
        decode(check("DELETE", response).await?).await
    }

    /// Fetch a raw body from a path relative to the base URL
    pub async fn get_bytes(&self, path: &str) -> Result<Bytes, ConsoleError> {
        self.fetch_bytes(&self.url(path)).await
    }

    /// Fetch a raw body from an absolute URL
    pub async fn fetch_bytes(&self, url: &str) -> Result<Bytes, ConsoleError> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        Ok(check("GET", response).await?.bytes().await?)
    }

    /// Make a multipart POST request
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> Result<T, ConsoleError> {
        let url = self.url(path);
        debug!("POST {} (multipart)", url);

        let response = self.client.post(&url).multipart(form).send().await?;
        decode(check("POST", response).await?).await
    }
}

/// Turn a non-success response into `ConsoleError::Api`
async fn check(method: &str, response: Response) -> Result<Response, ConsoleError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!("HTTP {} failed: {} - {}", method, status, body);
    Err(ConsoleError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ConsoleError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ConsoleError::Decode(format!("Invalid response body: {e}")))
}

/// Best human-readable message from an error body
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.best_message())
        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
}
