//! Application configuration options

use std::time::Duration;

use crate::errors::ConsoleError;
use crate::events::EventStreamOptions;
use crate::resources::{origin_of, ResourceUrls};
use crate::storage::settings::Settings;

/// Watch mode options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Backend API base URL
    pub api_base_url: String,

    /// Origin for server-local resource paths
    pub local_origin: String,

    /// REST request timeout
    pub request_timeout: Duration,

    /// Push channel options
    pub events: EventStreamOptions,

    /// Accepted control requests older than this are reported as unconfirmed
    pub confirmation_timeout: Duration,

    /// How often the unconfirmed list is checked
    pub confirmation_check_interval: Duration,

    /// Wait before restarting a stream that gave up; never restarts when `None`
    pub stream_restart_delay: Option<Duration>,
}

impl AppOptions {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConsoleError> {
        let api_base_url = settings.require_base_url()?.trim_end_matches('/').to_string();
        let local_origin = match settings.backend.local_origin.as_deref() {
            Some(origin) if !origin.trim().is_empty() => origin.trim().to_string(),
            _ => origin_of(&api_base_url)?,
        };

        Ok(Self {
            api_base_url,
            local_origin,
            request_timeout: Duration::from_secs(settings.backend.timeout_secs),
            events: settings.events.to_options(),
            stream_restart_delay: settings.events.restart_delay(),
            ..Default::default()
        })
    }

    pub fn resource_urls(&self) -> ResourceUrls {
        ResourceUrls::with_local_origin(&self.api_base_url, &self.local_origin)
    }
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/v1".to_string(),
            local_origin: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(30),
            events: EventStreamOptions::default(),
            confirmation_timeout: Duration::from_secs(120),
            confirmation_check_interval: Duration::from_secs(15),
            stream_restart_delay: Some(Duration::from_secs(60)),
        }
    }
}
