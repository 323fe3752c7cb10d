//! Settings file management

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ConsoleError;
use crate::events::EventStreamOptions;
use crate::filesys::file::File;
use crate::logs::LogLevel;

pub const ENV_API_BASE_URL: &str = "RPA_CONSOLE_API_BASE_URL";
pub const ENV_LOG_LEVEL: &str = "RPA_CONSOLE_LOG_LEVEL";

/// Console settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Push channel configuration
    #[serde(default)]
    pub events: EventSettings,

    /// Directory for rolling log files; stderr only when absent
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[serde(default)]
    pub json_logs: bool,
}

impl Settings {
    /// Read settings from `path` when given, then apply the environment
    pub async fn load(path: Option<&str>) -> Result<Self, ConsoleError> {
        let mut settings = match path {
            Some(path) => {
                debug!("Reading settings from {}", path);
                File::new(path).read_json::<Settings>().await?
            }
            None => Settings::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would stall every request or the keep-alive timer
    pub fn validate(&self) -> Result<(), ConsoleError> {
        if self.backend.timeout_secs == 0 {
            return Err(ConsoleError::Config(
                "backend.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.events.heartbeat_interval_secs == 0 {
            return Err(ConsoleError::Config(
                "events.heartbeat_interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConsoleError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.backend.base_url = Some(url.trim().to_string());
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            self.log_level = level.parse().map_err(ConsoleError::Config)?;
        }
        Ok(())
    }

    /// The API base URL; every REST and proxy call needs it
    pub fn require_base_url(&self) -> Result<&str, ConsoleError> {
        let url = self
            .backend
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                ConsoleError::Config(format!(
                    "API base URL is not configured; set {} or backend.base_url",
                    ENV_API_BASE_URL
                ))
            })?;

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConsoleError::Config(format!(
                "API base URL must be http(s): {}",
                url
            )));
        }
        Ok(url)
    }
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the backend API, e.g. `http://10.0.0.5:8000/api/v1`
    #[serde(default)]
    pub base_url: Option<String>,

    /// Origin prepended to server-local resource paths
    #[serde(default)]
    pub local_origin: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            local_origin: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Push channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSettings {
    #[serde(default = "default_true")]
    pub auto_reconnect: bool,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    #[serde(default = "default_true")]
    pub heartbeat: bool,

    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Restart a stream that gave up after this long; 0 disables
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_reconnect_interval_ms() -> u64 {
    3000
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

fn default_restart_delay_secs() -> u64 {
    60
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            reconnect_interval_ms: default_reconnect_interval_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            heartbeat: true,
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            restart_delay_secs: default_restart_delay_secs(),
        }
    }
}

impl EventSettings {
    pub fn to_options(&self) -> EventStreamOptions {
        EventStreamOptions {
            auto_reconnect: self.auto_reconnect,
            reconnect_interval: Duration::from_millis(self.reconnect_interval_ms),
            max_reconnect_attempts: self.max_reconnect_attempts,
            heartbeat: self.heartbeat,
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval_secs),
        }
    }

    pub fn restart_delay(&self) -> Option<Duration> {
        (self.restart_delay_secs > 0).then(|| Duration::from_secs(self.restart_delay_secs))
    }
}
