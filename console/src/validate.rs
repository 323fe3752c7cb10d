//! Local form validation for account and task submissions
//!
//! Nothing in here touches the network. Create and update calls run these
//! checks first and bail out before a request is built.

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;

use openapi_client::models::{AccountCreate, AccountUpdate, TaskCreate, TaskUpdate};

use crate::errors::ConsoleError;

/// Field name to message, ordered by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    fn into_result(self) -> Result<(), ConsoleError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ConsoleError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Dotted-quad IPv4 check
pub fn check_host_ip(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "Host IP is required");
    } else if value.split('.').count() != 4 {
        errors.add(field, "Host IP must have four dot-separated octets");
    } else if value.parse::<Ipv4Addr>().is_err() {
        errors.add(field, "Host IP octets must be numbers between 0 and 255");
    }
}

fn check_required(errors: &mut ValidationErrors, field: &'static str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("{label} is required"));
    }
}

/// Account create/edit form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountForm {
    pub shadow_bot_account: String,
    pub host_ip: String,
    pub port: u16,
    pub task_control: String,
}

impl AccountForm {
    pub fn validate(&self) -> Result<(), ConsoleError> {
        let mut errors = ValidationErrors::new();
        check_required(
            &mut errors,
            "shadow_bot_account",
            &self.shadow_bot_account,
            "Bot account name",
        );
        check_host_ip(&mut errors, "host_ip", &self.host_ip);
        check_required(&mut errors, "task_control", &self.task_control, "Task control tag");
        errors.into_result()
    }

    pub fn to_create(&self) -> Result<AccountCreate, ConsoleError> {
        self.validate()?;
        Ok(AccountCreate {
            shadow_bot_account: self.shadow_bot_account.trim().to_string(),
            host_ip: self.host_ip.trim().to_string(),
            port: self.port,
            task_control: self.task_control.trim().to_string(),
        })
    }

    pub fn to_update(&self) -> Result<AccountUpdate, ConsoleError> {
        self.validate()?;
        Ok(AccountUpdate {
            shadow_bot_account: Some(self.shadow_bot_account.trim().to_string()),
            host_ip: Some(self.host_ip.trim().to_string()),
            port: Some(self.port),
            task_control: Some(self.task_control.trim().to_string()),
        })
    }
}

/// Task create/edit form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub task_name: String,
    pub shadow_bot_account: String,
    pub host_ip: String,
    pub app_name: String,
    pub config_file: bool,
    pub config_info: bool,
    pub config_file_path: Option<String>,
    pub config_json: Option<String>,
}

impl TaskForm {
    pub fn validate(&self) -> Result<(), ConsoleError> {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "task_name", &self.task_name, "Task name");
        check_required(
            &mut errors,
            "shadow_bot_account",
            &self.shadow_bot_account,
            "Bot account",
        );
        check_host_ip(&mut errors, "host_ip", &self.host_ip);
        check_required(&mut errors, "app_name", &self.app_name, "Application name");

        if self.config_info {
            if let Some(raw) = self.config_json.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                if let Err(e) = serde_json::from_str::<serde_json::Value>(raw) {
                    errors.add("config_json", format!("Config JSON is malformed: {e}"));
                }
            }
        }

        errors.into_result()
    }

    fn config_json(&self) -> Option<String> {
        self.config_json
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn to_create(&self) -> Result<TaskCreate, ConsoleError> {
        self.validate()?;
        Ok(TaskCreate {
            task_name: self.task_name.trim().to_string(),
            shadow_bot_account: self.shadow_bot_account.trim().to_string(),
            host_ip: self.host_ip.trim().to_string(),
            app_name: self.app_name.trim().to_string(),
            config_file: self.config_file,
            config_info: self.config_info,
            config_file_path: self.config_file_path.clone(),
            config_json: self.config_json(),
        })
    }

    pub fn to_update(&self) -> Result<TaskUpdate, ConsoleError> {
        self.validate()?;
        Ok(TaskUpdate {
            task_name: Some(self.task_name.trim().to_string()),
            shadow_bot_account: Some(self.shadow_bot_account.trim().to_string()),
            host_ip: Some(self.host_ip.trim().to_string()),
            app_name: Some(self.app_name.trim().to_string()),
            status: None,
            config_file: Some(self.config_file),
            config_info: Some(self.config_info),
            config_file_path: self.config_file_path.clone(),
            config_json: self.config_json(),
        })
    }
}
