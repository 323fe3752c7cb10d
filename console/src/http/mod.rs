//! Backend REST bindings

pub mod accounts;
pub mod client;
pub mod dashboard;
pub mod logs;
pub mod resources;
pub mod tasks;

pub use client::HttpClient;
