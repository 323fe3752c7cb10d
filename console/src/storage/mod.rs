//! Persistent console configuration

pub mod settings;
