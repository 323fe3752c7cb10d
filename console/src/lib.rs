//! RPA Console Library
//!
//! Client side of the shadow bot management backend: push channel
//! subscription, resource URL resolution, task control and REST bindings.

pub mod app;
pub mod control;
pub mod errors;
pub mod events;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod resources;
pub mod storage;
pub mod utils;
pub mod validate;
