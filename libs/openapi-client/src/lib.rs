//! Wire models for the RPA workbench REST API

pub mod models;
