//! Local file access

pub mod file;
