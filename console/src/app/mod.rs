//! Console front end: options, task snapshot, one-shot commands and watch loop

pub mod board;
pub mod commands;
pub mod options;
pub mod run;
