//! Task control protocol

pub mod controller;
pub mod ledger;
pub mod protocol;

pub use controller::{ControlBackend, TaskController};
pub use ledger::{Confirmation, ControlLedger, PendingControl};
pub use protocol::{resolve_control_port, ControlDirective, ControlOutcome, ControlRequest, UNKNOWN_PORT};
