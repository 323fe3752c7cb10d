//! API models

mod account;
mod common;
mod dashboard;
mod log;
mod task;

pub use account::{Account, AccountCreate, AccountStatus, AccountUpdate};
pub use common::{
    ConfigUploadResponse, ControlAck, ErrorResponse, HealthResponse, ListQuery, LogQuery,
    MessageResponse, Page,
};
pub use dashboard::{
    AccountStats, DailyStat, DashboardStats, ExecutionRank, ExecutionRankResponse, LogStats,
    PerformanceTrends, TaskStats,
};
pub use log::{ExecutionLog, LogStatus};
pub use task::{Task, TaskCreate, TaskStatus, TaskUpdate};
