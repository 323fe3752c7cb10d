use serde::{Deserialize, Serialize};

/// Aggregate counters shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub accounts: AccountStats,
    #[serde(default)]
    pub tasks: TaskStats,
    #[serde(default)]
    pub execution_logs: LogStats,
    #[serde(default)]
    pub generated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub by_status: std::collections::BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub by_status: std::collections::BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub by_status: std::collections::BTreeMap<String, u64>,
    #[serde(default)]
    pub success_rate: f64,
}

/// Execution trend over the last N days
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceTrends {
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub daily_stats: Vec<DailyStat>,
    #[serde(default)]
    pub total_executions: u64,
    #[serde(default)]
    pub completion_rate: f64,
    #[serde(default)]
    pub avg_duration: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub date: String,
    #[serde(default)]
    pub total_executions: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub avg_duration: f64,
}

/// Average run time per application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRank {
    pub app_name: String,
    #[serde(default)]
    pub avg_duration: f64,
    #[serde(default)]
    pub execution_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRankResponse {
    #[serde(default)]
    pub items: Vec<ExecutionRank>,
    #[serde(default)]
    pub generated_at: Option<String>,
}
