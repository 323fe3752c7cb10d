//! Dashboard API client

use openapi_client::models::{DashboardStats, ExecutionRankResponse, HealthResponse, PerformanceTrends};

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;

impl HttpClient {
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ConsoleError> {
        self.get("/dashboard/stats").await
    }

    /// Daily execution counts for the last `days` days, clamped to 1..=30
    pub async fn performance_trends(&self, days: u32) -> Result<PerformanceTrends, ConsoleError> {
        let days = days.clamp(1, 30);
        self.get_query("/dashboard/performance", &[("days", days)]).await
    }

    /// Applications ranked by execution count
    pub async fn execution_rank(&self, limit: u32) -> Result<ExecutionRankResponse, ConsoleError> {
        self.get_query("/dashboard/execution-rank", &[("limit", limit)]).await
    }

    /// Backend liveness probe
    pub async fn health(&self) -> Result<HealthResponse, ConsoleError> {
        self.get("/health").await
    }
}
