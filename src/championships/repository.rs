use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::MonthlyChampionshipRecord;
use crate::shared::AppError;

/// Trait for monthly championship repository operations
#[async_trait]
pub trait ChampionshipRepository: Send + Sync {
    async fn get_championship(
        &self,
        month_label: &str,
    ) -> Result<Option<MonthlyChampionshipRecord>, AppError>;

    /// Crown history, newest month first
    async fn list_championships(&self) -> Result<Vec<MonthlyChampionshipRecord>, AppError>;

    /// Atomically appends the record and increments the winner's crown count.
    ///
    /// `Conflict` if the month already has a crown, or if the winner's monthly
    /// points no longer equal `record.points` (the selection went stale).
    async fn record_championship(&self, record: &MonthlyChampionshipRecord)
        -> Result<(), AppError>;

    /// Zeroes every user's monthly counters, returning how many users exist
    async fn reset_all_monthly_stats(&self) -> Result<u64, AppError>;

    /// Latest month the monthly counters were opened for, if any
    async fn open_stats_month(&self) -> Result<Option<String>, AppError>;

    /// Marks the monthly counters as belonging to `month_label` without
    /// touching them. Returns `false` when the month was already marked.
    async fn start_stats_month(
        &self,
        month_label: &str,
        started_at: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// Zeroes monthly counters and opens `month_label` for them, unless that
    /// month was already opened. Returns `None` when it had been.
    async fn reset_monthly_stats_once(
        &self,
        month_label: &str,
        reset_at: DateTime<Utc>,
    ) -> Result<Option<u64>, AppError>;
}
