use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use super::InMemoryStore;
use crate::championships::{
    repository::ChampionshipRepository, select_monthly_leader, MonthlyChampionshipRecord,
};
use crate::shared::AppError;

#[async_trait]
impl ChampionshipRepository for InMemoryStore {
    #[instrument(skip(self))]
    async fn get_championship(
        &self,
        month_label: &str,
    ) -> Result<Option<MonthlyChampionshipRecord>, AppError> {
        Ok(self.tables()?.championships.get(month_label).cloned())
    }

    #[instrument(skip(self))]
    async fn list_championships(&self) -> Result<Vec<MonthlyChampionshipRecord>, AppError> {
        Ok(self.tables()?.championships.values().rev().cloned().collect())
    }

    #[instrument(skip(self, record), fields(month_label = %record.month_label, user_id = %record.user_id))]
    async fn record_championship(
        &self,
        record: &MonthlyChampionshipRecord,
    ) -> Result<(), AppError> {
        let mut tables = self.tables()?;

        if tables.championships.contains_key(&record.month_label) {
            warn!("Month already has a crown");
            return Err(AppError::Conflict(format!(
                "Crown for {} was already awarded",
                record.month_label
            )));
        }

        if !tables.users.contains_key(&record.user_id) {
            return Err(AppError::NotFound(format!("User {} not found", record.user_id)));
        }

        // The crown goes to whoever leads now, with the points they were selected on
        let leader = select_monthly_leader(tables.users.values())
            .map(|user| (user.id, user.monthly_points));
        if leader != Some((record.user_id, record.points)) {
            warn!(
                selected = %record.user_id,
                selected_points = record.points,
                current = ?leader,
                "Monthly leader changed since selection"
            );
            return Err(AppError::Conflict(format!(
                "User {} is no longer the monthly leader with {} points",
                record.user_id, record.points
            )));
        }

        let winner = tables
            .users
            .get_mut(&record.user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", record.user_id)))?;
        winner.monthly_championships += 1;
        tables
            .championships
            .insert(record.month_label.clone(), record.clone());

        debug!("Crown recorded in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn reset_all_monthly_stats(&self) -> Result<u64, AppError> {
        let mut tables = self.tables()?;
        tables.users.values_mut().for_each(|user| user.reset_monthly());
        Ok(tables.users.len() as u64)
    }

    #[instrument(skip(self))]
    async fn open_stats_month(&self) -> Result<Option<String>, AppError> {
        Ok(self.tables()?.monthly_resets.keys().next_back().cloned())
    }

    #[instrument(skip(self))]
    async fn start_stats_month(
        &self,
        month_label: &str,
        started_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables()?;
        if tables.monthly_resets.contains_key(month_label) {
            return Ok(false);
        }
        tables
            .monthly_resets
            .insert(month_label.to_string(), started_at);
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn reset_monthly_stats_once(
        &self,
        month_label: &str,
        reset_at: DateTime<Utc>,
    ) -> Result<Option<u64>, AppError> {
        let mut tables = self.tables()?;

        if tables.monthly_resets.contains_key(month_label) {
            debug!("Month already reset");
            return Ok(None);
        }

        tables
            .monthly_resets
            .insert(month_label.to_string(), reset_at);
        tables.users.values_mut().for_each(|user| user.reset_monthly());
        Ok(Some(tables.users.len() as u64))
    }
}
