use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{db_error, is_unique_violation, PostgresStore};
use crate::championships::{repository::ChampionshipRepository, MonthlyChampionshipRecord};
use crate::shared::AppError;

const CHAMPIONSHIP_COLUMNS: &str = "id, user_id, month_label, points, awarded_at, awarded_by";

const RESET_MONTHLY_SQL: &str =
    "UPDATE users SET monthly_points = 0, monthly_predictions = 0, monthly_correct = 0";

fn duplicate_crown(month_label: &str) -> AppError {
    AppError::Conflict(format!("Crown for {} was already awarded", month_label))
}

#[async_trait]
impl ChampionshipRepository for PostgresStore {
    #[instrument(skip(self))]
    async fn get_championship(
        &self,
        month_label: &str,
    ) -> Result<Option<MonthlyChampionshipRecord>, AppError> {
        sqlx::query_as::<_, MonthlyChampionshipRecord>(&format!(
            "SELECT {} FROM monthly_championships WHERE month_label = $1",
            CHAMPIONSHIP_COLUMNS
        ))
        .bind(month_label)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch championship"))
    }

    #[instrument(skip(self))]
    async fn list_championships(&self) -> Result<Vec<MonthlyChampionshipRecord>, AppError> {
        sqlx::query_as::<_, MonthlyChampionshipRecord>(&format!(
            "SELECT {} FROM monthly_championships ORDER BY month_label DESC",
            CHAMPIONSHIP_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list championships"))
    }

    #[instrument(skip(self, record), fields(month_label = %record.month_label, user_id = %record.user_id))]
    async fn record_championship(
        &self,
        record: &MonthlyChampionshipRecord,
    ) -> Result<(), AppError> {
        let mut tx = self.begin().await?;

        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(record.user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("Failed to lock crown winner"))?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", record.user_id)))?;

        // The crown goes to whoever leads now, with the points they were selected on
        let leader = sqlx::query(
            "SELECT id, monthly_points FROM users WHERE monthly_points > 0 \
             ORDER BY monthly_points DESC, created_at ASC, id ASC LIMIT 1",
        )
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to load monthly leader"))?
        .map(|row| (row.get::<Uuid, _>("id"), row.get::<i32, _>("monthly_points")));

        if leader != Some((record.user_id, record.points)) {
            warn!(
                selected_points = record.points,
                current = ?leader,
                "Monthly leader changed since selection"
            );
            return Err(AppError::Conflict(format!(
                "User {} is no longer the monthly leader with {} points",
                record.user_id, record.points
            )));
        }

        let inserted = sqlx::query(&format!(
            "INSERT INTO monthly_championships ({}) VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (month_label) DO NOTHING",
            CHAMPIONSHIP_COLUMNS
        ))
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.month_label)
        .bind(record.points)
        .bind(record.awarded_at)
        .bind(&record.awarded_by)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_crown(&record.month_label)
            } else {
                db_error("Failed to insert championship")(e)
            }
        })?;

        if inserted.rows_affected() == 0 {
            warn!("Month already has a crown");
            return Err(duplicate_crown(&record.month_label));
        }

        sqlx::query(
            "UPDATE users SET monthly_championships = monthly_championships + 1 WHERE id = $1",
        )
        .bind(record.user_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to increment crown count"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit championship"))?;

        debug!("Crown recorded in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn reset_all_monthly_stats(&self) -> Result<u64, AppError> {
        let result = sqlx::query(RESET_MONTHLY_SQL)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to reset monthly stats"))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn open_stats_month(&self) -> Result<Option<String>, AppError> {
        let row = sqlx::query(
            "SELECT month_label FROM monthly_resets ORDER BY month_label DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to load open stats month"))?;

        Ok(row.map(|row| row.get("month_label")))
    }

    #[instrument(skip(self))]
    async fn start_stats_month(
        &self,
        month_label: &str,
        started_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let marker = sqlx::query(
            "INSERT INTO monthly_resets (month_label, reset_at) VALUES ($1, $2) \
             ON CONFLICT (month_label) DO NOTHING",
        )
        .bind(month_label)
        .bind(started_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to open stats month"))?;

        Ok(marker.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn reset_monthly_stats_once(
        &self,
        month_label: &str,
        reset_at: DateTime<Utc>,
    ) -> Result<Option<u64>, AppError> {
        let mut tx = self.begin().await?;

        let marker = sqlx::query(
            "INSERT INTO monthly_resets (month_label, reset_at) VALUES ($1, $2) \
             ON CONFLICT (month_label) DO NOTHING",
        )
        .bind(month_label)
        .bind(reset_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to record monthly reset"))?;

        if marker.rows_affected() == 0 {
            debug!("Month already reset");
            return Ok(None);
        }

        let result = sqlx::query(RESET_MONTHLY_SQL)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to reset monthly stats"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit monthly reset"))?;

        Ok(Some(result.rows_affected()))
    }
}
