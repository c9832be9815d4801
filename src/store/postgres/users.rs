use async_trait::async_trait;
use sqlx::Row;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{db_error, increment_user_sql, PostgresStore, USER_COLUMNS};
use crate::scoring::{points, ScoreOutcome};
use crate::shared::AppError;
use crate::stats::derive_totals;
use crate::users::{repository::UserRepository, StatsIncrement, UserModel};

#[async_trait]
impl UserRepository for PostgresStore {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(display_name = %user.display_name, "Creating user in database");

        sqlx::query(&format!(
            "INSERT INTO users ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.display_name)
        .bind(user.points)
        .bind(user.predictions)
        .bind(user.correct)
        .bind(user.current_streak)
        .bind(user.best_streak)
        .bind(user.level)
        .bind(user.monthly_points)
        .bind(user.monthly_predictions)
        .bind(user.monthly_correct)
        .bind(user.monthly_championships)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if super::is_unique_violation(&e) {
                AppError::Conflict(format!("User {} already exists", user.id))
            } else {
                db_error("Failed to create user in database")(e)
            }
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserModel>, AppError> {
        sqlx::query_as::<_, UserModel>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch user from database"))
    }

    #[instrument(skip(self))]
    async fn list_users_by_points(&self) -> Result<Vec<UserModel>, AppError> {
        sqlx::query_as::<_, UserModel>(&format!(
            "SELECT {} FROM users ORDER BY points DESC, created_at ASC, id ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list users by points"))
    }

    #[instrument(skip(self))]
    async fn list_users_by_monthly_points(&self) -> Result<Vec<UserModel>, AppError> {
        sqlx::query_as::<_, UserModel>(&format!(
            "SELECT {} FROM users ORDER BY monthly_points DESC, created_at ASC, id ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list users by monthly points"))
    }

    #[instrument(skip(self, increment))]
    async fn increment_user_stats(
        &self,
        user_id: Uuid,
        increment: &StatsIncrement,
    ) -> Result<UserModel, AppError> {
        let updated = sqlx::query_as::<_, UserModel>(&increment_user_sql())
            .bind(user_id)
            .bind(increment.points)
            .bind(increment.predictions)
            .bind(increment.correct)
            .bind(increment.monthly_points)
            .bind(increment.monthly_predictions)
            .bind(increment.monthly_correct)
            .bind(points::POINTS_PER_LEVEL)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if matches!(&e, sqlx::Error::Database(db) if db.is_check_violation()) {
                    warn!(error = %e, "Stats increment violates user invariants");
                    AppError::Validation(format!(
                        "Stats increment would leave user {} inconsistent",
                        user_id
                    ))
                } else {
                    db_error("Failed to increment user stats")(e)
                }
            })?;

        updated.ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    #[instrument(skip(self))]
    async fn reconcile_user_stats(&self, user_id: Uuid) -> Result<UserModel, AppError> {
        let mut tx = self.begin().await?;

        let mut user = sqlx::query_as::<_, UserModel>(&format!(
            "SELECT {} FROM users WHERE id = $1 FOR UPDATE",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock user for reconciliation"))?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let match_rows = sqlx::query(
            "SELECT p.points, p.correct FROM predictions p \
             JOIN matches m ON m.id = p.match_id \
             WHERE p.user_id = $1 AND m.status = 'finished' AND p.points IS NOT NULL \
             ORDER BY m.finished_at DESC, m.id DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("Failed to load match predictions"))?;

        let other_rows = sqlx::query(
            "SELECT points, correct FROM league_predictions \
             WHERE user_id = $1 AND points IS NOT NULL \
             UNION ALL \
             SELECT points, correct FROM award_predictions \
             WHERE user_id = $1 AND points IS NOT NULL",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("Failed to load league and award predictions"))?;

        let to_outcomes = |rows: &[sqlx::postgres::PgRow]| -> Vec<ScoreOutcome> {
            rows.iter()
                .map(|row| ScoreOutcome::new(row.get("points"), row.get("correct")))
                .collect()
        };
        let totals = derive_totals(&to_outcomes(&match_rows), &to_outcomes(&other_rows));
        user.apply_totals(&totals);

        sqlx::query(
            "UPDATE users SET points = $2, predictions = $3, correct = $4, \
             current_streak = $5, best_streak = $6, level = $7 WHERE id = $1",
        )
        .bind(user_id)
        .bind(user.points)
        .bind(user.predictions)
        .bind(user.correct)
        .bind(user.current_streak)
        .bind(user.best_streak)
        .bind(user.level)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to store reconciled stats"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit reconciliation"))?;

        debug!(?totals, "User stats reconciled in database");
        Ok(user)
    }
}
