use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Postgres, Row, Transaction,
};
use tracing::{debug, info, instrument, warn};

use crate::matches::{MatchModel, MatchStatus, TeamSide};
use crate::predictions::PredictionModel;
use crate::scoring::points;
use crate::shared::{AppError, CompetitionStatus};
use crate::stats::{current_streak, fold_increments, ScoredPrediction};
use crate::users::UserModel;

mod championships;
mod competitions;
mod matches;
mod users;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const USER_COLUMNS: &str = "id, display_name, points, predictions, correct, current_streak, \
    best_streak, level, monthly_points, monthly_predictions, monthly_correct, \
    monthly_championships, created_at";

const MATCH_COLUMNS: &str = "id, home_team, away_team, deadline, status, is_knockout, \
    result_home, result_away, advancing_team, created_at, finished_at";

const PREDICTION_COLUMNS: &str = "id, match_id, user_id, home_score, away_score, \
    predicted_advancing_team, points, correct, created_at, updated_at";

/// PostgreSQL implementation of every repository
///
/// Multi-row operations run in a single transaction; counters are updated
/// with in-place increments so concurrent writers never lose an update.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        info!("Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<(), AppError> {
        MIGRATOR.run(&self.pool).await.map_err(|e| {
            warn!(error = %e, "Failed to run database migrations");
            AppError::DatabaseError(e.to_string())
        })?;

        info!("Database migrations applied");
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, AppError> {
        self.pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))
    }
}

/// Logs a store failure and maps it to `DatabaseError`
fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        warn!(error = %e, "{}", context);
        AppError::DatabaseError(e.to_string())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.get(column);
    raw.parse().map_err(|e: T::Err| {
        AppError::DatabaseError(format!("Invalid {} '{}': {}", column, raw, e))
    })
}

fn parse_optional_column<T>(row: &PgRow, column: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: Option<String> = row.get(column);
    raw.map(|value| {
        value.parse().map_err(|e: T::Err| {
            AppError::DatabaseError(format!("Invalid {} '{}': {}", column, value, e))
        })
    })
    .transpose()
}

fn match_from_row(row: &PgRow) -> Result<MatchModel, AppError> {
    Ok(MatchModel {
        id: row.get("id"),
        home_team: row.get("home_team"),
        away_team: row.get("away_team"),
        deadline: row.get("deadline"),
        status: parse_column::<MatchStatus>(row, "status")?,
        is_knockout: row.get("is_knockout"),
        result_home: row.get("result_home"),
        result_away: row.get("result_away"),
        advancing_team: parse_optional_column::<TeamSide>(row, "advancing_team")?,
        created_at: row.get("created_at"),
        finished_at: row.get("finished_at"),
    })
}

fn prediction_from_row(row: &PgRow) -> Result<PredictionModel, AppError> {
    Ok(PredictionModel {
        id: row.get("id"),
        match_id: row.get("match_id"),
        user_id: row.get("user_id"),
        home_score: row.get("home_score"),
        away_score: row.get("away_score"),
        predicted_advancing_team: parse_optional_column::<TeamSide>(
            row,
            "predicted_advancing_team",
        )?,
        points: row.get("points"),
        correct: row.get("correct"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn competition_status(row: &PgRow) -> Result<CompetitionStatus, AppError> {
    parse_column::<CompetitionStatus>(row, "status")
}

/// Adds the six deltas in place and recomputes the level from the new points.
/// Table CHECK constraints reject results that would break user invariants.
fn increment_user_sql() -> String {
    format!(
        "UPDATE users SET \
            points = points + $2, \
            predictions = predictions + $3, \
            correct = correct + $4, \
            monthly_points = monthly_points + $5, \
            monthly_predictions = monthly_predictions + $6, \
            monthly_correct = monthly_correct + $7, \
            level = (points + $2) / $8 + 1 \
         WHERE id = $1 \
         RETURNING {}",
        USER_COLUMNS
    )
}

/// Credits scored predictions to their owners inside `tx`, in ascending user
/// id order. Any user that cannot be updated fails with `PartialFailure`;
/// the caller drops the transaction, which rolls every write back.
async fn credit_users(
    tx: &mut Transaction<'_, Postgres>,
    scored: &[ScoredPrediction],
    refresh_streaks: bool,
) -> Result<usize, AppError> {
    let increments = fold_increments(scored);
    let increment_sql = increment_user_sql();

    for (user_id, increment) in &increments {
        let updated = sqlx::query_as::<_, UserModel>(&increment_sql)
            .bind(*user_id)
            .bind(increment.points)
            .bind(increment.predictions)
            .bind(increment.correct)
            .bind(increment.monthly_points)
            .bind(increment.monthly_predictions)
            .bind(increment.monthly_correct)
            .bind(points::POINTS_PER_LEVEL)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| {
                warn!(user_id = %user_id, error = %e, "User increment failed, rolling back");
                AppError::PartialFailure(format!("User {} could not be updated: {}", user_id, e))
            })?;

        if updated.is_none() {
            warn!(user_id = %user_id, "Predicting user missing, rolling back");
            return Err(AppError::PartialFailure(format!(
                "User {} could not be updated",
                user_id
            )));
        }
    }

    if refresh_streaks {
        for user_id in increments.keys() {
            let history = sqlx::query(
                "SELECT p.correct FROM predictions p \
                 JOIN matches m ON m.id = p.match_id \
                 WHERE p.user_id = $1 AND m.status = 'finished' AND p.correct IS NOT NULL \
                 ORDER BY m.finished_at DESC, m.id DESC",
            )
            .bind(*user_id)
            .fetch_all(&mut **tx)
            .await
            .map_err(db_error("Failed to load prediction history"))?;

            let streak = current_streak(history.iter().map(|row| row.get::<bool, _>("correct")));

            sqlx::query(
                "UPDATE users SET current_streak = $2, best_streak = GREATEST(best_streak, $2) \
                 WHERE id = $1",
            )
            .bind(*user_id)
            .bind(streak)
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to update streak"))?;

            debug!(user_id = %user_id, streak, "Streak refreshed");
        }
    }

    Ok(increments.len())
}
