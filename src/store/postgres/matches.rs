use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    credit_users, db_error, match_from_row, prediction_from_row, PostgresStore, MATCH_COLUMNS,
    PREDICTION_COLUMNS,
};
use crate::matches::{
    repository::MatchRepository, FinishMatchRequest, MatchModel, MatchStatus,
};
use crate::predictions::{repository::PredictionRepository, PredictionModel, PredictionUpsert};
use crate::scoring::PredictionScorer;
use crate::shared::AppError;
use crate::stats::{FinishSummary, ScoredPrediction};

fn match_not_found(match_id: Uuid) -> AppError {
    AppError::NotFound(format!("Match {} not found", match_id))
}

#[async_trait]
impl MatchRepository for PostgresStore {
    #[instrument(skip(self, fixture), fields(match_id = %fixture.id))]
    async fn create_match(&self, fixture: &MatchModel) -> Result<(), AppError> {
        sqlx::query(&format!(
            "INSERT INTO matches ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            MATCH_COLUMNS
        ))
        .bind(fixture.id)
        .bind(&fixture.home_team)
        .bind(&fixture.away_team)
        .bind(fixture.deadline)
        .bind(fixture.status.as_ref())
        .bind(fixture.is_knockout)
        .bind(fixture.result_home)
        .bind(fixture.result_away)
        .bind(fixture.advancing_team.map(|side| side.to_string()))
        .bind(fixture.created_at)
        .bind(fixture.finished_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create match in database"))?;

        debug!("Match created in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_match(&self, match_id: Uuid) -> Result<Option<MatchModel>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM matches WHERE id = $1", MATCH_COLUMNS))
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch match from database"))?;

        row.as_ref().map(match_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn start_match(&self, match_id: Uuid) -> Result<MatchModel, AppError> {
        let row = sqlx::query(&format!(
            "UPDATE matches SET status = $2 WHERE id = $1 AND status = $3 RETURNING {}",
            MATCH_COLUMNS
        ))
        .bind(match_id)
        .bind(MatchStatus::Live.as_ref())
        .bind(MatchStatus::Pending.as_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to start match"))?;

        match row {
            Some(row) => match_from_row(&row),
            None => match self.get_match(match_id).await? {
                Some(fixture) => {
                    warn!(status = %fixture.status, "Only pending matches can start");
                    Err(AppError::Conflict(format!(
                        "Match {} is already {}",
                        match_id, fixture.status
                    )))
                }
                None => Err(match_not_found(match_id)),
            },
        }
    }

    #[instrument(skip(self, request, scorer), fields(match_id = %request.match_id))]
    async fn finish_match(
        &self,
        request: &FinishMatchRequest,
        scorer: &dyn PredictionScorer,
    ) -> Result<FinishSummary, AppError> {
        let mut tx = self.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM matches WHERE id = $1 FOR UPDATE",
            MATCH_COLUMNS
        ))
        .bind(request.match_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock match"))?
        .ok_or_else(|| match_not_found(request.match_id))?;

        let mut fixture = match_from_row(&row)?;
        if fixture.is_finished() {
            return Err(AppError::Conflict(format!(
                "Match {} is already finished",
                request.match_id
            )));
        }
        fixture.finish(&request.result, request.finished_at);

        sqlx::query(
            "UPDATE matches SET status = $2, result_home = $3, result_away = $4, \
             advancing_team = $5, finished_at = $6 WHERE id = $1",
        )
        .bind(fixture.id)
        .bind(fixture.status.as_ref())
        .bind(fixture.result_home)
        .bind(fixture.result_away)
        .bind(fixture.advancing_team.map(|side| side.to_string()))
        .bind(fixture.finished_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to store match result"))?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM predictions WHERE match_id = $1 ORDER BY user_id FOR UPDATE",
            PREDICTION_COLUMNS
        ))
        .bind(fixture.id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("Failed to lock predictions"))?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in &rows {
            let prediction = prediction_from_row(row)?;
            let outcome = scorer.score_prediction(&prediction, &fixture, &request.result);

            sqlx::query("UPDATE predictions SET points = $2, correct = $3 WHERE id = $1")
                .bind(prediction.id)
                .bind(outcome.points)
                .bind(outcome.correct)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to store prediction score"))?;

            scored.push(ScoredPrediction {
                prediction_id: prediction.id,
                user_id: prediction.user_id,
                outcome,
            });
        }

        let users_updated = credit_users(&mut tx, &scored, true).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit match finish"))?;

        info!(
            predictions_processed = scored.len(),
            users_updated, "Match finished in database"
        );
        Ok(FinishSummary {
            id: fixture.id,
            predictions_processed: scored.len(),
            users_updated,
        })
    }
}

#[async_trait]
impl PredictionRepository for PostgresStore {
    #[instrument(skip(self))]
    async fn get_prediction(
        &self,
        match_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PredictionModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM predictions WHERE match_id = $1 AND user_id = $2",
            PREDICTION_COLUMNS
        ))
        .bind(match_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch prediction"))?;

        row.as_ref().map(prediction_from_row).transpose()
    }

    #[instrument(skip(self, upsert), fields(match_id = %upsert.match_id, user_id = %upsert.user_id))]
    async fn upsert_prediction(
        &self,
        upsert: &PredictionUpsert,
        now: DateTime<Utc>,
    ) -> Result<PredictionModel, AppError> {
        let mut tx = self.begin().await?;

        // FOR SHARE serialises against a concurrent finish, which locks FOR UPDATE
        let row = sqlx::query(&format!(
            "SELECT {} FROM matches WHERE id = $1 FOR SHARE",
            MATCH_COLUMNS
        ))
        .bind(upsert.match_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock match for prediction"))?
        .ok_or_else(|| match_not_found(upsert.match_id))?;

        if !match_from_row(&row)?.accepts_predictions_at(now) {
            return Err(AppError::Validation(format!(
                "Predictions for match {} are closed",
                upsert.match_id
            )));
        }

        let fresh = upsert.clone().into_model(now);
        let row = sqlx::query(&format!(
            "INSERT INTO predictions ({}) VALUES ($1, $2, $3, $4, $5, $6, NULL, NULL, $7, $7) \
             ON CONFLICT (match_id, user_id) DO UPDATE SET \
                home_score = EXCLUDED.home_score, \
                away_score = EXCLUDED.away_score, \
                predicted_advancing_team = EXCLUDED.predicted_advancing_team, \
                updated_at = EXCLUDED.updated_at \
             RETURNING {}",
            PREDICTION_COLUMNS, PREDICTION_COLUMNS
        ))
        .bind(fresh.id)
        .bind(fresh.match_id)
        .bind(fresh.user_id)
        .bind(fresh.home_score)
        .bind(fresh.away_score)
        .bind(fresh.predicted_advancing_team.map(|side| side.to_string()))
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if matches!(&e, sqlx::Error::Database(db) if db.is_foreign_key_violation()) {
                AppError::NotFound(format!("User {} not found", upsert.user_id))
            } else {
                db_error("Failed to upsert prediction")(e)
            }
        })?;
        let prediction = prediction_from_row(&row)?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit prediction"))?;

        debug!(prediction_id = %prediction.id, "Prediction upserted in database");
        Ok(prediction)
    }

    #[instrument(skip(self))]
    async fn list_predictions(&self, match_id: Uuid) -> Result<Vec<PredictionModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM predictions WHERE match_id = $1 ORDER BY created_at, id",
            PREDICTION_COLUMNS
        ))
        .bind(match_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list predictions"))?;

        rows.iter().map(prediction_from_row).collect()
    }
}
