use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Row};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{competition_status, credit_users, db_error, PostgresStore};
use crate::awards::{
    repository::AwardRepository, AwardModel, AwardPredictionModel, AwardPredictionUpsert,
};
use crate::leagues::{
    repository::LeagueRepository, LeagueModel, LeaguePredictionModel, LeaguePredictionUpsert,
    LeagueResult,
};
use crate::scoring::{score_award_prediction, score_league_prediction};
use crate::shared::AppError;
use crate::stats::{FinishSummary, ScoredPrediction};

const LEAGUE_COLUMNS: &str =
    "id, name, deadline, status, champion, top_scorer, top_assist, mvp, created_at, finished_at";

const LEAGUE_PREDICTION_COLUMNS: &str = "id, league_id, user_id, champion, top_scorer, \
    top_assist, mvp, points, correct, created_at, updated_at";

const AWARD_COLUMNS: &str = "id, name, deadline, status, winner, created_at, finished_at";

const AWARD_PREDICTION_COLUMNS: &str =
    "id, award_id, user_id, predicted_winner, points, correct, created_at, updated_at";

fn league_from_row(row: &PgRow) -> Result<LeagueModel, AppError> {
    Ok(LeagueModel {
        id: row.get("id"),
        name: row.get("name"),
        deadline: row.get("deadline"),
        status: competition_status(row)?,
        champion: row.get("champion"),
        top_scorer: row.get("top_scorer"),
        top_assist: row.get("top_assist"),
        mvp: row.get("mvp"),
        created_at: row.get("created_at"),
        finished_at: row.get("finished_at"),
    })
}

fn league_prediction_from_row(row: &PgRow) -> LeaguePredictionModel {
    LeaguePredictionModel {
        id: row.get("id"),
        league_id: row.get("league_id"),
        user_id: row.get("user_id"),
        champion: row.get("champion"),
        top_scorer: row.get("top_scorer"),
        top_assist: row.get("top_assist"),
        mvp: row.get("mvp"),
        points: row.get("points"),
        correct: row.get("correct"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn award_from_row(row: &PgRow) -> Result<AwardModel, AppError> {
    Ok(AwardModel {
        id: row.get("id"),
        name: row.get("name"),
        deadline: row.get("deadline"),
        status: competition_status(row)?,
        winner: row.get("winner"),
        created_at: row.get("created_at"),
        finished_at: row.get("finished_at"),
    })
}

fn award_prediction_from_row(row: &PgRow) -> AwardPredictionModel {
    AwardPredictionModel {
        id: row.get("id"),
        award_id: row.get("award_id"),
        user_id: row.get("user_id"),
        predicted_winner: row.get("predicted_winner"),
        points: row.get("points"),
        correct: row.get("correct"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn closed(kind: &str, id: Uuid) -> AppError {
    AppError::Validation(format!("Predictions for {} {} are closed", kind, id))
}

#[async_trait]
impl LeagueRepository for PostgresStore {
    #[instrument(skip(self, league), fields(league_id = %league.id))]
    async fn create_league(&self, league: &LeagueModel) -> Result<(), AppError> {
        sqlx::query(&format!(
            "INSERT INTO leagues ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            LEAGUE_COLUMNS
        ))
        .bind(league.id)
        .bind(&league.name)
        .bind(league.deadline)
        .bind(league.status.as_ref())
        .bind(&league.champion)
        .bind(&league.top_scorer)
        .bind(&league.top_assist)
        .bind(&league.mvp)
        .bind(league.created_at)
        .bind(league.finished_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create league"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_league(&self, league_id: Uuid) -> Result<Option<LeagueModel>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM leagues WHERE id = $1", LEAGUE_COLUMNS))
            .bind(league_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch league"))?;

        row.as_ref().map(league_from_row).transpose()
    }

    #[instrument(skip(self, upsert), fields(league_id = %upsert.league_id, user_id = %upsert.user_id))]
    async fn upsert_league_prediction(
        &self,
        upsert: &LeaguePredictionUpsert,
        now: DateTime<Utc>,
    ) -> Result<LeaguePredictionModel, AppError> {
        let mut tx = self.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM leagues WHERE id = $1 FOR SHARE",
            LEAGUE_COLUMNS
        ))
        .bind(upsert.league_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock league"))?
        .ok_or_else(|| AppError::NotFound(format!("League {} not found", upsert.league_id)))?;

        if !league_from_row(&row)?.accepts_predictions_at(now) {
            return Err(closed("league", upsert.league_id));
        }

        let fresh = upsert.clone().into_model(now);
        let row = sqlx::query(&format!(
            "INSERT INTO league_predictions ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, NULL, $8, $8) \
             ON CONFLICT (league_id, user_id) DO UPDATE SET \
                champion = EXCLUDED.champion, \
                top_scorer = EXCLUDED.top_scorer, \
                top_assist = EXCLUDED.top_assist, \
                mvp = EXCLUDED.mvp, \
                updated_at = EXCLUDED.updated_at \
             RETURNING {}",
            LEAGUE_PREDICTION_COLUMNS, LEAGUE_PREDICTION_COLUMNS
        ))
        .bind(fresh.id)
        .bind(fresh.league_id)
        .bind(fresh.user_id)
        .bind(&fresh.champion)
        .bind(&fresh.top_scorer)
        .bind(&fresh.top_assist)
        .bind(&fresh.mvp)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to upsert league prediction"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit league prediction"))?;
        Ok(league_prediction_from_row(&row))
    }

    #[instrument(skip(self))]
    async fn list_league_predictions(
        &self,
        league_id: Uuid,
    ) -> Result<Vec<LeaguePredictionModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM league_predictions WHERE league_id = $1 ORDER BY created_at, id",
            LEAGUE_PREDICTION_COLUMNS
        ))
        .bind(league_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list league predictions"))?;

        Ok(rows.iter().map(league_prediction_from_row).collect())
    }

    #[instrument(skip(self, result))]
    async fn finish_league(
        &self,
        league_id: Uuid,
        result: &LeagueResult,
        finished_at: DateTime<Utc>,
    ) -> Result<FinishSummary, AppError> {
        let mut tx = self.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM leagues WHERE id = $1 FOR UPDATE",
            LEAGUE_COLUMNS
        ))
        .bind(league_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock league"))?
        .ok_or_else(|| AppError::NotFound(format!("League {} not found", league_id)))?;

        let mut league = league_from_row(&row)?;
        if league.is_finished() {
            return Err(AppError::Conflict(format!(
                "League {} is already finished",
                league_id
            )));
        }
        league.finish(result, finished_at);

        sqlx::query(
            "UPDATE leagues SET status = $2, champion = $3, top_scorer = $4, top_assist = $5, \
             mvp = $6, finished_at = $7 WHERE id = $1",
        )
        .bind(league_id)
        .bind(league.status.as_ref())
        .bind(&league.champion)
        .bind(&league.top_scorer)
        .bind(&league.top_assist)
        .bind(&league.mvp)
        .bind(league.finished_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to store league result"))?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM league_predictions WHERE league_id = $1 ORDER BY user_id FOR UPDATE",
            LEAGUE_PREDICTION_COLUMNS
        ))
        .bind(league_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("Failed to lock league predictions"))?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in &rows {
            let prediction = league_prediction_from_row(row);
            let outcome = score_league_prediction(&prediction, result);

            sqlx::query("UPDATE league_predictions SET points = $2, correct = $3 WHERE id = $1")
                .bind(prediction.id)
                .bind(outcome.points)
                .bind(outcome.correct)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to store league prediction score"))?;

            scored.push(ScoredPrediction {
                prediction_id: prediction.id,
                user_id: prediction.user_id,
                outcome,
            });
        }

        let users_updated = credit_users(&mut tx, &scored, false).await?;
        tx.commit()
            .await
            .map_err(db_error("Failed to commit league finish"))?;

        info!(predictions_processed = scored.len(), users_updated, "League finished in database");
        Ok(FinishSummary {
            id: league_id,
            predictions_processed: scored.len(),
            users_updated,
        })
    }
}

#[async_trait]
impl AwardRepository for PostgresStore {
    #[instrument(skip(self, award), fields(award_id = %award.id))]
    async fn create_award(&self, award: &AwardModel) -> Result<(), AppError> {
        sqlx::query(&format!(
            "INSERT INTO awards ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            AWARD_COLUMNS
        ))
        .bind(award.id)
        .bind(&award.name)
        .bind(award.deadline)
        .bind(award.status.as_ref())
        .bind(&award.winner)
        .bind(award.created_at)
        .bind(award.finished_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create award"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_award(&self, award_id: Uuid) -> Result<Option<AwardModel>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM awards WHERE id = $1", AWARD_COLUMNS))
            .bind(award_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch award"))?;

        row.as_ref().map(award_from_row).transpose()
    }

    #[instrument(skip(self, upsert), fields(award_id = %upsert.award_id, user_id = %upsert.user_id))]
    async fn upsert_award_prediction(
        &self,
        upsert: &AwardPredictionUpsert,
        now: DateTime<Utc>,
    ) -> Result<AwardPredictionModel, AppError> {
        let mut tx = self.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM awards WHERE id = $1 FOR SHARE",
            AWARD_COLUMNS
        ))
        .bind(upsert.award_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock award"))?
        .ok_or_else(|| AppError::NotFound(format!("Award {} not found", upsert.award_id)))?;

        if !award_from_row(&row)?.accepts_predictions_at(now) {
            return Err(closed("award", upsert.award_id));
        }

        let fresh = upsert.clone().into_model(now);
        let row = sqlx::query(&format!(
            "INSERT INTO award_predictions ({}) VALUES ($1, $2, $3, $4, NULL, NULL, $5, $5) \
             ON CONFLICT (award_id, user_id) DO UPDATE SET \
                predicted_winner = EXCLUDED.predicted_winner, \
                updated_at = EXCLUDED.updated_at \
             RETURNING {}",
            AWARD_PREDICTION_COLUMNS, AWARD_PREDICTION_COLUMNS
        ))
        .bind(fresh.id)
        .bind(fresh.award_id)
        .bind(fresh.user_id)
        .bind(&fresh.predicted_winner)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to upsert award prediction"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit award prediction"))?;
        Ok(award_prediction_from_row(&row))
    }

    #[instrument(skip(self))]
    async fn list_award_predictions(
        &self,
        award_id: Uuid,
    ) -> Result<Vec<AwardPredictionModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM award_predictions WHERE award_id = $1 ORDER BY created_at, id",
            AWARD_PREDICTION_COLUMNS
        ))
        .bind(award_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list award predictions"))?;

        Ok(rows.iter().map(award_prediction_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn finish_award(
        &self,
        award_id: Uuid,
        winner: &str,
        finished_at: DateTime<Utc>,
    ) -> Result<FinishSummary, AppError> {
        let mut tx = self.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM awards WHERE id = $1 FOR UPDATE",
            AWARD_COLUMNS
        ))
        .bind(award_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock award"))?
        .ok_or_else(|| AppError::NotFound(format!("Award {} not found", award_id)))?;

        let mut award = award_from_row(&row)?;
        if award.is_finished() {
            return Err(AppError::Conflict(format!(
                "Award {} is already finished",
                award_id
            )));
        }
        award.finish(winner, finished_at);

        sqlx::query("UPDATE awards SET status = $2, winner = $3, finished_at = $4 WHERE id = $1")
            .bind(award_id)
            .bind(award.status.as_ref())
            .bind(&award.winner)
            .bind(award.finished_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to store award winner"))?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM award_predictions WHERE award_id = $1 ORDER BY user_id FOR UPDATE",
            AWARD_PREDICTION_COLUMNS
        ))
        .bind(award_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("Failed to lock award predictions"))?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in &rows {
            let prediction = award_prediction_from_row(row);
            let outcome = score_award_prediction(&prediction.predicted_winner, winner);

            sqlx::query("UPDATE award_predictions SET points = $2, correct = $3 WHERE id = $1")
                .bind(prediction.id)
                .bind(outcome.points)
                .bind(outcome.correct)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to store award prediction score"))?;

            scored.push(ScoredPrediction {
                prediction_id: prediction.id,
                user_id: prediction.user_id,
                outcome,
            });
        }

        let users_updated = credit_users(&mut tx, &scored, false).await?;
        tx.commit()
            .await
            .map_err(db_error("Failed to commit award finish"))?;

        debug!(winner = %winner, "Award winner stored");
        info!(predictions_processed = scored.len(), users_updated, "Award finished in database");
        Ok(FinishSummary {
            id: award_id,
            predictions_processed: scored.len(),
            users_updated,
        })
    }
}
