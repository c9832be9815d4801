use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::InMemoryStore;
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

fn closed(kind: &str, id: Uuid) -> AppError {
    AppError::Validation(format!("Predictions for {} {} are closed", kind, id))
}

#[async_trait]
impl LeagueRepository for InMemoryStore {
    #[instrument(skip(self, league), fields(league_id = %league.id))]
    async fn create_league(&self, league: &LeagueModel) -> Result<(), AppError> {
        self.tables()?.leagues.insert(league.id, league.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_league(&self, league_id: Uuid) -> Result<Option<LeagueModel>, AppError> {
        Ok(self.tables()?.leagues.get(&league_id).cloned())
    }

    #[instrument(skip(self, upsert), fields(league_id = %upsert.league_id, user_id = %upsert.user_id))]
    async fn upsert_league_prediction(
        &self,
        upsert: &LeaguePredictionUpsert,
        now: DateTime<Utc>,
    ) -> Result<LeaguePredictionModel, AppError> {
        let mut tables = self.tables()?;

        let league = tables.leagues.get(&upsert.league_id).ok_or_else(|| {
            AppError::NotFound(format!("League {} not found", upsert.league_id))
        })?;
        if !league.accepts_predictions_at(now) {
            return Err(closed("league", upsert.league_id));
        }

        let prediction = tables
            .league_predictions
            .entry((upsert.league_id, upsert.user_id))
            .and_modify(|existing| existing.overwrite_with(upsert, now))
            .or_insert_with(|| upsert.clone().into_model(now));
        debug!(prediction_id = %prediction.id, "League prediction upserted in memory");
        Ok(prediction.clone())
    }

    #[instrument(skip(self))]
    async fn list_league_predictions(
        &self,
        league_id: Uuid,
    ) -> Result<Vec<LeaguePredictionModel>, AppError> {
        let mut predictions: Vec<LeaguePredictionModel> = self
            .tables()?
            .league_predictions
            .values()
            .filter(|prediction| prediction.league_id == league_id)
            .cloned()
            .collect();
        predictions.sort_by_key(|prediction| (prediction.created_at, prediction.id));
        Ok(predictions)
    }

    #[instrument(skip(self, result))]
    async fn finish_league(
        &self,
        league_id: Uuid,
        result: &LeagueResult,
        finished_at: DateTime<Utc>,
    ) -> Result<FinishSummary, AppError> {
        let mut tables = self.tables()?;

        let mut league = tables
            .leagues
            .get(&league_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("League {} not found", league_id)))?;
        if league.is_finished() {
            return Err(AppError::Conflict(format!(
                "League {} is already finished",
                league_id
            )));
        }

        league.finish(result, finished_at);

        let scored: Vec<ScoredPrediction> = tables
            .league_predictions
            .values()
            .filter(|prediction| prediction.league_id == league_id)
            .map(|prediction| ScoredPrediction {
                prediction_id: prediction.id,
                user_id: prediction.user_id,
                outcome: score_league_prediction(prediction, result),
            })
            .collect();
        let credited = tables.stage_credits(&scored)?;

        tables.leagues.insert(league_id, league);
        for entry in &scored {
            if let Some(prediction) = tables.league_predictions.get_mut(&(league_id, entry.user_id)) {
                prediction.record_outcome(entry.outcome);
            }
        }
        let users_updated = tables.commit_credits(credited, false);

        info!(predictions_processed = scored.len(), users_updated, "League finished in memory");
        Ok(FinishSummary {
            id: league_id,
            predictions_processed: scored.len(),
            users_updated,
        })
    }
}

#[async_trait]
impl AwardRepository for InMemoryStore {
    #[instrument(skip(self, award), fields(award_id = %award.id))]
    async fn create_award(&self, award: &AwardModel) -> Result<(), AppError> {
        self.tables()?.awards.insert(award.id, award.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_award(&self, award_id: Uuid) -> Result<Option<AwardModel>, AppError> {
        Ok(self.tables()?.awards.get(&award_id).cloned())
    }

    #[instrument(skip(self, upsert), fields(award_id = %upsert.award_id, user_id = %upsert.user_id))]
    async fn upsert_award_prediction(
        &self,
        upsert: &AwardPredictionUpsert,
        now: DateTime<Utc>,
    ) -> Result<AwardPredictionModel, AppError> {
        let mut tables = self.tables()?;

        let award = tables
            .awards
            .get(&upsert.award_id)
            .ok_or_else(|| AppError::NotFound(format!("Award {} not found", upsert.award_id)))?;
        if !award.accepts_predictions_at(now) {
            return Err(closed("award", upsert.award_id));
        }

        let prediction = tables
            .award_predictions
            .entry((upsert.award_id, upsert.user_id))
            .and_modify(|existing| {
                existing.predicted_winner = upsert.predicted_winner.clone();
                existing.updated_at = now;
            })
            .or_insert_with(|| upsert.clone().into_model(now));
        Ok(prediction.clone())
    }

    #[instrument(skip(self))]
    async fn list_award_predictions(
        &self,
        award_id: Uuid,
    ) -> Result<Vec<AwardPredictionModel>, AppError> {
        let mut predictions: Vec<AwardPredictionModel> = self
            .tables()?
            .award_predictions
            .values()
            .filter(|prediction| prediction.award_id == award_id)
            .cloned()
            .collect();
        predictions.sort_by_key(|prediction| (prediction.created_at, prediction.id));
        Ok(predictions)
    }

    #[instrument(skip(self))]
    async fn finish_award(
        &self,
        award_id: Uuid,
        winner: &str,
        finished_at: DateTime<Utc>,
    ) -> Result<FinishSummary, AppError> {
        let mut tables = self.tables()?;

        let mut award = tables
            .awards
            .get(&award_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Award {} not found", award_id)))?;
        if award.is_finished() {
            return Err(AppError::Conflict(format!(
                "Award {} is already finished",
                award_id
            )));
        }

        award.finish(winner, finished_at);

        let scored: Vec<ScoredPrediction> = tables
            .award_predictions
            .values()
            .filter(|prediction| prediction.award_id == award_id)
            .map(|prediction| ScoredPrediction {
                prediction_id: prediction.id,
                user_id: prediction.user_id,
                outcome: score_award_prediction(&prediction.predicted_winner, winner),
            })
            .collect();
        let credited = tables.stage_credits(&scored)?;

        tables.awards.insert(award_id, award);
        for entry in &scored {
            if let Some(prediction) = tables.award_predictions.get_mut(&(award_id, entry.user_id)) {
                prediction.record_outcome(entry.outcome);
            }
        }
        let users_updated = tables.commit_credits(credited, false);

        info!(predictions_processed = scored.len(), users_updated, "Award finished in memory");
        Ok(FinishSummary {
            id: award_id,
            predictions_processed: scored.len(),
            users_updated,
        })
    }
}
