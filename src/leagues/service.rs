use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    models::{LeagueModel, LeaguePredictionModel, LeaguePredictionUpsert, LeagueResult},
    repository::LeagueRepository,
};
use crate::shared::AppError;
use crate::stats::FinishSummary;
use crate::users::repository::UserRepository;

/// Service for season-long league competitions
pub struct LeagueService {
    leagues: Arc<dyn LeagueRepository>,
    users: Arc<dyn UserRepository>,
}

impl LeagueService {
    pub fn new(leagues: Arc<dyn LeagueRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { leagues, users }
    }

    #[instrument(skip(self))]
    pub async fn create_league(
        &self,
        name: &str,
        deadline: DateTime<Utc>,
    ) -> Result<LeagueModel, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("League name is required".to_string()));
        }

        let league = LeagueModel::new(name.to_string(), deadline);
        self.leagues.create_league(&league).await?;

        info!(league_id = %league.id, name = %league.name, "League created");
        Ok(league)
    }

    #[instrument(skip(self))]
    pub async fn get_league(&self, league_id: Uuid) -> Result<LeagueModel, AppError> {
        self.leagues
            .get_league(league_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("League {} not found", league_id)))
    }

    #[instrument(skip(self, upsert), fields(league_id = %upsert.league_id, user_id = %upsert.user_id))]
    pub async fn submit_prediction(
        &self,
        upsert: LeaguePredictionUpsert,
        now: DateTime<Utc>,
    ) -> Result<LeaguePredictionModel, AppError> {
        if upsert.is_empty() {
            return Err(AppError::Validation(
                "League prediction needs at least one pick".to_string(),
            ));
        }

        let league = self.get_league(upsert.league_id).await?;
        if !league.accepts_predictions_at(now) {
            warn!(status = %league.status, deadline = %league.deadline, "League predictions closed");
            return Err(AppError::Validation(format!(
                "Predictions for league {} are closed",
                league.id
            )));
        }

        if self.users.get_user(upsert.user_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "User {} not found",
                upsert.user_id
            )));
        }

        let prediction = self.leagues.upsert_league_prediction(&upsert, now).await?;
        info!(prediction_id = %prediction.id, "League prediction stored");
        Ok(prediction)
    }

    #[instrument(skip(self))]
    pub async fn list_predictions(
        &self,
        league_id: Uuid,
    ) -> Result<Vec<LeaguePredictionModel>, AppError> {
        self.get_league(league_id).await?;
        self.leagues.list_league_predictions(league_id).await
    }

    /// Records the real season outcome and credits every pick
    #[instrument(skip(self, result))]
    pub async fn finish_league(
        &self,
        league_id: Uuid,
        result: LeagueResult,
    ) -> Result<FinishSummary, AppError> {
        result.validate()?;

        let league = self.get_league(league_id).await?;
        if league.is_finished() {
            warn!(league_id = %league_id, "League already finished");
            return Err(AppError::Conflict(format!(
                "League {} is already finished",
                league_id
            )));
        }

        let summary = self
            .leagues
            .finish_league(league_id, &result, Utc::now())
            .await?;

        info!(
            league_id = %league_id,
            predictions_processed = summary.predictions_processed,
            users_updated = summary.users_updated,
            "League finished"
        );
        Ok(summary)
    }
}
