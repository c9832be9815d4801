use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    models::{PredictionModel, PredictionUpsert},
    repository::PredictionRepository,
};
use crate::matches::repository::MatchRepository;
use crate::shared::AppError;
use crate::users::repository::UserRepository;

/// Service for submitting and reading match predictions
pub struct PredictionService {
    predictions: Arc<dyn PredictionRepository>,
    matches: Arc<dyn MatchRepository>,
    users: Arc<dyn UserRepository>,
}

impl PredictionService {
    pub fn new(
        predictions: Arc<dyn PredictionRepository>,
        matches: Arc<dyn MatchRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            predictions,
            matches,
            users,
        }
    }

    /// Stores the user's guess, replacing any earlier one for the same match
    #[instrument(skip(self, upsert), fields(match_id = %upsert.match_id, user_id = %upsert.user_id))]
    pub async fn submit_prediction(
        &self,
        upsert: PredictionUpsert,
        now: DateTime<Utc>,
    ) -> Result<PredictionModel, AppError> {
        if upsert.home_score < 0 || upsert.away_score < 0 {
            return Err(AppError::Validation(
                "Predicted scores must not be negative".to_string(),
            ));
        }

        let fixture = self
            .matches
            .get_match(upsert.match_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", upsert.match_id)))?;

        if !fixture.is_knockout && upsert.predicted_advancing_team.is_some() {
            return Err(AppError::Validation(
                "Advancing team can only be predicted for knockout matches".to_string(),
            ));
        }

        if !fixture.accepts_predictions_at(now) {
            warn!(status = %fixture.status, deadline = %fixture.deadline, "Prediction window closed");
            return Err(AppError::Validation(format!(
                "Predictions for match {} are closed",
                fixture.id
            )));
        }

        if self.users.get_user(upsert.user_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "User {} not found",
                upsert.user_id
            )));
        }

        let prediction = self.predictions.upsert_prediction(&upsert, now).await?;

        info!(
            prediction_id = %prediction.id,
            home_score = prediction.home_score,
            away_score = prediction.away_score,
            "Prediction stored"
        );
        Ok(prediction)
    }

    #[instrument(skip(self))]
    pub async fn get_prediction(
        &self,
        match_id: Uuid,
        user_id: Uuid,
    ) -> Result<PredictionModel, AppError> {
        self.predictions
            .get_prediction(match_id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No prediction by user {} for match {}",
                    user_id, match_id
                ))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_predictions(&self, match_id: Uuid) -> Result<Vec<PredictionModel>, AppError> {
        if self.matches.get_match(match_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Match {} not found", match_id)));
        }

        let predictions = self.predictions.list_predictions(match_id).await?;
        debug!(count = predictions.len(), "Predictions listed");
        Ok(predictions)
    }
}
