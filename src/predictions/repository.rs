use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::{PredictionModel, PredictionUpsert};
use crate::shared::AppError;

/// Trait for prediction repository operations
#[async_trait]
pub trait PredictionRepository: Send + Sync {
    async fn get_prediction(
        &self,
        match_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PredictionModel>, AppError>;

    /// Creates or overwrites the prediction for (match, user).
    ///
    /// The prediction window is checked at write time against the stored
    /// match: `Validation` if it is not pending or `now` is past its
    /// deadline, `NotFound` if the match does not exist.
    async fn upsert_prediction(
        &self,
        upsert: &PredictionUpsert,
        now: DateTime<Utc>,
    ) -> Result<PredictionModel, AppError>;

    async fn list_predictions(&self, match_id: Uuid) -> Result<Vec<PredictionModel>, AppError>;
}
