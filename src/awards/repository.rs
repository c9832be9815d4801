use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::{AwardModel, AwardPredictionModel, AwardPredictionUpsert};
use crate::shared::AppError;
use crate::stats::FinishSummary;

/// Trait for award repository operations
#[async_trait]
pub trait AwardRepository: Send + Sync {
    async fn create_award(&self, award: &AwardModel) -> Result<(), AppError>;
    async fn get_award(&self, award_id: Uuid) -> Result<Option<AwardModel>, AppError>;

    async fn upsert_award_prediction(
        &self,
        upsert: &AwardPredictionUpsert,
        now: DateTime<Utc>,
    ) -> Result<AwardPredictionModel, AppError>;

    async fn list_award_predictions(
        &self,
        award_id: Uuid,
    ) -> Result<Vec<AwardPredictionModel>, AppError>;

    /// Declares the winner, scores every pick and credits each user in one unit
    async fn finish_award(
        &self,
        award_id: Uuid,
        winner: &str,
        finished_at: DateTime<Utc>,
    ) -> Result<FinishSummary, AppError>;
}
