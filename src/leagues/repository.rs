use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::{LeagueModel, LeaguePredictionModel, LeaguePredictionUpsert, LeagueResult};
use crate::shared::AppError;
use crate::stats::FinishSummary;

/// Trait for league repository operations
#[async_trait]
pub trait LeagueRepository: Send + Sync {
    async fn create_league(&self, league: &LeagueModel) -> Result<(), AppError>;
    async fn get_league(&self, league_id: Uuid) -> Result<Option<LeagueModel>, AppError>;

    /// Creates or overwrites the user's picks; `Validation` once the league
    /// is finished or past its deadline
    async fn upsert_league_prediction(
        &self,
        upsert: &LeaguePredictionUpsert,
        now: DateTime<Utc>,
    ) -> Result<LeaguePredictionModel, AppError>;

    async fn list_league_predictions(
        &self,
        league_id: Uuid,
    ) -> Result<Vec<LeaguePredictionModel>, AppError>;

    /// Stores the real outcome, scores every pick and credits each user in
    /// one unit. Same failure contract as finishing a match.
    async fn finish_league(
        &self,
        league_id: Uuid,
        result: &LeagueResult,
        finished_at: DateTime<Utc>,
    ) -> Result<FinishSummary, AppError>;
}
