use async_trait::async_trait;
use uuid::Uuid;

use super::models::{FinishMatchRequest, MatchModel};
use crate::scoring::PredictionScorer;
use crate::shared::AppError;
use crate::stats::FinishSummary;

/// Trait for match repository operations
#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn create_match(&self, fixture: &MatchModel) -> Result<(), AppError>;
    async fn get_match(&self, match_id: Uuid) -> Result<Option<MatchModel>, AppError>;

    /// Moves a pending match to live, which locks its predictions
    async fn start_match(&self, match_id: Uuid) -> Result<MatchModel, AppError>;

    /// Atomically finishes a match and credits every predicting user.
    ///
    /// Flips the status, stores the result, scores each prediction with
    /// `scorer`, increments each user's counters and recomputes streaks and
    /// level as one unit. Fails with `Conflict` if the match is already
    /// finished and with `PartialFailure` if any user update fails, in which
    /// case nothing is written.
    async fn finish_match(
        &self,
        request: &FinishMatchRequest,
        scorer: &dyn PredictionScorer,
    ) -> Result<FinishSummary, AppError>;
}
