use chrono::Utc;
use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::FinishSummary;
use crate::matches::{repository::MatchRepository, FinishMatchRequest, MatchResult};
use crate::scoring::ScoringEngine;
use crate::shared::AppError;

/// The "finish match" use case: validates the real result and hands the
/// whole scoring pass to the store as a single atomic unit.
pub struct StatsService {
    matches: Arc<dyn MatchRepository>,
    scoring_engine: Arc<ScoringEngine>,
}

impl StatsService {
    pub fn new(matches: Arc<dyn MatchRepository>, scoring_engine: Arc<ScoringEngine>) -> Self {
        Self {
            matches,
            scoring_engine,
        }
    }

    #[instrument(skip(self, result), fields(result_home = result.home, result_away = result.away))]
    pub async fn finish_match(
        &self,
        match_id: Uuid,
        result: MatchResult,
    ) -> Result<FinishSummary, AppError> {
        if result.home < 0 || result.away < 0 {
            return Err(AppError::Validation(
                "Match result must not be negative".to_string(),
            ));
        }

        let fixture = self
            .matches
            .get_match(match_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))?;

        if fixture.is_finished() {
            warn!(match_id = %match_id, "Match already finished");
            return Err(AppError::Conflict(format!(
                "Match {} is already finished",
                match_id
            )));
        }

        match (fixture.is_knockout, result.advancing_team) {
            (true, None) => {
                return Err(AppError::Validation(
                    "Knockout matches need the advancing team".to_string(),
                ))
            }
            (false, Some(_)) => {
                return Err(AppError::Validation(
                    "Only knockout matches have an advancing team".to_string(),
                ))
            }
            _ => {}
        }

        let request = FinishMatchRequest {
            match_id,
            result,
            finished_at: Utc::now(),
        };

        let summary = self
            .matches
            .finish_match(&request, self.scoring_engine.as_ref())
            .await
            .map_err(|err| {
                warn!(match_id = %match_id, error = %err, "Finishing match failed, nothing applied");
                err
            })?;

        info!(
            match_id = %match_id,
            predictions_processed = summary.predictions_processed,
            users_updated = summary.users_updated,
            "Match finished and scored"
        );
        Ok(summary)
    }
}
