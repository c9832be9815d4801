use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{models::MatchModel, repository::MatchRepository, types::CreateMatchRequest};
use crate::shared::AppError;

/// Service for scheduling matches and moving them through their lifecycle.
/// Finishing lives in the stats service since it is what credits users.
pub struct MatchService {
    repository: Arc<dyn MatchRepository>,
}

impl MatchService {
    pub fn new(repository: Arc<dyn MatchRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, request))]
    pub async fn create_match(&self, request: CreateMatchRequest) -> Result<MatchModel, AppError> {
        let home_team = request.home_team.trim();
        let away_team = request.away_team.trim();

        if home_team.is_empty() || away_team.is_empty() {
            return Err(AppError::Validation(
                "Both teams must be named".to_string(),
            ));
        }
        if home_team.eq_ignore_ascii_case(away_team) {
            return Err(AppError::Validation(
                "A team cannot play itself".to_string(),
            ));
        }

        let fixture = MatchModel::new(
            home_team.to_string(),
            away_team.to_string(),
            request.deadline,
            request.is_knockout,
        );
        self.repository.create_match(&fixture).await?;

        info!(
            match_id = %fixture.id,
            home_team = %fixture.home_team,
            away_team = %fixture.away_team,
            is_knockout = fixture.is_knockout,
            "Match scheduled"
        );
        Ok(fixture)
    }

    #[instrument(skip(self))]
    pub async fn get_match(&self, match_id: Uuid) -> Result<MatchModel, AppError> {
        self.repository
            .get_match(match_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))
    }

    #[instrument(skip(self))]
    pub async fn start_match(&self, match_id: Uuid) -> Result<MatchModel, AppError> {
        let fixture = self.repository.start_match(match_id).await?;
        info!(match_id = %match_id, "Match is live");
        Ok(fixture)
    }
}
