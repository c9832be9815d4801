use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::awards::repository::AwardRepository;
use crate::championships::repository::ChampionshipRepository;
use crate::leagues::repository::LeagueRepository;
use crate::matches::repository::MatchRepository;
use crate::predictions::repository::PredictionRepository;
use crate::scoring::ScoringEngine;
use crate::store::InMemoryStore;
use crate::users::repository::UserRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository>,
    pub match_repository: Arc<dyn MatchRepository>,
    pub prediction_repository: Arc<dyn PredictionRepository>,
    pub championship_repository: Arc<dyn ChampionshipRepository>,
    pub league_repository: Arc<dyn LeagueRepository>,
    pub award_repository: Arc<dyn AwardRepository>,
    pub scoring_engine: Arc<ScoringEngine>,
}

impl AppState {
    /// Wires every repository to the same backing store so that cross-table
    /// operations (finishing a match, awarding a crown) stay atomic
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + MatchRepository
            + PredictionRepository
            + ChampionshipRepository
            + LeagueRepository
            + AwardRepository
            + 'static,
    {
        Self {
            user_repository: store.clone(),
            match_repository: store.clone(),
            prediction_repository: store.clone(),
            championship_repository: store.clone(),
            league_repository: store.clone(),
            award_repository: store,
            scoring_engine: Arc::new(ScoringEngine::default()),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryStore::new()))
    }

    pub fn with_scoring_engine(mut self, scoring_engine: Arc<ScoringEngine>) -> Self {
        self.scoring_engine = scoring_engine;
        self
    }
}

/// Lifecycle of season-long competitions (leagues and awards)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CompetitionStatus {
    Open,
    Finished,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Partial failure: {0}")]
    PartialFailure(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::PartialFailure(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Scoring was not applied: {}", msg),
            ),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::matches::MatchModel;
    use crate::users::UserModel;
    use chrono::{Duration, Utc};

    /// Creates a user directly in the store, bypassing the service layer
    pub async fn seed_user(store: &InMemoryStore, display_name: &str) -> UserModel {
        let user = UserModel::new(display_name.to_string());
        UserRepository::create_user(store, &user).await.unwrap();
        user
    }

    /// Creates a pending match whose deadline is `hours_until_deadline` from now
    pub async fn seed_match(
        store: &InMemoryStore,
        hours_until_deadline: i64,
        is_knockout: bool,
    ) -> MatchModel {
        let fixture = MatchModel::new(
            "Home FC".to_string(),
            "Away United".to_string(),
            Utc::now() + Duration::hours(hours_until_deadline),
            is_knockout,
        );
        MatchRepository::create_match(store, &fixture)
            .await
            .unwrap();
        fixture
    }
}
