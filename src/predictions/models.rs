use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matches::TeamSide;
use crate::scoring::ScoreOutcome;

/// Database model for predictions table, unique on (match_id, user_id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionModel {
    pub id: Uuid,
    pub match_id: Uuid,
    pub user_id: Uuid,
    pub home_score: i32,
    pub away_score: i32,
    pub predicted_advancing_team: Option<TeamSide>,
    pub points: Option<i32>,    // set when the match finishes
    pub correct: Option<bool>,  // set when the match finishes
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PredictionModel {
    pub fn outcome(&self) -> Option<ScoreOutcome> {
        match (self.points, self.correct) {
            (Some(points), Some(correct)) => Some(ScoreOutcome::new(points, correct)),
            _ => None,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn record_outcome(&mut self, outcome: ScoreOutcome) {
        self.points = Some(outcome.points);
        self.correct = Some(outcome.correct);
    }

    /// Overwrites the guess in place, keeping identity and creation time
    pub fn overwrite_with(&mut self, upsert: &PredictionUpsert, now: DateTime<Utc>) {
        self.home_score = upsert.home_score;
        self.away_score = upsert.away_score;
        self.predicted_advancing_team = upsert.predicted_advancing_team;
        self.updated_at = now;
    }
}

/// A user's submitted guess, stored with last-write-wins semantics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionUpsert {
    pub match_id: Uuid,
    pub user_id: Uuid,
    pub home_score: i32,
    pub away_score: i32,
    pub predicted_advancing_team: Option<TeamSide>,
}

impl PredictionUpsert {
    pub fn into_model(self, now: DateTime<Utc>) -> PredictionModel {
        PredictionModel {
            id: Uuid::new_v4(),
            match_id: self.match_id,
            user_id: self.user_id,
            home_score: self.home_score,
            away_score: self.away_score,
            predicted_advancing_team: self.predicted_advancing_team,
            points: None,
            correct: None,
            created_at: now,
            updated_at: now,
        }
    }
}
