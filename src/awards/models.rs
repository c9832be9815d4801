use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::ScoreOutcome;
use crate::shared::CompetitionStatus;

/// Database model for awards table: an individual prize such as a golden boot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardModel {
    pub id: Uuid,
    pub name: String,
    pub deadline: DateTime<Utc>,
    pub status: CompetitionStatus,
    pub winner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl AwardModel {
    pub fn new(name: String, deadline: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            deadline,
            status: CompetitionStatus::Open,
            winner: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == CompetitionStatus::Finished
    }

    pub fn accepts_predictions_at(&self, now: DateTime<Utc>) -> bool {
        self.status == CompetitionStatus::Open && now <= self.deadline
    }

    pub fn finish(&mut self, winner: &str, finished_at: DateTime<Utc>) {
        self.status = CompetitionStatus::Finished;
        self.winner = Some(winner.to_string());
        self.finished_at = Some(finished_at);
    }
}

/// Database model for award_predictions table, unique on (award_id, user_id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardPredictionModel {
    pub id: Uuid,
    pub award_id: Uuid,
    pub user_id: Uuid,
    pub predicted_winner: String,
    pub points: Option<i32>,
    pub correct: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AwardPredictionModel {
    pub fn outcome(&self) -> Option<ScoreOutcome> {
        match (self.points, self.correct) {
            (Some(points), Some(correct)) => Some(ScoreOutcome::new(points, correct)),
            _ => None,
        }
    }

    pub fn record_outcome(&mut self, outcome: ScoreOutcome) {
        self.points = Some(outcome.points);
        self.correct = Some(outcome.correct);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardPredictionUpsert {
    pub award_id: Uuid,
    pub user_id: Uuid,
    pub predicted_winner: String,
}

impl AwardPredictionUpsert {
    pub fn into_model(self, now: DateTime<Utc>) -> AwardPredictionModel {
        AwardPredictionModel {
            id: Uuid::new_v4(),
            award_id: self.award_id,
            user_id: self.user_id,
            predicted_winner: self.predicted_winner,
            points: None,
            correct: None,
            created_at: now,
            updated_at: now,
        }
    }
}
