use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::ScoreOutcome;
use crate::shared::{AppError, CompetitionStatus};

/// Database model for leagues table: a season-long competition users pick outcomes for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueModel {
    pub id: Uuid,
    pub name: String,
    pub deadline: DateTime<Utc>,
    pub status: CompetitionStatus,
    pub champion: Option<String>,
    pub top_scorer: Option<String>,
    pub top_assist: Option<String>,
    pub mvp: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl LeagueModel {
    pub fn new(name: String, deadline: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            deadline,
            status: CompetitionStatus::Open,
            champion: None,
            top_scorer: None,
            top_assist: None,
            mvp: None,
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

    pub fn finish(&mut self, result: &LeagueResult, finished_at: DateTime<Utc>) {
        self.status = CompetitionStatus::Finished;
        self.champion = Some(result.champion.clone());
        self.top_scorer = Some(result.top_scorer.clone());
        self.top_assist = Some(result.top_assist.clone());
        self.mvp = Some(result.mvp.clone());
        self.finished_at = Some(finished_at);
    }
}

/// The real season outcome, one name per category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueResult {
    pub champion: String,
    pub top_scorer: String,
    pub top_assist: String,
    pub mvp: String,
}

impl LeagueResult {
    pub fn validate(&self) -> Result<(), AppError> {
        let categories = [
            ("champion", &self.champion),
            ("top_scorer", &self.top_scorer),
            ("top_assist", &self.top_assist),
            ("mvp", &self.mvp),
        ];
        match categories.iter().find(|(_, name)| name.trim().is_empty()) {
            Some((category, _)) => Err(AppError::Validation(format!(
                "League result is missing {}",
                category
            ))),
            None => Ok(()),
        }
    }
}

/// Database model for league_predictions table, unique on (league_id, user_id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaguePredictionModel {
    pub id: Uuid,
    pub league_id: Uuid,
    pub user_id: Uuid,
    pub champion: Option<String>,
    pub top_scorer: Option<String>,
    pub top_assist: Option<String>,
    pub mvp: Option<String>,
    pub points: Option<i32>,
    pub correct: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeaguePredictionModel {
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

    pub fn overwrite_with(&mut self, upsert: &LeaguePredictionUpsert, now: DateTime<Utc>) {
        self.champion = upsert.champion.clone();
        self.top_scorer = upsert.top_scorer.clone();
        self.top_assist = upsert.top_assist.clone();
        self.mvp = upsert.mvp.clone();
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaguePredictionUpsert {
    pub league_id: Uuid,
    pub user_id: Uuid,
    pub champion: Option<String>,
    pub top_scorer: Option<String>,
    pub top_assist: Option<String>,
    pub mvp: Option<String>,
}

impl LeaguePredictionUpsert {
    pub fn is_empty(&self) -> bool {
        [&self.champion, &self.top_scorer, &self.top_assist, &self.mvp]
            .iter()
            .all(|pick| pick.as_deref().map_or(true, |name| name.trim().is_empty()))
    }

    pub fn into_model(self, now: DateTime<Utc>) -> LeaguePredictionModel {
        LeaguePredictionModel {
            id: Uuid::new_v4(),
            league_id: self.league_id,
            user_id: self.user_id,
            champion: self.champion,
            top_scorer: self.top_scorer,
            top_assist: self.top_assist,
            mvp: self.mvp,
            points: None,
            correct: None,
            created_at: now,
            updated_at: now,
        }
    }
}
