use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::warn;
use uuid::Uuid;

use crate::awards::{AwardModel, AwardPredictionModel};
use crate::championships::MonthlyChampionshipRecord;
use crate::leagues::{LeagueModel, LeaguePredictionModel};
use crate::matches::MatchModel;
use crate::predictions::PredictionModel;
use crate::scoring::ScoreOutcome;
use crate::shared::AppError;
use crate::stats::{current_streak, fold_increments, ScoredPrediction};
use crate::users::UserModel;

mod championships;
mod competitions;
mod matches;
mod users;

/// Every table of the in-memory store, guarded together so that a
/// multi-table operation is applied under one lock
#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, UserModel>,
    matches: HashMap<Uuid, MatchModel>,
    predictions: HashMap<(Uuid, Uuid), PredictionModel>, // (match_id, user_id)
    championships: BTreeMap<String, MonthlyChampionshipRecord>,
    monthly_resets: BTreeMap<String, DateTime<Utc>>,
    leagues: HashMap<Uuid, LeagueModel>,
    league_predictions: HashMap<(Uuid, Uuid), LeaguePredictionModel>,
    awards: HashMap<Uuid, AwardModel>,
    award_predictions: HashMap<(Uuid, Uuid), AwardPredictionModel>,
}

impl Tables {
    /// Scored match predictions of a user, most recently finished match first
    fn match_history(&self, user_id: Uuid) -> Vec<ScoreOutcome> {
        let mut history: Vec<(DateTime<Utc>, Uuid, ScoreOutcome)> = self
            .predictions
            .values()
            .filter(|prediction| prediction.user_id == user_id)
            .filter_map(|prediction| {
                let fixture = self.matches.get(&prediction.match_id)?;
                let finished_at = fixture.finished_at.filter(|_| fixture.is_finished())?;
                Some((finished_at, fixture.id, prediction.outcome()?))
            })
            .collect();

        history.sort_by_key(|(finished_at, match_id, _)| Reverse((*finished_at, *match_id)));
        history.into_iter().map(|(_, _, outcome)| outcome).collect()
    }

    /// Applies each owner's folded increment to a copy of that user only.
    ///
    /// Any user that cannot be credited fails the whole call before anything
    /// is written, so callers commit nothing of the failed unit.
    fn stage_credits(&self, scored: &[ScoredPrediction]) -> Result<Vec<UserModel>, AppError> {
        fold_increments(scored)
            .into_iter()
            .map(|(user_id, increment)| -> Result<UserModel, AppError> {
                let mut user = self.users.get(&user_id).cloned().ok_or_else(|| {
                    warn!(user_id = %user_id, "Predicting user missing, discarding unit");
                    AppError::PartialFailure(format!("User {} could not be updated", user_id))
                })?;
                user.apply_increment(&increment).map_err(|e| {
                    warn!(user_id = %user_id, error = %e, "User increment rejected, discarding unit");
                    AppError::PartialFailure(format!(
                        "User {} could not be updated: {}",
                        user_id, e
                    ))
                })?;
                Ok(user)
            })
            .collect()
    }

    /// Writes staged users back. Streaks are recomputed from match history,
    /// so the finished match and its scored predictions must already be stored.
    fn commit_credits(&mut self, credited: Vec<UserModel>, refresh_streaks: bool) -> usize {
        let users_updated = credited.len();

        for user in credited {
            let user_id = user.id;
            self.users.insert(user_id, user);

            if refresh_streaks {
                let streak = current_streak(self.match_history(user_id).iter().map(|o| o.correct));
                if let Some(user) = self.users.get_mut(&user_id) {
                    user.record_streak(streak);
                }
            }
        }

        users_updated
    }
}

/// In-memory implementation of every repository for development and testing
///
/// All tables sit behind one mutex, which serialises operations the way row
/// locks do in PostgreSQL. Data is lost when the application restarts.
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Returns the current number of users in the store
    pub fn user_count(&self) -> usize {
        self.tables().map(|tables| tables.users.len()).unwrap_or(0)
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables.lock().map_err(|_| {
            warn!("In-memory store lock poisoned");
            AppError::Internal
        })
    }
}

#[cfg(test)]
impl InMemoryStore {
    pub(crate) fn get_match_for_tests(&self, match_id: Uuid) -> MatchModel {
        self.tables.lock().unwrap().matches[&match_id].clone()
    }

    /// Inserts a prediction without checking that its user exists
    pub(crate) fn insert_orphan_prediction_for_tests(
        &self,
        match_id: Uuid,
        user_id: Uuid,
        home_score: i32,
        away_score: i32,
    ) {
        let prediction = crate::predictions::PredictionUpsert {
            match_id,
            user_id,
            home_score,
            away_score,
            predicted_advancing_team: None,
        }
        .into_model(Utc::now());
        self.tables
            .lock()
            .unwrap()
            .predictions
            .insert((match_id, user_id), prediction);
    }
}
