use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::ops::AddAssign;
use uuid::Uuid;

use crate::scoring::{level_for_points, ScoreOutcome};
use crate::shared::AppError;
use crate::stats::UserTotals;

/// Database model for users table
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserModel {
    pub id: Uuid,
    pub display_name: String,
    pub points: i32,
    pub predictions: i32,
    pub correct: i32,
    pub current_streak: i32,
    pub best_streak: i32,
    pub level: i32, // always level_for_points(points)
    pub monthly_points: i32,
    pub monthly_predictions: i32,
    pub monthly_correct: i32,
    pub monthly_championships: i32,
    pub created_at: DateTime<Utc>,
}

impl UserModel {
    /// Creates a new user with zeroed stats at level 1
    pub fn new(display_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name,
            points: 0,
            predictions: 0,
            correct: 0,
            current_streak: 0,
            best_streak: 0,
            level: level_for_points(0),
            monthly_points: 0,
            monthly_predictions: 0,
            monthly_correct: 0,
            monthly_championships: 0,
            created_at: Utc::now(),
        }
    }

    /// Applies all six counter deltas or none of them
    pub fn apply_increment(&mut self, increment: &StatsIncrement) -> Result<(), AppError> {
        let overflow = || AppError::Validation("Stats increment overflows".to_string());

        let mut next = self.clone();
        next.points = self.points.checked_add(increment.points).ok_or_else(overflow)?;
        next.predictions = self
            .predictions
            .checked_add(increment.predictions)
            .ok_or_else(overflow)?;
        next.correct = self.correct.checked_add(increment.correct).ok_or_else(overflow)?;
        next.monthly_points = self
            .monthly_points
            .checked_add(increment.monthly_points)
            .ok_or_else(overflow)?;
        next.monthly_predictions = self
            .monthly_predictions
            .checked_add(increment.monthly_predictions)
            .ok_or_else(overflow)?;
        next.monthly_correct = self
            .monthly_correct
            .checked_add(increment.monthly_correct)
            .ok_or_else(overflow)?;
        next.level = level_for_points(next.points);

        if !next.is_consistent() {
            return Err(AppError::Validation(format!(
                "Stats increment would leave user {} inconsistent",
                self.id
            )));
        }

        *self = next;
        Ok(())
    }

    /// Stores a freshly computed current streak, raising the best streak if needed
    pub fn record_streak(&mut self, current_streak: i32) {
        self.current_streak = current_streak;
        self.best_streak = self.best_streak.max(current_streak);
    }

    /// Overwrites the cumulative counters with values derived from scored predictions
    pub fn apply_totals(&mut self, totals: &UserTotals) {
        self.points = totals.points;
        self.predictions = totals.predictions;
        self.correct = totals.correct;
        self.current_streak = totals.current_streak;
        self.best_streak = totals.best_streak;
        self.level = level_for_points(totals.points);
    }

    pub fn reset_monthly(&mut self) {
        self.monthly_points = 0;
        self.monthly_predictions = 0;
        self.monthly_correct = 0;
    }

    /// Checks the counter invariants every stored user must satisfy
    pub fn is_consistent(&self) -> bool {
        self.points >= 0
            && self.monthly_points >= 0
            && self.correct >= 0
            && self.monthly_correct >= 0
            && self.correct <= self.predictions
            && self.monthly_correct <= self.monthly_predictions
            && self.level == level_for_points(self.points)
    }
}

/// Deltas for the six counters that are updated together
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsIncrement {
    pub points: i32,
    pub predictions: i32,
    pub correct: i32,
    pub monthly_points: i32,
    pub monthly_predictions: i32,
    pub monthly_correct: i32,
}

impl StatsIncrement {
    /// Credits one scored prediction to both the lifetime and monthly counters
    pub fn for_outcome(outcome: ScoreOutcome) -> Self {
        let correct = i32::from(outcome.correct);
        Self {
            points: outcome.points,
            predictions: 1,
            correct,
            monthly_points: outcome.points,
            monthly_predictions: 1,
            monthly_correct: correct,
        }
    }
}

impl AddAssign for StatsIncrement {
    fn add_assign(&mut self, other: Self) {
        self.points += other.points;
        self.predictions += other.predictions;
        self.correct += other.correct;
        self.monthly_points += other.monthly_points;
        self.monthly_predictions += other.monthly_predictions;
        self.monthly_correct += other.monthly_correct;
    }
}
