use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::ScoreOutcome;

/// One prediction after scoring, ready to be folded into its owner's stats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredPrediction {
    pub prediction_id: Uuid,
    pub user_id: Uuid,
    pub outcome: ScoreOutcome,
}

/// Result of finishing a match, league or award
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishSummary {
    pub id: Uuid,
    pub predictions_processed: usize,
    pub users_updated: usize,
}

/// Cumulative counters re-derived from a user's scored predictions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTotals {
    pub points: i32,
    pub predictions: i32,
    pub correct: i32,
    pub current_streak: i32,
    pub best_streak: i32,
}
