pub mod bonus;
pub mod calculators;
mod engine;
pub mod models;

pub use bonus::{names_match, score_award_prediction, score_league_prediction};
pub use engine::{PredictionScorer, ScoringEngine, ScoringEngineBuilder};
pub use models::{Outcome, ScoreOutcome};

use crate::matches::{MatchModel, MatchResult};
use crate::predictions::PredictionModel;

/// Fixed point values of every scoring rule
pub mod points {
    /// Predicted score equals the real score
    pub const EXACT_RESULT: i32 = 5;
    /// Right winner (or draw) with the wrong score
    pub const CORRECT_OUTCOME: i32 = 3;
    /// Knockout match where the predicted advancing team went through
    pub const KNOCKOUT_ADVANCE_BONUS: i32 = 2;
    /// Each of champion, top scorer, top assist and MVP of a league
    pub const LEAGUE_CATEGORY: i32 = 5;
    /// Correct winner of an individual award
    pub const AWARD_WINNER: i32 = 10;
    pub const POINTS_PER_LEVEL: i32 = 20;
}

/// Priority constants for point calculators.
/// Lower values run first. Calculators with higher priority
/// see the outcome produced by lower-priority calculators.
pub mod calculator_priority {
    /// Base match result points (exact / outcome / miss)
    pub const BASE_SCORE: u32 = 100;
    /// Bonuses layered on top of the base score
    pub const BONUS: u32 = 200;
}

pub trait PointCalculator: Send + Sync {
    fn calculate(
        &self,
        prediction: &PredictionModel,
        result: &MatchResult,
        context: &ScoringContext,
    ) -> ScoreOutcome;

    fn priority(&self) -> u32;
}

pub struct ScoringContext<'a> {
    pub fixture: &'a MatchModel,
    pub current: ScoreOutcome,
}

impl<'a> ScoringContext<'a> {
    pub fn new(fixture: &'a MatchModel, current: ScoreOutcome) -> Self {
        Self { fixture, current }
    }
}

/// Scores a guessed result against the real one.
///
/// Exact score earns 5, the right direction (home win, draw, away win) with a
/// different score earns 3, anything else earns nothing.
pub fn score(pred_home: i32, pred_away: i32, result_home: i32, result_away: i32) -> ScoreOutcome {
    if pred_home == result_home && pred_away == result_away {
        return ScoreOutcome::new(points::EXACT_RESULT, true);
    }

    if Outcome::from_scores(pred_home, pred_away) == Outcome::from_scores(result_home, result_away)
    {
        return ScoreOutcome::new(points::CORRECT_OUTCOME, true);
    }

    ScoreOutcome::MISS
}

/// Every 20 points advances one level, starting at level 1
pub fn level_for_points(points: i32) -> i32 {
    points.max(0) / points::POINTS_PER_LEVEL + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case((2, 1), (2, 1), 5, true)] // exact
    #[case((2, 1), (3, 2), 3, true)] // both home wins
    #[case((2, 1), (1, 2), 0, false)] // opposite outcome
    #[case((1, 1), (2, 2), 3, true)] // both draws
    #[case((0, 0), (0, 0), 5, true)]
    #[case((0, 2), (1, 4), 3, true)] // both away wins
    #[case((1, 1), (2, 1), 0, false)] // draw vs home win
    #[case((3, 0), (0, 0), 0, false)]
    fn scores_prediction_against_result(
        #[case] prediction: (i32, i32),
        #[case] result: (i32, i32),
        #[case] expected_points: i32,
        #[case] expected_correct: bool,
    ) {
        let outcome = score(prediction.0, prediction.1, result.0, result.1);
        assert_eq!(outcome.points, expected_points);
        assert_eq!(outcome.correct, expected_correct);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(19, 1)]
    #[case(20, 2)]
    #[case(39, 2)]
    #[case(40, 3)]
    #[case(205, 11)]
    fn derives_level_from_points(#[case] points: i32, #[case] expected_level: i32) {
        assert_eq!(level_for_points(points), expected_level);
    }

    #[test]
    fn level_never_drops_below_one() {
        assert_eq!(level_for_points(-7), 1);
    }
}
