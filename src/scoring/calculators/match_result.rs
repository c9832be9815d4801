use super::super::{score, PointCalculator, ScoreOutcome, ScoringContext};
use crate::matches::MatchResult;
use crate::predictions::PredictionModel;

pub struct MatchResultCalculator;

impl Default for MatchResultCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchResultCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl PointCalculator for MatchResultCalculator {
    fn calculate(
        &self,
        prediction: &PredictionModel,
        result: &MatchResult,
        context: &ScoringContext,
    ) -> ScoreOutcome {
        let base = score(
            prediction.home_score,
            prediction.away_score,
            result.home,
            result.away,
        );

        ScoreOutcome::new(
            context.current.points + base.points,
            context.current.correct || base.correct,
        )
    }

    fn priority(&self) -> u32 {
        crate::scoring::calculator_priority::BASE_SCORE
    }
}
