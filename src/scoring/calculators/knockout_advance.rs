use super::super::{PointCalculator, ScoreOutcome, ScoringContext};
use crate::matches::MatchResult;
use crate::predictions::PredictionModel;

/// Adds the advance bonus in knockout matches on top of the result points
pub struct KnockoutAdvanceCalculator;

impl KnockoutAdvanceCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl PointCalculator for KnockoutAdvanceCalculator {
    fn calculate(
        &self,
        prediction: &PredictionModel,
        result: &MatchResult,
        context: &ScoringContext,
    ) -> ScoreOutcome {
        if !context.fixture.is_knockout {
            return context.current;
        }

        let advanced = matches!(
            (prediction.predicted_advancing_team, result.advancing_team),
            (Some(predicted), Some(actual)) if predicted == actual
        );

        if advanced {
            context
                .current
                .with_bonus(crate::scoring::points::KNOCKOUT_ADVANCE_BONUS)
        } else {
            context.current
        }
    }

    fn priority(&self) -> u32 {
        crate::scoring::calculator_priority::BONUS
    }
}
