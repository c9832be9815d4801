use std::sync::Arc;

use super::{
    calculators::{KnockoutAdvanceCalculator, MatchResultCalculator},
    PointCalculator, ScoreOutcome, ScoringContext,
};
use crate::matches::{MatchModel, MatchResult};
use crate::predictions::PredictionModel;

/// Scores one prediction of a match that is being finished.
///
/// Stores call this from inside their atomic finish so that predictions are
/// read and scored under the same lock that flips the match to finished.
pub trait PredictionScorer: Send + Sync {
    fn score_prediction(
        &self,
        prediction: &PredictionModel,
        fixture: &MatchModel,
        result: &MatchResult,
    ) -> ScoreOutcome;
}

pub struct ScoringEngine {
    calculators: Vec<Arc<dyn PointCalculator>>,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ScoringEngine {
    pub fn builder() -> ScoringEngineBuilder {
        ScoringEngineBuilder::new()
    }

    pub fn calculators(&self) -> Vec<Arc<dyn PointCalculator>> {
        self.calculators.clone()
    }
}

impl PredictionScorer for ScoringEngine {
    fn score_prediction(
        &self,
        prediction: &PredictionModel,
        fixture: &MatchModel,
        result: &MatchResult,
    ) -> ScoreOutcome {
        let total = self
            .calculators
            .iter()
            .fold(ScoreOutcome::MISS, |current, calculator| {
                let context = ScoringContext::new(fixture, current);
                calculator.calculate(prediction, result, &context)
            });

        // A prediction is correct exactly when it scored anything
        ScoreOutcome::from_points(total.points)
    }
}

pub struct ScoringEngineBuilder {
    calculators: Vec<Arc<dyn PointCalculator>>,
}

impl ScoringEngineBuilder {
    fn new() -> Self {
        Self {
            calculators: vec![
                Arc::new(MatchResultCalculator::new()),
                Arc::new(KnockoutAdvanceCalculator::new()),
            ],
        }
    }

    pub fn with_calculator(mut self, calculator: Arc<dyn PointCalculator>) -> Self {
        self.calculators.push(calculator);
        self
    }

    pub fn build(mut self) -> ScoringEngine {
        self.calculators.sort_by_key(|c| c.priority());
        ScoringEngine {
            calculators: self.calculators,
        }
    }
}
