use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Points awarded for one prediction and whether it counts as correct
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub points: i32,
    pub correct: bool,
}

impl ScoreOutcome {
    pub const MISS: Self = Self {
        points: 0,
        correct: false,
    };

    pub fn new(points: i32, correct: bool) -> Self {
        Self { points, correct }
    }

    /// Builds an outcome where correctness follows from scoring anything at all
    pub fn from_points(points: i32) -> Self {
        Self {
            points,
            correct: points > 0,
        }
    }

    /// Adds a layered bonus on top of the points earned so far
    pub fn with_bonus(self, bonus: i32) -> Self {
        Self::from_points(self.points + bonus)
    }
}

/// Direction of a result: the sign of the goal difference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl Outcome {
    pub fn from_scores(home: i32, away: i32) -> Self {
        match home.cmp(&away) {
            Ordering::Greater => Outcome::HomeWin,
            Ordering::Equal => Outcome::Draw,
            Ordering::Less => Outcome::AwayWin,
        }
    }
}
