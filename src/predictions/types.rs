use serde::Deserialize;

use crate::matches::TeamSide;

/// Request payload for submitting (or replacing) a prediction
#[derive(Debug, Deserialize)]
pub struct SubmitPredictionRequest {
    pub home_score: i32,
    pub away_score: i32,
    pub predicted_advancing_team: Option<TeamSide>,
}
