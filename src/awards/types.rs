use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateAwardRequest {
    pub name: String,
    pub deadline: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAwardPredictionRequest {
    pub predicted_winner: String,
}

#[derive(Debug, Deserialize)]
pub struct FinishAwardRequest {
    pub winner: String,
}
