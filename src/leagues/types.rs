use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateLeagueRequest {
    pub name: String,
    pub deadline: DateTime<Utc>,
}

/// Season picks; categories left out are simply not predicted
#[derive(Debug, Deserialize)]
pub struct SubmitLeaguePredictionRequest {
    #[serde(default)]
    pub champion: Option<String>,
    #[serde(default)]
    pub top_scorer: Option<String>,
    #[serde(default)]
    pub top_assist: Option<String>,
    #[serde(default)]
    pub mvp: Option<String>,
}
