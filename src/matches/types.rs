use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Request payload for scheduling a match
#[derive(Debug, Deserialize)]
pub struct CreateMatchRequest {
    pub home_team: String,
    pub away_team: String,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub is_knockout: bool,
}
