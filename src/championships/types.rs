use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AwardChampionshipRequest {
    pub awarded_by: String,
    /// Leader shown to the admin when they confirmed; guards against a stale pick
    #[serde(default)]
    pub expected_winner: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RolloverRequest {
    #[serde(default = "default_awarded_by")]
    pub awarded_by: String,
}

fn default_awarded_by() -> String {
    "system".to_string()
}
