use serde::Deserialize;

use crate::matches::TeamSide;

/// Request payload for finishing a match with its real result
#[derive(Debug, Deserialize)]
pub struct FinishMatchBody {
    pub result_home: i32,
    pub result_away: i32,
    pub advancing_team: Option<TeamSide>,
}
