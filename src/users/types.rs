use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::UserModel;

/// Request payload for registering a user
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardScope {
    #[default]
    Overall,
    Monthly,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub scope: Option<LeaderboardScope>,
    pub limit: Option<usize>,
}

/// One row of a leaderboard response
#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: Uuid,
    pub display_name: String,
    pub points: i32,
    pub level: i32,
    pub monthly_points: i32,
    pub current_streak: i32,
    pub monthly_championships: i32,
}

impl LeaderboardEntry {
    pub fn from_user(rank: usize, user: &UserModel) -> Self {
        Self {
            rank,
            user_id: user.id,
            display_name: user.display_name.clone(),
            points: user.points,
            level: user.level,
            monthly_points: user.monthly_points,
            current_streak: user.current_streak,
            monthly_championships: user.monthly_championships,
        }
    }
}
