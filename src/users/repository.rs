use async_trait::async_trait;
use uuid::Uuid;

use super::models::{StatsIncrement, UserModel};
use crate::shared::AppError;

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserModel>, AppError>;

    /// Highest cumulative points first; ties by earliest account, then id
    async fn list_users_by_points(&self) -> Result<Vec<UserModel>, AppError>;

    /// Highest monthly points first; ties by earliest account, then id
    async fn list_users_by_monthly_points(&self) -> Result<Vec<UserModel>, AppError>;

    /// Atomically adds the deltas to the user's counters and recomputes the level.
    /// Fails without writing if the result would break the user invariants.
    async fn increment_user_stats(
        &self,
        user_id: Uuid,
        increment: &StatsIncrement,
    ) -> Result<UserModel, AppError>;

    /// Re-derives the cumulative counters and streaks from already scored
    /// predictions and overwrites them. Monthly counters are left alone.
    async fn reconcile_user_stats(&self, user_id: Uuid) -> Result<UserModel, AppError>;
}
