use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    models::{StatsIncrement, UserModel},
    repository::UserRepository,
    types::{LeaderboardEntry, LeaderboardScope},
};
use crate::shared::AppError;

const MAX_DISPLAY_NAME_LEN: usize = 50;
const DEFAULT_LEADERBOARD_LIMIT: usize = 50;

/// Service for user registration, lookups and leaderboards
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn register_user(&self, display_name: &str) -> Result<UserModel, AppError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AppError::Validation(
                "Display name must not be empty".to_string(),
            ));
        }
        if display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err(AppError::Validation(format!(
                "Display name must be at most {} characters",
                MAX_DISPLAY_NAME_LEN
            )));
        }

        let user = UserModel::new(display_name.to_string());
        self.repository.create_user(&user).await?;

        info!(user_id = %user.id, display_name = %user.display_name, "User registered");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserModel, AppError> {
        self.repository
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    #[instrument(skip(self))]
    pub async fn leaderboard(
        &self,
        scope: LeaderboardScope,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, AppError> {
        let users = match scope {
            LeaderboardScope::Overall => self.repository.list_users_by_points().await?,
            LeaderboardScope::Monthly => self.repository.list_users_by_monthly_points().await?,
        };

        let entries: Vec<LeaderboardEntry> = users
            .iter()
            .take(limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT))
            .enumerate()
            .map(|(index, user)| LeaderboardEntry::from_user(index + 1, user))
            .collect();

        debug!(?scope, entries = entries.len(), "Leaderboard built");
        Ok(entries)
    }

    #[instrument(skip(self, increment))]
    pub async fn adjust_stats(
        &self,
        user_id: Uuid,
        increment: &StatsIncrement,
    ) -> Result<UserModel, AppError> {
        let user = self
            .repository
            .increment_user_stats(user_id, increment)
            .await?;
        info!(user_id = %user_id, points = user.points, "User stats adjusted");
        Ok(user)
    }

    /// Rebuilds a user's cumulative stats from their scored predictions
    #[instrument(skip(self))]
    pub async fn reconcile(&self, user_id: Uuid) -> Result<UserModel, AppError> {
        let user = self.repository.reconcile_user_stats(user_id).await?;
        info!(
            user_id = %user_id,
            points = user.points,
            predictions = user.predictions,
            current_streak = user.current_streak,
            "User stats reconciled"
        );
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn service() -> (Arc<InMemoryStore>, UserService) {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), UserService::new(store))
    }

    #[tokio::test]
    async fn registers_user_with_trimmed_name() {
        let (_store, service) = service();

        let user = service.register_user("  Valentina  ").await.unwrap();
        assert_eq!(user.display_name, "Valentina");

        let fetched = service.get_user(user.id).await.unwrap();
        assert_eq!(fetched, user);
    }

    #[tokio::test]
    async fn rejects_blank_and_long_names() {
        let (_store, service) = service();

        assert!(matches!(
            service.register_user("   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.register_user(&"x".repeat(51)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (_store, service) = service();
        assert!(matches!(
            service.get_user(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn leaderboard_ranks_by_scope() {
        let (_store, service) = service();
        let ana = service.register_user("ana").await.unwrap();
        let beto = service.register_user("beto").await.unwrap();

        service
            .adjust_stats(
                ana.id,
                &StatsIncrement {
                    points: 30,
                    predictions: 6,
                    correct: 6,
                    ..StatsIncrement::default()
                },
            )
            .await
            .unwrap();
        service
            .adjust_stats(
                beto.id,
                &StatsIncrement {
                    points: 10,
                    predictions: 2,
                    correct: 2,
                    monthly_points: 10,
                    monthly_predictions: 2,
                    monthly_correct: 2,
                },
            )
            .await
            .unwrap();

        let overall = service
            .leaderboard(LeaderboardScope::Overall, None)
            .await
            .unwrap();
        assert_eq!(overall[0].user_id, ana.id);
        assert_eq!(overall[0].rank, 1);
        assert_eq!(overall[0].level, 2);

        let monthly = service
            .leaderboard(LeaderboardScope::Monthly, Some(1))
            .await
            .unwrap();
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].user_id, beto.id);
    }
}
