use async_trait::async_trait;
use std::cmp::Reverse;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::InMemoryStore;
use crate::shared::AppError;
use crate::stats::derive_totals;
use crate::users::{repository::UserRepository, StatsIncrement, UserModel};

fn not_found(user_id: Uuid) -> AppError {
    AppError::NotFound(format!("User {} not found", user_id))
}

#[async_trait]
impl UserRepository for InMemoryStore {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(display_name = %user.display_name, "Creating user in memory");

        let mut tables = self.tables()?;
        if tables.users.contains_key(&user.id) {
            warn!("User already exists in memory");
            return Err(AppError::Conflict(format!("User {} already exists", user.id)));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserModel>, AppError> {
        let user = self.tables()?.users.get(&user_id).cloned();
        debug!(found = user.is_some(), "Fetched user from memory");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn list_users_by_points(&self) -> Result<Vec<UserModel>, AppError> {
        let mut users: Vec<UserModel> = self.tables()?.users.values().cloned().collect();
        users.sort_by_key(|user| (Reverse(user.points), user.created_at, user.id));
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn list_users_by_monthly_points(&self) -> Result<Vec<UserModel>, AppError> {
        let mut users: Vec<UserModel> = self.tables()?.users.values().cloned().collect();
        users.sort_by_key(|user| (Reverse(user.monthly_points), user.created_at, user.id));
        Ok(users)
    }

    #[instrument(skip(self, increment))]
    async fn increment_user_stats(
        &self,
        user_id: Uuid,
        increment: &StatsIncrement,
    ) -> Result<UserModel, AppError> {
        let mut tables = self.tables()?;
        let user = tables.users.get_mut(&user_id).ok_or_else(|| not_found(user_id))?;

        user.apply_increment(increment)?;
        debug!(points = user.points, level = user.level, "User stats incremented in memory");
        Ok(user.clone())
    }

    #[instrument(skip(self))]
    async fn reconcile_user_stats(&self, user_id: Uuid) -> Result<UserModel, AppError> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&user_id) {
            return Err(not_found(user_id));
        }

        let match_history = tables.match_history(user_id);
        let other_outcomes: Vec<_> = tables
            .league_predictions
            .values()
            .filter(|prediction| prediction.user_id == user_id)
            .filter_map(|prediction| prediction.outcome())
            .chain(
                tables
                    .award_predictions
                    .values()
                    .filter(|prediction| prediction.user_id == user_id)
                    .filter_map(|prediction| prediction.outcome()),
            )
            .collect();
        let totals = derive_totals(&match_history, &other_outcomes);

        let user = tables.users.get_mut(&user_id).ok_or_else(|| not_found(user_id))?;
        user.apply_totals(&totals);
        debug!(?totals, "User stats reconciled in memory");
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::{repository::MatchRepository, FinishMatchRequest, MatchResult};
    use crate::predictions::{repository::PredictionRepository, PredictionUpsert};
    use crate::scoring::ScoringEngine;
    use crate::shared::test_utils::{seed_match, seed_user};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn duplicate_user_id_conflicts() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "ana").await;

        let again = store.create_user(&user).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn increment_on_unknown_user_is_not_found() {
        let store = InMemoryStore::new();
        let outcome = store
            .increment_user_stats(Uuid::new_v4(), &StatsIncrement::default())
            .await;
        assert!(matches!(outcome, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn inconsistent_increment_is_rejected() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "ana").await;

        let outcome = store
            .increment_user_stats(
                user.id,
                &StatsIncrement {
                    points: -5,
                    ..StatsIncrement::default()
                },
            )
            .await;

        assert!(matches!(outcome, Err(AppError::Validation(_))));
        assert_eq!(store.get_user(user.id).await.unwrap().unwrap(), user);
    }

    #[tokio::test]
    async fn equal_points_rank_the_older_account_first() {
        let store = InMemoryStore::new();
        let mut older = UserModel::new("older".to_string());
        older.created_at = Utc::now() - Duration::days(10);
        let newer = UserModel::new("newer".to_string());
        store.create_user(&newer).await.unwrap();
        store.create_user(&older).await.unwrap();

        let ranked = store.list_users_by_points().await.unwrap();
        assert_eq!(ranked[0].id, older.id);
        assert_eq!(ranked[1].id, newer.id);
    }

    #[tokio::test]
    async fn reconcile_rebuilds_drifted_counters() {
        let store = InMemoryStore::new();
        let engine = ScoringEngine::default();
        let ana = seed_user(&store, "ana").await;

        // Two finished matches, the most recent one missed
        let scores = [(1, 0, 1, 0), (0, 0, 2, 1)];
        for (offset, (ph, pa, rh, ra)) in scores.into_iter().enumerate() {
            let fixture = seed_match(&store, 1, false).await;
            store
                .upsert_prediction(
                    &PredictionUpsert {
                        match_id: fixture.id,
                        user_id: ana.id,
                        home_score: ph,
                        away_score: pa,
                        predicted_advancing_team: None,
                    },
                    Utc::now(),
                )
                .await
                .unwrap();
            store
                .finish_match(
                    &FinishMatchRequest {
                        match_id: fixture.id,
                        result: MatchResult {
                            home: rh,
                            away: ra,
                            advancing_team: None,
                        },
                        finished_at: Utc::now() + Duration::minutes(offset as i64),
                    },
                    &engine,
                )
                .await
                .unwrap();
        }

        // Simulate drift from a double-applied increment
        store
            .increment_user_stats(
                ana.id,
                &StatsIncrement {
                    points: 5,
                    predictions: 1,
                    correct: 1,
                    ..StatsIncrement::default()
                },
            )
            .await
            .unwrap();

        let reconciled = store.reconcile_user_stats(ana.id).await.unwrap();
        assert_eq!(reconciled.points, 5);
        assert_eq!(reconciled.predictions, 2);
        assert_eq!(reconciled.correct, 1);
        assert_eq!(reconciled.current_streak, 0);
        assert_eq!(reconciled.best_streak, 1);
        assert_eq!(reconciled.level, 1);
        // Monthly counters are not part of reconciliation
        assert_eq!(reconciled.monthly_points, 5);
    }
}
