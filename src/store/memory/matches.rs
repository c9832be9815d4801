use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::InMemoryStore;
use crate::matches::{
    repository::MatchRepository, FinishMatchRequest, MatchModel, MatchStatus,
};
use crate::predictions::{repository::PredictionRepository, PredictionModel, PredictionUpsert};
use crate::scoring::PredictionScorer;
use crate::shared::AppError;
use crate::stats::{FinishSummary, ScoredPrediction};

fn match_not_found(match_id: Uuid) -> AppError {
    AppError::NotFound(format!("Match {} not found", match_id))
}

#[async_trait]
impl MatchRepository for InMemoryStore {
    #[instrument(skip(self, fixture), fields(match_id = %fixture.id))]
    async fn create_match(&self, fixture: &MatchModel) -> Result<(), AppError> {
        let mut tables = self.tables()?;
        if tables.matches.contains_key(&fixture.id) {
            return Err(AppError::Conflict(format!(
                "Match {} already exists",
                fixture.id
            )));
        }
        tables.matches.insert(fixture.id, fixture.clone());
        debug!("Match created in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_match(&self, match_id: Uuid) -> Result<Option<MatchModel>, AppError> {
        Ok(self.tables()?.matches.get(&match_id).cloned())
    }

    #[instrument(skip(self))]
    async fn start_match(&self, match_id: Uuid) -> Result<MatchModel, AppError> {
        let mut tables = self.tables()?;
        let fixture = tables
            .matches
            .get_mut(&match_id)
            .ok_or_else(|| match_not_found(match_id))?;

        if fixture.status != MatchStatus::Pending {
            warn!(status = %fixture.status, "Only pending matches can start");
            return Err(AppError::Conflict(format!(
                "Match {} is already {}",
                match_id, fixture.status
            )));
        }
        fixture.status = MatchStatus::Live;
        Ok(fixture.clone())
    }

    #[instrument(skip(self, request, scorer), fields(match_id = %request.match_id))]
    async fn finish_match(
        &self,
        request: &FinishMatchRequest,
        scorer: &dyn PredictionScorer,
    ) -> Result<FinishSummary, AppError> {
        let mut tables = self.tables()?;

        let mut fixture = tables
            .matches
            .get(&request.match_id)
            .cloned()
            .ok_or_else(|| match_not_found(request.match_id))?;
        if fixture.is_finished() {
            return Err(AppError::Conflict(format!(
                "Match {} is already finished",
                request.match_id
            )));
        }

        fixture.finish(&request.result, request.finished_at);

        let scored: Vec<ScoredPrediction> = tables
            .predictions
            .values()
            .filter(|prediction| prediction.match_id == fixture.id)
            .map(|prediction| ScoredPrediction {
                prediction_id: prediction.id,
                user_id: prediction.user_id,
                outcome: scorer.score_prediction(prediction, &fixture, &request.result),
            })
            .collect();
        let credited = tables.stage_credits(&scored)?;

        // Nothing below can fail, so the unit is applied whole
        let match_id = fixture.id;
        tables.matches.insert(match_id, fixture);
        for entry in &scored {
            if let Some(prediction) = tables.predictions.get_mut(&(match_id, entry.user_id)) {
                prediction.record_outcome(entry.outcome);
            }
        }
        let users_updated = tables.commit_credits(credited, true);

        info!(
            predictions_processed = scored.len(),
            users_updated, "Match finished in memory"
        );
        Ok(FinishSummary {
            id: match_id,
            predictions_processed: scored.len(),
            users_updated,
        })
    }
}

#[async_trait]
impl PredictionRepository for InMemoryStore {
    #[instrument(skip(self))]
    async fn get_prediction(
        &self,
        match_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PredictionModel>, AppError> {
        Ok(self
            .tables()?
            .predictions
            .get(&(match_id, user_id))
            .cloned())
    }

    #[instrument(skip(self, upsert), fields(match_id = %upsert.match_id, user_id = %upsert.user_id))]
    async fn upsert_prediction(
        &self,
        upsert: &PredictionUpsert,
        now: DateTime<Utc>,
    ) -> Result<PredictionModel, AppError> {
        let mut tables = self.tables()?;

        let fixture = tables
            .matches
            .get(&upsert.match_id)
            .ok_or_else(|| match_not_found(upsert.match_id))?;
        if !fixture.accepts_predictions_at(now) {
            return Err(AppError::Validation(format!(
                "Predictions for match {} are closed",
                upsert.match_id
            )));
        }

        let prediction = tables
            .predictions
            .entry((upsert.match_id, upsert.user_id))
            .and_modify(|existing| existing.overwrite_with(upsert, now))
            .or_insert_with(|| upsert.clone().into_model(now));

        debug!(prediction_id = %prediction.id, "Prediction upserted in memory");
        Ok(prediction.clone())
    }

    #[instrument(skip(self))]
    async fn list_predictions(&self, match_id: Uuid) -> Result<Vec<PredictionModel>, AppError> {
        let mut predictions: Vec<PredictionModel> = self
            .tables()?
            .predictions
            .values()
            .filter(|prediction| prediction.match_id == match_id)
            .cloned()
            .collect();
        predictions.sort_by_key(|prediction| (prediction.created_at, prediction.id));
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::MatchResult;
    use crate::scoring::ScoringEngine;
    use crate::shared::test_utils::{seed_match, seed_user};
    use crate::users::repository::UserRepository;
    use chrono::Duration;

    fn upsert(match_id: Uuid, user_id: Uuid, home: i32, away: i32) -> PredictionUpsert {
        PredictionUpsert {
            match_id,
            user_id,
            home_score: home,
            away_score: away,
            predicted_advancing_team: None,
        }
    }

    fn finish_request(match_id: Uuid, home: i32, away: i32, at: DateTime<Utc>) -> FinishMatchRequest {
        FinishMatchRequest {
            match_id,
            result: MatchResult {
                home,
                away,
                advancing_team: None,
            },
            finished_at: at,
        }
    }

    #[tokio::test]
    async fn upsert_checks_window_at_write_time() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "ana").await;
        let fixture = seed_match(&store, 1, false).await;

        let late = store
            .upsert_prediction(
                &upsert(fixture.id, user.id, 1, 0),
                fixture.deadline + Duration::seconds(1),
            )
            .await;
        assert!(matches!(late, Err(AppError::Validation(_))));

        let unknown = store
            .upsert_prediction(&upsert(Uuid::new_v4(), user.id, 1, 0), Utc::now())
            .await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn live_match_refuses_predictions() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "ana").await;
        let fixture = seed_match(&store, 1, false).await;

        store.start_match(fixture.id).await.unwrap();
        let outcome = store
            .upsert_prediction(&upsert(fixture.id, user.id, 1, 0), Utc::now())
            .await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn streak_follows_finish_order() {
        let store = InMemoryStore::new();
        let engine = ScoringEngine::default();
        let user = seed_user(&store, "ana").await;
        let now = Utc::now();

        let missed = seed_match(&store, 1, false).await;
        let hit_one = seed_match(&store, 1, false).await;
        let hit_two = seed_match(&store, 1, false).await;
        for fixture in [&missed, &hit_one, &hit_two] {
            store
                .upsert_prediction(&upsert(fixture.id, user.id, 2, 0), now)
                .await
                .unwrap();
        }

        store
            .finish_match(&finish_request(missed.id, 0, 1, now), &engine)
            .await
            .unwrap();
        store
            .finish_match(&finish_request(hit_one.id, 1, 0, now + Duration::minutes(1)), &engine)
            .await
            .unwrap();
        store
            .finish_match(&finish_request(hit_two.id, 2, 0, now + Duration::minutes(2)), &engine)
            .await
            .unwrap();

        let user = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.points, 8);
        assert_eq!(user.current_streak, 2);
        assert_eq!(user.best_streak, 2);
    }

    #[tokio::test]
    async fn failed_finish_leaves_every_row_untouched() {
        let store = InMemoryStore::new();
        let engine = ScoringEngine::default();
        let ana = seed_user(&store, "ana").await;
        let bystander = seed_user(&store, "carla").await;
        let fixture = seed_match(&store, 1, false).await;
        let now = Utc::now();

        store
            .upsert_prediction(&upsert(fixture.id, ana.id, 1, 0), now)
            .await
            .unwrap();
        store.insert_orphan_prediction_for_tests(fixture.id, Uuid::new_v4(), 1, 0);

        let outcome = store
            .finish_match(&finish_request(fixture.id, 1, 0, now), &engine)
            .await;
        assert!(matches!(outcome, Err(AppError::PartialFailure(_))));

        assert!(!store.get_match_for_tests(fixture.id).is_finished());
        let prediction = store.get_prediction(fixture.id, ana.id).await.unwrap().unwrap();
        assert_eq!(prediction.outcome(), None);
        assert_eq!(store.get_user(ana.id).await.unwrap().unwrap(), ana);

        // Once the orphan is gone only the predicting user is credited
        store.tables.lock().unwrap().predictions.retain(|_, p| p.user_id == ana.id);
        let summary = store
            .finish_match(&finish_request(fixture.id, 1, 0, now), &engine)
            .await
            .unwrap();
        assert_eq!(summary.users_updated, 1);
        assert_eq!(store.get_user(ana.id).await.unwrap().unwrap().points, 5);
        assert_eq!(store.get_user(bystander.id).await.unwrap().unwrap(), bystander);
    }

    #[tokio::test]
    async fn predictions_are_listed_in_submission_order() {
        let store = InMemoryStore::new();
        let fixture = seed_match(&store, 1, false).await;
        let ana = seed_user(&store, "ana").await;
        let beto = seed_user(&store, "beto").await;
        let now = Utc::now();

        store
            .upsert_prediction(&upsert(fixture.id, beto.id, 0, 0), now)
            .await
            .unwrap();
        store
            .upsert_prediction(&upsert(fixture.id, ana.id, 1, 0), now + Duration::seconds(1))
            .await
            .unwrap();

        let listed = store.list_predictions(fixture.id).await.unwrap();
        let owners: Vec<Uuid> = listed.iter().map(|p| p.user_id).collect();
        assert_eq!(owners, vec![beto.id, ana.id]);
    }
}
