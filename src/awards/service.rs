use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    models::{AwardModel, AwardPredictionModel, AwardPredictionUpsert},
    repository::AwardRepository,
};
use crate::shared::AppError;
use crate::stats::FinishSummary;
use crate::users::repository::UserRepository;

pub struct AwardService {
    awards: Arc<dyn AwardRepository>,
    users: Arc<dyn UserRepository>,
}

impl AwardService {
    pub fn new(awards: Arc<dyn AwardRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { awards, users }
    }

    #[instrument(skip(self))]
    pub async fn create_award(
        &self,
        name: &str,
        deadline: DateTime<Utc>,
    ) -> Result<AwardModel, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Award name is required".to_string()));
        }

        let award = AwardModel::new(name.to_string(), deadline);
        self.awards.create_award(&award).await?;

        info!(award_id = %award.id, name = %award.name, "Award created");
        Ok(award)
    }

    #[instrument(skip(self))]
    pub async fn get_award(&self, award_id: Uuid) -> Result<AwardModel, AppError> {
        self.awards
            .get_award(award_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Award {} not found", award_id)))
    }

    #[instrument(skip(self, upsert), fields(award_id = %upsert.award_id, user_id = %upsert.user_id))]
    pub async fn submit_prediction(
        &self,
        mut upsert: AwardPredictionUpsert,
        now: DateTime<Utc>,
    ) -> Result<AwardPredictionModel, AppError> {
        upsert.predicted_winner = upsert.predicted_winner.trim().to_string();
        if upsert.predicted_winner.is_empty() {
            return Err(AppError::Validation(
                "Predicted winner is required".to_string(),
            ));
        }

        let award = self.get_award(upsert.award_id).await?;
        if !award.accepts_predictions_at(now) {
            warn!(status = %award.status, deadline = %award.deadline, "Award predictions closed");
            return Err(AppError::Validation(format!(
                "Predictions for award {} are closed",
                award.id
            )));
        }

        if self.users.get_user(upsert.user_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "User {} not found",
                upsert.user_id
            )));
        }

        let prediction = self.awards.upsert_award_prediction(&upsert, now).await?;
        info!(prediction_id = %prediction.id, "Award prediction stored");
        Ok(prediction)
    }

    #[instrument(skip(self))]
    pub async fn list_predictions(
        &self,
        award_id: Uuid,
    ) -> Result<Vec<AwardPredictionModel>, AppError> {
        self.get_award(award_id).await?;
        self.awards.list_award_predictions(award_id).await
    }

    #[instrument(skip(self))]
    pub async fn finish_award(
        &self,
        award_id: Uuid,
        winner: &str,
    ) -> Result<FinishSummary, AppError> {
        let winner = winner.trim();
        if winner.is_empty() {
            return Err(AppError::Validation("Award winner is required".to_string()));
        }

        let award = self.get_award(award_id).await?;
        if award.is_finished() {
            warn!(award_id = %award_id, "Award already finished");
            return Err(AppError::Conflict(format!(
                "Award {} is already finished",
                award_id
            )));
        }

        let summary = self
            .awards
            .finish_award(award_id, winner, Utc::now())
            .await?;

        info!(
            award_id = %award_id,
            winner = %winner,
            predictions_processed = summary.predictions_processed,
            "Award finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::seed_user;
    use crate::store::InMemoryStore;
    use chrono::Duration;

    fn service(store: &Arc<InMemoryStore>) -> AwardService {
        AwardService::new(store.clone(), store.clone())
    }

    fn pick(award_id: Uuid, user_id: Uuid, winner: &str) -> AwardPredictionUpsert {
        AwardPredictionUpsert {
            award_id,
            user_id,
            predicted_winner: winner.to_string(),
        }
    }

    #[tokio::test]
    async fn right_winner_earns_ten_points() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let ana = seed_user(&store, "ana").await;
        let beto = seed_user(&store, "beto").await;
        let award = service
            .create_award("Golden Boot", Utc::now() + Duration::days(2))
            .await
            .unwrap();

        service
            .submit_prediction(pick(award.id, ana.id, " miguel borja "), Utc::now())
            .await
            .unwrap();
        service
            .submit_prediction(pick(award.id, beto.id, "Cavani"), Utc::now())
            .await
            .unwrap();

        let summary = service.finish_award(award.id, "Miguel Borja").await.unwrap();
        assert_eq!(summary.predictions_processed, 2);

        let ana = store.get_user(ana.id).await.unwrap().unwrap();
        assert_eq!((ana.points, ana.correct, ana.monthly_points), (10, 1, 10));
        let beto = store.get_user(beto.id).await.unwrap().unwrap();
        assert_eq!((beto.points, beto.predictions, beto.correct), (0, 1, 0));

        let scored = service.list_predictions(award.id).await.unwrap();
        assert!(scored.iter().all(|p| p.points.is_some()));
    }

    #[tokio::test]
    async fn blank_pick_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let ana = seed_user(&store, "ana").await;
        let award = service
            .create_award("MVP", Utc::now() + Duration::days(2))
            .await
            .unwrap();

        let outcome = service
            .submit_prediction(pick(award.id, ana.id, "   "), Utc::now())
            .await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn finished_award_conflicts_and_locks_picks() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let ana = seed_user(&store, "ana").await;
        let award = service
            .create_award("MVP", Utc::now() + Duration::days(2))
            .await
            .unwrap();

        service.finish_award(award.id, "Armani").await.unwrap();

        let again = service.finish_award(award.id, "Armani").await;
        assert!(matches!(again, Err(AppError::Conflict(_))));

        let late = service
            .submit_prediction(pick(award.id, ana.id, "Armani"), Utc::now())
            .await;
        assert!(matches!(late, Err(AppError::Validation(_))));
    }
}
