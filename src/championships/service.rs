use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    models::{
        select_monthly_leader, MonthLabel, MonthlyChampionshipRecord, ResetSummary,
        RolloverOutcome,
    },
    repository::ChampionshipRepository,
};
use crate::shared::AppError;
use crate::users::repository::UserRepository;

/// Service for monthly crowns and the monthly counter reset
pub struct ChampionshipService {
    users: Arc<dyn UserRepository>,
    championships: Arc<dyn ChampionshipRepository>,
}

impl ChampionshipService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        championships: Arc<dyn ChampionshipRepository>,
    ) -> Self {
        Self {
            users,
            championships,
        }
    }

    /// Crowns the current monthly leader for `month_label`.
    ///
    /// When `expected_winner` is given (the admin screen shows a leader before
    /// confirming), the award is refused if the leader has changed since.
    /// Monthly counters are not reset here.
    #[instrument(skip(self))]
    pub async fn award_monthly_championship(
        &self,
        month_label: MonthLabel,
        awarded_by: &str,
        expected_winner: Option<Uuid>,
    ) -> Result<MonthlyChampionshipRecord, AppError> {
        let awarded_by = awarded_by.trim();
        if awarded_by.is_empty() {
            return Err(AppError::Validation(
                "Awarding administrator must be named".to_string(),
            ));
        }

        let label = month_label.to_string();
        if self.championships.get_championship(&label).await?.is_some() {
            warn!(month_label = %label, "Crown already awarded for month");
            return Err(AppError::Conflict(format!(
                "Crown for {} was already awarded",
                label
            )));
        }

        let users = self.users.list_users_by_monthly_points().await?;
        let leader = select_monthly_leader(&users).ok_or_else(|| {
            AppError::Validation(format!("Nobody scored monthly points for {}", label))
        })?;

        if let Some(expected) = expected_winner {
            if expected != leader.id {
                warn!(
                    expected = %expected,
                    leader = %leader.id,
                    "Selected winner is no longer the monthly leader"
                );
                return Err(AppError::Conflict(format!(
                    "User {} is no longer the monthly leader",
                    expected
                )));
            }
        }

        let record = MonthlyChampionshipRecord::new(leader, month_label, awarded_by);
        self.championships.record_championship(&record).await?;

        info!(
            month_label = %record.month_label,
            user_id = %record.user_id,
            points = record.points,
            awarded_by = %record.awarded_by,
            "Monthly crown awarded"
        );
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn list_championships(&self) -> Result<Vec<MonthlyChampionshipRecord>, AppError> {
        self.championships.list_championships().await
    }

    /// Zeroes monthly counters for everyone; safe to repeat
    #[instrument(skip(self))]
    pub async fn reset_all_monthly_stats(&self) -> Result<ResetSummary, AppError> {
        let users_reset = self.championships.reset_all_monthly_stats().await?;
        info!(users_reset, "Monthly stats reset");
        Ok(ResetSummary { users_reset })
    }

    /// Closes the month the monthly counters belong to once `now` has moved
    /// past it: crowns its leader if nobody has yet, then resets the counters
    /// and opens the current month for them.
    ///
    /// A store that has never tracked a month opens the current one and does
    /// nothing else, so a first run mid-month keeps this month's progress.
    /// Repeated runs within a month are no-ops.
    #[instrument(skip(self))]
    pub async fn run_monthly_rollover(
        &self,
        now: DateTime<Utc>,
        awarded_by: &str,
    ) -> Result<RolloverOutcome, AppError> {
        let current = MonthLabel::from_datetime(now);

        let open = match self.championships.open_stats_month().await? {
            Some(label) => label.parse::<MonthLabel>()?,
            None => {
                let label = current.to_string();
                if self.championships.start_stats_month(&label, now).await? {
                    info!(month_label = %label, "Monthly counters opened for month");
                }
                return Ok(RolloverOutcome::idle(label));
            }
        };

        let label = open.to_string();
        if open >= current {
            debug!(month_label = %label, "Month still open");
            return Ok(RolloverOutcome::idle(label));
        }

        let championship = if self.championships.get_championship(&label).await?.is_some() {
            debug!(month_label = %label, "Crown already in history");
            None
        } else {
            match self
                .award_monthly_championship(open, awarded_by, None)
                .await
            {
                Ok(record) => Some(record),
                Err(AppError::Validation(reason)) => {
                    info!(month_label = %label, %reason, "No crown to award");
                    None
                }
                Err(AppError::Conflict(reason)) => {
                    info!(month_label = %label, %reason, "Crown awarded concurrently");
                    None
                }
                Err(err) => return Err(err),
            }
        };

        let users_reset = self
            .championships
            .reset_monthly_stats_once(&current.to_string(), now)
            .await?;

        match users_reset {
            Some(count) => info!(
                month_label = %label,
                opened = %current,
                users_reset = count,
                "Monthly rollover reset"
            ),
            None => debug!(month_label = %label, "Monthly stats already reset for month"),
        }

        Ok(RolloverOutcome {
            month_label: label,
            championship,
            users_reset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::users::{StatsIncrement, UserModel};
    use chrono::TimeZone;

    async fn user_with_points(store: &InMemoryStore, name: &str, points: i32) -> UserModel {
        let user = UserModel::new(name.to_string());
        store.create_user(&user).await.unwrap();
        store
            .increment_user_stats(
                user.id,
                &StatsIncrement {
                    points,
                    predictions: 1,
                    correct: 1,
                    monthly_points: points,
                    monthly_predictions: 1,
                    monthly_correct: 1,
                },
            )
            .await
            .unwrap()
    }

    fn service(store: &Arc<InMemoryStore>) -> ChampionshipService {
        ChampionshipService::new(store.clone(), store.clone())
    }

    fn january() -> MonthLabel {
        MonthLabel::new(2026, 1).unwrap()
    }

    #[tokio::test]
    async fn crowns_leader_and_keeps_monthly_counters() {
        let store = Arc::new(InMemoryStore::new());
        user_with_points(&store, "ana", 8).await;
        let beto = user_with_points(&store, "beto", 13).await;

        let record = service(&store)
            .award_monthly_championship(january(), "admin", Some(beto.id))
            .await
            .unwrap();

        assert_eq!(record.user_id, beto.id);
        assert_eq!(record.points, 13);
        assert_eq!(record.month_label, "2026-01");

        let beto = store.get_user(beto.id).await.unwrap().unwrap();
        assert_eq!(beto.monthly_championships, 1);
        assert_eq!(beto.monthly_points, 13);
    }

    #[tokio::test]
    async fn second_crown_for_same_month_conflicts() {
        let store = Arc::new(InMemoryStore::new());
        let ana = user_with_points(&store, "ana", 8).await;
        let service = service(&store);

        service
            .award_monthly_championship(january(), "admin", None)
            .await
            .unwrap();
        let again = service
            .award_monthly_championship(january(), "admin", None)
            .await;

        assert!(matches!(again, Err(AppError::Conflict(_))));
        assert_eq!(service.list_championships().await.unwrap().len(), 1);
        let ana = store.get_user(ana.id).await.unwrap().unwrap();
        assert_eq!(ana.monthly_championships, 1);
    }

    #[tokio::test]
    async fn nothing_to_award_without_monthly_points() {
        let store = Arc::new(InMemoryStore::new());
        store
            .create_user(&UserModel::new("idle".to_string()))
            .await
            .unwrap();

        let outcome = service(&store)
            .award_monthly_championship(january(), "admin", None)
            .await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn stale_selection_is_refused() {
        let store = Arc::new(InMemoryStore::new());
        let ana = user_with_points(&store, "ana", 8).await;
        user_with_points(&store, "beto", 20).await;

        let outcome = service(&store)
            .award_monthly_championship(january(), "admin", Some(ana.id))
            .await;

        assert!(matches!(outcome, Err(AppError::Conflict(_))));
        assert!(service(&store)
            .list_championships()
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        let ana = user_with_points(&store, "ana", 8).await;
        user_with_points(&store, "beto", 3).await;
        let service = service(&store);

        assert_eq!(service.reset_all_monthly_stats().await.unwrap().users_reset, 2);
        assert_eq!(service.reset_all_monthly_stats().await.unwrap().users_reset, 2);

        let ana = store.get_user(ana.id).await.unwrap().unwrap();
        assert_eq!(
            (ana.monthly_points, ana.monthly_predictions, ana.monthly_correct),
            (0, 0, 0)
        );
        assert_eq!(ana.points, 8);
    }

    #[tokio::test]
    async fn first_rollover_mid_month_keeps_progress() {
        let store = Arc::new(InMemoryStore::new());
        let ana = user_with_points(&store, "ana", 9).await;
        let service = service(&store);
        let mid_october = Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap();

        let outcome = service
            .run_monthly_rollover(mid_october, "system")
            .await
            .unwrap();
        assert_eq!(outcome, RolloverOutcome::idle("2026-10".to_string()));

        let again = service
            .run_monthly_rollover(mid_october + chrono::Duration::days(3), "system")
            .await
            .unwrap();
        assert!(again.championship.is_none());
        assert_eq!(again.users_reset, None);

        assert!(service.list_championships().await.unwrap().is_empty());
        let ana = store.get_user(ana.id).await.unwrap().unwrap();
        assert_eq!(ana.monthly_points, 9);
        assert_eq!(
            store.open_stats_month().await.unwrap().as_deref(),
            Some("2026-10")
        );
    }

    #[tokio::test]
    async fn rollover_awards_closed_month_then_resets_once() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let mid_january = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
        service.run_monthly_rollover(mid_january, "system").await.unwrap();

        let ana = user_with_points(&store, "ana", 11).await;
        let first_of_february = Utc.with_ymd_and_hms(2026, 2, 1, 0, 5, 0).unwrap();

        let first = service
            .run_monthly_rollover(first_of_february, "system")
            .await
            .unwrap();
        assert_eq!(first.month_label, "2026-01");
        assert_eq!(first.championship.as_ref().unwrap().user_id, ana.id);
        assert_eq!(first.championship.as_ref().unwrap().month_label, "2026-01");
        assert_eq!(first.users_reset, Some(1));

        // Points scored after the reset belong to February and must survive a rerun
        user_with_points(&store, "beto", 4).await;
        let second = service
            .run_monthly_rollover(first_of_february + chrono::Duration::hours(1), "system")
            .await
            .unwrap();
        assert_eq!(second.month_label, "2026-02");
        assert!(second.championship.is_none());
        assert_eq!(second.users_reset, None);

        let standings = store.list_users_by_monthly_points().await.unwrap();
        assert_eq!(standings[0].monthly_points, 4);
    }

    #[tokio::test]
    async fn rollover_without_points_still_resets() {
        let store = Arc::new(InMemoryStore::new());
        store
            .create_user(&UserModel::new("idle".to_string()))
            .await
            .unwrap();
        store
            .start_stats_month("2025-12", Utc.with_ymd_and_hms(2025, 12, 3, 0, 0, 0).unwrap())
            .await
            .unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let outcome = service(&store)
            .run_monthly_rollover(now, "system")
            .await
            .unwrap();

        assert_eq!(outcome.month_label, "2025-12");
        assert!(outcome.championship.is_none());
        assert_eq!(outcome.users_reset, Some(1));
        assert_eq!(
            store.open_stats_month().await.unwrap().as_deref(),
            Some("2026-01")
        );
    }

    #[tokio::test]
    async fn missed_boundary_crowns_the_month_that_was_open() {
        let store = Arc::new(InMemoryStore::new());
        store
            .start_stats_month("2026-03", Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap())
            .await
            .unwrap();
        user_with_points(&store, "ana", 6).await;

        // Nothing ran during April
        let outcome = service(&store)
            .run_monthly_rollover(Utc.with_ymd_and_hms(2026, 5, 2, 0, 0, 0).unwrap(), "system")
            .await
            .unwrap();

        assert_eq!(outcome.month_label, "2026-03");
        assert_eq!(outcome.championship.unwrap().month_label, "2026-03");
        assert_eq!(
            store.open_stats_month().await.unwrap().as_deref(),
            Some("2026-05")
        );
    }
}
