use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, instrument, warn};

use super::service::ChampionshipService;

/// Configuration for the monthly rollover task
#[derive(Debug, Clone)]
pub struct RolloverConfig {
    /// How often to check whether the month has turned
    pub check_interval: Duration,
    /// Recorded as `awarded_by` on crowns awarded by the task
    pub awarded_by: String,
}

impl Default for RolloverConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60 * 60), // 1 hour
            awarded_by: "system".to_string(),
        }
    }
}

/// Starts the background task that closes finished months.
///
/// Every tick runs the rollover for the month before now; repeated runs
/// within a month are no-ops, so the interval only bounds how late a crown
/// can be awarded after the boundary.
#[instrument(skip(service))]
pub async fn start_rollover_task(service: Arc<ChampionshipService>, config: RolloverConfig) {
    // tokio intervals cannot have a zero period
    let period = if config.check_interval.is_zero() {
        let fallback = RolloverConfig::default().check_interval;
        warn!(
            fallback_secs = fallback.as_secs(),
            "Zero rollover check interval, using the default"
        );
        fallback
    } else {
        config.check_interval
    };

    info!(
        check_interval_secs = period.as_secs(),
        awarded_by = %config.awarded_by,
        "Starting monthly rollover background task"
    );

    let mut check_interval = interval(period);

    loop {
        check_interval.tick().await;

        match service
            .run_monthly_rollover(Utc::now(), &config.awarded_by)
            .await
        {
            Ok(outcome) => {
                info!(
                    month_label = %outcome.month_label,
                    crowned = outcome.championship.is_some(),
                    users_reset = ?outcome.users_reset,
                    "Monthly rollover check completed"
                );
            }
            Err(e) => {
                error!(error = %e, "Monthly rollover check failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::championships::{repository::ChampionshipRepository, MonthLabel};
    use crate::store::InMemoryStore;
    use crate::users::{repository::UserRepository, StatsIncrement, UserModel};

    #[tokio::test]
    async fn test_task_closes_previous_month_on_first_tick() {
        let store = Arc::new(InMemoryStore::new());
        let user = UserModel::new("ana".to_string());
        store.create_user(&user).await.unwrap();
        store
            .increment_user_stats(
                user.id,
                &StatsIncrement {
                    points: 5,
                    predictions: 1,
                    correct: 1,
                    monthly_points: 5,
                    monthly_predictions: 1,
                    monthly_correct: 1,
                },
            )
            .await
            .unwrap();

        // Counters were opened last month, so the current month has turned
        let last_month = MonthLabel::from_datetime(Utc::now()).previous();
        store
            .start_stats_month(&last_month.to_string(), Utc::now())
            .await
            .unwrap();

        let service = Arc::new(ChampionshipService::new(store.clone(), store.clone()));
        let config = RolloverConfig {
            check_interval: Duration::from_secs(3600),
            awarded_by: "scheduler".to_string(),
        };
        let handle = tokio::spawn(start_rollover_task(service, config));

        // The first interval tick fires immediately
        for _ in 0..50 {
            if !store.list_championships().await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        let history = store.list_championships().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user_id, user.id);
        assert_eq!(history[0].awarded_by, "scheduler");

        assert_eq!(history[0].month_label, last_month.to_string());

        let user = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.monthly_points, 0);
        assert_eq!(user.points, 5);
    }

    #[tokio::test]
    async fn test_zero_interval_still_runs_checks() {
        let store = Arc::new(InMemoryStore::new());
        let service = Arc::new(ChampionshipService::new(store.clone(), store.clone()));
        let config = RolloverConfig {
            check_interval: Duration::ZERO,
            awarded_by: "scheduler".to_string(),
        };
        let handle = tokio::spawn(start_rollover_task(service, config));

        // The first check opens the current month on a fresh store
        for _ in 0..50 {
            if store.open_stats_month().await.unwrap().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(!handle.is_finished());
        handle.abort();
        assert_eq!(
            store.open_stats_month().await.unwrap(),
            Some(MonthLabel::from_datetime(Utc::now()).to_string())
        );
    }
}
