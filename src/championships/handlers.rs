use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::{MonthLabel, MonthlyChampionshipRecord, ResetSummary, RolloverOutcome},
    service::ChampionshipService,
    types::{AwardChampionshipRequest, RolloverRequest},
};
use crate::shared::{AppError, AppState};

fn championship_service(state: &AppState) -> ChampionshipService {
    ChampionshipService::new(
        Arc::clone(&state.user_repository),
        Arc::clone(&state.championship_repository),
    )
}

/// GET /championships
#[instrument(name = "list_championships", skip(state))]
pub async fn list_championships(
    State(state): State<AppState>,
) -> Result<Json<Vec<MonthlyChampionshipRecord>>, AppError> {
    Ok(Json(championship_service(&state).list_championships().await?))
}

/// HTTP handler for crowning the monthly leader (admin only)
///
/// POST /championships/:month_label
#[instrument(name = "award_championship", skip(state, request))]
pub async fn award_championship(
    State(state): State<AppState>,
    Path(month_label): Path<String>,
    Json(request): Json<AwardChampionshipRequest>,
) -> Result<(StatusCode, Json<MonthlyChampionshipRecord>), AppError> {
    let month_label: MonthLabel = month_label.parse()?;
    info!(
        month_label = %month_label,
        awarded_by = %request.awarded_by,
        "Awarding monthly crown"
    );

    let record = championship_service(&state)
        .award_monthly_championship(month_label, &request.awarded_by, request.expected_winner)
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /monthly-stats/reset
#[instrument(name = "reset_monthly_stats", skip(state))]
pub async fn reset_monthly_stats(
    State(state): State<AppState>,
) -> Result<Json<ResetSummary>, AppError> {
    Ok(Json(championship_service(&state).reset_all_monthly_stats().await?))
}

/// POST /monthly-stats/rollover
#[instrument(name = "run_rollover", skip(state, request))]
pub async fn run_rollover(
    State(state): State<AppState>,
    Json(request): Json<RolloverRequest>,
) -> Result<Json<RolloverOutcome>, AppError> {
    let outcome = championship_service(&state)
        .run_monthly_rollover(Utc::now(), &request.awarded_by)
        .await?;
    Ok(Json(outcome))
}
