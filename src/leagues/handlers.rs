use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    models::{LeagueModel, LeaguePredictionModel, LeaguePredictionUpsert, LeagueResult},
    service::LeagueService,
    types::{CreateLeagueRequest, SubmitLeaguePredictionRequest},
};
use crate::shared::{AppError, AppState};
use crate::stats::FinishSummary;

fn league_service(state: &AppState) -> LeagueService {
    LeagueService::new(
        Arc::clone(&state.league_repository),
        Arc::clone(&state.user_repository),
    )
}

/// POST /leagues
#[instrument(name = "create_league", skip(state, request))]
pub async fn create_league(
    State(state): State<AppState>,
    Json(request): Json<CreateLeagueRequest>,
) -> Result<(StatusCode, Json<LeagueModel>), AppError> {
    let league = league_service(&state)
        .create_league(&request.name, request.deadline)
        .await?;
    Ok((StatusCode::CREATED, Json(league)))
}

/// GET /leagues/:league_id
#[instrument(name = "get_league", skip(state))]
pub async fn get_league(
    State(state): State<AppState>,
    Path(league_id): Path<Uuid>,
) -> Result<Json<LeagueModel>, AppError> {
    Ok(Json(league_service(&state).get_league(league_id).await?))
}

/// PUT /leagues/:league_id/predictions/:user_id
#[instrument(name = "submit_league_prediction", skip(state, request))]
pub async fn submit_league_prediction(
    State(state): State<AppState>,
    Path((league_id, user_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SubmitLeaguePredictionRequest>,
) -> Result<Json<LeaguePredictionModel>, AppError> {
    let upsert = LeaguePredictionUpsert {
        league_id,
        user_id,
        champion: request.champion,
        top_scorer: request.top_scorer,
        top_assist: request.top_assist,
        mvp: request.mvp,
    };
    let prediction = league_service(&state)
        .submit_prediction(upsert, Utc::now())
        .await?;
    Ok(Json(prediction))
}

/// GET /leagues/:league_id/predictions
#[instrument(name = "list_league_predictions", skip(state))]
pub async fn list_league_predictions(
    State(state): State<AppState>,
    Path(league_id): Path<Uuid>,
) -> Result<Json<Vec<LeaguePredictionModel>>, AppError> {
    Ok(Json(league_service(&state).list_predictions(league_id).await?))
}

/// HTTP handler for closing a league with its real outcome (admin only)
///
/// POST /leagues/:league_id/finish
#[instrument(name = "finish_league", skip(state, result))]
pub async fn finish_league(
    State(state): State<AppState>,
    Path(league_id): Path<Uuid>,
    Json(result): Json<LeagueResult>,
) -> Result<Json<FinishSummary>, AppError> {
    info!(league_id = %league_id, champion = %result.champion, "Finishing league");
    Ok(Json(league_service(&state).finish_league(league_id, result).await?))
}
