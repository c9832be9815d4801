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
    models::{AwardModel, AwardPredictionModel, AwardPredictionUpsert},
    service::AwardService,
    types::{CreateAwardRequest, FinishAwardRequest, SubmitAwardPredictionRequest},
};
use crate::shared::{AppError, AppState};
use crate::stats::FinishSummary;

fn award_service(state: &AppState) -> AwardService {
    AwardService::new(
        Arc::clone(&state.award_repository),
        Arc::clone(&state.user_repository),
    )
}

/// POST /awards
#[instrument(name = "create_award", skip(state, request))]
pub async fn create_award(
    State(state): State<AppState>,
    Json(request): Json<CreateAwardRequest>,
) -> Result<(StatusCode, Json<AwardModel>), AppError> {
    let award = award_service(&state)
        .create_award(&request.name, request.deadline)
        .await?;
    Ok((StatusCode::CREATED, Json(award)))
}

/// GET /awards/:award_id
#[instrument(name = "get_award", skip(state))]
pub async fn get_award(
    State(state): State<AppState>,
    Path(award_id): Path<Uuid>,
) -> Result<Json<AwardModel>, AppError> {
    Ok(Json(award_service(&state).get_award(award_id).await?))
}

/// PUT /awards/:award_id/predictions/:user_id
#[instrument(name = "submit_award_prediction", skip(state, request))]
pub async fn submit_award_prediction(
    State(state): State<AppState>,
    Path((award_id, user_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SubmitAwardPredictionRequest>,
) -> Result<Json<AwardPredictionModel>, AppError> {
    let upsert = AwardPredictionUpsert {
        award_id,
        user_id,
        predicted_winner: request.predicted_winner,
    };
    let prediction = award_service(&state)
        .submit_prediction(upsert, Utc::now())
        .await?;
    Ok(Json(prediction))
}

/// GET /awards/:award_id/predictions
#[instrument(name = "list_award_predictions", skip(state))]
pub async fn list_award_predictions(
    State(state): State<AppState>,
    Path(award_id): Path<Uuid>,
) -> Result<Json<Vec<AwardPredictionModel>>, AppError> {
    Ok(Json(award_service(&state).list_predictions(award_id).await?))
}

/// POST /awards/:award_id/finish
#[instrument(name = "finish_award", skip(state, request))]
pub async fn finish_award(
    State(state): State<AppState>,
    Path(award_id): Path<Uuid>,
    Json(request): Json<FinishAwardRequest>,
) -> Result<Json<FinishSummary>, AppError> {
    info!(award_id = %award_id, winner = %request.winner, "Finishing award");
    Ok(Json(
        award_service(&state)
            .finish_award(award_id, &request.winner)
            .await?,
    ))
}
