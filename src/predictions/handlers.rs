use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    models::{PredictionModel, PredictionUpsert},
    service::PredictionService,
    types::SubmitPredictionRequest,
};
use crate::shared::{AppError, AppState};

fn prediction_service(state: &AppState) -> PredictionService {
    PredictionService::new(
        Arc::clone(&state.prediction_repository),
        Arc::clone(&state.match_repository),
        Arc::clone(&state.user_repository),
    )
}

/// HTTP handler for creating or replacing a prediction
///
/// PUT /matches/:match_id/predictions/:user_id
#[instrument(name = "submit_prediction", skip(state, request))]
pub async fn submit_prediction(
    State(state): State<AppState>,
    Path((match_id, user_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SubmitPredictionRequest>,
) -> Result<Json<PredictionModel>, AppError> {
    info!(match_id = %match_id, user_id = %user_id, "Submitting prediction");

    let upsert = PredictionUpsert {
        match_id,
        user_id,
        home_score: request.home_score,
        away_score: request.away_score,
        predicted_advancing_team: request.predicted_advancing_team,
    };
    let prediction = prediction_service(&state)
        .submit_prediction(upsert, Utc::now())
        .await?;

    Ok(Json(prediction))
}

/// GET /matches/:match_id/predictions/:user_id
#[instrument(name = "get_prediction", skip(state))]
pub async fn get_prediction(
    State(state): State<AppState>,
    Path((match_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PredictionModel>, AppError> {
    let prediction = prediction_service(&state)
        .get_prediction(match_id, user_id)
        .await?;
    Ok(Json(prediction))
}

/// GET /matches/:match_id/predictions
#[instrument(name = "list_predictions", skip(state))]
pub async fn list_predictions(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> Result<Json<Vec<PredictionModel>>, AppError> {
    let predictions = prediction_service(&state).list_predictions(match_id).await?;
    Ok(Json(predictions))
}
