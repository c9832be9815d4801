use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::{models::MatchModel, service::MatchService, types::CreateMatchRequest};
use crate::shared::{AppError, AppState};

/// HTTP handler for scheduling a match
///
/// POST /matches
#[instrument(name = "create_match", skip(state, request))]
pub async fn create_match(
    State(state): State<AppState>,
    Json(request): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<MatchModel>), AppError> {
    let service = MatchService::new(Arc::clone(&state.match_repository));
    let fixture = service.create_match(request).await?;

    Ok((StatusCode::CREATED, Json(fixture)))
}

/// GET /matches/:match_id
#[instrument(name = "get_match", skip(state))]
pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> Result<Json<MatchModel>, AppError> {
    let service = MatchService::new(Arc::clone(&state.match_repository));
    Ok(Json(service.get_match(match_id).await?))
}

/// POST /matches/:match_id/start
#[instrument(name = "start_match", skip(state))]
pub async fn start_match(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> Result<Json<MatchModel>, AppError> {
    let service = MatchService::new(Arc::clone(&state.match_repository));
    Ok(Json(service.start_match(match_id).await?))
}
