use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{service::StatsService, types::FinishMatchBody, FinishSummary};
use crate::matches::MatchResult;
use crate::shared::{AppError, AppState};

/// HTTP handler for finishing a match (admin only)
///
/// POST /matches/:match_id/finish
/// Returns how many predictions were scored and users credited
#[instrument(name = "finish_match", skip(state, body))]
pub async fn finish_match(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
    Json(body): Json<FinishMatchBody>,
) -> Result<Json<FinishSummary>, AppError> {
    info!(
        match_id = %match_id,
        result_home = body.result_home,
        result_away = body.result_away,
        "Finishing match"
    );

    let service = StatsService::new(
        Arc::clone(&state.match_repository),
        Arc::clone(&state.scoring_engine),
    );
    let summary = service
        .finish_match(
            match_id,
            MatchResult {
                home: body.result_home,
                away: body.result_away,
                advancing_team: body.advancing_team,
            },
        )
        .await?;

    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::MatchModel;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::post,
        Router,
    };
    use chrono::{Duration, Utc};
    use tower::ServiceExt; // for `oneshot`

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/matches/:match_id/finish", post(finish_match))
            .with_state(state)
    }

    fn finish_request(match_id: Uuid, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/matches/{}/finish", match_id))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_finish_then_refinish_returns_409() {
        let state = AppState::in_memory();
        let fixture = MatchModel::new(
            "A".into(),
            "B".into(),
            Utc::now() + Duration::hours(1),
            false,
        );
        state.match_repository.create_match(&fixture).await.unwrap();

        let body = r#"{"result_home": 2, "result_away": 0}"#;
        let response = app(state.clone())
            .oneshot(finish_request(fixture.id, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let summary: FinishSummary = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(summary.id, fixture.id);
        assert_eq!(summary.predictions_processed, 0);

        let response = app(state)
            .oneshot(finish_request(fixture.id, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_finish_unknown_match_returns_404() {
        let response = app(AppState::in_memory())
            .oneshot(finish_request(
                Uuid::new_v4(),
                r#"{"result_home": 1, "result_away": 1}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
