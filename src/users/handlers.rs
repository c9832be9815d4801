use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    models::UserModel,
    service::UserService,
    types::{CreateUserRequest, LeaderboardEntry, LeaderboardQuery},
};
use crate::shared::{AppError, AppState};

/// HTTP handler for registering a user
///
/// POST /users
#[instrument(name = "create_user", skip(state, request))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserModel>), AppError> {
    let service = UserService::new(Arc::clone(&state.user_repository));
    let user = service.register_user(&request.display_name).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/:user_id
#[instrument(name = "get_user", skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserModel>, AppError> {
    let service = UserService::new(Arc::clone(&state.user_repository));
    Ok(Json(service.get_user(user_id).await?))
}

/// POST /users/:user_id/reconcile
#[instrument(name = "reconcile_user", skip(state))]
pub async fn reconcile_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserModel>, AppError> {
    info!(user_id = %user_id, "Reconciling user stats");

    let service = UserService::new(Arc::clone(&state.user_repository));
    Ok(Json(service.reconcile(user_id).await?))
}

/// GET /leaderboard?scope=overall|monthly&limit=n
#[instrument(name = "leaderboard", skip(state))]
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let service = UserService::new(Arc::clone(&state.user_repository));
    let entries = service
        .leaderboard(query.scope.unwrap_or_default(), query.limit)
        .await?;

    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/users", post(create_user))
            .route("/users/:user_id", get(get_user))
            .route("/leaderboard", get(leaderboard))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let state = AppState::in_memory();

        let request = Request::builder()
            .method("POST")
            .uri("/users")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"display_name": "Camila"}"#))
            .unwrap();

        let response = app(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let created: UserModel = serde_json::from_slice(&body).unwrap();
        assert_eq!(created.display_name, "Camila");
        assert_eq!(created.level, 1);

        let request = Request::builder()
            .uri(format!("/users/{}", created.id))
            .body(Body::empty())
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_user_returns_404() {
        let request = Request::builder()
            .uri(format!("/users/{}", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();

        let response = app(AppState::in_memory()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blank_name_returns_400() {
        let request = Request::builder()
            .method("POST")
            .uri("/users")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"display_name": "  "}"#))
            .unwrap();

        let response = app(AppState::in_memory()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_monthly_leaderboard_query() {
        let request = Request::builder()
            .uri("/leaderboard?scope=monthly&limit=5")
            .body(Body::empty())
            .unwrap();

        let response = app(AppState::in_memory()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let entries: Vec<LeaderboardEntry> = serde_json::from_slice(&body).unwrap();
        assert!(entries.is_empty());
    }
}
