use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::shared::AppState;
use crate::{awards, championships, leagues, matches, predictions, stats, users};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the HTTP API over the given state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Users and standings
        .route("/users", post(users::create_user))
        .route("/users/:user_id", get(users::get_user))
        .route("/users/:user_id/reconcile", post(users::reconcile_user))
        .route("/leaderboard", get(users::leaderboard))
        // Matches and predictions
        .route("/matches", post(matches::create_match))
        .route("/matches/:match_id", get(matches::get_match))
        .route("/matches/:match_id/start", post(matches::start_match))
        .route("/matches/:match_id/finish", post(stats::finish_match))
        .route(
            "/matches/:match_id/predictions",
            get(predictions::list_predictions),
        )
        .route(
            "/matches/:match_id/predictions/:user_id",
            get(predictions::get_prediction).put(predictions::submit_prediction),
        )
        // Monthly championship
        .route("/championships", get(championships::list_championships))
        .route(
            "/championships/:month_label",
            post(championships::award_championship),
        )
        .route(
            "/monthly-stats/reset",
            post(championships::reset_monthly_stats),
        )
        .route("/monthly-stats/rollover", post(championships::run_rollover))
        // Leagues
        .route("/leagues", post(leagues::create_league))
        .route("/leagues/:league_id", get(leagues::get_league))
        .route(
            "/leagues/:league_id/predictions",
            get(leagues::list_league_predictions),
        )
        .route(
            "/leagues/:league_id/predictions/:user_id",
            put(leagues::submit_league_prediction),
        )
        .route("/leagues/:league_id/finish", post(leagues::finish_league))
        // Awards
        .route("/awards", post(awards::create_award))
        .route("/awards/:award_id", get(awards::get_award))
        .route(
            "/awards/:award_id/predictions",
            get(awards::list_award_predictions),
        )
        .route(
            "/awards/:award_id/predictions/:user_id",
            put(awards::submit_award_prediction),
        )
        .route("/awards/:award_id/finish", post(awards::finish_award))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
