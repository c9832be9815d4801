use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use globalscore::users::UserModel;
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`
use uuid::Uuid;

use super::setup::TestSetup;

// ============================================================================
// HTTP Actions
// ============================================================================

pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestSetup {
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> ApiResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(value) => Body::from(value.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        ApiResponse { status, body }
    }

    /// Schedules a match whose deadline is an hour away and returns its id
    pub async fn create_match(&self, is_knockout: bool) -> Uuid {
        let response = self
            .send(
                "POST",
                "/matches",
                Some(json!({
                    "home_team": "Boca Juniors",
                    "away_team": "River Plate",
                    "deadline": Utc::now() + Duration::hours(1),
                    "is_knockout": is_knockout,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn predict(&self, match_id: Uuid, user: &str, home: i32, away: i32) -> ApiResponse {
        self.send(
            "PUT",
            &format!("/matches/{}/predictions/{}", match_id, self.user_id(user)),
            Some(json!({ "home_score": home, "away_score": away })),
        )
        .await
    }

    pub async fn predict_knockout(
        &self,
        match_id: Uuid,
        user: &str,
        home: i32,
        away: i32,
        advancing_team: &str,
    ) -> ApiResponse {
        self.send(
            "PUT",
            &format!("/matches/{}/predictions/{}", match_id, self.user_id(user)),
            Some(json!({
                "home_score": home,
                "away_score": away,
                "predicted_advancing_team": advancing_team,
            })),
        )
        .await
    }

    pub async fn finish(&self, match_id: Uuid, home: i32, away: i32) -> ApiResponse {
        self.send(
            "POST",
            &format!("/matches/{}/finish", match_id),
            Some(json!({ "result_home": home, "result_away": away })),
        )
        .await
    }

    pub async fn user(&self, name: &str) -> UserModel {
        let response = self
            .send("GET", &format!("/users/{}", self.user_id(name)), None)
            .await;
        assert_eq!(response.status, StatusCode::OK);
        serde_json::from_value(response.body).unwrap()
    }

    pub async fn award_crown(&self, month_label: &str, expected_winner: Option<Uuid>) -> ApiResponse {
        self.send(
            "POST",
            &format!("/championships/{}", month_label),
            Some(json!({ "awarded_by": "admin", "expected_winner": expected_winner })),
        )
        .await
    }
}
