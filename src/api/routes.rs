use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Opt-in preferences
        .route(
            "/api/preferences",
            post(handlers::save_preferences).get(handlers::has_shared),
        )
        // Reward payout
        .route("/api/send-reward", post(handlers::send_reward))
        // Campaign analysis
        .route("/api/analyze", post(handlers::analyze_campaign))
        .with_state(state)
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::store::PreferenceStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        create_router(AppState::new(PreferenceStore::in_memory(), None))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn preferences_round_trip_and_duplicate() {
        let app = app();
        let body = json!({
            "walletAddress": "0xAbC0000000000000000000000000000000000001",
            "campaignId": 2,
            "email": "holder@example.com",
            "preferences": { "email": true, "sms": false, "push": true }
        });

        let (status, value) = send(&app, post_json("/api/preferences", body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["success"], true);

        let (status, value) = send(&app, post_json("/api/preferences", body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(value["success"], false);

        let get = Request::builder()
            .uri("/api/preferences?walletAddress=0xabc0000000000000000000000000000000000001&campaignId=2")
            .body(Body::empty())
            .unwrap();
        let (status, value) = send(&app, get).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["hasShared"], true);
    }

    #[tokio::test]
    async fn preferences_require_email() {
        let (status, value) = send(
            &app(),
            post_json(
                "/api/preferences",
                json!({ "walletAddress": "0xabc", "campaignId": 1, "email": "" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"], "email is required");
    }

    #[tokio::test]
    async fn unreadable_bodies_get_json_errors() {
        let app = app();

        let malformed = Request::builder()
            .method("POST")
            .uri("/api/preferences")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, value) = send(&app, malformed).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["success"], false);
        assert!(value["error"].is_string());

        // campaignId missing
        let (status, value) = send(
            &app,
            post_json(
                "/api/preferences",
                json!({ "walletAddress": "0xabc", "email": "holder@example.com" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"].as_str().unwrap().contains("campaignId"));

        for uri in ["/api/send-reward", "/api/analyze"] {
            let request = Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from("[1, 2"))
                .unwrap();
            let (status, value) = send(&app, request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(value["success"], false, "{uri}");
        }
    }

    #[tokio::test]
    async fn reward_without_business_wallet_is_server_error() {
        let (status, value) = send(
            &app(),
            post_json("/api/send-reward", json!({ "toAddress": "0x0000000000000000000000000000000000000001" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["error"], "Business wallet not configured");
    }

    #[tokio::test]
    async fn analyze_returns_insights() {
        let (status, value) = send(
            &app(),
            post_json(
                "/api/analyze",
                json!({
                    "campaignData": {
                        "location": "Downtown",
                        "metrics": {
                            "conversionRate": "75",
                            "redemptionRate": "65",
                            "totalClaimed": 150,
                            "uniqueClaimers": 100
                        }
                    }
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(value["insights"]["summary"]
            .as_str()
            .unwrap()
            .starts_with("Campaign shows excellent performance"));
        assert_eq!(value["insights"]["findings"].as_array().unwrap().len(), 2);
    }
}
