//! Read-only REST endpoints for user status and mood journals.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::store::ProfileStore;

/// Shared state for the API routes.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<ProfileStore>,
}

fn not_found(user_id: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": format!("Unknown user: {user_id}") })),
    )
        .into_response()
}

/// GET /api/users/{user_id}/status
///
/// Onboarding progress, current phase, profile and routing state.
async fn get_status(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.store.snapshot(&user_id).await {
        Some(snapshot) => Json(snapshot).into_response(),
        None => not_found(&user_id),
    }
}

/// GET /api/users/{user_id}/journal
async fn get_journal(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.store.mood_journal(&user_id).await {
        Some(entries) => Json(entries).into_response(),
        None => not_found(&user_id),
    }
}

/// GET /api/health
async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "users": state.store.user_count().await,
    }))
}

/// Build the API router.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/users/{user_id}/status", get(get_status))
        .route("/api/users/{user_id}/journal", get(get_journal))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::journal::{Mood, MoodJournalEntry};
    use crate::onboarding::Profile;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn app() -> (Router, Arc<ProfileStore>) {
        let store = Arc::new(ProfileStore::new(10));
        let app = api_routes(ApiState {
            store: Arc::clone(&store),
        });
        (app, store)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = app();
        let (status, body) = get_json(app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["users"], 0);
    }

    #[tokio::test]
    async fn unknown_user_is_404() {
        let (app, _) = app();
        let (status, body) = get_json(app.clone(), "/api/users/nobody/status").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nobody"));

        let (status, _) = get_json(app, "/api/users/nobody/journal").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_of_onboarding_user() {
        let (app, store) = app();
        store.session("u1").await;

        let (status, body) = get_json(app, "/api/users/u1/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], "u1");
        assert_eq!(body["onboarding_completed"], false);
        assert!(body["state"].is_null());
    }

    #[tokio::test]
    async fn journal_lists_entries() {
        let (app, store) = app();
        let profile = Profile {
            name: Some("Sophie".into()),
            age: Some(20),
            location: Some("Paris".into()),
        };
        {
            let session = store.session("u1").await;
            let mut session = session.lock().await;
            session.complete_onboarding(profile.clone());
            session
                .log
                .record_mood(MoodJournalEntry::new(&profile, Mood::Calm, "You rested."));
        }

        let (status, body) = get_json(app, "/api/users/u1/journal").await;
        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["mood"], "Calm");
        assert_eq!(entries[0]["name"], "Sophie");
    }
}
