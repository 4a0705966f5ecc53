use crate::handlers::{auth, health, matches, profile};
use crate::state::AppState;
use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health))
        .route("/matches", post(matches::create_match).get(matches::list_matches))
        .route("/matches/{id}", get(matches::get_match))
        .route("/matches/{id}/participants", get(matches::list_participants))
        .route("/matches/{id}/join", post(matches::join_match))
        .route("/auth/wallet", post(auth::wallet_login))
        .route("/profile", get(profile::get_profile).put(profile::update_profile))
        .route("/profile/telegram", post(profile::link_telegram));

    Router::new()
        .route("/", get(health::root))
        .nest("/v1", api_routes)
        .fallback(route_not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "NOT_FOUND", "message": "No such route" })),
    )
}
